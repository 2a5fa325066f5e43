//! "Moved" vs "edited" labelling derived from a message's edit history.

use crate::message::{EditEntry, Message};

/// Marker prepended to a topic name when the topic is resolved.
pub const RESOLVED_TOPIC_PREFIX: &str = "✔ ";

fn strip_resolved(topic: &str) -> &str {
    topic.strip_prefix(RESOLVED_TOPIC_PREFIX).unwrap_or(topic)
}

/// True when the only difference between two topic names is the resolved marker.
pub fn is_resolve_toggle(prev_topic: &str, topic: &str) -> bool {
    strip_resolved(prev_topic) == strip_resolved(topic)
}

/// `Some(false)` means "edited", `Some(true)` means "moved", `None` means no
/// label. Content edits win over moves anywhere in the history.
pub fn classify_moved(edit_history: &[EditEntry]) -> Option<bool> {
    if edit_history.is_empty() {
        return None;
    }

    let has_content_edit = edit_history.iter().any(|e| e.prev_content.is_some());
    if has_content_edit {
        return Some(false);
    }

    let has_stream_change = edit_history.iter().any(|e| e.prev_stream.is_some());
    let has_real_topic_change = edit_history.iter().any(|e| match (&e.prev_topic, &e.topic) {
        (Some(prev), Some(topic)) => !is_resolve_toggle(prev, topic),
        _ => false,
    });
    if has_stream_change || has_real_topic_change {
        return Some(true);
    }

    None
}

/// Where the "edited" marker is drawn for a message that has been edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditPosition {
    /// Next to the "/me" status text
    StatusMessage,
    /// Next to the sender name
    AlongsideSender,
    /// In the left column, for rows without a sender line
    LeftColumn,
}

pub fn classify_edit_position(msg: &Message, include_sender: bool) -> Option<EditPosition> {
    msg.last_edit_timestamp?;
    Some(if msg.is_me_message {
        EditPosition::StatusMessage
    } else if include_sender {
        EditPosition::AlongsideSender
    } else {
        EditPosition::LeftColumn
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_change() -> EditEntry {
        EditEntry {
            prev_stream: Some(1),
            timestamp: 1000,
            user_id: Some(1),
            ..Default::default()
        }
    }

    fn topic_change(prev: &str, topic: &str) -> EditEntry {
        EditEntry {
            prev_topic: Some(prev.into()),
            topic: Some(topic.into()),
            timestamp: 1000,
            user_id: Some(1),
            ..Default::default()
        }
    }

    fn content_change() -> EditEntry {
        EditEntry {
            prev_content: Some("test_content".into()),
            timestamp: 1000,
            user_id: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_resolve_toggle() {
        assert!(is_resolve_toggle("a", "✔ a"));
        assert!(is_resolve_toggle("✔ a", "a"));
        assert!(!is_resolve_toggle("a", "b"));
        assert!(!is_resolve_toggle("a", "✔ b"));
        // Only one marker is stripped
        assert!(!is_resolve_toggle("a", "✔ ✔ a"));
    }

    #[test]
    fn test_single_entry_cases() {
        assert_eq!(classify_moved(&[]), None);
        assert_eq!(classify_moved(&[stream_change()]), Some(true));
        assert_eq!(classify_moved(&[topic_change("a", "b")]), Some(true));
        assert_eq!(classify_moved(&[content_change()]), Some(false));
        assert_eq!(classify_moved(&[topic_change("a", "✔ a")]), None);
        assert_eq!(classify_moved(&[topic_change("✔ a", "a")]), None);
    }

    #[test]
    fn test_combined_entry_cases() {
        let stream_and_topic = EditEntry {
            prev_stream: Some(1),
            ..topic_change("test_topic", "new_topic")
        };
        assert_eq!(classify_moved(&[stream_and_topic]), Some(true));

        let topic_and_content = EditEntry {
            prev_content: Some("test_content".into()),
            ..topic_change("test_topic", "new_topic")
        };
        assert_eq!(classify_moved(&[topic_and_content]), Some(false));
    }

    #[test]
    fn test_multiple_entries() {
        let with_content = vec![
            stream_change(),
            topic_change("old_topic", "test_topic"),
            content_change(),
            topic_change("test_topic", "✔ test_topic"),
        ];
        assert_eq!(classify_moved(&with_content), Some(false));

        let without_content = vec![
            stream_change(),
            topic_change("old_topic", "test_topic"),
            topic_change("test_topic", "✔ test_topic"),
            topic_change("✔ test_topic", "test_topic"),
        ];
        assert_eq!(classify_moved(&without_content), Some(true));
    }

    #[test]
    fn test_incomplete_entries_count_as_unchanged() {
        // A topic edit missing its new topic is not a move
        let partial = EditEntry {
            prev_topic: Some("old".into()),
            ..Default::default()
        };
        assert_eq!(classify_moved(&[partial.clone()]), None);
        assert_eq!(classify_moved(&[partial, stream_change()]), Some(true));
        assert_eq!(classify_moved(&[EditEntry::default()]), None);
    }

    #[test]
    fn test_edit_position() {
        let edited = Message::stream(1, 10, 1000, "general", 1, "t");
        let edited = edited.with_edit_history(vec![content_change()]);

        assert_eq!(
            classify_edit_position(&edited, true),
            Some(EditPosition::AlongsideSender)
        );
        assert_eq!(
            classify_edit_position(&edited, false),
            Some(EditPosition::LeftColumn)
        );

        let me = edited.clone().with_me_message(true);
        assert_eq!(
            classify_edit_position(&me, true),
            Some(EditPosition::StatusMessage)
        );
        assert_eq!(
            classify_edit_position(&me, false),
            Some(EditPosition::StatusMessage)
        );

        let unedited = Message::stream(2, 10, 1000, "general", 1, "t");
        assert_eq!(classify_edit_position(&unedited, true), None);
    }
}
