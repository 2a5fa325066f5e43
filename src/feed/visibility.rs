//! Hide/reveal state for messages from muted senders.

use super::group::MessageContainer;

/// Project mute and reveal state onto a container.
///
/// Starts from the grouping-derived sender flag and the message's own mention
/// flag each time, so it can be re-applied after any mute or reveal change.
pub fn apply_visibility(
    container: &mut MessageContainer,
    is_sender_muted: bool,
    is_revealed: bool,
) {
    container.is_hidden = is_sender_muted && !is_revealed;

    if container.is_hidden {
        container.include_sender = false;
        container.contains_mention = false;
    } else if is_revealed {
        // A revealed message may follow hidden ones in its run, so it always
        // carries its own sender line
        container.include_sender = true;
        container.contains_mention = container.msg.mentioned;
    } else {
        container.include_sender = container.starts_sender_run();
        container.contains_mention = container.msg.mentioned;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use std::sync::Arc;

    /// Three messages from one sender: first shows the sender, second has a mention.
    fn run() -> Vec<MessageContainer> {
        let msgs = [
            Message::stream(1, 10, 1000, "general", 1, "t"),
            Message::stream(2, 10, 1001, "general", 1, "t").with_mentioned(true),
            Message::stream(3, 10, 1002, "general", 1, "t"),
        ];
        msgs.into_iter()
            .enumerate()
            .map(|(i, m)| {
                let mut c = MessageContainer::new(Arc::new(m));
                c.set_starts_sender_run(i == 0);
                c
            })
            .collect()
    }

    fn apply_all(containers: &mut [MessageContainer], muted: bool, revealed: bool) {
        for c in containers.iter_mut() {
            apply_visibility(c, muted, revealed);
        }
    }

    #[test]
    fn test_unmuted_keeps_grouping() {
        let mut containers = run();
        apply_all(&mut containers, false, false);

        assert!(containers.iter().all(|c| !c.is_hidden));
        let senders: Vec<bool> = containers.iter().map(|c| c.include_sender).collect();
        assert_eq!(senders, vec![true, false, false]);
        assert!(containers[1].contains_mention);
    }

    #[test]
    fn test_muted_hides_everything() {
        let mut containers = run();
        apply_all(&mut containers, true, false);

        for c in &containers {
            assert!(c.is_hidden);
            assert!(!c.include_sender);
            assert!(!c.contains_mention);
        }
    }

    #[test]
    fn test_reveal_then_rehide() {
        let mut containers = run();
        apply_all(&mut containers, true, true);
        for c in &containers {
            assert!(!c.is_hidden);
            assert!(c.include_sender);
        }
        assert!(containers[1].contains_mention);
        assert!(!containers[0].contains_mention);

        apply_all(&mut containers, true, false);
        for c in &containers {
            assert!(c.is_hidden);
            assert!(!c.include_sender);
            assert!(!c.contains_mention);
        }

        // Unmuting restores the grouping-derived sender lines
        apply_all(&mut containers, false, false);
        let senders: Vec<bool> = containers.iter().map(|c| c.include_sender).collect();
        assert_eq!(senders, vec![true, false, false]);
        assert!(containers[1].contains_mention);
    }
}
