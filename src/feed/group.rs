//! Message containers and the recipient/day groups they are clustered into.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::edits::{classify_edit_position, classify_moved, EditPosition};
use super::format::status_message_text;
use super::recipient::{group_compatible, RecipientKey};
use super::visibility::apply_visibility;
use crate::dates::DayBoundary;
use crate::message::{Message, MessageId};
use crate::store::MuteRegistry;

/// Read-only state every derived attribute is computed from.
pub struct FeedContext<'a> {
    pub days: &'a dyn DayBoundary,
    pub mutes: &'a dyn MuteRegistry,
    pub revealed: &'a HashSet<MessageId>,
}

/// One message plus the display attributes derived from its neighbours,
/// mute state and edit history. Every derived field is recomputable.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageContainer {
    pub msg: Arc<Message>,
    pub include_sender: bool,
    /// The following row in the group has the same sender
    pub next_is_same_sender: bool,
    pub is_hidden: bool,
    pub contains_mention: bool,
    /// `Some(true)` moved, `Some(false)` edited, `None` no label
    pub moved: Option<bool>,
    pub edited_in_left_col: bool,
    pub edited_alongside_sender: bool,
    pub edited_status_msg: bool,
    pub want_date_divider: bool,
    pub date_divider_html: Option<String>,
    /// Body of a "/me" message
    pub status_message: Option<String>,
    starts_sender_run: bool,
}

impl MessageContainer {
    pub fn new(msg: Arc<Message>) -> Self {
        let contains_mention = msg.mentioned;
        Self {
            msg,
            include_sender: true,
            next_is_same_sender: false,
            is_hidden: false,
            contains_mention,
            moved: None,
            edited_in_left_col: false,
            edited_alongside_sender: false,
            edited_status_msg: false,
            want_date_divider: false,
            date_divider_html: None,
            status_message: None,
            starts_sender_run: true,
        }
    }

    pub fn id(&self) -> MessageId {
        self.msg.id
    }

    /// Whether grouping alone would show the sender on this row.
    pub fn starts_sender_run(&self) -> bool {
        self.starts_sender_run
    }

    pub(crate) fn set_starts_sender_run(&mut self, starts: bool) {
        self.starts_sender_run = starts;
    }

    pub(crate) fn set_message(&mut self, msg: Arc<Message>) {
        self.msg = msg;
    }

    /// Recompute everything that does not depend on neighbouring rows.
    pub(crate) fn refresh(&mut self, ctx: &FeedContext<'_>) {
        self.status_message = self
            .msg
            .is_me_message
            .then(|| status_message_text(&self.msg.content));

        let is_revealed = ctx.revealed.contains(&self.msg.id);
        apply_visibility(self, ctx.mutes.is_muted(self.msg.sender_id), is_revealed);

        self.moved = classify_moved(&self.msg.edit_history);
        let position = classify_edit_position(&self.msg, self.include_sender);
        self.edited_status_msg = position == Some(EditPosition::StatusMessage);
        self.edited_alongside_sender = position == Some(EditPosition::AlongsideSender);
        self.edited_in_left_col = position == Some(EditPosition::LeftColumn);
    }
}

/// Stable identifier handed to the renderer for diffing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message-group-{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct GroupIdAllocator {
    next: u64,
}

impl GroupIdAllocator {
    pub fn next_id(&mut self) -> GroupId {
        self.next += 1;
        GroupId(self.next)
    }
}

/// A non-empty run of containers sharing a recipient key and calendar day.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageGroup {
    pub group_id: GroupId,
    /// The subscription state changes at the top of this group
    pub bookend_top: bool,
    /// Day divider shown above the group
    pub group_date_divider_html: Option<String>,
    key: RecipientKey,
    containers: Vec<MessageContainer>,
}

impl MessageGroup {
    pub fn new(group_id: GroupId, key: RecipientKey, first: MessageContainer) -> Self {
        Self {
            group_id,
            bookend_top: false,
            group_date_divider_html: None,
            key,
            containers: vec![first],
        }
    }

    pub fn key(&self) -> &RecipientKey {
        &self.key
    }

    pub fn containers(&self) -> &[MessageContainer] {
        &self.containers
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn first(&self) -> &MessageContainer {
        &self.containers[0]
    }

    pub fn last(&self) -> &MessageContainer {
        &self.containers[self.containers.len() - 1]
    }

    pub fn container(&self, id: MessageId) -> Option<&MessageContainer> {
        self.containers.iter().find(|c| c.id() == id)
    }

    pub(crate) fn container_mut(&mut self, id: MessageId) -> Option<&mut MessageContainer> {
        self.containers.iter_mut().find(|c| c.id() == id)
    }

    pub fn message_ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.containers.iter().map(MessageContainer::id)
    }

    pub(crate) fn into_containers(self) -> Vec<MessageContainer> {
        self.containers
    }

    pub(crate) fn push(&mut self, container: MessageContainer) {
        self.containers.push(container);
    }

    pub(crate) fn extend_tail(&mut self, containers: Vec<MessageContainer>) {
        self.containers.extend(containers);
    }

    pub(crate) fn extend_head(&mut self, containers: Vec<MessageContainer>) {
        self.containers.splice(0..0, containers);
    }

    /// Drop containers for the given messages. Returns the ids removed.
    pub(crate) fn remove_messages(&mut self, ids: &HashSet<MessageId>) -> Vec<MessageId> {
        let mut removed = Vec::new();
        self.containers.retain(|c| {
            let keep = !ids.contains(&c.id());
            if !keep {
                removed.push(c.id());
            }
            keep
        });
        removed
    }

    /// Recompute every container's neighbour-dependent and own attributes.
    pub(crate) fn recompute(&mut self, ctx: &FeedContext<'_>) {
        let len = self.containers.len();
        for i in 0..len {
            let (before, rest) = self.containers.split_at_mut(i);
            let (current, after) = rest.split_at_mut(1);
            let current = &mut current[0];
            let prev = before.last().map(|c| Arc::clone(&c.msg));
            let msg = Arc::clone(&current.msg);

            let starts_run = match &prev {
                Some(prev) => prev.sender_id != msg.sender_id || msg.is_me_message,
                None => true,
            };
            current.set_starts_sender_run(starts_run);

            match &prev {
                Some(prev) if !ctx.days.is_same_day(prev.timestamp, msg.timestamp) => {
                    current.want_date_divider = true;
                    current.date_divider_html =
                        Some(ctx.days.format_divider(prev.timestamp, msg.timestamp));
                }
                _ => {
                    current.want_date_divider = false;
                    current.date_divider_html = None;
                }
            }

            current.next_is_same_sender = after
                .first()
                .is_some_and(|next| next.msg.sender_id == msg.sender_id);

            current.refresh(ctx);
        }
    }

    /// Set the bookend and day divider against the message right above the
    /// group. Returns true when the divider text changed.
    pub(crate) fn decorate(&mut self, prev: Option<&Message>, days: &dyn DayBoundary) -> bool {
        let first = Arc::clone(&self.first().msg);
        self.bookend_top = prev.is_some_and(|p| p.historical != first.historical);

        let divider = prev
            .filter(|p| !days.is_same_day(p.timestamp, first.timestamp))
            .map(|p| days.format_divider(p.timestamp, first.timestamp));
        let changed = divider != self.group_date_divider_html;
        self.group_date_divider_html = divider;
        changed
    }
}

/// Whether the messages of `later` may be spliced onto the end of `earlier`.
pub(crate) fn continues_group(
    earlier: &MessageGroup,
    later: &MessageGroup,
    days: &dyn DayBoundary,
) -> bool {
    let prev = &earlier.last().msg;
    let next = &later.first().msg;
    continues_run(earlier.key(), prev, later.key(), next, days)
}

/// Recipient and day must match. A change in subscription state also keeps
/// two messages apart so the bookend between them stays visible.
fn continues_run(
    prev_key: &RecipientKey,
    prev: &Message,
    key: &RecipientKey,
    msg: &Message,
    days: &dyn DayBoundary,
) -> bool {
    prev.historical == msg.historical
        && group_compatible(prev_key, prev.timestamp, key, msg.timestamp, days)
}

/// Cluster an ordered batch into group fragments.
///
/// A new fragment starts whenever the recipient key, the calendar day or the
/// subscription state changes. Messages whose recipient cannot be normalized
/// are logged and left out; the rest of the batch is still grouped.
pub fn build_message_groups(
    messages: &[Arc<Message>],
    ids: &mut GroupIdAllocator,
    ctx: &FeedContext<'_>,
) -> Vec<MessageGroup> {
    let mut groups: Vec<MessageGroup> = Vec::new();

    for msg in messages {
        let key = match RecipientKey::for_message(msg) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(message_id = msg.id, error = %e, "excluding message from grouping");
                continue;
            }
        };

        let container = MessageContainer::new(Arc::clone(msg));
        let should_group = groups.last().is_some_and(|last| {
            let prev = &last.last().msg;
            continues_run(last.key(), prev, &key, msg, ctx.days)
        });

        match groups.last_mut() {
            Some(last) if should_group => last.push(container),
            _ => groups.push(MessageGroup::new(ids.next_id(), key, container)),
        }
    }

    for i in 0..groups.len() {
        let prev = i.checked_sub(1).map(|j| Arc::clone(&groups[j].last().msg));
        let group = &mut groups[i];
        group.recompute(ctx);
        group.decorate(prev.as_deref(), ctx.days);
    }

    groups
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn ids_of(groups: &[MessageGroup]) -> Vec<Vec<MessageId>> {
        groups.iter().map(|g| g.message_ids().collect()).collect()
    }

    #[test]
    fn test_build_groups_splits_on_topic_and_day() {
        let tc = TestContext::new();
        let mut alloc = GroupIdAllocator::default();
        let msgs = vec![
            stream_msg(1, 10, BASE, "a"),
            stream_msg(2, 11, BASE + 1, "A"),
            stream_msg(3, 11, BASE + 2, "b"),
            stream_msg(4, 11, BASE + DAY, "b"),
        ];

        let groups = build_message_groups(&msgs, &mut alloc, &tc.ctx());
        assert_eq!(ids_of(&groups), vec![vec![1, 2], vec![3], vec![4]]);

        assert_eq!(groups[0].group_date_divider_html, None);
        assert_eq!(groups[1].group_date_divider_html, None);
        assert_eq!(groups[2].group_date_divider_html.as_deref(), Some("Jul 15"));

        let unique: HashSet<GroupId> = groups.iter().map(|g| g.group_id).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_build_groups_skips_unnormalizable_recipient() {
        let tc = TestContext::new();
        let mut alloc = GroupIdAllocator::default();
        let msgs = vec![
            stream_msg(1, 10, BASE, "a"),
            Arc::new(Message::private(2, 10, BASE + 1, &[])),
            stream_msg(3, 10, BASE + 2, "a"),
        ];

        let groups = build_message_groups(&msgs, &mut alloc, &tc.ctx());
        assert_eq!(ids_of(&groups), vec![vec![1, 3]]);
    }

    #[test]
    fn test_sender_runs_and_next_same_sender() {
        let tc = TestContext::new();
        let mut alloc = GroupIdAllocator::default();
        let msgs = vec![
            stream_msg(1, 10, BASE, "a"),
            stream_msg(2, 10, BASE + 1, "a"),
            stream_msg(3, 11, BASE + 2, "a"),
            Arc::new(
                Message::stream(4, 11, BASE + 3, "Test stream 1", 1, "a")
                    .with_me_message(true)
                    .with_content("<p>/me waves</p>"),
            ),
        ];

        let groups = build_message_groups(&msgs, &mut alloc, &tc.ctx());
        let c = groups[0].containers();
        let include: Vec<bool> = c.iter().map(|c| c.include_sender).collect();
        assert_eq!(include, vec![true, false, true, true]);
        let next_same: Vec<bool> = c.iter().map(|c| c.next_is_same_sender).collect();
        assert_eq!(next_same, vec![true, false, true, false]);
        assert_eq!(c[3].status_message.as_deref(), Some("waves"));
        assert_eq!(c[0].status_message, None);
    }

    #[test]
    fn test_historical_change_sets_bookend() {
        let tc = TestContext::new();
        let mut alloc = GroupIdAllocator::default();
        let unsubscribed = Message::stream(2, 10, BASE + 1, "Test stream 1", 1, "b");
        let msgs = vec![
            stream_msg(1, 10, BASE, "a"),
            Arc::new(unsubscribed.with_historical(true)),
        ];
        let groups = build_message_groups(&msgs, &mut alloc, &tc.ctx());
        assert!(!groups[0].bookend_top);
        assert!(groups[1].bookend_top);
    }

    #[test]
    fn test_recompute_marks_day_change_inside_group() {
        let tc = TestContext::new();
        let first = stream_msg(1, 10, BASE, "a");
        let key = RecipientKey::for_message(&first).unwrap();
        let mut group = MessageGroup::new(GroupId(1), key, MessageContainer::new(first));
        let next_day = stream_msg(2, 10, BASE + DAY, "a");
        group.extend_tail(vec![MessageContainer::new(next_day)]);
        group.recompute(&tc.ctx());

        assert!(!group.first().want_date_divider);
        assert!(group.last().want_date_divider);
        assert_eq!(group.last().date_divider_html.as_deref(), Some("Jul 15"));
        // A day break does not restart the sender run
        assert!(!group.last().include_sender);
    }

    #[test]
    fn test_refresh_sets_edit_flags() {
        let tc = TestContext::new();
        let mut alloc = GroupIdAllocator::default();
        let edited = Message::stream(1, 10, BASE, "Test stream 1", 1, "a").with_edit_history(vec![
            crate::message::EditEntry {
                prev_content: Some("old".into()),
                timestamp: BASE + 5,
                ..Default::default()
            },
        ]);
        let edited_follow = Message {
            id: 2,
            ..edited.clone()
        };
        let msgs = vec![Arc::new(edited), Arc::new(edited_follow)];

        let groups = build_message_groups(&msgs, &mut alloc, &tc.ctx());
        let c = groups[0].containers();
        assert_eq!(c[0].moved, Some(false));
        assert!(c[0].edited_alongside_sender);
        assert!(!c[0].edited_in_left_col);
        assert!(c[1].edited_in_left_col);
        assert!(!c[1].edited_alongside_sender);
        assert!(!c[1].edited_status_msg);
    }

    #[test]
    fn test_decorate_reports_divider_change() {
        let tc = TestContext::new();
        let first = stream_msg(2, 10, BASE + DAY, "a");
        let key = RecipientKey::for_message(&first).unwrap();
        let mut group = MessageGroup::new(GroupId(1), key, MessageContainer::new(first));

        assert!(!group.decorate(None, &tc.days));
        let earlier = stream_msg(1, 10, BASE, "b");
        assert!(group.decorate(Some(&earlier), &tc.days));
        assert!(!group.decorate(Some(&earlier), &tc.days));
        let same_day = stream_msg(3, 10, BASE + DAY - 1, "b");
        // BASE + DAY - 1 is still July 15th
        assert!(group.decorate(Some(&same_day), &tc.days));
        assert_eq!(group.group_date_divider_html, None);
    }
}
