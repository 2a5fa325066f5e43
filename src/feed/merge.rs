//! Incremental merging of new group fragments into the ordered group list.
//!
//! New messages arrive either at the tail (live traffic) or at the head
//! (backfill). When the fragment nearest the existing list is compatible with
//! the group it touches, the two are spliced together; everything else is
//! added as whole groups. The returned `MergeDiff` tells the renderer the
//! smallest visible change that reflects the merge.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::group::{continues_group, FeedContext, GroupId, MessageContainer, MessageGroup};
use crate::dates::DayBoundary;
use crate::message::{Message, MessageId};

/// Which end of the list a batch belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

/// Disjoint buckets describing how a merge changed the list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeDiff {
    /// New groups at the tail, in order
    pub append_groups: Vec<GroupId>,
    /// New groups at the head, in order
    pub prepend_groups: Vec<GroupId>,
    /// Existing groups whose structure changed and must be redrawn whole
    pub rerender_groups: Vec<GroupId>,
    /// Messages spliced onto the end of the tail group
    pub append_messages: Vec<MessageId>,
    /// Rows whose "same sender as next" styling may have changed
    pub rerender_messages_next_same_sender: Vec<MessageId>,
}

impl MergeDiff {
    pub fn is_empty(&self) -> bool {
        self.append_groups.is_empty()
            && self.prepend_groups.is_empty()
            && self.rerender_groups.is_empty()
            && self.append_messages.is_empty()
            && self.rerender_messages_next_same_sender.is_empty()
    }
}

/// Result of dropping messages from the list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    /// Groups that lost every message and were dropped
    pub removed_groups: Vec<GroupId>,
    /// Rows removed from groups that still exist
    pub removed_rows: Vec<MessageId>,
    /// Surviving groups that lost at least one row
    pub touched_groups: Vec<GroupId>,
}

/// The ordered group sequence backing the feed.
#[derive(Clone, Debug, Default)]
pub struct GroupList {
    groups: VecDeque<MessageGroup>,
}

impl GroupList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessageGroup> {
        self.groups.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut MessageGroup> {
        self.groups.iter_mut()
    }

    pub fn first(&self) -> Option<&MessageGroup> {
        self.groups.front()
    }

    pub fn last(&self) -> Option<&MessageGroup> {
        self.groups.back()
    }

    pub fn get(&self, id: GroupId) -> Option<&MessageGroup> {
        self.groups.iter().find(|g| g.group_id == id)
    }

    pub(crate) fn get_mut(&mut self, id: GroupId) -> Option<&mut MessageGroup> {
        self.groups.iter_mut().find(|g| g.group_id == id)
    }

    /// Group holding the given message.
    pub fn group_of(&self, message_id: MessageId) -> Option<&MessageGroup> {
        self.groups
            .iter()
            .find(|g| g.container(message_id).is_some())
    }

    pub fn container(&self, message_id: MessageId) -> Option<&MessageContainer> {
        self.groups.iter().find_map(|g| g.container(message_id))
    }

    /// Number of messages across all groups.
    pub fn message_count(&self) -> usize {
        self.groups.iter().map(MessageGroup::len).sum()
    }

    /// Empty the list, returning the ids of the groups that were dropped.
    pub(crate) fn clear(&mut self) -> Vec<GroupId> {
        self.groups.drain(..).map(|g| g.group_id).collect()
    }

    pub fn merge(
        &mut self,
        new_groups: Vec<MessageGroup>,
        edge: Edge,
        ctx: &FeedContext<'_>,
    ) -> MergeDiff {
        let mut diff = MergeDiff::default();
        if new_groups.is_empty() {
            return diff;
        }

        match edge {
            Edge::Bottom => self.merge_bottom(new_groups, ctx, &mut diff),
            Edge::Top => self.merge_top(new_groups, ctx, &mut diff),
        }

        tracing::debug!(
            ?edge,
            append_groups = diff.append_groups.len(),
            prepend_groups = diff.prepend_groups.len(),
            rerender_groups = diff.rerender_groups.len(),
            append_messages = diff.append_messages.len(),
            "merged message groups"
        );
        diff
    }

    fn merge_bottom(
        &mut self,
        mut new_groups: Vec<MessageGroup>,
        ctx: &FeedContext<'_>,
        diff: &mut MergeDiff,
    ) {
        let joins = match (self.groups.back(), new_groups.first()) {
            (Some(tail), Some(first)) => continues_group(tail, first, ctx.days),
            _ => false,
        };
        if let (true, Some(tail)) = (joins, self.groups.back_mut()) {
            let first = new_groups.remove(0);
            let last_id = tail.last().id();
            diff.rerender_messages_next_same_sender.push(last_id);
            diff.append_messages.extend(first.message_ids());
            tail.extend_tail(first.into_containers());
            tail.recompute(ctx);
        }

        for mut group in new_groups {
            let prev = self.groups.back().map(|g| g.last().msg.as_ref());
            group.decorate(prev, ctx.days);
            diff.append_groups.push(group.group_id);
            self.groups.push_back(group);
        }
    }

    fn merge_top(
        &mut self,
        mut new_groups: Vec<MessageGroup>,
        ctx: &FeedContext<'_>,
        diff: &mut MergeDiff,
    ) {
        let joins = match (new_groups.last(), self.groups.front()) {
            (Some(last), Some(head)) => continues_group(last, head, ctx.days),
            _ => false,
        };
        let mut joined_head = false;
        if joins {
            if let (Some(head), Some(last)) = (self.groups.front_mut(), new_groups.pop()) {
                head.extend_head(last.into_containers());
                head.recompute(ctx);
                diff.rerender_groups.push(head.group_id);
                joined_head = true;
            }
        }

        let mut prev: Option<Arc<Message>> = None;
        for group in new_groups.iter_mut() {
            group.decorate(prev.as_deref(), ctx.days);
            prev = Some(Arc::clone(&group.last().msg));
        }

        if let Some(head) = self.groups.front_mut() {
            let prev = new_groups.last().map(|g| g.last().msg.as_ref());
            let divider_changed = head.decorate(prev, ctx.days);
            if divider_changed && !joined_head {
                diff.rerender_groups.push(head.group_id);
            }
        }

        diff.prepend_groups = new_groups.iter().map(|g| g.group_id).collect();
        for group in new_groups.into_iter().rev() {
            self.groups.push_front(group);
        }
    }

    /// Redo every group's bookend and divider. Returns groups whose divider changed.
    pub(crate) fn redecorate(&mut self, days: &dyn DayBoundary) -> Vec<GroupId> {
        let mut changed = Vec::new();
        let mut prev: Option<Arc<Message>> = None;
        for group in self.groups.iter_mut() {
            if group.decorate(prev.as_deref(), days) {
                changed.push(group.group_id);
            }
            prev = Some(Arc::clone(&group.last().msg));
        }
        changed
    }

    /// Join neighbouring groups that became compatible, e.g. after the group
    /// between them was removed. Returns the ids of the absorbed groups and of
    /// the groups that grew.
    pub(crate) fn coalesce(&mut self, ctx: &FeedContext<'_>) -> (Vec<GroupId>, Vec<GroupId>) {
        let mut absorbed = Vec::new();
        let mut grown = Vec::new();
        let mut i = 1;
        while i < self.groups.len() {
            if !continues_group(&self.groups[i - 1], &self.groups[i], ctx.days) {
                i += 1;
                continue;
            }
            let Some(later) = self.groups.remove(i) else {
                break;
            };
            absorbed.push(later.group_id);
            let earlier = &mut self.groups[i - 1];
            earlier.extend_tail(later.into_containers());
            earlier.recompute(ctx);
            if !grown.contains(&earlier.group_id) {
                grown.push(earlier.group_id);
            }
        }
        (absorbed, grown)
    }

    pub(crate) fn remove_messages(&mut self, ids: &HashSet<MessageId>) -> Removal {
        let mut removal = Removal::default();
        for group in self.groups.iter_mut() {
            let removed = group.remove_messages(ids);
            if removed.is_empty() {
                continue;
            }
            if group.is_empty() {
                removal.removed_groups.push(group.group_id);
            } else {
                removal.touched_groups.push(group.group_id);
                removal.removed_rows.extend(removed);
            }
        }
        self.groups.retain(|g| !g.is_empty());
        removal
    }
}
