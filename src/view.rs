//! The message list view: owns the group list and the render window and
//! drives the renderer as the feed changes.
//!
//! All collaborators are handed over at construction. Every entry point is
//! synchronous and expects to be called from a single owner, one at a time,
//! in delivery order.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::FeedSettings;
use crate::dates::DayBoundary;
use crate::error::Result;
use crate::feed::group::{
    build_message_groups, FeedContext, GroupId, GroupIdAllocator, MessageContainer, MessageGroup,
};
use crate::feed::merge::{Edge, GroupList, MergeDiff};
use crate::feed::recipient::RecipientKey;
use crate::feed::window::{RenderWindow, WindowManager};
use crate::message::{Message, MessageId};
use crate::render::{Placement, Renderer, RowTarget};
use crate::store::{MessageStore, MuteRegistry, SelectionCursor};

pub struct MessageListView<S, M, D, R> {
    store: S,
    mutes: M,
    days: D,
    renderer: R,
    window: WindowManager,
    groups: GroupList,
    group_ids: GroupIdAllocator,
    /// Messages from muted senders the user chose to show
    revealed: HashSet<MessageId>,
    /// Last selection seen, reused when new batches arrive
    selected_index: usize,
}

impl<S, M, D, R> MessageListView<S, M, D, R>
where
    S: MessageStore,
    M: MuteRegistry,
    D: DayBoundary,
    R: Renderer,
{
    pub fn new(store: S, mutes: M, days: D, renderer: R, settings: FeedSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            store,
            mutes,
            days,
            renderer,
            window: WindowManager::new(settings),
            groups: GroupList::new(),
            group_ids: GroupIdAllocator::default(),
            revealed: HashSet::new(),
            selected_index: 0,
        })
    }

    pub fn window(&self) -> RenderWindow {
        self.window.window()
    }

    pub fn settings(&self) -> &FeedSettings {
        self.window.settings()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn groups(&self) -> &GroupList {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&MessageGroup> {
        self.groups.get(id)
    }

    pub fn container(&self, id: MessageId) -> Option<&MessageContainer> {
        self.groups.container(id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn mutes(&self) -> &M {
        &self.mutes
    }

    /// Changes made here take effect on the next `update_muting`.
    pub fn mutes_mut(&mut self) -> &mut M {
        &mut self.mutes
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn is_revealed(&self, id: MessageId) -> bool {
        self.revealed.contains(&id)
    }

    /// Recentre the window on `selected_index` if it got too close to an edge.
    ///
    /// Returns true when the window moved and the visible rows were rebuilt.
    /// A small feed whose window was snapped back to `[0, count)` is rebuilt
    /// as well but still reports false.
    pub fn maybe_rerender(&mut self, selected_index: usize) -> bool {
        self.selected_index = selected_index;
        let count = self.store.count();
        let before = self.window.window();
        let moved = self.window.maybe_rerender(selected_index, count);
        if moved || self.window.window() != before {
            self.render_window();
        }
        moved
    }

    pub fn sync_selection(&mut self, cursor: &impl SelectionCursor) -> bool {
        self.maybe_rerender(cursor.selected_index())
    }

    /// Incorporate a batch of newer messages already added to the store's tail.
    ///
    /// Returns true if the window had to move afterwards.
    pub fn append(&mut self, batch: &[Arc<Message>]) -> bool {
        if batch.is_empty() {
            return false;
        }
        let count = self.store.count();
        let old_count = count.saturating_sub(batch.len());

        // Only extend the rendered rows when they reach the old tail
        if self.window.window().end == old_count {
            let take = self.window.room().min(batch.len());
            if take > 0 {
                let diff = self.merge_batch(&batch[..take], Edge::Bottom);
                self.window.grow_tail(take);
                self.apply_diff(&diff);
            }
        }

        self.maybe_rerender(self.selected_index)
    }

    /// Incorporate a batch of older messages already added to the store's head.
    ///
    /// Returns true if the window had to move afterwards.
    pub fn prepend(&mut self, batch: &[Arc<Message>]) -> bool {
        if batch.is_empty() {
            return false;
        }
        let n = batch.len();
        let had_messages = self.store.count() > n;
        let head_rendered = self.window.window().start == 0;

        self.window.shift(n);
        if had_messages {
            self.selected_index += n;
        }

        if head_rendered {
            let take = self.window.room().min(n);
            if take > 0 {
                let diff = self.merge_batch(&batch[n - take..], Edge::Top);
                self.window.grow_head(take);
                self.apply_diff(&diff);
            }
        }

        self.maybe_rerender(self.selected_index)
    }

    /// Dispose every rendered group and rebuild the window from the store.
    pub fn rerender_window(&mut self) {
        let count = self.store.count();
        if count <= self.window.settings().window_size {
            self.window.set(RenderWindow::new(0, count));
        } else {
            self.window.clamp(count);
            if self.window.window().is_empty() {
                let selected = self.selected_index.min(count - 1);
                self.window.recentre(selected, count);
            }
        }
        self.render_window();
    }

    /// Re-apply mute state to every rendered message.
    pub fn update_muting(&mut self) {
        let ctx = FeedContext {
            days: &self.days,
            mutes: &self.mutes,
            revealed: &self.revealed,
        };
        let mut changed = Vec::new();
        for group in self.groups.iter_mut() {
            let before = group.containers().to_vec();
            group.recompute(&ctx);
            if group.containers() != before.as_slice() {
                changed.push(group.group_id);
            }
        }
        self.rerender_groups(&changed);
    }

    /// Show a hidden message from a muted sender.
    pub fn reveal_message(&mut self, id: MessageId) {
        if self.store.get(id).is_none() {
            return;
        }
        if self.revealed.insert(id) {
            self.refresh_groups_of(&[id]);
        }
    }

    pub fn hide_revealed_message(&mut self, id: MessageId) {
        if self.revealed.remove(&id) {
            self.refresh_groups_of(&[id]);
        }
    }

    /// Pick up edits for the given messages from the store.
    ///
    /// Messages the store no longer has, or that are not rendered, are
    /// skipped. A message that changed recipient rebuilds the window.
    pub fn rerender_messages(&mut self, ids: &[MessageId]) {
        let mut needs_rebuild = false;
        let mut touched = Vec::new();

        for &id in ids {
            let Some(fresh) = self.store.get(id) else {
                continue;
            };
            let Some(group) = self.groups.group_of(id) else {
                continue;
            };
            let same_recipient = match RecipientKey::for_message(&fresh) {
                Ok(key) => &key == group.key(),
                Err(e) => {
                    tracing::error!(
                        message_id = id,
                        error = %e,
                        "edited message no longer groupable"
                    );
                    false
                }
            };
            if !same_recipient {
                needs_rebuild = true;
                continue;
            }

            let gid = group.group_id;
            let group = self.groups.get_mut(gid);
            if let Some(container) = group.and_then(|g| g.container_mut(id)) {
                container.set_message(fresh);
            }
            if !touched.contains(&id) {
                touched.push(id);
            }
        }

        if needs_rebuild {
            self.rerender_window();
        } else {
            self.refresh_groups_of(&touched);
        }
    }

    /// Swap a locally echoed row for the server's acknowledged copy.
    pub fn replace_local_echo(&mut self, local_id: MessageId, server_id: MessageId) {
        let Some(fresh) = self.store.get(server_id) else {
            return;
        };
        let Some(gid) = self.groups.group_of(local_id).map(|g| g.group_id) else {
            return;
        };
        let Some(container) = self
            .groups
            .get_mut(gid)
            .and_then(|g| g.container_mut(local_id))
        else {
            return;
        };
        if !container.msg.locally_echoed {
            tracing::warn!(
                message_id = local_id,
                "refusing to replace a message that was not locally echoed"
            );
            return;
        }
        container.set_message(fresh);
        if self.revealed.remove(&local_id) {
            self.revealed.insert(server_id);
        }
        self.refresh_groups_of(&[server_id]);
    }

    /// Drop rows for messages the store has deleted.
    pub fn remove_messages(&mut self, ids: &[MessageId]) {
        let ids: HashSet<MessageId> = ids.iter().copied().collect();
        for id in &ids {
            self.revealed.remove(id);
        }

        let old_window = self.window.window();
        let removal = self.groups.remove_messages(&ids);

        for gid in &removal.removed_groups {
            self.renderer.dispose(RowTarget::Group(*gid));
        }
        for mid in &removal.removed_rows {
            self.renderer.dispose(RowTarget::Message(*mid));
        }

        if self.groups.is_empty() {
            self.rerender_window();
            return;
        }

        let ctx = FeedContext {
            days: &self.days,
            mutes: &self.mutes,
            revealed: &self.revealed,
        };
        for gid in &removal.touched_groups {
            if let Some(group) = self.groups.get_mut(*gid) {
                group.recompute(&ctx);
            }
        }
        let (absorbed, grown) = self.groups.coalesce(&ctx);
        for gid in &absorbed {
            self.renderer.dispose(RowTarget::Group(*gid));
        }

        let redecorated = self.groups.redecorate(&self.days);
        let mut to_rerender: Vec<GroupId> = Vec::new();
        let touched = removal.touched_groups.into_iter().chain(grown);
        for gid in touched.chain(redecorated) {
            if !absorbed.contains(&gid) && !to_rerender.contains(&gid) {
                to_rerender.push(gid);
            }
        }
        self.rerender_groups(&to_rerender);

        // Re-anchor the window on the first and last rows still rendered
        let count = self.store.count();
        let first = self.groups.first().map(|g| g.first().id());
        let last = self.groups.last().map(|g| g.last().id());
        let start = first
            .and_then(|id| self.store.index_of(id))
            .unwrap_or(old_window.start)
            .min(count);
        let end = last
            .and_then(|id| self.store.index_of(id))
            .map_or(old_window.end, |index| index + 1)
            .clamp(start, count);
        self.window.set(RenderWindow::new(start, end));
    }

    /// Forget every rendered row and reset the window.
    pub fn clear(&mut self) {
        for gid in self.groups.clear() {
            self.renderer.dispose(RowTarget::Group(gid));
        }
        self.window.set(RenderWindow::default());
        self.revealed.clear();
        self.selected_index = 0;
    }

    fn merge_batch(&mut self, batch: &[Arc<Message>], edge: Edge) -> MergeDiff {
        let ctx = FeedContext {
            days: &self.days,
            mutes: &self.mutes,
            revealed: &self.revealed,
        };
        let fragments = build_message_groups(batch, &mut self.group_ids, &ctx);
        self.groups.merge(fragments, edge, &ctx)
    }

    fn render_window(&mut self) {
        for gid in self.groups.clear() {
            self.renderer.dispose(RowTarget::Group(gid));
        }
        let RenderWindow { start, end } = self.window.window();
        let messages: Vec<Arc<Message>> = (start..end)
            .filter_map(|i| self.store.message_at(i))
            .collect();
        let diff = self.merge_batch(&messages, Edge::Bottom);
        self.apply_diff(&diff);
    }

    fn apply_diff(&mut self, diff: &MergeDiff) {
        for gid in diff.prepend_groups.iter().rev() {
            if let Some(group) = self.groups.get(*gid) {
                self.renderer.materialize(group, Placement::Top);
            }
        }
        for gid in &diff.rerender_groups {
            if let Some(group) = self.groups.get(*gid) {
                self.renderer.rerender(group);
            }
        }
        for id in &diff.append_messages {
            if let Some(group) = self.groups.group_of(*id) {
                if let Some(container) = group.container(*id) {
                    self.renderer.append(group, container);
                }
            }
        }
        for id in &diff.rerender_messages_next_same_sender {
            if let Some(group) = self.groups.group_of(*id) {
                if let Some(container) = group.container(*id) {
                    self.renderer.refresh_row(group, container);
                }
            }
        }
        for gid in &diff.append_groups {
            if let Some(group) = self.groups.get(*gid) {
                self.renderer.materialize(group, Placement::Bottom);
            }
        }
    }

    /// Recompute and redraw the groups holding the given messages.
    fn refresh_groups_of(&mut self, ids: &[MessageId]) {
        let mut gids = Vec::new();
        for id in ids {
            if let Some(group) = self.groups.group_of(*id) {
                if !gids.contains(&group.group_id) {
                    gids.push(group.group_id);
                }
            }
        }

        let ctx = FeedContext {
            days: &self.days,
            mutes: &self.mutes,
            revealed: &self.revealed,
        };
        for gid in &gids {
            if let Some(group) = self.groups.get_mut(*gid) {
                group.recompute(&ctx);
            }
        }
        self.rerender_groups(&gids);
    }

    fn rerender_groups(&mut self, gids: &[GroupId]) {
        for gid in gids {
            if let Some(group) = self.groups.get(*gid) {
                self.renderer.rerender(group);
            }
        }
    }
}
