//! Sliding render window over the flattened message index space.
//!
//! Only the messages inside the window are materialized. The window moves
//! when the selection gets within `margin` of an edge that is not flush with
//! the end of the sequence, and a move recentres it on the selection. After a
//! recentre the selection sits `half_window` from the start, which is farther
//! than `margin` from both edges, so the same index cannot retrigger a move.

use crate::config::FeedSettings;

/// Half-open range `[start, end)` of materialized message indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderWindow {
    pub start: usize,
    pub end: usize,
}

impl RenderWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

#[derive(Clone, Debug)]
pub struct WindowManager {
    settings: FeedSettings,
    window: RenderWindow,
}

impl WindowManager {
    pub fn new(settings: FeedSettings) -> Self {
        Self {
            settings,
            window: RenderWindow::default(),
        }
    }

    pub fn window(&self) -> RenderWindow {
        self.window
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Free slots before the window reaches its maximum size.
    pub fn room(&self) -> usize {
        self.settings.window_size.saturating_sub(self.window.len())
    }

    /// Decide whether `selected_index` requires recentring the window.
    ///
    /// Returns `true` when the window moved; the caller must then dispose of
    /// everything outside the new window and materialize everything inside.
    pub fn maybe_rerender(&mut self, selected_index: usize, count: usize) -> bool {
        let FeedSettings {
            window_size,
            margin,
            ..
        } = self.settings;

        if count <= window_size {
            self.window = RenderWindow::new(0, count);
            return false;
        }

        let RenderWindow { start, end } = self.window;
        let near_start = selected_index < start + margin && start > 0;
        let near_end = selected_index + margin >= end && end < count;
        if !(near_start || near_end) {
            return false;
        }

        self.recentre(selected_index, count);
        tracing::debug!(
            old_start = start,
            old_end = end,
            new_start = self.window.start,
            new_end = self.window.end,
            selected_index,
            count,
            "render window moved"
        );
        true
    }

    /// Place the window so `selected_index` sits `half_window` from its start.
    pub(crate) fn recentre(&mut self, selected_index: usize, count: usize) {
        let start = selected_index
            .saturating_sub(self.settings.half_window)
            .min(count);
        let end = count.min(start + self.settings.window_size);
        self.window = RenderWindow::new(start, end);
    }

    /// Extend the window over `n` newly rendered messages at its tail.
    pub(crate) fn grow_tail(&mut self, n: usize) {
        self.window.end += n;
    }

    /// Extend the window over `n` newly rendered messages at its head.
    pub(crate) fn grow_head(&mut self, n: usize) {
        self.window.start = self.window.start.saturating_sub(n);
    }

    /// Account for `n` messages inserted ahead of the window.
    pub(crate) fn shift(&mut self, n: usize) {
        self.window.start += n;
        self.window.end += n;
    }

    pub(crate) fn set(&mut self, window: RenderWindow) {
        self.window = window;
    }

    /// Pull the window back inside a sequence that shrank to `count`.
    pub(crate) fn clamp(&mut self, count: usize) {
        let end = self.window.end.min(count);
        let start = self.window.start.min(end);
        self.window = RenderWindow::new(start, end);
    }
}
