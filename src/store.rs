//! Read-only collaborators the feed consults: the message store, the
//! selection cursor and the mute registry.
//!
//! The feed only ever reads through these traits. Hosts keep ownership of
//! the underlying data and swap in their own implementations (or test
//! doubles) at construction time.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::message::{Message, MessageId, UserId};

/// Ordered, append/prepend-growing sequence of messages.
pub trait MessageStore {
    fn count(&self) -> usize;
    fn message_at(&self, index: usize) -> Option<Arc<Message>>;
    fn get(&self, id: MessageId) -> Option<Arc<Message>>;
    fn index_of(&self, id: MessageId) -> Option<usize>;
}

/// Current position of the user's selection in the full sequence.
pub trait SelectionCursor {
    fn selected_index(&self) -> usize;
}

impl SelectionCursor for usize {
    fn selected_index(&self) -> usize {
        *self
    }
}

pub trait MuteRegistry {
    fn is_muted(&self, user_id: UserId) -> bool;
}

impl MuteRegistry for HashSet<UserId> {
    fn is_muted(&self, user_id: UserId) -> bool {
        self.contains(&user_id)
    }
}

/// In-memory message store backed by a deque, so backfill at the head
/// is as cheap as new arrivals at the tail.
#[derive(Default, Clone, Debug)]
pub struct VecMessageStore {
    messages: VecDeque<Arc<Message>>,
}

impl VecMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of newer messages. Returns the shared copies.
    pub fn push_tail(&mut self, batch: Vec<Message>) -> Vec<Arc<Message>> {
        let batch: Vec<Arc<Message>> = batch.into_iter().map(Arc::new).collect();
        self.messages.extend(batch.iter().cloned());
        batch
    }

    /// Prepend a batch of older messages, given oldest first.
    pub fn push_head(&mut self, batch: Vec<Message>) -> Vec<Arc<Message>> {
        let batch: Vec<Arc<Message>> = batch.into_iter().map(Arc::new).collect();
        for msg in batch.iter().rev() {
            self.messages.push_front(msg.clone());
        }
        batch
    }

    /// Remove messages by id. Unknown ids are ignored.
    pub fn remove(&mut self, ids: &[MessageId]) {
        self.messages.retain(|m| !ids.contains(&m.id));
    }

    /// Replace a stored message in place (edits, moves). Returns false if
    /// the message id is not present.
    pub fn replace(&mut self, id: MessageId, message: Message) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(slot) => {
                *slot = Arc::new(message);
                true
            }
            None => false,
        }
    }
}

impl MessageStore for VecMessageStore {
    fn count(&self) -> usize {
        self.messages.len()
    }

    fn message_at(&self, index: usize) -> Option<Arc<Message>> {
        self.messages.get(index).cloned()
    }

    fn get(&self, id: MessageId) -> Option<Arc<Message>> {
        self.messages.iter().find(|m| m.id == id).cloned()
    }

    fn index_of(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }
}
