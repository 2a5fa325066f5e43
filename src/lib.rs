//! Chatfeed library.
//!
//! A synchronous, single-owner engine that decides which slice of a chat
//! message feed is materialized, clusters messages into recipient/day groups,
//! and derives per-message display attributes from mute and edit state.

pub mod config;
pub mod dates;
pub mod error;
pub mod feed;
pub mod message;
pub mod render;
pub mod store;
pub mod view;


pub use config::FeedSettings;
pub use error::{FeedError, Result};
pub use message::{EditEntry, Message, MessageId, Recipient, StreamId, UserId};
pub use view::MessageListView;
