use thiserror::Error;

use crate::message::MessageId;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Private message {id} has no participants")]
    EmptyParticipants { id: MessageId },

    #[error("Stream message {id} has an empty stream name")]
    EmptyStream { id: MessageId },

    #[error("Invalid feed settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
