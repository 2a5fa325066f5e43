use serde::{Deserialize, Serialize};

pub type MessageId = u64;
pub type UserId = u64;
pub type StreamId = u64;

/// Where a message was sent: a stream topic or a private conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recipient {
    Stream {
        stream: String,
        stream_id: StreamId,
        topic: String,
    },
    Private {
        /// Every participant, including the sender.
        participants: Vec<UserId>,
    },
}

/// One entry of a message's edit history.
///
/// Fields that were not part of an edit are absent. A missing field means
/// that dimension did not change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditEntry {
    pub prev_stream: Option<StreamId>,
    pub prev_topic: Option<String>,
    pub topic: Option<String>,
    pub prev_content: Option<String>,
    pub timestamp: i64,
    pub user_id: Option<UserId>,
}

/// A chat message as held by the message store. The feed never mutates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub recipient: Recipient,
    pub content: String,
    #[serde(default)]
    pub edit_history: Vec<EditEntry>,
    #[serde(default)]
    pub last_edit_timestamp: Option<i64>,
    /// "/me" status message
    #[serde(default)]
    pub is_me_message: bool,
    #[serde(default)]
    pub mentioned: bool,
    /// Sent while the viewer was not subscribed
    #[serde(default)]
    pub historical: bool,
    /// Echoed locally before the server acknowledged it
    #[serde(default)]
    pub locally_echoed: bool,
}

impl Message {
    pub fn stream(
        id: MessageId,
        sender_id: UserId,
        timestamp: i64,
        stream: &str,
        stream_id: StreamId,
        topic: &str,
    ) -> Self {
        Self::new(
            id,
            sender_id,
            timestamp,
            Recipient::Stream {
                stream: stream.to_string(),
                stream_id,
                topic: topic.to_string(),
            },
        )
    }

    pub fn private(
        id: MessageId,
        sender_id: UserId,
        timestamp: i64,
        participants: &[UserId],
    ) -> Self {
        Self::new(
            id,
            sender_id,
            timestamp,
            Recipient::Private {
                participants: participants.to_vec(),
            },
        )
    }

    fn new(id: MessageId, sender_id: UserId, timestamp: i64, recipient: Recipient) -> Self {
        Self {
            id,
            sender_id,
            timestamp,
            recipient,
            content: String::new(),
            edit_history: Vec::new(),
            last_edit_timestamp: None,
            is_me_message: false,
            mentioned: false,
            historical: false,
            locally_echoed: false,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Attach an edit history. The last entry's timestamp becomes the
    /// last-edit timestamp.
    pub fn with_edit_history(mut self, history: Vec<EditEntry>) -> Self {
        self.last_edit_timestamp = history.last().map(|e| e.timestamp);
        self.edit_history = history;
        self
    }

    pub fn with_me_message(mut self, is_me_message: bool) -> Self {
        self.is_me_message = is_me_message;
        self
    }

    pub fn with_mentioned(mut self, mentioned: bool) -> Self {
        self.mentioned = mentioned;
        self
    }

    pub fn with_historical(mut self, historical: bool) -> Self {
        self.historical = historical;
        self
    }

    pub fn with_locally_echoed(mut self, locally_echoed: bool) -> Self {
        self.locally_echoed = locally_echoed;
        self
    }
}
