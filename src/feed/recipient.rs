//! Normalized recipient identity used to decide which messages may share a group.

use std::collections::BTreeSet;

use crate::dates::DayBoundary;
use crate::error::{FeedError, Result};
use crate::message::{Message, Recipient, StreamId, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecipientKey {
    Stream {
        stream: String,
        stream_id: StreamId,
        /// Lowercased; topics compare case-insensitively
        topic: String,
    },
    Private {
        participants: BTreeSet<UserId>,
    },
}

impl RecipientKey {
    pub fn for_message(msg: &Message) -> Result<Self> {
        match &msg.recipient {
            Recipient::Stream {
                stream,
                stream_id,
                topic,
            } => {
                if stream.trim().is_empty() {
                    return Err(FeedError::EmptyStream { id: msg.id });
                }
                Ok(Self::Stream {
                    stream: stream.clone(),
                    stream_id: *stream_id,
                    topic: topic.to_lowercase(),
                })
            }
            Recipient::Private { participants } => {
                if participants.is_empty() {
                    return Err(FeedError::EmptyParticipants { id: msg.id });
                }
                Ok(Self::Private {
                    participants: participants.iter().copied().collect(),
                })
            }
        }
    }
}

/// Two messages may share a group when their recipient keys match and they
/// were sent on the same calendar day.
pub fn group_compatible(
    key_a: &RecipientKey,
    ts_a: i64,
    key_b: &RecipientKey,
    ts_b: i64,
    days: &dyn DayBoundary,
) -> bool {
    key_a == key_b && days.is_same_day(ts_a, ts_b)
}
