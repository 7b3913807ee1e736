//! Chat message value type and its persisted encoding.
//!
//! Each log entry is one JSON object with the fields `sender`, `message` and
//! `timestamp`. Entries written under these names stay in the store
//! indefinitely, so renaming a field needs a migration.

use serde::{Deserialize, Serialize};

/// A single chat message as stored in a room's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender identifier (non-empty).
    pub sender: String,
    /// Message body text.
    pub message: String,
    /// Ordering key. Used verbatim as the store score.
    pub timestamp: i64,
}

impl Message {
    pub fn new(sender: impl Into<String>, message: impl Into<String>, timestamp: i64) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
            timestamp,
        }
    }

    /// Create a message stamped with the current time in milliseconds.
    ///
    /// Millisecond epoch values stay well below 2^53, so they survive the
    /// conversion to a floating-point score without losing order.
    pub fn now(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(sender, message, chrono::Utc::now().timestamp_millis())
    }

    /// Score under which this message is filed.
    ///
    /// Timestamps with a magnitude above 2^53 are rounded by the conversion,
    /// so neighbouring values may share a score.
    #[inline]
    pub fn score(&self) -> f64 {
        self.timestamp as f64
    }

    /// Encode to the persisted JSON form.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        if self.sender.is_empty() {
            return Err(EncodeError::EmptySender);
        }
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a persisted entry.
    pub fn decode(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

/// Reasons a message cannot be encoded.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("sender must not be empty")]
    EmptySender,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
