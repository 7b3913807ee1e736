//! Unified error handling for roomlog.
//!
//! Backend faults are reported as [`BackendError`]. The public operations wrap
//! them in [`RoomLogError`], which distinguishes set-up failures from failures
//! on a live handle.

use thiserror::Error;

// ============================================================================
// Backend Errors (store round trips)
// ============================================================================

/// Errors raised by an ordered store implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redb error: {0}")]
    Redb(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection behind the handle has been severed.
    #[error("connection closed")]
    Closed,

    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

impl BackendError {
    pub(crate) fn redb(err: impl std::fmt::Display) -> Self {
        Self::Redb(err.to_string())
    }
}

// ============================================================================
// RoomLog Errors (public operations)
// ============================================================================

/// Errors returned by [`RoomLog`](crate::RoomLog) operations.
#[derive(Debug, Error)]
pub enum RoomLogError {
    /// The store could not be reached, authenticated or pinged at open time.
    #[error("failed to connect to store: {0}")]
    Connection(#[source] BackendError),

    /// The message could not be encoded. Indicates a caller bug.
    #[error("failed to serialize message: {0}")]
    Serialization(#[from] crate::message::EncodeError),

    /// A live call to the store failed. May be transient; never retried here.
    #[error("store error: {0}")]
    Store(#[from] BackendError),

    /// A stored entry does not decode as a message.
    #[error("failed to decode entry {index} of room {room}: {source}")]
    Deserialization {
        room: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("room id must not be empty")]
    EmptyRoom,
}

impl RoomLogError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection_error",
            Self::Serialization(_) => "serialization_error",
            Self::Store(_) => "store_error",
            Self::Deserialization { .. } => "deserialization_error",
            Self::EmptyRoom => "empty_room",
        }
    }
}

pub type Result<T, E = RoomLogError> = std::result::Result<T, E>;
