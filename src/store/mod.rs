//! Ordered store abstraction.
//!
//! A store keeps named collections of byte payloads sorted by a floating-point
//! score and answers rank-range queries over them in either direction.

use crate::error::BackendError;
use async_trait::async_trait;
use serde::Deserialize;
use std::ops::Range;

pub mod memory;
pub mod redb;
pub mod redis;

pub use memory::MemoryStore;
pub use redb::RedbStore;
pub use redis::RedisStore;

/// How a store decides whether two added members are the same member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberIdentity {
    /// The payload bytes are the identity. Re-adding a payload moves it to the
    /// new score; ties on score are ordered lexicographically by payload.
    #[default]
    Payload,
    /// Every add creates a new entry. Ties on score keep insertion order.
    Entry,
}

impl MemberIdentity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payload => "payload",
            Self::Entry => "entry",
        }
    }
}

#[async_trait]
pub trait OrderedStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Member identity rule this store applies.
    fn member_identity(&self) -> MemberIdentity;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), BackendError>;

    /// Insert `payload` into collection `key` under `score`.
    async fn add_scored(&self, key: &str, score: f64, payload: &[u8])
    -> Result<(), BackendError>;

    /// Members ranked `start..=end` in ascending score order.
    async fn range_asc(&self, key: &str, start: i64, end: i64)
    -> Result<Vec<Vec<u8>>, BackendError>;

    /// Members ranked `start..=end` in descending score order.
    async fn range_desc(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Vec<u8>>, BackendError>;
}

/// Resolve inclusive rank bounds against a collection of `len` members.
///
/// Negative bounds count from the end. `start` clamps to zero and `end` to the
/// last member; an inverted or out-of-range window yields `None`.
pub(crate) fn resolve_ranks(len: usize, start: i64, end: i64) -> Option<Range<usize>> {
    let len = len as i64;
    let mut start = if start < 0 { start + len } else { start };
    let mut end = if end < 0 { end + len } else { end };
    if start < 0 {
        start = 0;
    }
    if end >= len {
        end = len - 1;
    }
    if start > end || start >= len {
        return None;
    }
    Some(start as usize..end as usize + 1)
}

/// Map a score to big-endian bytes whose lexicographic order matches
/// numeric order.
pub(crate) fn score_key(score: f64) -> [u8; 8] {
    // Fold -0.0 into 0.0 so both sort as the same score.
    let score = if score == 0.0 { 0.0 } else { score };
    let bits = score.to_bits();
    let ordered = if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    };
    ordered.to_be_bytes()
}
