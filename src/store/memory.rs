//! In-process ordered store.
//!
//! Keeps every collection in a [`DashMap`] of ordered trees keyed by
//! `(score, tie)`, mirroring the redb layout. Used as a test double and for
//! single-process deployments that do not need durability. A store can be
//! severed with [`MemoryStore::disconnect`] to behave like a dropped network
//! connection.

use super::{MemberIdentity, OrderedStore, resolve_ranks, score_key};
use crate::error::BackendError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Sort key: encoded score, then the payload (payload identity) or a
/// big-endian sequence number (entry identity).
type RankKey = ([u8; 8], Vec<u8>);

#[derive(Default)]
struct Room {
    members: BTreeMap<RankKey, Vec<u8>>,
    /// Current score of each payload. Payload identity only.
    scores: HashMap<Vec<u8>, [u8; 8]>,
}

pub struct MemoryStore {
    rooms: DashMap<String, Room>,
    identity: MemberIdentity,
    next_seq: AtomicU64,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new(identity: MemberIdentity) -> Self {
        Self {
            rooms: DashMap::new(),
            identity,
            next_seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Sever the store. Every later call fails with [`BackendError::Closed`].
    pub fn disconnect(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Number of members in collection `key`.
    pub fn len(&self, key: &str) -> usize {
        self.rooms.get(key).map(|r| r.members.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }

    fn check_open(&self) -> Result<(), BackendError> {
        if self.closed.load(Ordering::Acquire) {
            Err(BackendError::Closed)
        } else {
            Ok(())
        }
    }

    fn range(
        &self,
        key: &str,
        start: i64,
        end: i64,
        descending: bool,
    ) -> Result<Vec<Vec<u8>>, BackendError> {
        self.check_open()?;
        let Some(room) = self.rooms.get(key) else {
            return Ok(Vec::new());
        };
        let Some(ranks) = resolve_ranks(room.members.len(), start, end) else {
            return Ok(Vec::new());
        };
        let window = ranks.len();
        let payloads = if descending {
            room.members
                .values()
                .rev()
                .skip(ranks.start)
                .take(window)
                .cloned()
                .collect()
        } else {
            room.members
                .values()
                .skip(ranks.start)
                .take(window)
                .cloned()
                .collect()
        };
        Ok(payloads)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemberIdentity::default())
    }
}

#[async_trait]
impl OrderedStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn member_identity(&self) -> MemberIdentity {
        self.identity
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.check_open()
    }

    async fn add_scored(
        &self,
        key: &str,
        score: f64,
        payload: &[u8],
    ) -> Result<(), BackendError> {
        self.check_open()?;
        let score = score_key(score);
        let mut room = self.rooms.entry(key.to_string()).or_default();

        match self.identity {
            MemberIdentity::Payload => {
                if let Some(old) = room.scores.insert(payload.to_vec(), score) {
                    room.members.remove(&(old, payload.to_vec()));
                }
                room.members.insert((score, payload.to_vec()), payload.to_vec());
            }
            MemberIdentity::Entry => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                room.members.insert((score, seq.to_be_bytes().to_vec()), payload.to_vec());
            }
        }
        Ok(())
    }

    async fn range_asc(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Vec<u8>>, BackendError> {
        self.range(key, start, end, false)
    }

    async fn range_desc(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Vec<u8>>, BackendError> {
        self.range(key, start, end, true)
    }
}
