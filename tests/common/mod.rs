//! Shared helpers for room log integration tests.

#![allow(dead_code)]

use roomlog::store::{MemoryStore, RedbStore};
use roomlog::{MemberIdentity, Message, RoomLog};
use std::sync::Arc;
use tempfile::TempDir;

/// Environment variable naming a redis server for the redis-backed tests.
pub const REDIS_ENV: &str = "ROOMLOG_TEST_REDIS";

/// A room log over a fresh in-memory store.
pub async fn memory_log(identity: MemberIdentity) -> (Arc<MemoryStore>, RoomLog) {
    let store = Arc::new(MemoryStore::new(identity));
    let log = RoomLog::with_store(store.clone())
        .await
        .expect("memory store should always answer ping");
    (store, log)
}

/// A room log over a redb file in a fresh temporary directory.
///
/// The directory is removed when the returned guard drops.
pub async fn redb_log(identity: MemberIdentity) -> (TempDir, RoomLog) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = RedbStore::open(dir.path().join("rooms.redb"), identity).expect("open redb");
    let log = RoomLog::with_store(Arc::new(store))
        .await
        .expect("redb store should answer ping");
    (dir, log)
}

/// Connect to the redis named by [`REDIS_ENV`], or `None` when unset.
///
/// Every call gets its own key prefix so parallel tests never share rooms.
pub async fn redis_log() -> Option<RoomLog> {
    let address = std::env::var(REDIS_ENV).ok()?;
    let log = RoomLog::connect(&address, "")
        .await
        .expect("ROOMLOG_TEST_REDIS is set but the server is unreachable");
    let prefix = format!(
        "roomlog-test:{}:{}:",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    );
    Some(log.with_key_prefix(prefix))
}

pub fn msg(sender: &str, body: &str, timestamp: i64) -> Message {
    Message::new(sender, body, timestamp)
}

pub fn bodies(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.message.as_str()).collect()
}
