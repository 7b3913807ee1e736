//! Redb-backed ordered store.
//!
//! Implements [`OrderedStore`] on the redb embedded database. Every member is
//! one row in `members`, keyed so that a prefix scan over a collection walks it
//! in score order:
//!
//! `len(key) as u32 BE | key | score_key(score) | tie`
//!
//! where `tie` is the payload itself under [`MemberIdentity::Payload`] and a
//! big-endian sequence number under [`MemberIdentity::Entry`]. Payload identity
//! also keeps a `payload_index` row per member so a re-added payload can be
//! moved to its new score. The identity is recorded in `meta` on first open.

use super::{MemberIdentity, OrderedStore, resolve_ranks, score_key};
use crate::error::BackendError;
use async_trait::async_trait;
use redb::{
    AccessGuard, Database, ReadableDatabase, ReadableTable, StorageError, TableDefinition,
};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

const MEMBERS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("members");
const PAYLOAD_INDEX: TableDefinition<&[u8], &[u8]> = TableDefinition::new("payload_index");
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_SEQ: &str = "next_seq";
const IDENTITY: &str = "member_identity";

type Member<'a> = (
    AccessGuard<'a, &'static [u8]>,
    AccessGuard<'a, &'static [u8]>,
);

pub struct RedbStore {
    db: Arc<Database>,
    identity: MemberIdentity,
}

impl RedbStore {
    /// Open or create the database at `path`.
    ///
    /// The member identity is fixed when the file is created. Opening an
    /// existing file with a different identity fails with
    /// [`BackendError::Unsupported`].
    pub fn open(path: impl AsRef<Path>, identity: MemberIdentity) -> Result<Self, BackendError> {
        let db = Database::create(path.as_ref()).map_err(BackendError::redb)?;

        // Create the tables up front so read transactions never miss them.
        let write_txn = db.begin_write().map_err(BackendError::redb)?;
        {
            write_txn
                .open_table(MEMBERS_TABLE)
                .map_err(BackendError::redb)?;
            write_txn
                .open_table(PAYLOAD_INDEX)
                .map_err(BackendError::redb)?;
            let mut meta = write_txn.open_table(META_TABLE).map_err(BackendError::redb)?;

            let stored = meta
                .get(IDENTITY)
                .map_err(BackendError::redb)?
                .map(|v| v.value());
            match stored {
                Some(code) if code != identity_code(identity) => {
                    return Err(BackendError::Unsupported(
                        "database file was created with a different member identity",
                    ));
                }
                Some(_) => {}
                None => {
                    meta.insert(IDENTITY, identity_code(identity))
                        .map_err(BackendError::redb)?;
                }
            }
        }
        write_txn.commit().map_err(BackendError::redb)?;

        Ok(Self {
            db: Arc::new(db),
            identity,
        })
    }

    fn collection_prefix(key: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(4 + key.len());
        prefix.extend_from_slice(&(key.len() as u32).to_be_bytes());
        prefix.extend_from_slice(key.as_bytes());
        prefix
    }

    fn member_key(prefix: &[u8], score: &[u8; 8], tie: &[u8]) -> Vec<u8> {
        let mut k = Vec::with_capacity(prefix.len() + 8 + tie.len());
        k.extend_from_slice(prefix);
        k.extend_from_slice(score);
        k.extend_from_slice(tie);
        k
    }

    /// Payloads ranked `start..=end`, walking only as far as the window needs.
    fn range(
        &self,
        key: &str,
        start: i64,
        end: i64,
        descending: bool,
    ) -> Result<Vec<Vec<u8>>, BackendError> {
        let read_txn = self.db.begin_read().map_err(BackendError::redb)?;
        let table = read_txn
            .open_table(MEMBERS_TABLE)
            .map_err(BackendError::redb)?;

        let prefix = Self::collection_prefix(key);
        let upper = prefix_end(&prefix);
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (
            Bound::Included(prefix.as_slice()),
            upper.as_deref().map_or(Bound::Unbounded, Bound::Excluded),
        );

        if start < 0 && end < 0 {
            // Both ranks count from the far end: walk from there and flip.
            if start > end {
                return Ok(Vec::new());
            }
            let from = (-(end + 1)) as usize;
            let to = (-(start + 1)) as usize;
            let range = table.range::<&[u8]>(bounds).map_err(BackendError::redb)?;
            let mut window = if descending {
                take_window(range, from, to - from + 1)?
            } else {
                take_window(range.rev(), from, to - from + 1)?
            };
            window.reverse();
            return Ok(window);
        }

        let (skip, take) = if start < 0 || end < 0 {
            let len = table.range::<&[u8]>(bounds).map_err(BackendError::redb)?.count();
            match resolve_ranks(len, start, end) {
                Some(ranks) => (ranks.start, ranks.len()),
                None => return Ok(Vec::new()),
            }
        } else if start > end {
            return Ok(Vec::new());
        } else {
            (start as usize, ((end - start) as usize).saturating_add(1))
        };

        let range = table.range::<&[u8]>(bounds).map_err(BackendError::redb)?;
        if descending {
            take_window(range.rev(), skip, take)
        } else {
            take_window(range, skip, take)
        }
    }
}

fn identity_code(identity: MemberIdentity) -> u64 {
    match identity {
        MemberIdentity::Payload => 0,
        MemberIdentity::Entry => 1,
    }
}

/// Smallest key greater than every key starting with `prefix`.
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

fn take_window<'a, I>(members: I, skip: usize, take: usize) -> Result<Vec<Vec<u8>>, BackendError>
where
    I: Iterator<Item = Result<Member<'a>, StorageError>>,
{
    members
        .skip(skip)
        .take(take)
        .map(|item| {
            let (_k, v) = item.map_err(BackendError::redb)?;
            Ok(v.value().to_vec())
        })
        .collect()
}

#[async_trait]
impl OrderedStore for RedbStore {
    fn name(&self) -> &'static str {
        "redb"
    }

    fn member_identity(&self) -> MemberIdentity {
        self.identity
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let read_txn = self.db.begin_read().map_err(BackendError::redb)?;
        read_txn
            .open_table(MEMBERS_TABLE)
            .map_err(BackendError::redb)?;
        Ok(())
    }

    async fn add_scored(
        &self,
        key: &str,
        score: f64,
        payload: &[u8],
    ) -> Result<(), BackendError> {
        let prefix = Self::collection_prefix(key);
        let score = score_key(score);

        let write_txn = self.db.begin_write().map_err(BackendError::redb)?;
        {
            let mut members = write_txn
                .open_table(MEMBERS_TABLE)
                .map_err(BackendError::redb)?;

            match self.identity {
                MemberIdentity::Payload => {
                    let mut index = write_txn
                        .open_table(PAYLOAD_INDEX)
                        .map_err(BackendError::redb)?;
                    let index_key = [prefix.as_slice(), payload].concat();

                    let previous = index
                        .get(index_key.as_slice())
                        .map_err(BackendError::redb)?
                        .map(|v| v.value().to_vec());
                    if let Some(old_score) = previous
                        && let Ok(old_score) = <[u8; 8]>::try_from(old_score.as_slice())
                    {
                        let old_key = Self::member_key(&prefix, &old_score, payload);
                        members
                            .remove(old_key.as_slice())
                            .map_err(BackendError::redb)?;
                    }

                    let member_key = Self::member_key(&prefix, &score, payload);
                    members
                        .insert(member_key.as_slice(), payload)
                        .map_err(BackendError::redb)?;
                    index
                        .insert(index_key.as_slice(), score.as_slice())
                        .map_err(BackendError::redb)?;
                }
                MemberIdentity::Entry => {
                    let mut meta = write_txn
                        .open_table(META_TABLE)
                        .map_err(BackendError::redb)?;
                    let seq = meta
                        .get(NEXT_SEQ)
                        .map_err(BackendError::redb)?
                        .map(|v| v.value())
                        .unwrap_or(0);
                    meta.insert(NEXT_SEQ, seq + 1)
                        .map_err(BackendError::redb)?;

                    let member_key = Self::member_key(&prefix, &score, &seq.to_be_bytes());
                    members
                        .insert(member_key.as_slice(), payload)
                        .map_err(BackendError::redb)?;
                }
            }
        }
        write_txn.commit().map_err(BackendError::redb)?;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn open(dir: &tempfile::TempDir, identity: MemberIdentity) -> RedbStore {
        RedbStore::open(dir.path().join("log.redb"), identity).unwrap()
    }

    fn strings(raw: Vec<Vec<u8>>) -> Vec<String> {
        raw.into_iter()
            .map(|p| String::from_utf8(p).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn ping_on_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, MemberIdentity::Payload);
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn orders_by_score_including_negative() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, MemberIdentity::Payload);
        store.add_scored("k", 10.0, b"ten").await.unwrap();
        store.add_scored("k", -5.0, b"minus five").await.unwrap();
        store.add_scored("k", 0.0, b"zero").await.unwrap();

        assert_eq!(
            strings(store.range_asc("k", 0, -1).await.unwrap()),
            ["minus five", "zero", "ten"]
        );
        assert_eq!(
            strings(store.range_desc("k", 0, 0).await.unwrap()),
            ["ten"]
        );
    }

    #[tokio::test]
    async fn prefixed_keys_do_not_bleed_into_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, MemberIdentity::Payload);
        store.add_scored("room", 1.0, b"a").await.unwrap();
        store.add_scored("room2", 1.0, b"b").await.unwrap();
        store.add_scored("roo", 1.0, b"c").await.unwrap();

        assert_eq!(strings(store.range_asc("room", 0, -1).await.unwrap()), ["a"]);
        assert_eq!(strings(store.range_asc("room2", 0, -1).await.unwrap()), ["b"]);
        assert_eq!(strings(store.range_asc("roo", 0, -1).await.unwrap()), ["c"]);
    }

    #[tokio::test]
    async fn payload_identity_moves_existing_member() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, MemberIdentity::Payload);
        store.add_scored("k", 1.0, b"x").await.unwrap();
        store.add_scored("k", 2.0, b"y").await.unwrap();
        store.add_scored("k", 3.0, b"x").await.unwrap();

        assert_eq!(strings(store.range_asc("k", 0, -1).await.unwrap()), ["y", "x"]);
    }

    #[tokio::test]
    async fn entry_identity_keeps_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, MemberIdentity::Entry);
        store.add_scored("k", 1.0, b"x").await.unwrap();
        store.add_scored("k", 1.0, b"x").await.unwrap();
        store.add_scored("k", 1.0, b"a").await.unwrap();

        assert_eq!(
            strings(store.range_asc("k", 0, -1).await.unwrap()),
            ["x", "x", "a"]
        );
        assert_eq!(
            strings(store.range_desc("k", 0, -1).await.unwrap()),
            ["a", "x", "x"]
        );
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(&dir, MemberIdentity::Entry);
            store.add_scored("k", 1.0, b"first").await.unwrap();
        }
        let store = open(&dir, MemberIdentity::Entry);
        store.add_scored("k", 2.0, b"second").await.unwrap();

        assert_eq!(
            strings(store.range_asc("k", 0, -1).await.unwrap()),
            ["first", "second"]
        );
    }

    #[tokio::test]
    async fn out_of_range_window_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, MemberIdentity::Payload);
        store.add_scored("k", 1.0, b"a").await.unwrap();

        assert!(store.range_asc("k", 5, 10).await.unwrap().is_empty());
        assert!(store.range_desc("missing", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reopen_with_other_identity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.redb");
        {
            let store = RedbStore::open(&path, MemberIdentity::Entry).unwrap();
            store.add_scored("k", 100.0, b"hi").await.unwrap();
        }

        let err = RedbStore::open(&path, MemberIdentity::Payload).err().unwrap();
        assert!(matches!(err, BackendError::Unsupported(_)));

        // The recorded identity is untouched by the refused open.
        let store = RedbStore::open(&path, MemberIdentity::Entry).unwrap();
        store.add_scored("k", 100.0, b"hi").await.unwrap();
        assert_eq!(strings(store.range_asc("k", 0, -1).await.unwrap()), ["hi", "hi"]);
    }

    #[tokio::test]
    async fn reopen_entry_over_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.redb");
        drop(RedbStore::open(&path, MemberIdentity::Payload).unwrap());

        assert!(matches!(
            RedbStore::open(&path, MemberIdentity::Entry),
            Err(BackendError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn windows_follow_rank_rules() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, MemberIdentity::Payload);
        let all: Vec<String> = (0..6).map(|i| format!("m{i}")).collect();
        for (i, p) in all.iter().enumerate() {
            store.add_scored("k", i as f64, p.as_bytes()).await.unwrap();
        }
        let reversed: Vec<String> = all.iter().rev().cloned().collect();

        let bounds = [-10, -7, -6, -3, -1, 0, 1, 3, 5, 6, 10, i64::MAX];
        for &start in &bounds {
            for &end in &bounds {
                let expect = |list: &[String]| match resolve_ranks(list.len(), start, end) {
                    Some(r) => list[r].to_vec(),
                    None => Vec::new(),
                };
                assert_eq!(
                    strings(store.range_asc("k", start, end).await.unwrap()),
                    expect(&all),
                    "asc {start}..={end}"
                );
                assert_eq!(
                    strings(store.range_desc("k", start, end).await.unwrap()),
                    expect(&reversed),
                    "desc {start}..={end}"
                );
            }
        }
    }

    #[test]
    fn prefix_end_increments_last_byte() {
        assert_eq!(prefix_end(&[0, 0, 0, 1, b'a']), Some(vec![0, 0, 0, 1, b'b']));
        assert_eq!(prefix_end(&[1, 0xFF, 0xFF]), Some(vec![2]));
        assert_eq!(prefix_end(&[0xFF]), None);
    }
}
