//! Per-room message logs over an ordered store.
//!
//! A [`RoomLog`] is a connected handle. Each room is one collection in the
//! store, scored by message timestamp. The handle keeps no log state of its
//! own, so clones share the underlying connection and see the same data.
//!
//! Every operation is a single store round trip. Nothing here retries or
//! imposes a timeout; wrap the returned future (for example with
//! `tokio::time::timeout`) to bound it, and drop it to cancel.

use crate::config::{Backend, StoreConfig};
use crate::error::{BackendError, Result, RoomLogError};
use crate::message::Message;
use crate::store::{MemberIdentity, MemoryStore, OrderedStore, RedbStore, RedisStore};
use crate::telemetry::spans;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, trace};

#[derive(Clone)]
pub struct RoomLog {
    store: Arc<dyn OrderedStore>,
    key_prefix: String,
}

impl RoomLog {
    /// Connect to a redis server and verify it answers PING.
    ///
    /// An empty `credential` connects without authentication.
    pub async fn connect(address: &str, credential: &str) -> Result<Self> {
        let store = RedisStore::connect(address, credential)
            .instrument(spans::store("redis"))
            .await
            .map_err(RoomLogError::Connection)?;
        Self::with_store(Arc::new(store)).await
    }

    /// Open whichever backend `config` selects.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let span = spans::store(config.backend.as_str());
        let store: Arc<dyn OrderedStore> = match config.backend {
            Backend::Redis => {
                if config.member_identity != MemberIdentity::Payload {
                    return Err(RoomLogError::Connection(BackendError::Unsupported(
                        "redis sorted sets only support payload member identity",
                    )));
                }
                let store = RedisStore::connect(&config.address, &config.password)
                    .instrument(span)
                    .await
                    .map_err(RoomLogError::Connection)?;
                Arc::new(store)
            }
            Backend::Redb => {
                let store = span
                    .in_scope(|| RedbStore::open(&config.path, config.member_identity))
                    .map_err(RoomLogError::Connection)?;
                Arc::new(store)
            }
            Backend::Memory => Arc::new(MemoryStore::new(config.member_identity)),
        };
        Ok(Self::with_store(store)
            .await?
            .with_key_prefix(config.key_prefix.clone()))
    }

    /// Wrap an already constructed store, pinging it first.
    pub async fn with_store(store: Arc<dyn OrderedStore>) -> Result<Self> {
        store.ping().await.map_err(RoomLogError::Connection)?;
        debug!(
            backend = store.name(),
            identity = store.member_identity().as_str(),
            "Store ready"
        );
        Ok(Self {
            store,
            key_prefix: String::new(),
        })
    }

    /// Prefix every room id with `prefix` when forming collection keys.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    pub fn member_identity(&self) -> MemberIdentity {
        self.store.member_identity()
    }

    /// Liveness probe against the store.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await?;
        Ok(())
    }

    /// Append `message` to `room`'s log, scored by its timestamp.
    pub async fn append(&self, room: &str, message: &Message) -> Result<()> {
        let key = self.collection_key(room)?;
        let payload = message.encode()?;

        self.store
            .add_scored(&key, message.score(), &payload)
            .instrument(spans::room("append", room))
            .await?;
        trace!(room = %room, timestamp = message.timestamp, "Message appended");
        Ok(())
    }

    /// Messages ranked `start..=end` in `room`'s log.
    ///
    /// Ranks are zero-based and negative ranks count from the end. With
    /// `reverse` the ranks index the newest-first view and the result is
    /// newest first. One undecodable entry fails the whole call.
    pub async fn fetch_range(
        &self,
        room: &str,
        start: i64,
        end: i64,
        reverse: bool,
    ) -> Result<Vec<Message>> {
        let key = self.collection_key(room)?;
        let span = spans::room("fetch_range", room);

        let raw = if reverse {
            self.store
                .range_desc(&key, start, end)
                .instrument(span)
                .await?
        } else {
            self.store
                .range_asc(&key, start, end)
                .instrument(span)
                .await?
        };
        trace!(room = %room, start, end, reverse, count = raw.len(), "Range fetched");

        raw.iter()
            .enumerate()
            .map(|(index, payload)| {
                Message::decode(payload).map_err(|source| RoomLogError::Deserialization {
                    room: room.to_string(),
                    index,
                    source,
                })
            })
            .collect()
    }

    fn collection_key<'a>(&self, room: &'a str) -> Result<Cow<'a, str>> {
        if room.is_empty() {
            return Err(RoomLogError::EmptyRoom);
        }
        if self.key_prefix.is_empty() {
            Ok(Cow::Borrowed(room))
        } else {
            Ok(Cow::Owned(format!("{}{}", self.key_prefix, room)))
        }
    }
}

impl fmt::Debug for RoomLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomLog")
            .field("backend", &self.store.name())
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}
