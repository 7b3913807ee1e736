//! roomlog - timestamp-ordered per-room message logs.
//!
//! Messages are appended to one sorted collection per room, scored by their
//! timestamp, and read back by rank in either direction. The collection lives
//! in an external ordered store: redis sorted sets, an embedded redb file, or
//! process memory.
//!
//! ```no_run
//! # async fn demo() -> roomlog::Result<()> {
//! use roomlog::{Message, RoomLog};
//!
//! let log = RoomLog::connect("127.0.0.1:6379", "").await?;
//! log.append("r1", &Message::new("alice", "hi", 100)).await?;
//! let latest_first = log.fetch_range("r1", 0, -1, true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Scores are `f64`, so timestamps whose magnitude exceeds 2^53 may collapse
//! onto a shared score. Messages sharing a score are ordered by the store's
//! own rule (see [`MemberIdentity`]); callers that need strict insertion order
//! under equal timestamps must make their timestamps distinct.

pub mod config;
pub mod error;
pub mod message;
pub mod room_log;
pub mod store;
pub mod telemetry;

pub use config::{Backend, Config, StoreConfig};
pub use error::{BackendError, Result, RoomLogError};
pub use message::Message;
pub use room_log::RoomLog;
pub use store::{MemberIdentity, OrderedStore};
