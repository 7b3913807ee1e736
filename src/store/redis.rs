//! Redis-backed ordered store.
//!
//! Collections are redis sorted sets. A sorted set identifies members by their
//! bytes, so this backend only supports [`MemberIdentity::Payload`]: re-adding
//! an identical payload updates its score, and members sharing a score are
//! ordered lexicographically.

use super::{MemberIdentity, OrderedStore};
use crate::error::BackendError;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, ConnectionInfo, IntoConnectionInfo};
use tracing::debug;

pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Open a connection to the server at `address`.
    ///
    /// `address` is `host:port` or a full `redis://` URL. A non-empty
    /// `credential` is sent as the password. The logical database is always 0.
    pub async fn connect(address: &str, credential: &str) -> Result<Self, BackendError> {
        let info = connection_info(address, credential)?;
        debug!(addr = ?info.addr, "Opening redis connection");
        let client = Client::open(info)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

fn connection_info(address: &str, credential: &str) -> Result<ConnectionInfo, BackendError> {
    let url = if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{address}")
    };
    let mut info = url.as_str().into_connection_info()?;
    info.redis.db = 0;
    if !credential.is_empty() {
        info.redis.password = Some(credential.to_string());
    }
    Ok(info)
}

#[async_trait]
impl OrderedStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn member_identity(&self) -> MemberIdentity {
        MemberIdentity::Payload
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn add_scored(
        &self,
        key: &str,
        score: f64,
        payload: &[u8],
    ) -> Result<(), BackendError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("ZADD")
            .arg(key)
            .arg(score)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn range_asc(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Vec<u8>>, BackendError> {
        let mut conn = self.conn.clone();
        let raw: Vec<Vec<u8>> = redis::cmd("ZRANGE")
            .arg(key)
            .arg(start)
            .arg(end)
            .query_async(&mut conn)
            .await?;
        Ok(raw)
    }

    async fn range_desc(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Vec<u8>>, BackendError> {
        let mut conn = self.conn.clone();
        let raw: Vec<Vec<u8>> = redis::cmd("ZREVRANGE")
            .arg(key)
            .arg(start)
            .arg(end)
            .query_async(&mut conn)
            .await?;
        Ok(raw)
    }
}
