//! Backing store configuration.

use serde::Deserialize;

use crate::store::MemberIdentity;

/// Which ordered store a [`RoomLog`](crate::RoomLog) is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Redis sorted sets over the network.
    #[default]
    Redis,
    /// Embedded redb database file.
    Redb,
    /// Process-local, lost on exit.
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Redis address, `host:port` or a `redis://` URL.
    #[serde(default = "default_address")]
    pub address: String,
    /// Redis password. Empty means no authentication.
    #[serde(default)]
    pub password: String,
    /// Redb database file.
    #[serde(default = "default_path")]
    pub path: String,
    /// Whether identical payloads collapse into one member.
    #[serde(default)]
    pub member_identity: MemberIdentity,
    /// Prepended to each room id to form the collection key.
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            address: default_address(),
            password: String::new(),
            path: default_path(),
            member_identity: MemberIdentity::default(),
            key_prefix: String::new(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_path() -> String {
    "roomlog.redb".to_string()
}
