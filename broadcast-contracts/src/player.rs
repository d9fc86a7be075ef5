//! The player-control contract (C1). `broadcast-core::player_ipc` is the
//! concrete implementation over the player's JSON-IPC socket;
//! `broadcast-core`'s other modules (tuner, interstitial machine, EAS) are
//! written against this trait so they can be exercised in tests with a
//! fake double instead of a real socket.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("player IPC connect failed: {0}")]
    Connect(String),
    #[error("player IPC send failed: {0}")]
    Send(String),
    #[error("load did not become ready within the polling deadline")]
    LoadTimeout,
}

pub type PlayerResult<T> = Result<T, PlayerError>;

/// A property value read back from the player. Missing/null reads collapse
/// to `PlayerValue::Empty` per §4.1 rather than propagating as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PlayerValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PlayerValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PlayerValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlayerValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => PlayerValue::Empty,
            Value::Bool(b) => PlayerValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(PlayerValue::Number).unwrap_or(PlayerValue::Empty),
            Value::String(s) => PlayerValue::Text(s.clone()),
            _ => PlayerValue::Empty,
        }
    }
}

/// Single entry point for driving the external media player. Every method
/// is idempotent in effect: re-issuing a filter add with an already-present
/// label, or re-issuing a seek, is harmless (§4.1).
#[async_trait]
pub trait PlayerControl: Send + Sync {
    /// Issue one fire-and-forget command; the reply (if any) is discarded.
    async fn command(&self, payload: &[&str]);

    /// Issue a get-property command and extract its `data` field.
    async fn get_property(&self, name: &str) -> PlayerValue;

    /// Set a player property.
    async fn set_property(&self, name: &str, value: Value);

    /// Load `path`, optionally seeking to `seek_seconds`, per the
    /// replace-load / poll-for-ready / seek-with-retry / unpause protocol
    /// in §4.1.
    async fn load(&self, path: &str, seek_seconds: f64) -> PlayerResult<()>;

    /// Add a labeled video filter. A no-op if `label` is already installed.
    async fn add_filter(&self, label: &str, spec: &str);

    /// Remove a labeled video filter. A no-op if `label` is absent.
    async fn remove_filter(&self, label: &str);
}
