//! Test-only doubles shared across this crate's unit tests. Gated behind
//! `#[cfg(test)]` in `lib.rs`; never compiled into the production crate.

use std::sync::Mutex;

use async_trait::async_trait;
use broadcast_contracts::player::{PlayerControl, PlayerResult, PlayerValue};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Command(Vec<String>),
    GetProperty(String),
    SetProperty(String, Value),
    Load(String, f64),
    AddFilter(String, String),
    RemoveFilter(String),
}

/// Records every call instead of talking to a real player, so tuner/
/// interstitial/EAS logic can be asserted against without a socket.
#[derive(Default)]
pub struct FakePlayer {
    pub calls: Mutex<Vec<PlayerCall>>,
    pub property_values: Mutex<std::collections::HashMap<String, PlayerValue>>,
}

impl FakePlayer {
    pub fn set_reply(&self, name: &str, value: PlayerValue) {
        self.property_values
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
    }
}

#[async_trait]
impl PlayerControl for FakePlayer {
    async fn command(&self, payload: &[&str]) {
        self.calls
            .lock()
            .unwrap()
            .push(PlayerCall::Command(payload.iter().map(|s| s.to_string()).collect()));
    }

    async fn get_property(&self, name: &str) -> PlayerValue {
        self.calls
            .lock()
            .unwrap()
            .push(PlayerCall::GetProperty(name.to_string()));
        self.property_values
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or(PlayerValue::Empty)
    }

    async fn set_property(&self, name: &str, value: Value) {
        self.calls
            .lock()
            .unwrap()
            .push(PlayerCall::SetProperty(name.to_string(), value));
    }

    async fn load(&self, path: &str, seek_seconds: f64) -> PlayerResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(PlayerCall::Load(path.to_string(), seek_seconds));
        Ok(())
    }

    async fn add_filter(&self, label: &str, spec: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(PlayerCall::AddFilter(label.to_string(), spec.to_string()));
    }

    async fn remove_filter(&self, label: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(PlayerCall::RemoveFilter(label.to_string()));
    }
}
