use std::collections::HashSet;
use std::path::Path;

use broadcast_contracts::ids::ChannelNumber;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// `{pin, locked_channels, auto_lock_channels, always_mute_channels}` (§6).
#[derive(Debug, Clone, Default)]
pub struct ParentalConfig {
    pub pin: String,
    pub locked: HashSet<ChannelNumber>,
    pub auto_lock: HashSet<ChannelNumber>,
    pub always_mute: HashSet<ChannelNumber>,
}

#[derive(Deserialize)]
struct Raw {
    pin: String,
    locked_channels: Vec<u32>,
    auto_lock_channels: Vec<u32>,
    always_mute_channels: Vec<u32>,
}

pub fn load(path: &Path) -> ConfigResult<ParentalConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: Raw = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ParentalConfig {
        pin: raw.pin,
        locked: raw.locked_channels.into_iter().map(ChannelNumber).collect(),
        auto_lock: raw.auto_lock_channels.into_iter().map(ChannelNumber).collect(),
        always_mute: raw
            .always_mute_channels
            .into_iter()
            .map(ChannelNumber)
            .collect(),
    })
}
