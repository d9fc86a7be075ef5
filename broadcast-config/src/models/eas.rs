use std::collections::HashMap;
use std::path::Path;

use broadcast_contracts::ids::Station;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// `{enabled, latitude, longitude, poll_interval_seconds, alert_types, exempt_channels}` (§6).
#[derive(Debug, Clone)]
pub struct EasConfig {
    pub enabled: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub poll_interval_seconds: u64,
    pub alert_types: HashMap<String, bool>,
    pub exempt_stations: Vec<Station>,
}

impl Default for EasConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: 0.0,
            longitude: 0.0,
            poll_interval_seconds: 1,
            alert_types: HashMap::new(),
            exempt_stations: Vec::new(),
        }
    }
}

impl EasConfig {
    pub fn is_exempt(&self, station: &Station) -> bool {
        self.exempt_stations.contains(station)
    }
}

#[derive(Deserialize)]
struct Raw {
    enabled: bool,
    latitude: f64,
    longitude: f64,
    poll_interval_seconds: u64,
    alert_types: HashMap<String, bool>,
    exempt_channels: Vec<String>,
}

pub fn load(path: &Path) -> ConfigResult<EasConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: Raw = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(EasConfig {
        enabled: raw.enabled,
        latitude: raw.latitude,
        longitude: raw.longitude,
        poll_interval_seconds: raw.poll_interval_seconds.max(1),
        alert_types: raw.alert_types,
        exempt_stations: raw.exempt_channels.iter().map(|s| Station::from(s.as_str())).collect(),
    })
}
