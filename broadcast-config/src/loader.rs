use std::time::SystemTime;

use crate::error::ConfigResult;
use crate::models::{ChannelTable, EasConfig, ParentalConfig, ScheduleConfig};
use crate::paths::Paths;

/// The full configuration surface read from disk at a single moment, plus
/// the mtimes it was read at (used by `ConfigWatcher` to decide whether a
/// reload is actually needed).
#[derive(Debug, Clone)]
pub struct Config {
    pub channels: ChannelTable,
    pub schedule: ScheduleConfig,
    pub parental: ParentalConfig,
    pub eas: EasConfig,
}

#[derive(Debug, Clone, Default)]
struct Mtimes {
    channels: Option<SystemTime>,
    schedule: Option<SystemTime>,
    parental: Option<SystemTime>,
    eas: Option<SystemTime>,
}

fn mtime(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok()?.modified().ok()
}

/// Loads the configuration surface rooted at a `Paths` layout, tracking
/// each source file's mtime so `reload_if_changed` is a cheap no-op between
/// real edits (§9 design note: load at start, reload on file-mtime change).
pub struct ConfigLoader {
    paths: Paths,
    last: Mtimes,
}

impl ConfigLoader {
    pub fn new(paths: Paths) -> Self {
        Self {
            paths,
            last: Mtimes::default(),
        }
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn load(&mut self) -> ConfigResult<Config> {
        let channels_path = self.paths.channel_table();
        let schedule_path = self.paths.schedule_config();
        let parental_path = self.paths.parental_config();
        let eas_path = self.paths.eas_config();

        let channels_text = std::fs::read_to_string(&channels_path).map_err(|source| {
            crate::error::ConfigError::Read {
                path: channels_path.clone(),
                source,
            }
        })?;
        let channels = ChannelTable::parse(&channels_text).map_err(|(line, reason)| {
            crate::error::ConfigError::ChannelTable {
                path: channels_path.clone(),
                line,
                reason,
            }
        })?;

        let schedule = crate::models::schedule::load(&schedule_path)?;
        let parental = crate::models::parental::load(&parental_path)?;
        let eas = crate::models::eas::load(&eas_path)?;

        self.last = Mtimes {
            channels: mtime(&channels_path),
            schedule: mtime(&schedule_path),
            parental: mtime(&parental_path),
            eas: mtime(&eas_path),
        };

        Ok(Config {
            channels,
            schedule,
            parental,
            eas,
        })
    }

    /// Returns `true` if any tracked source file's mtime moved since the
    /// last successful `load`.
    pub fn changed_on_disk(&self) -> bool {
        mtime(&self.paths.channel_table()) != self.last.channels
            || mtime(&self.paths.schedule_config()) != self.last.schedule
            || mtime(&self.paths.parental_config()) != self.last.parental
            || mtime(&self.paths.eas_config()) != self.last.eas
    }
}
