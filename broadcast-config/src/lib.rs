//! Configuration loading for the broadcast controller: the channel table,
//! weekly schedule, parental policy, and EAS configuration (§6), plus the
//! path layout for everything the controller reads and writes on disk.

pub mod error;
pub mod loader;
pub mod models;
pub mod paths;
pub mod watcher;

pub use error::{ConfigError, ConfigResult};
pub use loader::{Config, ConfigLoader};
pub use paths::Paths;
pub use watcher::ConfigWatcher;
