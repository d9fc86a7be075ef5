use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed channel table line {line} in {path}: {reason}")]
    ChannelTable {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("duplicate channel number {0}")]
    DuplicateChannel(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
