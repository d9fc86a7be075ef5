use thiserror::Error;

/// Error taxonomy from §7. Every watcher catches its own
/// `ControllerError` and continues — nothing here propagates past a
/// single tick except the fatal player-startup case, which the supervisor
/// turns into a non-zero process exit.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] broadcast_config::ConfigError),

    #[error("player IPC error: {0}")]
    Player(#[from] broadcast_contracts::player::PlayerError),

    #[error("station index for {0} is empty or has zero total duration")]
    MissingContent(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("alert generation failed: {0}")]
    AlertGeneration(String),

    #[error("player socket never became ready at {0}")]
    PlayerStartup(String),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
