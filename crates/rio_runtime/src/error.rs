use rio_game::GameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error(transparent)]
    Game(#[from] GameError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
