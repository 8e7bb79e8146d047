use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected controller argument; filter state and generation are left untouched.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Network error, timeout or non-success status from the roster service.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The roster service answered with a body that is not the expected JSON.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Import error: {0}")]
    Import(#[from] shared_types::ImportError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EngineError::Decode(err.to_string())
        } else {
            EngineError::Transport(err.to_string())
        }
    }
}
