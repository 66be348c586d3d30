//! Engine-wide error types

use crate::persistence::PersistenceError;

/// Errors surfaced by the public engine API.
///
/// Expected transient conditions (missing neighbor chunks, invalid spawns,
/// failed saves) are absorbed inside the engine and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("{what} has already been disposed")]
    Disposed { what: &'static str },

    #[error("System error in {component}: {error}")]
    SystemError { component: String, error: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config {
            message: message.into(),
        }
    }

    pub fn system(component: impl Into<String>, error: impl std::fmt::Display) -> Self {
        EngineError::SystemError {
            component: component.into(),
            error: error.to_string(),
        }
    }
}
