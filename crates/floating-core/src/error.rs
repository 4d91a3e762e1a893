use futures::task::SpawnError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FloatingError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FloatingError {
    #[error("position computation failed: {message}")]
    Engine { message: String },

    #[error("failed to spawn position computation: {message}")]
    Spawn { message: String },

    #[error("global `{name}` is not available")]
    MissingGlobal { name: String },

    #[error("JavaScript error: {message}")]
    Js { message: String },

    #[error("invalid placement: {value}")]
    InvalidPlacement { value: String },

    #[error("invalid strategy: {value}")]
    InvalidStrategy { value: String },
}

impl FloatingError {
    #[must_use]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn js(message: impl Into<String>) -> Self {
        Self::Js {
            message: message.into(),
        }
    }
}

// `SpawnError` is not `Clone`; errors are kept in reactive cells, so only the
// rendered message is retained.
impl From<SpawnError> for FloatingError {
    fn from(err: SpawnError) -> Self {
        Self::Spawn {
            message: err.to_string(),
        }
    }
}
