use pushtalk_core::{ConnectionId, ControlParseError};
use std::time::Duration;
use thiserror::Error;

/// Ошибки публичных операций координатора.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("connection {0} not found")]
    NotFound(ConnectionId),

    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),

    #[error("ice gathering for connection {0} is not complete")]
    NotReady(ConnectionId),

    #[error("media engine failure: {0:#}")]
    EngineFailure(#[from] anyhow::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ControlParseError> for RelayError {
    fn from(e: ControlParseError) -> Self {
        Self::InvalidProtocol(e.to_string())
    }
}

pub type Result<T, E = RelayError> = std::result::Result<T, E>;
