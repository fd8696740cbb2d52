//! Tracker-specific error types

use std::net::SocketAddr;
use thiserror::Error;
use shared::SharedError;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {message}")]
    ServerError { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TrackerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
