//! Controller-specific error types

use thiserror::Error;
use shared::SharedError;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Not connected to the vehicle")]
    NotConnected,

    #[error("Outbound queue to the vehicle is full")]
    OutboundFull,

    #[error("Handshake with {url} failed: {message}")]
    HandshakeFailed { url: String, message: String },

    #[error("Gave up reconnecting after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("No route steps to send")]
    EmptyRoute,

    #[error("Invalid endpoint: {input:?}")]
    InvalidEndpoint { input: String },

    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },

    #[error("Tracker request failed: {message}")]
    TrackerUnavailable { message: String },

    #[error("Tracker does not know {ip}")]
    UnknownIdentity { ip: String },

    #[error("Endpoint store error: {message}")]
    StoreError { message: String },

    #[error("Controller is not running")]
    ControllerStopped,

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ControllerError {
    pub fn handshake(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandshakeFailed { url: url.into(), message: message.into() }
    }

    pub fn tracker(message: impl Into<String>) -> Self {
        Self::TrackerUnavailable { message: message.into() }
    }

    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand { message: message.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError { message: message.into() }
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
