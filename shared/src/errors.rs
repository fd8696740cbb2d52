//! Shared error types for the remote vehicle control system

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Malformed incoming message: {message}")]
    MalformedMessage { message: String },

    #[error("Unknown {kind}: {input}")]
    UnknownValue { kind: &'static str, input: String },
}

impl SharedError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage { message: message.into() }
    }

    pub fn unknown(kind: &'static str, input: impl Into<String>) -> Self {
        Self::UnknownValue { kind, input: input.into() }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
