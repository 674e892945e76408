//! Error types for the R4 control core

use thiserror::Error;

/// Failures on the command channel. None of these are fatal to the control loop.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("transport unavailable, command dropped")]
    TransportUnavailable,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
}

/// Top-level error type
#[derive(Error, Debug)]
pub enum R4Error {
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}

pub type Result<T> = std::result::Result<T, R4Error>;
