//! Error types for the relay server

use shared::{ProtocolError, SessionId};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop the relay server itself
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] io::Error),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("dispatcher stopped accepting events")]
    DispatcherStopped,
}

/// Failures that end a single session's connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("framing failed: {0}")]
    Framing(#[source] ProtocolError),

    #[error("session {0} writer has shut down")]
    WriterClosed(SessionId),

    #[error("dispatcher is no longer accepting messages")]
    DispatcherClosed,
}
