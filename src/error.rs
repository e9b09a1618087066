//! Error type shared by the server and the client.
//!
//! Every variant ends the current run; nothing is retried.

use crate::config::ConfigError;
use std::io;

/// Errors that abort a server or client run.
#[derive(Debug)]
pub enum Error {
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// Socket bind/accept/connect/read/write failure.
    Io(io::Error),
    /// The peer closed the connection before the session ended.
    PeerClosed,
    /// The console ran out of input before `Exit` was typed.
    ConsoleClosed,
    /// A configured address could not be resolved.
    InvalidAddress(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "{e}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::PeerClosed => write!(f, "connection closed by peer"),
            Error::ConsoleClosed => write!(f, "console input closed"),
            Error::InvalidAddress(addr) => write!(f, "invalid address '{addr}'"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}
