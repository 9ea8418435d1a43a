//! Error handling types

use thiserror::Error;

/// Result type alias for bus and bulletin-board operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a bulletin-board call can surface.
///
/// Nothing here is recovered locally; callers receive the error as-is.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot connect to bus at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("remote error: {message}")]
    Remote { message: String },

    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl Error {
    /// Create a remote error
    pub fn remote<S: Into<String>>(message: S) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}
