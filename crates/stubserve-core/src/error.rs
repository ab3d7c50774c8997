//! Error types for stubserve-core

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for stubserve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the test server
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid listen or tunnel address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Outbound tunnel dial failed
    #[error("Tunnel connect to {target} failed: {source}")]
    Tunnel {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hyper error
    #[error("HTTP error: {0}")]
    Hyper(#[from] hyper::Error),

    /// Response construction error
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),
}
