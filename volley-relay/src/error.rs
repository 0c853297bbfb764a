//! Error type for the relay client.

use std::io;

use thiserror::Error;

/// Errors surfaced by [`RelayClient`](crate::RelayClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// IO failure on the underlying connection.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The server's reply could not be parsed as an SMTP response.
    #[error("failed to parse SMTP response: {0}")]
    Parse(String),

    /// TLS setup or handshake failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The connection was closed before a complete response arrived.
    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    /// The server's reply was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub(crate) type Result<T> = std::result::Result<T, ClientError>;
