//! Error types for the RPC engine.

use std::io;

use thiserror::Error;

/// Transport-layer errors. Anything surfacing here is fatal to the
/// connection; clean shutdown (EOF, unparseable length line) is reported as
/// an absent frame instead.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced by the call engine and the accessors built on it.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport-level I/O failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Outgoing message serialisation failed.
    #[error("JSON codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The peer closed the stream while a call was outstanding.
    #[error("peer closed the stream while a call was outstanding")]
    Disconnected,

    /// The peer answered with a protocol-level error response.
    #[error("peer returned error: {message} (code: {code})")]
    Peer {
        /// The error code from the response.
        code: i64,
        /// The error message from the response.
        message: String,
    },

    /// A command invocation named a command the host does not know.
    #[error("unknown editor command: {name}")]
    UnknownCommand {
        /// The command name that failed the existence check.
        name: String,
    },

    /// The peer supplied a key code that does not decode to a key.
    #[error("invalid key code from peer: {code}")]
    InvalidKeyCode {
        /// The offending wire code.
        code: i64,
    },
}

impl RpcError {
    /// Creates a peer error from an error response.
    pub fn peer(code: i64, message: impl Into<String>) -> Self {
        Self::Peer {
            code,
            message: message.into(),
        }
    }

    /// Creates an unknown-command error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }
}
