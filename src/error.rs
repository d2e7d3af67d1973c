//! Error types for rengu-store operations.
//!
//! This module provides the error hierarchy using `thiserror` for the
//! streaming pipeline, document decoding, the transport layer, and CLI
//! commands.

use thiserror::Error;

/// Result type alias for rengu-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Buffered stream errors (cursor positioning).
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// A document in the result stream could not be decoded.
    #[error("malformed document: {0}")]
    Document(#[from] DocumentError),

    /// The transport failed to deliver or accept data.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Errors raised by [`BufferedByteStream`](crate::io::BufferedByteStream)
/// cursor operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Seek target lies before the start or past the sealed end.
    #[error("seek to {target} out of range (stream length {len})")]
    SeekOutOfRange {
        /// Requested absolute position.
        target: i128,
        /// Accumulated stream length at the time of the seek.
        len: usize,
    },
}

/// Errors for documents that cannot be turned into a cached object.
///
/// Every variant is fatal to the query pass that produced it: once a
/// document is malformed, the position of later documents cannot be trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The stream ended inside a value.
    #[error("stream ended inside a document starting at byte {offset}")]
    Truncated {
        /// Offset where the unfinished document starts.
        offset: usize,
    },

    /// A byte that cannot start or continue a top-level value.
    #[error("unexpected byte 0x{byte:02x} at offset {offset}")]
    UnexpectedByte {
        /// The offending byte.
        byte: u8,
        /// Offset of the byte in the stream.
        offset: usize,
    },

    /// The span is not valid JSON.
    #[error("invalid JSON at byte {offset}: {reason}")]
    InvalidJson {
        /// Offset where the document starts.
        offset: usize,
        /// Parser message.
        reason: String,
    },

    /// The document is valid JSON but not an object.
    #[error("document at byte {offset} is not an object")]
    NotAnObject {
        /// Offset where the document starts.
        offset: usize,
    },

    /// The object has no string `ID` field.
    #[error("document at byte {offset} has no ID field")]
    MissingId {
        /// Offset where the document starts.
        offset: usize,
    },

    /// The `ID` field is not a canonical UUID.
    #[error("invalid ID {value:?}: {reason}")]
    InvalidId {
        /// The raw `ID` value.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Errors reported by a [`Transport`](crate::transport::Transport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Target URL.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Reading the response body failed mid-stream.
    #[error("response body failed: {0}")]
    Body(String),

    /// A non-streaming response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// Output format error.
    #[error("output format error: {0}")]
    OutputFormat(String),
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::ExecutionFailed(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Command(err.into())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Stream(StreamError::SeekOutOfRange { .. }) => {
                Self::new(std::io::ErrorKind::InvalidInput, err)
            }
            other => Self::other(other),
        }
    }
}
