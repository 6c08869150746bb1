//! Wire protocol error types.

use std::io;

use thiserror::Error;

/// Errors produced while encoding, framing or decoding P2P messages.
#[derive(Debug, Error)]
pub enum WireError {
    /// Fewer bytes remain than the field being read declares.
    #[error("truncated input: {context} needs {needed} more byte(s)")]
    TruncatedInput {
        /// The field that could not be read.
        context: &'static str,
        /// How many bytes were missing.
        needed: usize,
    },

    /// Correctly sized but structurally invalid: trailing bytes, unknown
    /// enumeration values, counts over protocol limits.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The header checksum does not match `SHA256(SHA256(payload))[..4]`.
    #[error("checksum mismatch: header carries {expected:02x?}, payload hashes to {actual:02x?}")]
    ChecksumMismatch { expected: [u8; 4], actual: [u8; 4] },

    /// The frame's magic bytes belong to another network.
    #[error("wrong network magic: expected {expected:02x?}, got {actual:02x?}")]
    WrongNetwork { expected: [u8; 4], actual: [u8; 4] },

    /// No codec is registered for the command. The frame itself was valid;
    /// skip `length` payload bytes and keep reading.
    #[error("unknown command {command:?} ({length} byte payload)")]
    UnknownCommand { command: String, length: u32 },

    /// The randomness source could not supply a nonce.
    #[error("random source failure: {0}")]
    RandomSourceFailure(String),

    /// Reading from or writing to the underlying stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl WireError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        WireError::MalformedPayload(reason.into())
    }

    pub(crate) fn truncated(context: &'static str, needed: usize) -> Self {
        WireError::TruncatedInput { context, needed }
    }

    /// True when the connection can carry on after this error.
    ///
    /// Only [`WireError::UnknownCommand`] qualifies: newer peers send
    /// commands this crate does not know, and the frame length is still
    /// trustworthy.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WireError::UnknownCommand { .. })
    }
}

/// A specialized Result type for wire operations.
pub type Result<T> = std::result::Result<T, WireError>;
