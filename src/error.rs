//! error.rs
//! Typed errors for the driver surface and the codec contract.

use std::io;

use thiserror::Error;

/// Error surfaced by the stream drivers.
///
/// End-of-stream is never an error: drivers report it as a 0-byte read.
/// `Corrupt` is the one condition that must stay distinguishable from it.
#[derive(Debug, Error)]
pub enum Error {
    /// Source-side I/O failure. Raised only when the failing call produced
    /// nothing; a call that already wrote bytes returns them first and the
    /// source is re-polled on the next call.
    #[error("source i/o error: {0}")]
    Io(#[from] io::Error),

    /// Decode-side data corruption. Terminal: the session reports only
    /// end-of-stream afterwards.
    #[error("corrupt stream: {0}")]
    Corrupt(String),

    /// Rejected configuration. Raised at construction, never mid-stream.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Error reported by a codec primitive.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Activation failed. The owning session ends silently.
    #[error("codec init failed: {0}")]
    Init(String),

    /// The input bytes do not form a valid stream (decode side).
    #[error("invalid stream data: {0}")]
    Data(String),

    /// Any other unrecoverable codec failure.
    #[error("codec error: {0}")]
    Other(String),
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(inner) => inner,
            Error::Corrupt(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
            Error::Config(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
        }
    }
}
