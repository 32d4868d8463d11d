//! config.rs
//! Per-session parameters: effort level, container format, chunk size.

use crate::codec::Format;
use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_LEVEL, MAX_CHUNK_SIZE, MAX_LEVEL};
use crate::error::Error;

/// Session parameters, fixed at construction time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// DEFLATE effort level, `0..=9`.
    pub level: u32,
    /// Container framing around the raw DEFLATE body.
    pub format: Format,
    /// Scratch chunk size in bytes; one chunk per session.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            format: Format::Zlib,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Build a validated configuration.
    pub fn new(level: u32, format: Format, chunk_size: usize) -> Result<Self, Error> {
        let config = Self { level, format, chunk_size };
        config.validate()?;
        Ok(config)
    }

    pub fn with_format(format: Format) -> Self {
        Self { format, ..Self::default() }
    }

    /// Reject nonsense values up front so nothing fails mid-stream.
    pub fn validate(&self) -> Result<(), Error> {
        validate_chunk_size(self.chunk_size)?;
        if self.level > MAX_LEVEL {
            return Err(Error::Config(format!(
                "compression level {} out of range 0..={}",
                self.level, MAX_LEVEL
            )));
        }
        Ok(())
    }
}

pub fn validate_chunk_size(size: usize) -> Result<(), Error> {
    if size == 0 {
        return Err(Error::Config("chunk size must be non-zero".into()));
    }
    if size > MAX_CHUNK_SIZE {
        return Err(Error::Config(format!(
            "chunk size {} exceeds max {}",
            size, MAX_CHUNK_SIZE
        )));
    }
    Ok(())
}
