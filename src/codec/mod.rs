//! codec/mod.rs
//! The transform primitive contract and the shipped DEFLATE-family codecs.

pub mod deflate;
pub mod gzip;

pub use deflate::{DeflateDecoder, DeflateEncoder};
pub use gzip::{GzipDecoder, GzipEncoder};

use crate::config::Config;
use crate::error::CodecError;

/// Container framing around the raw DEFLATE body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    /// Raw DEFLATE, no container.
    Raw,
    /// zlib wrapper (RFC 1950): 2-byte header, Adler-32 trailer.
    Zlib,
    /// gzip member (RFC 1952): 10-byte header, CRC-32 + ISIZE trailer.
    Gzip,
}

/// How far a `step` call got.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// Progress was made and more input can follow.
    Ok,
    /// Output space ran out before the input was fully consumed. The
    /// unconsumed remainder must be offered again later.
    BufferFull,
    /// The codec saw its end-of-stream marker (decode side); it will not
    /// consume further input.
    StreamEnd,
}

/// Result of one `step` call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// Input bytes consumed.
    pub consumed: usize,
    /// Output bytes produced.
    pub produced: usize,
    pub status: StepStatus,
}

/// How far a `finish` call got.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FinishStatus {
    /// All tail bytes are out; the stream is complete.
    StreamEnd,
    /// Progress was made and more tail output remains; call again.
    Ok,
    /// No progress possible with the output space offered this call.
    BufferFull,
}

/// Result of one `finish` call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FinishOutcome {
    /// Output bytes produced.
    pub produced: usize,
    pub status: FinishStatus,
}

/// A stateful, block-oriented byte transform.
///
/// The contract the stream drivers rely on:
/// - `step` must be safely re-callable with the unconsumed remainder of its
///   input after a `BufferFull` result.
/// - `finish` is repeatable across calls until `StreamEnd`; a `FinishStatus::Ok`
///   result implies the call made progress (bytes out or internal advance
///   that lets the next call produce).
/// - A `CodecError::Data` means the input cannot be trusted; the session
///   becomes terminal and surfaces the corruption to its caller.
pub trait Codec: Send {
    /// Activate the codec with its construction-time parameters.
    fn init(&mut self) -> Result<(), CodecError>;

    /// Consume `input` bytes, produce into `out`. Never called with an
    /// empty `out` by the drivers in this crate.
    fn step(&mut self, input: &[u8], out: &mut [u8]) -> Result<StepOutcome, CodecError>;

    /// Drain the codec's internal tail after end-of-input.
    fn finish(&mut self, out: &mut [u8]) -> Result<FinishOutcome, CodecError>;
}

impl<T: Codec + ?Sized> Codec for Box<T> {
    fn init(&mut self) -> Result<(), CodecError> {
        (**self).init()
    }

    fn step(&mut self, input: &[u8], out: &mut [u8]) -> Result<StepOutcome, CodecError> {
        (**self).step(input, out)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<FinishOutcome, CodecError> {
        (**self).finish(out)
    }
}

/// Build the encoder matching `config.format`.
pub fn make_encoder(config: &Config) -> Box<dyn Codec> {
    match config.format {
        Format::Raw => Box::new(DeflateEncoder::new(config.level, false)),
        Format::Zlib => Box::new(DeflateEncoder::new(config.level, true)),
        Format::Gzip => Box::new(GzipEncoder::new(config.level)),
    }
}

/// Build the decoder matching `config.format`.
pub fn make_decoder(config: &Config) -> Box<dyn Codec> {
    match config.format {
        Format::Raw => Box::new(DeflateDecoder::new(false)),
        Format::Zlib => Box::new(DeflateDecoder::new(true)),
        Format::Gzip => Box::new(GzipDecoder::new()),
    }
}
