//! streamflate
//!
//! Chunked streaming compression and decompression adapters: a pull-based
//! byte-stream `read` contract over block-oriented DEFLATE-family codecs,
//! with a blocking driver, a poll-driven async driver sharing the same
//! state machine, and stage-by-stage pipeline composition.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod config;
pub mod error;

// Codec primitive and byte sources
pub mod codec;
pub mod source;

// Stream drivers
pub mod session;
pub mod reader;
pub mod async_reader;
pub mod pipeline;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::async_reader::AsyncTransformReader;
    pub use crate::codec::{make_decoder, make_encoder, Codec, Format};
    pub use crate::config::Config;
    pub use crate::error::{CodecError, Error};
    pub use crate::pipeline::Pipeline;
    pub use crate::reader::{decode_all, encode_all, TransformReader};
    pub use crate::session::{Session, SessionStats, State};
    pub use crate::source::{AsyncChunkSource, ChunkSource, Pull, ReadSource, SliceSource};
}
