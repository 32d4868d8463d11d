//! constants.rs
//! Defaults and sanity bounds shared across the crate.

/// Default scratch chunk size in bytes (1 KiB).
/// One chunk is allocated per session and refilled from the source.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Max chunk size sanity bound (32 MiB).
pub const MAX_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Default DEFLATE effort level. 0 = store, 9 = best; 6 is the zlib default.
pub const DEFAULT_LEVEL: u32 = 6;

/// Highest DEFLATE effort level accepted by configuration.
pub const MAX_LEVEL: u32 = 9;

/// gzip member framing fields (RFC 1952).
pub mod gzip {
    /// Two-byte member magic.
    pub const MAGIC: [u8; 2] = [0x1f, 0x8b];
    /// Compression method byte: DEFLATE.
    pub const CM_DEFLATE: u8 = 8;
    /// OS byte: unknown.
    pub const OS_UNKNOWN: u8 = 255;
    /// Fixed header length; no optional fields are emitted.
    pub const HEADER_LEN: usize = 10;
    /// Trailer length: CRC-32 then ISIZE, both little-endian.
    pub const TRAILER_LEN: usize = 8;

    /// FLG bits marking optional header fields.
    pub mod flg {
        pub const FTEXT: u8 = 0x01;
        pub const FHCRC: u8 = 0x02;
        pub const FEXTRA: u8 = 0x04;
        pub const FNAME: u8 = 0x08;
        pub const FCOMMENT: u8 = 0x10;
        /// Bits 5..7 are reserved and must be zero.
        pub const RESERVED: u8 = 0xe0;
    }
}
