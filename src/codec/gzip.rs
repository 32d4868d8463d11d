//! codec/gzip.rs
//! gzip member framing (RFC 1952) over a raw DEFLATE body.
//!
//! Layout:
//!
//! ```text
//! [ magic (2) = 1f 8b ]
//! [ cm (1) = 8 ]
//! [ flg (1) ]
//! [ mtime (4) ]
//! [ xfl (1) ]
//! [ os (1) ]
//! [ optional fields per flg ]
//! [ raw DEFLATE body ]
//! [ crc32 of plaintext (4, LE) ]
//! [ isize = plaintext len mod 2^32 (4, LE) ]
//! ```
//!
//! The encoder emits the fixed 10-byte header (flg = 0). The decoder accepts
//! and skips FEXTRA/FNAME/FCOMMENT/FHCRC fields, and verifies the trailer.
//! All parsing is incremental: header, body and trailer may arrive one byte
//! per call. Only the first member of a multi-member file is read.

use byteorder::{ByteOrder, LittleEndian};
use crc32fast::Hasher;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::codec::{Codec, FinishOutcome, FinishStatus, StepOutcome, StepStatus};
use crate::constants::gzip::{flg, CM_DEFLATE, HEADER_LEN, MAGIC, OS_UNKNOWN, TRAILER_LEN};
use crate::error::CodecError;

/// Copy as much of `src[*sent..]` into `out` as fits.
fn emit_pending(src: &[u8], sent: &mut usize, out: &mut [u8]) -> usize {
    let n = out.len().min(src.len() - *sent);
    out[..n].copy_from_slice(&src[*sent..*sent + n]);
    *sent += n;
    n
}

fn progress(produced: usize) -> FinishStatus {
    if produced > 0 {
        FinishStatus::Ok
    } else {
        FinishStatus::BufferFull
    }
}

/// gzip compressor: fixed header, raw DEFLATE body, CRC-32/ISIZE trailer.
pub struct GzipEncoder {
    level: u32,
    inner: Option<Compress>,
    crc: Hasher,
    plain_len: u64,
    header: [u8; HEADER_LEN],
    header_sent: usize,
    trailer: [u8; TRAILER_LEN],
    trailer_sent: usize,
    body_done: bool,
}

impl GzipEncoder {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            inner: None,
            crc: Hasher::new(),
            plain_len: 0,
            header: [0; HEADER_LEN],
            header_sent: 0,
            trailer: [0; TRAILER_LEN],
            trailer_sent: 0,
            body_done: false,
        }
    }

    fn seal_trailer(&mut self) {
        let crc = self.crc.clone().finalize();
        LittleEndian::write_u32(&mut self.trailer[0..4], crc);
        LittleEndian::write_u32(&mut self.trailer[4..8], self.plain_len as u32);
    }
}

impl Codec for GzipEncoder {
    fn init(&mut self) -> Result<(), CodecError> {
        // XFL hints per RFC 1952: 2 = slowest, 4 = fastest.
        let xfl = match self.level {
            9 => 2,
            0 | 1 => 4,
            _ => 0,
        };
        self.header = [
            MAGIC[0], MAGIC[1], CM_DEFLATE, 0, 0, 0, 0, 0, xfl, OS_UNKNOWN,
        ];
        self.header_sent = 0;
        self.trailer = [0; TRAILER_LEN];
        self.trailer_sent = 0;
        self.crc = Hasher::new();
        self.plain_len = 0;
        self.body_done = false;
        self.inner = Some(Compress::new(Compression::new(self.level), false));
        Ok(())
    }

    fn step(&mut self, input: &[u8], out: &mut [u8]) -> Result<StepOutcome, CodecError> {
        let mut produced = 0;
        if self.header_sent < HEADER_LEN {
            produced += emit_pending(&self.header, &mut self.header_sent, out);
            if self.header_sent < HEADER_LEN {
                return Ok(StepOutcome {
                    consumed: 0,
                    produced,
                    status: StepStatus::BufferFull,
                });
            }
        }

        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| CodecError::Other("gzip encoder not initialized".into()))?;
        let before_in = inner.total_in();
        let before_out = inner.total_out();
        let status = inner
            .compress(input, &mut out[produced..], FlushCompress::None)
            .map_err(|e| CodecError::Other(e.to_string()))?;
        let consumed = (inner.total_in() - before_in) as usize;
        produced += (inner.total_out() - before_out) as usize;

        self.crc.update(&input[..consumed]);
        self.plain_len += consumed as u64;

        let status = match status {
            Status::Ok => StepStatus::Ok,
            Status::BufError => StepStatus::BufferFull,
            Status::StreamEnd => StepStatus::StreamEnd,
        };
        Ok(StepOutcome { consumed, produced, status })
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<FinishOutcome, CodecError> {
        let mut produced = 0;

        // Even a zero-byte stream frames a complete member.
        if self.header_sent < HEADER_LEN {
            produced += emit_pending(&self.header, &mut self.header_sent, out);
            if self.header_sent < HEADER_LEN {
                return Ok(FinishOutcome { produced, status: progress(produced) });
            }
        }

        if !self.body_done {
            let inner = self
                .inner
                .as_mut()
                .ok_or_else(|| CodecError::Other("gzip encoder not initialized".into()))?;
            let before_out = inner.total_out();
            let status = inner
                .compress(&[], &mut out[produced..], FlushCompress::Finish)
                .map_err(|e| CodecError::Other(e.to_string()))?;
            produced += (inner.total_out() - before_out) as usize;
            match status {
                Status::StreamEnd => {
                    self.body_done = true;
                    self.seal_trailer();
                }
                Status::Ok => return Ok(FinishOutcome { produced, status: FinishStatus::Ok }),
                Status::BufError => {
                    return Ok(FinishOutcome { produced, status: progress(produced) })
                }
            }
        }

        produced += emit_pending(&self.trailer, &mut self.trailer_sent, &mut out[produced..]);
        let status = if self.trailer_sent == TRAILER_LEN {
            FinishStatus::StreamEnd
        } else {
            progress(produced)
        };
        Ok(FinishOutcome { produced, status })
    }
}

/// Where the decoder is inside the member layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DecPhase {
    /// Accumulating the 10 fixed header bytes.
    Fixed,
    /// Accumulating the 2-byte XLEN of an FEXTRA field.
    ExtraLen,
    /// Skipping XLEN bytes of FEXTRA payload.
    Extra,
    /// Skipping a NUL-terminated FNAME.
    Name,
    /// Skipping a NUL-terminated FCOMMENT.
    Comment,
    /// Accumulating the 2-byte FHCRC (accepted, not verified).
    HeaderCrc,
    /// Raw DEFLATE body.
    Body,
    /// Accumulating the 8 trailer bytes.
    Trailer,
    Done,
}

/// gzip decompressor mirroring [`GzipEncoder`], tolerant of the optional
/// header fields the encoder never emits.
pub struct GzipDecoder {
    inner: Option<Decompress>,
    crc: Hasher,
    plain_len: u64,
    phase: DecPhase,
    fixed: [u8; HEADER_LEN],
    fixed_have: usize,
    flg: u8,
    pending: [u8; 2],
    pending_have: usize,
    extra_left: usize,
    trailer: [u8; TRAILER_LEN],
    trailer_have: usize,
}

impl GzipDecoder {
    pub fn new() -> Self {
        Self {
            inner: None,
            crc: Hasher::new(),
            plain_len: 0,
            phase: DecPhase::Fixed,
            fixed: [0; HEADER_LEN],
            fixed_have: 0,
            flg: 0,
            pending: [0; 2],
            pending_have: 0,
            extra_left: 0,
            trailer: [0; TRAILER_LEN],
            trailer_have: 0,
        }
    }

    fn check_fixed_header(&mut self) -> Result<(), CodecError> {
        if self.fixed[0..2] != MAGIC {
            return Err(CodecError::Data(format!(
                "bad gzip magic {:02x}{:02x}",
                self.fixed[0], self.fixed[1]
            )));
        }
        if self.fixed[2] != CM_DEFLATE {
            return Err(CodecError::Data(format!(
                "unsupported gzip compression method {}",
                self.fixed[2]
            )));
        }
        let raw_flg = self.fixed[3];
        if raw_flg & flg::RESERVED != 0 {
            return Err(CodecError::Data(format!(
                "reserved gzip flg bits set: {:#04x}",
                raw_flg
            )));
        }
        self.flg = raw_flg;
        self.phase = self.after_fixed();
        Ok(())
    }

    fn after_fixed(&self) -> DecPhase {
        if self.flg & flg::FEXTRA != 0 {
            DecPhase::ExtraLen
        } else {
            self.after_extra()
        }
    }

    fn after_extra(&self) -> DecPhase {
        if self.flg & flg::FNAME != 0 {
            DecPhase::Name
        } else {
            self.after_name()
        }
    }

    fn after_name(&self) -> DecPhase {
        if self.flg & flg::FCOMMENT != 0 {
            DecPhase::Comment
        } else {
            self.after_comment()
        }
    }

    fn after_comment(&self) -> DecPhase {
        if self.flg & flg::FHCRC != 0 {
            DecPhase::HeaderCrc
        } else {
            DecPhase::Body
        }
    }

    fn verify_trailer(&self) -> Result<(), CodecError> {
        let stored_crc = LittleEndian::read_u32(&self.trailer[0..4]);
        let computed = self.crc.clone().finalize();
        if stored_crc != computed {
            return Err(CodecError::Data(format!(
                "gzip crc mismatch: stored {:08x}, computed {:08x}",
                stored_crc, computed
            )));
        }
        let stored_len = LittleEndian::read_u32(&self.trailer[4..8]);
        if stored_len != self.plain_len as u32 {
            return Err(CodecError::Data(format!(
                "gzip length mismatch: stored {}, decoded {}",
                stored_len, self.plain_len as u32
            )));
        }
        Ok(())
    }
}

impl Default for GzipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for GzipDecoder {
    fn init(&mut self) -> Result<(), CodecError> {
        self.inner = Some(Decompress::new(false));
        self.crc = Hasher::new();
        self.plain_len = 0;
        self.phase = DecPhase::Fixed;
        self.fixed_have = 0;
        self.flg = 0;
        self.pending_have = 0;
        self.extra_left = 0;
        self.trailer_have = 0;
        Ok(())
    }

    fn step(&mut self, input: &[u8], out: &mut [u8]) -> Result<StepOutcome, CodecError> {
        let mut consumed = 0;
        let mut produced = 0;
        loop {
            let avail = input.len() - consumed;
            match self.phase {
                DecPhase::Fixed => {
                    if avail == 0 {
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::Ok });
                    }
                    let n = (HEADER_LEN - self.fixed_have).min(avail);
                    self.fixed[self.fixed_have..self.fixed_have + n]
                        .copy_from_slice(&input[consumed..consumed + n]);
                    self.fixed_have += n;
                    consumed += n;
                    if self.fixed_have == HEADER_LEN {
                        self.check_fixed_header()?;
                    }
                }
                DecPhase::ExtraLen => {
                    if avail == 0 {
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::Ok });
                    }
                    let n = (2 - self.pending_have).min(avail);
                    self.pending[self.pending_have..self.pending_have + n]
                        .copy_from_slice(&input[consumed..consumed + n]);
                    self.pending_have += n;
                    consumed += n;
                    if self.pending_have == 2 {
                        self.extra_left = LittleEndian::read_u16(&self.pending) as usize;
                        self.pending_have = 0;
                        self.phase = DecPhase::Extra;
                    }
                }
                DecPhase::Extra => {
                    if self.extra_left == 0 {
                        self.phase = self.after_extra();
                        continue;
                    }
                    if avail == 0 {
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::Ok });
                    }
                    let n = self.extra_left.min(avail);
                    self.extra_left -= n;
                    consumed += n;
                }
                DecPhase::Name | DecPhase::Comment => {
                    if avail == 0 {
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::Ok });
                    }
                    match input[consumed..].iter().position(|&b| b == 0) {
                        Some(i) => {
                            consumed += i + 1;
                            self.phase = if self.phase == DecPhase::Name {
                                self.after_name()
                            } else {
                                self.after_comment()
                            };
                        }
                        None => {
                            consumed = input.len();
                            return Ok(StepOutcome { consumed, produced, status: StepStatus::Ok });
                        }
                    }
                }
                DecPhase::HeaderCrc => {
                    if avail == 0 {
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::Ok });
                    }
                    let n = (2 - self.pending_have).min(avail);
                    self.pending_have += n;
                    consumed += n;
                    if self.pending_have == 2 {
                        self.pending_have = 0;
                        self.phase = DecPhase::Body;
                    }
                }
                DecPhase::Body => {
                    if avail == 0 {
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::Ok });
                    }
                    if produced == out.len() {
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::BufferFull });
                    }
                    let inner = self
                        .inner
                        .as_mut()
                        .ok_or_else(|| CodecError::Other("gzip decoder not initialized".into()))?;
                    let before_in = inner.total_in();
                    let before_out = inner.total_out();
                    let status = inner
                        .decompress(&input[consumed..], &mut out[produced..], FlushDecompress::None)
                        .map_err(|e| CodecError::Data(e.to_string()))?;
                    let c = (inner.total_in() - before_in) as usize;
                    let p = (inner.total_out() - before_out) as usize;
                    self.crc.update(&out[produced..produced + p]);
                    self.plain_len += p as u64;
                    consumed += c;
                    produced += p;
                    match status {
                        Status::StreamEnd => self.phase = DecPhase::Trailer,
                        Status::Ok => {}
                        Status::BufError => {
                            return Ok(StepOutcome { consumed, produced, status: StepStatus::BufferFull })
                        }
                    }
                }
                DecPhase::Trailer => {
                    if avail == 0 {
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::Ok });
                    }
                    let n = (TRAILER_LEN - self.trailer_have).min(avail);
                    self.trailer[self.trailer_have..self.trailer_have + n]
                        .copy_from_slice(&input[consumed..consumed + n]);
                    self.trailer_have += n;
                    consumed += n;
                    if self.trailer_have == TRAILER_LEN {
                        self.verify_trailer()?;
                        self.phase = DecPhase::Done;
                        return Ok(StepOutcome { consumed, produced, status: StepStatus::StreamEnd });
                    }
                }
                DecPhase::Done => {
                    return Ok(StepOutcome { consumed, produced, status: StepStatus::StreamEnd });
                }
            }
        }
    }

    fn finish(&mut self, _out: &mut [u8]) -> Result<FinishOutcome, CodecError> {
        match self.phase {
            DecPhase::Done => Ok(FinishOutcome { produced: 0, status: FinishStatus::StreamEnd }),
            // Nothing arrived at all: treat the empty input as an empty stream.
            DecPhase::Fixed if self.fixed_have == 0 => {
                self.phase = DecPhase::Done;
                Ok(FinishOutcome { produced: 0, status: FinishStatus::StreamEnd })
            }
            DecPhase::Body => Err(CodecError::Data("truncated gzip stream: missing trailer".into())),
            DecPhase::Trailer => Err(CodecError::Data("truncated gzip trailer".into())),
            _ => Err(CodecError::Data("truncated gzip header".into())),
        }
    }
}
