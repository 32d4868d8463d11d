//! codec/deflate.rs
//! Raw DEFLATE and zlib-wrapped codecs via flate2's streaming primitives.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::codec::{Codec, FinishOutcome, FinishStatus, StepOutcome, StepStatus};
use crate::error::CodecError;

fn step_status(status: Status) -> StepStatus {
    match status {
        Status::Ok => StepStatus::Ok,
        Status::BufError => StepStatus::BufferFull,
        Status::StreamEnd => StepStatus::StreamEnd,
    }
}

fn finish_status(status: Status) -> FinishStatus {
    match status {
        Status::Ok => FinishStatus::Ok,
        Status::BufError => FinishStatus::BufferFull,
        Status::StreamEnd => FinishStatus::StreamEnd,
    }
}

/// DEFLATE compressor. `zlib_header` selects the RFC 1950 wrapper; without
/// it the output is a bare DEFLATE body.
pub struct DeflateEncoder {
    level: u32,
    zlib_header: bool,
    inner: Option<Compress>,
}

impl DeflateEncoder {
    pub fn new(level: u32, zlib_header: bool) -> Self {
        Self { level, zlib_header, inner: None }
    }
}

impl Codec for DeflateEncoder {
    fn init(&mut self) -> Result<(), CodecError> {
        self.inner = Some(Compress::new(Compression::new(self.level), self.zlib_header));
        Ok(())
    }

    fn step(&mut self, input: &[u8], out: &mut [u8]) -> Result<StepOutcome, CodecError> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| CodecError::Other("deflate encoder not initialized".into()))?;
        let before_in = inner.total_in();
        let before_out = inner.total_out();
        let status = inner
            .compress(input, out, FlushCompress::None)
            .map_err(|e| CodecError::Other(e.to_string()))?;
        Ok(StepOutcome {
            consumed: (inner.total_in() - before_in) as usize,
            produced: (inner.total_out() - before_out) as usize,
            status: step_status(status),
        })
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<FinishOutcome, CodecError> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| CodecError::Other("deflate encoder not initialized".into()))?;
        let before_out = inner.total_out();
        let status = inner
            .compress(&[], out, FlushCompress::Finish)
            .map_err(|e| CodecError::Other(e.to_string()))?;
        Ok(FinishOutcome {
            produced: (inner.total_out() - before_out) as usize,
            status: finish_status(status),
        })
    }
}

/// DEFLATE decompressor, raw or zlib-wrapped to mirror [`DeflateEncoder`].
pub struct DeflateDecoder {
    zlib_header: bool,
    inner: Option<Decompress>,
}

impl DeflateDecoder {
    pub fn new(zlib_header: bool) -> Self {
        Self { zlib_header, inner: None }
    }
}

impl Codec for DeflateDecoder {
    fn init(&mut self) -> Result<(), CodecError> {
        self.inner = Some(Decompress::new(self.zlib_header));
        Ok(())
    }

    fn step(&mut self, input: &[u8], out: &mut [u8]) -> Result<StepOutcome, CodecError> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| CodecError::Other("deflate decoder not initialized".into()))?;
        let before_in = inner.total_in();
        let before_out = inner.total_out();
        let status = inner
            .decompress(input, out, FlushDecompress::None)
            .map_err(|e| CodecError::Data(e.to_string()))?;
        Ok(StepOutcome {
            consumed: (inner.total_in() - before_in) as usize,
            produced: (inner.total_out() - before_out) as usize,
            status: step_status(status),
        })
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<FinishOutcome, CodecError> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| CodecError::Other("deflate decoder not initialized".into()))?;
        let before_out = inner.total_out();
        let status = inner
            .decompress(&[], out, FlushDecompress::Finish)
            .map_err(|e| CodecError::Data(e.to_string()))?;
        Ok(FinishOutcome {
            produced: (inner.total_out() - before_out) as usize,
            status: finish_status(status),
        })
    }
}
