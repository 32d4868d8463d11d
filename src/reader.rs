//! reader.rs
//! Blocking transform driver: a pull-based `read` over one session.

use std::io;

use crate::codec::{make_decoder, make_encoder, Codec};
use crate::config::{validate_chunk_size, Config};
use crate::constants::DEFAULT_CHUNK_SIZE;
use crate::error::Error;
use crate::session::{Next, Session, SessionStats, State};
use crate::source::{ChunkSource, Pull, SliceSource};

/// Blocking driver: pulls chunks from `S`, runs them through the codec and
/// fills caller buffers on demand.
///
/// `read` returning `Ok(0)` is the end-of-stream signal; a short read is
/// legal and means nothing more than "that is what was ready."
pub struct TransformReader<S, C> {
    source: S,
    session: Session<C>,
}

impl<S: ChunkSource, C: Codec> TransformReader<S, C> {
    pub fn new(source: S, codec: C) -> Self {
        Self { source, session: Session::new(codec, DEFAULT_CHUNK_SIZE) }
    }

    pub fn with_chunk_size(source: S, codec: C, chunk_size: usize) -> Result<Self, Error> {
        validate_chunk_size(chunk_size)?;
        Ok(Self { source, session: Session::new(codec, chunk_size) })
    }

    pub fn state(&self) -> State {
        self.session.state()
    }

    pub fn stats(&self) -> &SessionStats {
        self.session.stats()
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Fill up to `buf.len()` bytes of `buf`.
    ///
    /// Corruption surfaces as [`Error::Corrupt`] exactly once; afterwards
    /// the session is terminal and reads report `Ok(0)`. A source error is
    /// returned only if the call produced nothing; otherwise the partial
    /// count is returned and the source is retried on the next call.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            self.session.ensure_started();
            return Ok(0);
        }
        let mut written = 0;
        loop {
            let turn = self.session.turn(&mut buf[written..])?;
            written += turn.written;
            match turn.next {
                Next::Full | Next::End => return Ok(written),
                Next::Pull => match self.source.pull(self.session.scratch_mut()) {
                    Ok(Pull::Data(n)) => self.session.feed(n),
                    Ok(Pull::Retry) => self.session.feed_retry(),
                    Ok(Pull::Eof) => self.session.feed_eof(),
                    Err(err) => {
                        if written > 0 {
                            return Ok(written);
                        }
                        return Err(Error::Io(err));
                    }
                },
            }
        }
    }

    /// Drain the whole stream into a vector.
    pub fn read_to_vec(&mut self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];
        loop {
            let n = self.read(&mut buf)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
}

impl<S: ChunkSource> TransformReader<S, Box<dyn Codec>> {
    /// Compressing reader for `config.format`.
    pub fn encoder(source: S, config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { source, session: Session::new(make_encoder(&config), config.chunk_size) })
    }

    /// Decompressing reader for `config.format`.
    pub fn decoder(source: S, config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { source, session: Session::new(make_decoder(&config), config.chunk_size) })
    }
}

impl<S: ChunkSource, C: Codec> io::Read for TransformReader<S, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        TransformReader::read(self, buf).map_err(io::Error::from)
    }
}

/// Compress `input` in one pass.
pub fn encode_all(input: &[u8], config: Config) -> Result<Vec<u8>, Error> {
    TransformReader::encoder(SliceSource::new(input), config)?.read_to_vec()
}

/// Decompress `input` in one pass.
pub fn decode_all(input: &[u8], config: Config) -> Result<Vec<u8>, Error> {
    TransformReader::decoder(SliceSource::new(input), config)?.read_to_vec()
}
