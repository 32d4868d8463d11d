//! async_reader.rs
//! Suspend/resume transform driver: the same session machine as the
//! blocking reader, driven through `poll`.
//!
//! The only suspension point is the chunk pull. Everything between pulls
//! (codec step, capacity bookkeeping, state transitions) runs synchronously
//! inside one poll, so the output byte sequence is identical to the
//! blocking driver's for the same chunk timeline.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::poll_fn;
use futures::io::AsyncRead;

use crate::codec::{make_decoder, make_encoder, Codec};
use crate::config::{validate_chunk_size, Config};
use crate::constants::DEFAULT_CHUNK_SIZE;
use crate::error::Error;
use crate::session::{Next, Session, SessionStats, State};
use crate::source::{AsyncChunkSource, Pull};

/// Poll-driven driver over one session.
///
/// Dropping an in-flight read future is safe: all state lives in the
/// reader, and a pull left outstanding resumes cleanly on the next poll.
pub struct AsyncTransformReader<S, C> {
    source: S,
    session: Session<C>,
}

impl<S: AsyncChunkSource + Unpin, C: Codec> AsyncTransformReader<S, C> {
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

    /// Poll-shaped `read`. If the source suspends after bytes were already
    /// produced this call, the partial count is returned instead of
    /// `Pending`, which callers see as a legal short read.
    pub fn poll_read(&mut self, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<Result<usize, Error>> {
        if buf.is_empty() {
            self.session.ensure_started();
            return Poll::Ready(Ok(0));
        }
        let mut written = 0;
        loop {
            let turn = match self.session.turn(&mut buf[written..]) {
                Ok(turn) => turn,
                Err(err) => return Poll::Ready(Err(err)),
            };
            written += turn.written;
            match turn.next {
                Next::Full | Next::End => return Poll::Ready(Ok(written)),
                Next::Pull => {
                    match Pin::new(&mut self.source).poll_pull(cx, self.session.scratch_mut()) {
                        Poll::Ready(Ok(Pull::Data(n))) => self.session.feed(n),
                        Poll::Ready(Ok(Pull::Retry)) => self.session.feed_retry(),
                        Poll::Ready(Ok(Pull::Eof)) => self.session.feed_eof(),
                        Poll::Ready(Err(err)) => {
                            if written > 0 {
                                return Poll::Ready(Ok(written));
                            }
                            return Poll::Ready(Err(Error::Io(err)));
                        }
                        Poll::Pending => {
                            if written > 0 {
                                return Poll::Ready(Ok(written));
                            }
                            return Poll::Pending;
                        }
                    }
                }
            }
        }
    }

    /// Awaitable `read` built on [`Self::poll_read`].
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        poll_fn(|cx| self.poll_read(cx, buf)).await
    }

    /// Drain the whole stream into a vector.
    pub async fn read_to_vec(&mut self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];
        loop {
            let n = self.read(&mut buf).await?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
}

impl<S: AsyncChunkSource + Unpin> AsyncTransformReader<S, Box<dyn Codec>> {
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

impl<S: AsyncChunkSource + Unpin, C: Codec + Unpin> AsyncRead for AsyncTransformReader<S, C> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut()
            .poll_read(cx, buf)
            .map(|r| r.map_err(io::Error::from))
    }
}
