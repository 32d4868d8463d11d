//! source.rs
//! Pull-style byte sources feeding the stream drivers, sync and async.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::io::AsyncRead;

/// Result of one chunk pull.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pull {
    /// `n > 0` bytes were written into the scratch chunk.
    Data(usize),
    /// Nothing this round; try again. Distinct from end-of-input.
    Retry,
    /// The source is exhausted and will never yield bytes again.
    Eof,
}

/// Blocking chunk producer.
pub trait ChunkSource {
    /// Fill up to `buf.len()` bytes. One pull per driver loop iteration;
    /// the driver adds no retry loop of its own.
    fn pull(&mut self, buf: &mut [u8]) -> io::Result<Pull>;
}

/// Poll-shaped chunk producer for the async driver.
///
/// `Poll::Pending` is the driver's single suspension point; the waker must
/// be registered before returning it.
pub trait AsyncChunkSource {
    fn poll_pull(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Pull>>;
}

// =============================================================================
// Adapters
// =============================================================================

/// Adapter over any [`std::io::Read`].
///
/// `Interrupted`/`WouldBlock` become [`Pull::Retry`]; a zero-byte read is
/// end-of-input per the `Read` contract.
pub struct ReadSource<R> {
    inner: R,
}

impl<R: io::Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read> ChunkSource for ReadSource<R> {
    fn pull(&mut self, buf: &mut [u8]) -> io::Result<Pull> {
        if buf.is_empty() {
            // `read` returns Ok(0) for an empty buffer; that must not read
            // as end-of-input.
            return Ok(Pull::Retry);
        }
        match self.inner.read(buf) {
            Ok(0) => Ok(Pull::Eof),
            Ok(n) => Ok(Pull::Data(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Pull::Retry),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Pull::Retry),
            Err(e) => Err(e),
        }
    }
}

/// Adapter over any [`futures::io::AsyncRead`].
pub struct AsyncReadSource<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> AsyncReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead + Unpin> AsyncChunkSource for AsyncReadSource<R> {
    fn poll_pull(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Pull>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(Pull::Retry));
        }
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(0)) => Poll::Ready(Ok(Pull::Eof)),
            Poll::Ready(Ok(n)) => Poll::Ready(Ok(Pull::Data(n))),
            Poll::Ready(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {
                Poll::Ready(Ok(Pull::Retry))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
        }
    }
}

/// In-memory source over a byte slice. Implements both pull traits, so the
/// same data can drive either flavor of reader.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, buf: &mut [u8]) -> Pull {
        let remaining = self.data.len() - self.pos;
        if remaining == 0 {
            return Pull::Eof;
        }
        if buf.is_empty() {
            // `Data(n)` promises n > 0; an empty destination can only retry.
            return Pull::Retry;
        }
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Pull::Data(n)
    }
}

impl ChunkSource for SliceSource<'_> {
    fn pull(&mut self, buf: &mut [u8]) -> io::Result<Pull> {
        Ok(self.take(buf))
    }
}

impl AsyncChunkSource for SliceSource<'_> {
    fn poll_pull(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Pull>> {
        Poll::Ready(Ok(self.get_mut().take(buf)))
    }
}

// =============================================================================
// Scripted source
// =============================================================================

/// One scripted event in a [`TraceSource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// Deliver these bytes; split over several pulls if they outsize the
    /// scratch chunk.
    Data(Vec<u8>),
    /// Report one [`Pull::Retry`].
    Retry,
    /// Async: report `Poll::Pending` once (and wake immediately). The
    /// blocking trait reports [`Pull::Retry`] instead.
    Pending,
    /// Report end-of-input from here on.
    Eof,
}

/// Replays a fixed sequence of pull results, so a driver can be exercised
/// against an exact chunk-by-chunk timeline. An exhausted script reports
/// end-of-input.
pub struct TraceSource {
    events: VecDeque<TraceEvent>,
}

impl TraceSource {
    pub fn new(events: Vec<TraceEvent>) -> Self {
        Self { events: events.into() }
    }

    /// A plain data timeline: one `Data` event per chunk.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self::new(chunks.into_iter().map(TraceEvent::Data).collect())
    }

    fn next(&mut self, buf: &mut [u8], blocking: bool) -> Option<Pull> {
        loop {
            match self.events.front_mut() {
                None | Some(TraceEvent::Eof) => return Some(Pull::Eof),
                Some(TraceEvent::Retry) => {
                    self.events.pop_front();
                    return Some(Pull::Retry);
                }
                Some(TraceEvent::Pending) => {
                    self.events.pop_front();
                    if blocking {
                        return Some(Pull::Retry);
                    }
                    return None;
                }
                Some(TraceEvent::Data(bytes)) => {
                    if bytes.is_empty() {
                        self.events.pop_front();
                        continue;
                    }
                    if buf.is_empty() {
                        return Some(Pull::Retry);
                    }
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    if n == bytes.len() {
                        self.events.pop_front();
                    } else {
                        bytes.drain(..n);
                    }
                    return Some(Pull::Data(n));
                }
            }
        }
    }
}

impl ChunkSource for TraceSource {
    fn pull(&mut self, buf: &mut [u8]) -> io::Result<Pull> {
        match self.next(buf, true) {
            Some(pull) => Ok(pull),
            None => Ok(Pull::Retry),
        }
    }
}

impl AsyncChunkSource for TraceSource {
    fn poll_pull(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<Pull>> {
        match self.get_mut().next(buf, false) {
            Some(pull) => Poll::Ready(Ok(pull)),
            None => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }
}
