//! session.rs
//! One transform session: the state machine shared by both drivers.
//!
//! Summary: a `Session` owns one codec bound to one stream, plus the scratch
//! chunk staging source bytes and the cursors over it. `turn` advances the
//! machine as far as it can without touching the source; the sync and async
//! readers differ only in how they satisfy a [`Next::Pull`]. Because every
//! byte flows through this one transition function, both readers emit
//! identical output for identical chunk timelines.

use crate::codec::{Codec, FinishStatus, StepStatus};
use crate::error::{CodecError, Error};

/// Session lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// Codec not yet initialized; activation happens on the first read.
    Waiting,
    /// Normal transform: pull, step, drain.
    Active,
    /// Source exhausted; draining the codec's internal tail.
    Finishing,
    /// Terminal. All further reads report zero bytes.
    Done,
}

/// Counters collected while a session runs.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct SessionStats {
    pub pulls: u64,
    pub retries: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl SessionStats {
    fn add_pull(&mut self, n: usize) {
        self.pulls += 1;
        self.bytes_in += n as u64;
    }

    fn add_retry(&mut self) {
        self.retries += 1;
    }

    fn add_out(&mut self, n: usize) {
        self.bytes_out += n as u64;
    }
}

/// What a `turn` needs from its runner next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Next {
    /// Pull a chunk into [`Session::scratch_mut`] and report it back via
    /// `feed`, `feed_retry` or `feed_eof`.
    Pull,
    /// Output capacity is spoken for; hand the bytes to the caller.
    Full,
    /// Terminal: no further output will ever be produced.
    End,
}

/// Result of one `turn`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Bytes written into the output slice during this turn.
    pub written: usize,
    pub next: Next,
}

/// One instantiated, stateful use of a codec bound to one stream.
///
/// Exactly one driver owns a session; nothing here is shared or locked.
pub struct Session<C> {
    codec: C,
    state: State,
    chunk_size: usize,
    /// Scratch chunk, allocated once on first use.
    scratch: Option<Box<[u8]>>,
    /// Window of pulled-but-unconsumed bytes inside the scratch chunk.
    win_pos: usize,
    win_len: usize,
    stats: SessionStats,
}

impl<C: Codec> Session<C> {
    /// `chunk_size` must already be validated (non-zero, within bounds).
    pub fn new(codec: C, chunk_size: usize) -> Self {
        Self {
            codec,
            state: State::Waiting,
            chunk_size,
            scratch: None,
            win_pos: 0,
            win_len: 0,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Run lazy activation if it has not happened yet.
    pub fn ensure_started(&mut self) {
        if self.state == State::Waiting {
            self.start();
        }
    }

    /// The scratch chunk a runner pulls source bytes into.
    pub fn scratch_mut(&mut self) -> &mut [u8] {
        let chunk_size = self.chunk_size;
        self.scratch
            .get_or_insert_with(|| vec![0u8; chunk_size].into_boxed_slice())
    }

    /// Report a successful pull of `n` bytes into the scratch chunk.
    /// A count above the chunk capacity is a contract violation and panics.
    pub fn feed(&mut self, n: usize) {
        assert!(n <= self.chunk_size, "pulled byte count exceeds the scratch chunk");
        debug_assert!(n > 0);
        debug_assert!(self.window_is_empty());
        self.win_pos = 0;
        self.win_len = n;
        self.stats.add_pull(n);
    }

    /// Report a transient empty pull.
    pub fn feed_retry(&mut self) {
        self.stats.add_retry();
    }

    /// Report source end-of-input.
    pub fn feed_eof(&mut self) {
        if self.state == State::Active {
            log::trace!("source exhausted, draining codec tail");
            self.state = State::Finishing;
        }
    }

    /// Advance until output is produced, more input is needed, or the
    /// stream ends. Never touches the source.
    ///
    /// `Err(Error::Corrupt)` leaves the session terminal; bytes written
    /// before the corruption was detected are not reported.
    pub fn turn(&mut self, out: &mut [u8]) -> Result<TurnOutcome, Error> {
        let mut written = 0usize;
        loop {
            match self.state {
                State::Waiting => self.start(),
                State::Done => return Ok(TurnOutcome { written, next: Next::End }),
                State::Active => {
                    if written == out.len() {
                        return Ok(TurnOutcome { written, next: Next::Full });
                    }
                    if self.window_is_empty() {
                        return Ok(TurnOutcome { written, next: Next::Pull });
                    }
                    let scratch = match self.scratch.as_deref() {
                        Some(scratch) => scratch,
                        None => return Ok(TurnOutcome { written, next: Next::Pull }),
                    };
                    let window = &scratch[self.win_pos..self.win_len];
                    match self.codec.step(window, &mut out[written..]) {
                        Ok(outcome) => {
                            self.win_pos += outcome.consumed;
                            if self.window_is_empty() {
                                self.win_pos = 0;
                                self.win_len = 0;
                            }
                            written += outcome.produced;
                            self.stats.add_out(outcome.produced);
                            match outcome.status {
                                StepStatus::Ok => {
                                    if outcome.consumed == 0 && outcome.produced == 0 {
                                        // Codec stalled without claiming buffer-full.
                                        // Hand back what we have instead of spinning.
                                        return Ok(TurnOutcome { written, next: Next::Full });
                                    }
                                }
                                StepStatus::BufferFull => {
                                    return Ok(TurnOutcome { written, next: Next::Full });
                                }
                                StepStatus::StreamEnd => {
                                    log::trace!("codec stream end during step");
                                    self.state = State::Done;
                                    return Ok(TurnOutcome { written, next: Next::End });
                                }
                            }
                        }
                        Err(err) => return self.fail(err, written),
                    }
                }
                State::Finishing => {
                    if written == out.len() {
                        return Ok(TurnOutcome { written, next: Next::Full });
                    }
                    match self.codec.finish(&mut out[written..]) {
                        Ok(outcome) => {
                            written += outcome.produced;
                            self.stats.add_out(outcome.produced);
                            match outcome.status {
                                FinishStatus::StreamEnd => {
                                    self.state = State::Done;
                                    return Ok(TurnOutcome { written, next: Next::End });
                                }
                                FinishStatus::Ok => {}
                                FinishStatus::BufferFull => {
                                    return Ok(TurnOutcome { written, next: Next::Full });
                                }
                            }
                        }
                        Err(err) => return self.fail(err, written),
                    }
                }
            }
        }
    }

    fn window_is_empty(&self) -> bool {
        self.win_pos == self.win_len
    }

    fn start(&mut self) {
        match self.codec.init() {
            Ok(()) => {
                log::trace!("codec activated, chunk_size={}", self.chunk_size);
                self.state = State::Active;
            }
            Err(err) => {
                // Preserved behavior: a codec that cannot start ends the
                // stream silently instead of raising.
                log::warn!("codec init failed, ending stream: {}", err);
                self.state = State::Done;
            }
        }
    }

    fn fail(&mut self, err: CodecError, written: usize) -> Result<TurnOutcome, Error> {
        self.state = State::Done;
        match err {
            CodecError::Data(msg) => {
                log::debug!("corrupt stream data: {}", msg);
                Err(Error::Corrupt(msg))
            }
            other => {
                // Preserved behavior: non-corruption codec failures finish
                // the stream silently.
                log::warn!("codec failed, finishing stream: {}", other);
                Ok(TurnOutcome { written, next: Next::End })
            }
        }
    }
}
