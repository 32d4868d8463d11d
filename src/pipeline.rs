//! pipeline.rs
//! Ordered transform stages composed behind the single codec interface.
//!
//! A pipeline is itself a [`Codec`], so either reader can drive it exactly
//! like a lone codec, and pipelines nest. Between consecutive stages sits
//! one fixed-size joint buffer; a stage only ever produces into the free
//! tail of its joint, so at most one buffer's worth of bytes is in flight
//! between neighbours and no stage can flood the next.

use crate::codec::{Codec, FinishOutcome, FinishStatus, StepOutcome, StepStatus};
use crate::config::validate_chunk_size;
use crate::constants::DEFAULT_CHUNK_SIZE;
use crate::error::{CodecError, Error};
use crate::session::State;

/// Hand-off buffer between two neighbouring stages.
struct Joint {
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl Joint {
    fn new(size: usize) -> Self {
        Self { buf: vec![0u8; size].into_boxed_slice(), pos: 0, len: 0 }
    }

    fn window(&self) -> &[u8] {
        &self.buf[self.pos..self.len]
    }

    fn free_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    fn consume(&mut self, n: usize) {
        self.pos += n;
        if self.pos == self.len {
            self.pos = 0;
            self.len = 0;
        }
    }

    fn commit(&mut self, n: usize) {
        self.len += n;
    }

    fn is_empty(&self) -> bool {
        self.pos == self.len
    }
}

struct Stage {
    codec: Box<dyn Codec>,
    state: State,
}

/// Ordered list of transforms applied stage-by-stage.
///
/// Stages are uniform capability objects: each is polymorphic only over
/// "advance with bounded input and output." The composite reports
/// stream-end only once every stage has independently finished.
pub struct Pipeline {
    stages: Vec<Stage>,
    joints: Vec<Joint>,
    joint_size: usize,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new(), joints: Vec::new(), joint_size: DEFAULT_CHUNK_SIZE }
    }

    pub fn with_joint_size(joint_size: usize) -> Result<Self, Error> {
        validate_chunk_size(joint_size)?;
        Ok(Self { stages: Vec::new(), joints: Vec::new(), joint_size })
    }

    /// Append a stage. Stages run in push order; add them all before the
    /// pipeline is first driven.
    pub fn push(&mut self, codec: Box<dyn Codec>) {
        self.stages.push(Stage { codec, state: State::Waiting });
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn all_done(&self) -> bool {
        self.stages.iter().all(|stage| stage.state == State::Done)
    }

    /// One upstream-to-downstream pass. Returns whether any bytes moved or
    /// any stage changed state; callers sweep until nothing moves.
    fn advance_stages(
        &mut self,
        input: &[u8],
        consumed: &mut usize,
        out: &mut [u8],
        produced: &mut usize,
    ) -> Result<bool, CodecError> {
        let last = self.stages.len() - 1;
        let mut moved = false;
        for i in 0..self.stages.len() {
            // A finished predecessor with a drained joint is this stage's
            // end-of-input.
            if i > 0
                && self.stages[i - 1].state == State::Done
                && self.joints[i - 1].is_empty()
                && self.stages[i].state == State::Active
            {
                self.stages[i].state = State::Finishing;
                moved = true;
            }

            let (upstream, downstream) = self.joints.split_at_mut(i);
            let stage = &mut self.stages[i];
            match stage.state {
                State::Active => {
                    let in_window: &[u8] = if i == 0 {
                        &input[*consumed..]
                    } else {
                        upstream[i - 1].window()
                    };
                    if in_window.is_empty() {
                        continue;
                    }
                    let out_free: &mut [u8] = if i == last {
                        &mut out[*produced..]
                    } else {
                        downstream[0].free_mut()
                    };
                    if out_free.is_empty() {
                        continue;
                    }
                    let outcome = stage.codec.step(in_window, out_free)?;
                    if i == 0 {
                        *consumed += outcome.consumed;
                    } else {
                        upstream[i - 1].consume(outcome.consumed);
                    }
                    if i == last {
                        *produced += outcome.produced;
                    } else {
                        downstream[0].commit(outcome.produced);
                    }
                    if outcome.consumed > 0 || outcome.produced > 0 {
                        moved = true;
                    }
                    if outcome.status == StepStatus::StreamEnd {
                        stage.state = State::Done;
                        moved = true;
                    }
                }
                State::Finishing => {
                    let out_free: &mut [u8] = if i == last {
                        &mut out[*produced..]
                    } else {
                        downstream[0].free_mut()
                    };
                    if out_free.is_empty() {
                        continue;
                    }
                    let outcome = stage.codec.finish(out_free)?;
                    if i == last {
                        *produced += outcome.produced;
                    } else {
                        downstream[0].commit(outcome.produced);
                    }
                    if outcome.produced > 0 {
                        moved = true;
                    }
                    if outcome.status == FinishStatus::StreamEnd {
                        stage.state = State::Done;
                        moved = true;
                    }
                }
                State::Waiting | State::Done => {}
            }
        }
        Ok(moved)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for Pipeline {
    fn init(&mut self) -> Result<(), CodecError> {
        self.joints = (0..self.stages.len().saturating_sub(1))
            .map(|_| Joint::new(self.joint_size))
            .collect();
        for stage in &mut self.stages {
            stage.codec.init()?;
            stage.state = State::Active;
        }
        Ok(())
    }

    fn step(&mut self, input: &[u8], out: &mut [u8]) -> Result<StepOutcome, CodecError> {
        if self.stages.is_empty() {
            // Identity transform: a bounded copy.
            let n = input.len().min(out.len());
            out[..n].copy_from_slice(&input[..n]);
            let status = if n < input.len() { StepStatus::BufferFull } else { StepStatus::Ok };
            return Ok(StepOutcome { consumed: n, produced: n, status });
        }
        let mut consumed = 0;
        let mut produced = 0;
        while self.advance_stages(input, &mut consumed, out, &mut produced)? {}
        let status = if self.all_done() {
            StepStatus::StreamEnd
        } else if produced == out.len() {
            StepStatus::BufferFull
        } else {
            StepStatus::Ok
        };
        Ok(StepOutcome { consumed, produced, status })
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<FinishOutcome, CodecError> {
        if self.stages.is_empty() {
            return Ok(FinishOutcome { produced: 0, status: FinishStatus::StreamEnd });
        }
        if self.stages[0].state == State::Active {
            self.stages[0].state = State::Finishing;
        }
        let mut consumed = 0;
        let mut produced = 0;
        while self.advance_stages(&[], &mut consumed, out, &mut produced)? {}
        let status = if self.all_done() {
            FinishStatus::StreamEnd
        } else if produced > 0 {
            FinishStatus::Ok
        } else {
            FinishStatus::BufferFull
        };
        Ok(FinishOutcome { produced, status })
    }
}
