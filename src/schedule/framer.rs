use std::iter::Peekable;

use crate::foundation::core::FrameNo;
use crate::puzzle::model::Puzzle;

/// Entrance/exit animation state of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ramp {
    /// Vertex markers and theme text fading in; fraction in `[0, 1]`.
    Appear(f64),
    /// Finalized shapes shrinking and fading out; fraction in `[0, 1]`.
    Decay(f64),
}

/// One globally numbered frame: an owned puzzle snapshot plus how to draw it.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub puzzle: Puzzle,
    pub ramp: Option<Ramp>,
    /// When set, only this many characters of the theme are shown and the footer is hidden.
    pub text_reveal: Option<usize>,
    pub frame_no: FrameNo,
    /// How many consecutive frame numbers this frame occupies (at least 1).
    pub repeats: u64,
    /// Unfinished shapes in `puzzle` at this frame.
    pub remaining: usize,
}

impl Frame {
    pub fn appear(&self) -> Option<f64> {
        match self.ramp {
            Some(Ramp::Appear(t)) => Some(t),
            _ => None,
        }
    }

    pub fn decay(&self) -> Option<f64> {
        match self.ramp {
            Some(Ramp::Decay(t)) => Some(t),
            _ => None,
        }
    }

    /// Frame numbers covered by this frame, first to last.
    pub fn frame_numbers(&self) -> impl Iterator<Item = FrameNo> + use<> {
        let start = self.frame_no.0;
        (start..start + self.repeats.max(1)).map(FrameNo)
    }
}

/// Timing of the entrance/exit ramps.
#[derive(Clone, Debug)]
pub struct FramerOpts {
    /// Ramp length in steps; each ramp has `ramp_steps + 1` frames.
    pub ramp_steps: u32,
    /// Repeats of the last appear frame before the walk starts.
    pub appear_hold: u64,
    /// Repeats of the first decay frame when a run renders a single file.
    pub final_hold_single: u64,
    /// Repeats of the first decay frame when a run renders several files.
    pub final_hold_batch: u64,
}

impl Default for FramerOpts {
    fn default() -> Self {
        Self {
            ramp_steps: 30,
            appear_hold: 30,
            final_hold_single: 60 * 5,
            final_hold_batch: 60,
        }
    }
}

impl FramerOpts {
    /// Final-state hold for a run over `total_files` inputs.
    pub fn final_hold(&self, total_files: usize) -> u64 {
        if total_files == 1 {
            self.final_hold_single
        } else {
            self.final_hold_batch
        }
    }
}

/// Hands out contiguous frame numbers across every file of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameClock {
    next: FrameNo,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `repeats` consecutive numbers and return the first.
    pub fn take(&mut self, repeats: u64) -> FrameNo {
        let at = self.next;
        self.next = at.offset(repeats.max(1));
        at
    }

    /// Total frame numbers handed out so far.
    pub fn total(&self) -> u64 {
        self.next.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Appear(u32),
    Walk,
    Decay(u32),
    Done,
}

/// Wraps a raw walk with appear/decay ramps and assigns global frame numbers.
///
/// The first raw frame is replaced by the appear ramp and the last one by the decay ramp; every
/// raw frame in between passes through unchanged. A walk of `n` raw frames therefore becomes
/// `n + 2 * ramp_steps` frames (a single raw frame feeds both ramps).
pub struct Framer<'c, I: Iterator<Item = Puzzle>> {
    raw: Peekable<I>,
    opts: FramerOpts,
    final_hold: u64,
    clock: &'c mut FrameClock,
    phase: Phase,
    first: Option<Puzzle>,
    last: Option<Puzzle>,
}

impl<'c, I: Iterator<Item = Puzzle>> Framer<'c, I> {
    pub fn new(raw: I, opts: FramerOpts, final_hold: u64, clock: &'c mut FrameClock) -> Self {
        let mut raw = raw.peekable();
        let first = raw.next();
        let phase = if first.is_some() {
            Phase::Appear(0)
        } else {
            Phase::Done
        };
        Self {
            raw,
            opts,
            final_hold,
            clock,
            phase,
            first,
            last: None,
        }
    }

    fn emit(
        &mut self,
        puzzle: Puzzle,
        ramp: Option<Ramp>,
        text_reveal: Option<usize>,
        repeats: u64,
    ) -> Frame {
        let repeats = repeats.max(1);
        let frame_no = self.clock.take(repeats);
        let remaining = puzzle.remaining();
        Frame {
            puzzle,
            ramp,
            text_reveal,
            frame_no,
            repeats,
            remaining,
        }
    }

    fn fraction(&self, i: u32) -> f64 {
        if self.opts.ramp_steps == 0 {
            1.0
        } else {
            f64::from(i) / f64::from(self.opts.ramp_steps)
        }
    }
}

impl<I: Iterator<Item = Puzzle>> Iterator for Framer<'_, I> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        loop {
            match self.phase {
                Phase::Appear(i) => {
                    let steps = self.opts.ramp_steps;
                    let base = self.first.clone()?;
                    let repeats = if i == steps { self.opts.appear_hold } else { 1 };
                    self.phase = if i == steps {
                        if self.raw.peek().is_none() {
                            self.last = self.first.take();
                            Phase::Decay(0)
                        } else {
                            self.first = None;
                            Phase::Walk
                        }
                    } else {
                        Phase::Appear(i + 1)
                    };
                    let t = self.fraction(i);
                    return Some(self.emit(
                        base,
                        Some(Ramp::Appear(t)),
                        Some(i as usize),
                        repeats,
                    ));
                }
                Phase::Walk => {
                    let Some(p) = self.raw.next() else {
                        self.phase = Phase::Done;
                        continue;
                    };
                    if self.raw.peek().is_none() {
                        self.last = Some(p);
                        self.phase = Phase::Decay(0);
                        continue;
                    }
                    return Some(self.emit(p, None, None, 1));
                }
                Phase::Decay(i) => {
                    let steps = self.opts.ramp_steps;
                    let base = self.last.clone()?;
                    let (text_reveal, repeats) = if i == 0 {
                        (None, self.final_hold)
                    } else {
                        (Some((steps - i) as usize), 1)
                    };
                    self.phase = if i == steps {
                        self.last = None;
                        Phase::Done
                    } else {
                        Phase::Decay(i + 1)
                    };
                    let t = self.fraction(i);
                    return Some(self.emit(base, Some(Ramp::Decay(t)), text_reveal, repeats));
                }
                Phase::Done => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/framer.rs"]
mod tests;
