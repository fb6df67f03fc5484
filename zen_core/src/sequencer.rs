//! Exercise phase/timer state machine.
//!
//! The sequencer has no clock of its own. Whoever owns it calls
//! [`ExerciseSequencer::tick`] with the seconds elapsed since the previous
//! call (10 Hz from the CLI, any cadence from tests).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Stopped | Complete)
//!   ^                        |
//!   +-------- reset ---------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut seq = ExerciseSequencer::new(ExerciseKind::Kegel, &settings)?;
//! seq.add_observer(cues);
//! seq.start();
//! // In a loop:
//! seq.tick(0.1);
//! ```

use std::fmt;

use serde::Serialize;

use crate::events::SequencerObserver;
use crate::plan::{ExercisePlan, TimingSource};
use crate::{ExerciseKind, Phase, Result};

/// Remaining time at or below this counts as the phase boundary.
const BOUNDARY_EPSILON: f64 = 1e-6;

/// Per-exercise state machine driving phases, rounds and progress.
pub struct ExerciseSequencer {
    plan: ExercisePlan,
    phase_index: usize,
    rounds_remaining: u32,
    current_round: u32,
    /// Seconds left in the current phase. Everything else is derived from it.
    phase_remaining: f64,
    running: bool,
    complete: bool,
    observers: Vec<Box<dyn SequencerObserver>>,
}

/// Consistent point-in-time readout for presentation layers
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SequencerSnapshot {
    pub kind: ExerciseKind,
    pub phase: Phase,
    pub phase_label: &'static str,
    pub phase_index: usize,
    pub phase_progress: f64,
    pub overall_progress: f64,
    pub phase_remaining: f64,
    pub phase_remaining_display: u32,
    pub total_remaining: f64,
    pub current_round: u32,
    pub rounds_remaining: u32,
    pub total_rounds: u32,
    pub is_running: bool,
    pub is_complete: bool,
}

impl SequencerSnapshot {
    /// Whole-exercise countdown as `MM:SS`, rounded up to the next second
    pub fn formatted_total_remaining(&self) -> String {
        let secs = ceil_seconds(self.total_remaining);
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

impl ExerciseSequencer {
    /// Create a sequencer for `kind` using the timings from `source`.
    ///
    /// Fails with `InvalidConfiguration` if any phase duration or the round
    /// count for `kind` is not positive.
    pub fn new<S>(kind: ExerciseKind, source: &S) -> Result<Self>
    where
        S: TimingSource + ?Sized,
    {
        Ok(Self::from_plan(ExercisePlan::from_source(kind, source)?))
    }

    /// Create a sequencer from an already validated plan.
    pub fn from_plan(plan: ExercisePlan) -> Self {
        let mut sequencer = Self {
            rounds_remaining: plan.rounds(),
            phase_remaining: plan.duration(0),
            plan,
            phase_index: 0,
            current_round: 1,
            running: false,
            complete: false,
            observers: Vec::new(),
        };
        sequencer.restore_initial();
        sequencer
    }

    /// Register a listener. Listeners survive `reset` and `reconfigure`.
    pub fn add_observer<O>(&mut self, observer: O)
    where
        O: SequencerObserver + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> ExerciseKind {
        self.plan.kind()
    }

    pub fn plan(&self) -> &ExercisePlan {
        &self.plan
    }

    pub fn phase(&self) -> Phase {
        self.plan.phase(self.phase_index)
    }

    pub fn phase_label(&self) -> &'static str {
        self.phase().label()
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn rounds_remaining(&self) -> u32 {
        self.rounds_remaining
    }

    pub fn total_rounds(&self) -> u32 {
        self.plan.rounds()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn phase_duration(&self) -> f64 {
        self.plan.duration(self.phase_index)
    }

    pub fn phase_remaining(&self) -> f64 {
        self.phase_remaining
    }

    pub fn phase_elapsed(&self) -> f64 {
        (self.phase_duration() - self.phase_remaining).max(0.0)
    }

    pub fn total_duration(&self) -> f64 {
        self.plan.total_duration()
    }

    /// Sum of the durations of every phase instance not yet finished.
    pub fn total_remaining(&self) -> f64 {
        if self.complete {
            return 0.0;
        }
        let later_rounds = self.rounds_remaining.saturating_sub(1);
        let remaining = self.phase_remaining
            + self.plan.duration_after(self.phase_index)
            + self.plan.round_duration() * f64::from(later_rounds);
        remaining.clamp(0.0, self.total_duration())
    }

    pub fn total_elapsed(&self) -> f64 {
        (self.total_duration() - self.total_remaining()).max(0.0)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        ratio(self.phase_elapsed(), self.phase_duration())
    }

    /// 0.0 .. 1.0 progress across the whole exercise, by elapsed time.
    pub fn overall_progress(&self) -> f64 {
        if self.complete {
            return 1.0;
        }
        ratio(self.total_elapsed(), self.total_duration())
    }

    /// Whole seconds left in the phase, rounded up.
    ///
    /// Never shows 0 while the phase still has time left; 0 only once the
    /// exercise has finished.
    pub fn phase_remaining_display(&self) -> u32 {
        if self.phase_remaining <= 0.0 {
            return 0;
        }
        ceil_seconds(self.phase_remaining).max(1)
    }

    /// Build a full state snapshot.
    pub fn snapshot(&self) -> SequencerSnapshot {
        let phase = self.phase();
        SequencerSnapshot {
            kind: self.kind(),
            phase,
            phase_label: phase.label(),
            phase_index: self.phase_index,
            phase_progress: self.phase_progress(),
            overall_progress: self.overall_progress(),
            phase_remaining: self.phase_remaining,
            phase_remaining_display: self.phase_remaining_display(),
            total_remaining: self.total_remaining(),
            current_round: self.current_round,
            rounds_remaining: self.rounds_remaining,
            total_rounds: self.total_rounds(),
            is_running: self.running,
            is_complete: self.complete,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or restart) the current phase and start accepting ticks.
    ///
    /// Does nothing while already running. A completed sequencer stays
    /// complete until `reset()`. After `stop()` the interrupted phase is
    /// re-entered from its full duration.
    pub fn start(&mut self) {
        if self.running {
            tracing::debug!("{} already running, ignoring start", self.kind());
            return;
        }
        if self.complete {
            tracing::warn!(
                "{} already complete, reset before starting again",
                self.kind()
            );
            return;
        }

        tracing::info!(
            "Starting {} ({} rounds, {:.1}s)",
            self.kind(),
            self.total_rounds(),
            self.total_duration()
        );
        self.running = true;
        self.enter_phase();
    }

    /// Advance the clock by `delta_seconds`.
    ///
    /// Time that overshoots a phase boundary is carried into the next phase,
    /// so a single call may cross several phases (each one raising its own
    /// entry notification). Negative or non-finite deltas count as zero.
    pub fn tick(&mut self, delta_seconds: f64) {
        if !self.running {
            return;
        }

        let mut leftover = if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };

        loop {
            let step = leftover.min(self.phase_remaining);
            self.phase_remaining -= step;
            leftover -= step;

            if self.phase_remaining > BOUNDARY_EPSILON {
                break;
            }

            self.phase_remaining = 0.0;
            self.advance_phase();

            if !self.running || leftover <= 0.0 {
                break;
            }
        }
    }

    /// Stop ticking and freeze all counters. Safe to call at any time.
    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(
                "Stopping {} during {} (round {})",
                self.kind(),
                self.phase_label(),
                self.current_round
            );
        }
        self.running = false;
        for observer in &mut self.observers {
            observer.on_stop();
        }
    }

    /// Return to the freshly constructed state, ready for `start()`.
    pub fn reset(&mut self) {
        tracing::debug!("Resetting {}", self.kind());
        self.restore_initial();
        for observer in &mut self.observers {
            observer.on_reset();
        }
    }

    /// Switch to `kind` with new timings, discarding all progress.
    ///
    /// The new timings are validated first; on error nothing changes. A
    /// running sequencer is stopped before the switch. Timing state is always
    /// rebuilt, even when the kind is unchanged.
    pub fn reconfigure<S>(&mut self, kind: ExerciseKind, source: &S) -> Result<()>
    where
        S: TimingSource + ?Sized,
    {
        let plan = ExercisePlan::from_source(kind, source)?;
        self.replace_plan(plan);
        Ok(())
    }

    /// Same as `reconfigure` for an already validated plan.
    pub fn replace_plan(&mut self, plan: ExercisePlan) {
        if self.running {
            self.stop();
        }
        tracing::debug!("Reconfiguring {} -> {}", self.kind(), plan.kind());
        self.plan = plan;
        self.restore_initial();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn restore_initial(&mut self) {
        self.phase_index = 0;
        self.current_round = 1;
        self.rounds_remaining = self.plan.rounds();
        self.phase_remaining = self.plan.duration(0);
        self.running = false;
        self.complete = false;
    }

    fn enter_phase(&mut self) {
        self.phase_remaining = self.phase_duration();

        let kind = self.kind();
        let phase = self.phase();
        let round = self.current_round;
        tracing::debug!(
            "{}: entering {} (round {}/{})",
            kind,
            phase,
            round,
            self.total_rounds()
        );

        for observer in &mut self.observers {
            observer.on_phase_enter(kind, phase, round);
        }
    }

    fn advance_phase(&mut self) {
        self.phase_index = (self.phase_index + 1) % self.plan.phase_count();

        if self.phase_index != 0 {
            self.enter_phase();
            return;
        }

        // Full round finished.
        self.rounds_remaining = self.rounds_remaining.saturating_sub(1);
        if self.rounds_remaining == 0 {
            self.finish();
        } else {
            self.current_round += 1;
            self.enter_phase();
        }
    }

    fn finish(&mut self) {
        self.running = false;
        self.complete = true;
        self.phase_remaining = 0.0;

        let kind = self.kind();
        tracing::info!("{} complete", kind);
        for observer in &mut self.observers {
            observer.on_complete(kind);
        }
    }
}

impl fmt::Debug for ExerciseSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExerciseSequencer")
            .field("plan", &self.plan)
            .field("phase_index", &self.phase_index)
            .field("rounds_remaining", &self.rounds_remaining)
            .field("current_round", &self.current_round)
            .field("phase_remaining", &self.phase_remaining)
            .field("running", &self.running)
            .field("complete", &self.complete)
            .field("observers", &self.observers.len())
            .finish()
    }
}

fn ratio(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    (part / whole).clamp(0.0, 1.0)
}

fn ceil_seconds(seconds: f64) -> u32 {
    // Float residue (3.0000000001) must not bump the display a whole second.
    (seconds - BOUNDARY_EPSILON).max(0.0).ceil() as u32
}
