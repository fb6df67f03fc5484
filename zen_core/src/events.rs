//! Notifications raised by the exercise sequencer.
//!
//! Observers are invoked synchronously from inside `start`, `tick`, `stop`
//! and `reset`, in the order phases are traversed. Audio cues, haptics and
//! session bookkeeping all hang off this trait.

use crate::{ExerciseKind, Phase};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Listener for sequencer lifecycle notifications
///
/// Every method has a no-op default so listeners only implement what they need.
pub trait SequencerObserver {
    /// A phase just became current (including the first phase on `start`)
    fn on_phase_enter(&mut self, _kind: ExerciseKind, _phase: Phase, _round: u32) {}

    /// All rounds finished. Raised once per completed run, always last.
    fn on_complete(&mut self, _kind: ExerciseKind) {}

    /// `stop()` was called; tear down anything started on phase entry
    fn on_stop(&mut self) {}

    /// `reset()` was called
    fn on_reset(&mut self) {}
}

/// A recorded sequencer notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SequencerEvent {
    PhaseEntered {
        kind: ExerciseKind,
        phase: Phase,
        round: u32,
    },
    Completed {
        kind: ExerciseKind,
    },
    Stopped,
    Reset,
}

/// Observer that records every notification into a shared buffer
///
/// Clones share the same buffer, so one handle can be registered with the
/// sequencer while another is kept for reading.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<SequencerEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<SequencerEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<SequencerEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn phase_entries(&self) -> Vec<(Phase, u32)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SequencerEvent::PhaseEntered { phase, round, .. } => Some((*phase, *round)),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SequencerEvent::Completed { .. }))
            .count()
    }

    fn push(&self, event: SequencerEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl SequencerObserver for EventLog {
    fn on_phase_enter(&mut self, kind: ExerciseKind, phase: Phase, round: u32) {
        self.push(SequencerEvent::PhaseEntered { kind, phase, round });
    }

    fn on_complete(&mut self, kind: ExerciseKind) {
        self.push(SequencerEvent::Completed { kind });
    }

    fn on_stop(&mut self) {
        self.push(SequencerEvent::Stopped);
    }

    fn on_reset(&mut self) {
        self.push(SequencerEvent::Reset);
    }
}
