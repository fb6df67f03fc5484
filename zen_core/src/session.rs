//! Multi-exercise practice session.
//!
//! Runs a list of exercises back to back on one sequencer, moving to the
//! next exercise as soon as the current one completes. Every plan is
//! validated up front so a bad setting can't abort a session halfway.

use crate::config::{Config, ExerciseSettings};
use crate::events::SequencerObserver;
use crate::plan::ExercisePlan;
use crate::sequencer::ExerciseSequencer;
use crate::{Error, ExerciseKind, Result};

/// Outcome of a single session tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStep {
    /// Not started, stopped, or already finished
    Idle,
    /// Current exercise still in progress
    Continuing,
    /// An exercise completed and the next one has started
    ExerciseFinished(ExerciseKind),
    /// The last exercise completed
    SessionFinished(ExerciseKind),
}

pub struct PracticeSession {
    plans: Vec<ExercisePlan>,
    position: usize,
    sequencer: ExerciseSequencer,
    completed: Vec<ExerciseKind>,
    finished: bool,
}

impl PracticeSession {
    /// Build a session running `order` with the given timings
    pub fn new(settings: &ExerciseSettings, order: &[ExerciseKind]) -> Result<Self> {
        let plans = order
            .iter()
            .map(|&kind| ExercisePlan::from_source(kind, settings))
            .collect::<Result<Vec<_>>>()?;

        let first = plans
            .first()
            .cloned()
            .ok_or_else(|| Error::Config("practice session needs at least one exercise".into()))?;

        tracing::info!(
            "Practice session: {}",
            order
                .iter()
                .map(|k| k.display_name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(Self {
            plans,
            position: 0,
            sequencer: ExerciseSequencer::from_plan(first),
            completed: Vec::new(),
            finished: false,
        })
    }

    /// Build the configured session
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.exercises, &config.session.order)
    }

    /// Register a listener on the underlying sequencer
    pub fn add_observer<O>(&mut self, observer: O)
    where
        O: SequencerObserver + 'static,
    {
        self.sequencer.add_observer(observer);
    }

    pub fn sequencer(&self) -> &ExerciseSequencer {
        &self.sequencer
    }

    pub fn current_kind(&self) -> Option<ExerciseKind> {
        if self.finished {
            None
        } else {
            Some(self.sequencer.kind())
        }
    }

    /// Zero-based index of the current exercise
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Exercises completed so far, in order
    pub fn completed(&self) -> &[ExerciseKind] {
        &self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn start(&mut self) {
        if self.finished {
            tracing::warn!("Practice session already finished");
            return;
        }
        self.sequencer.start();
    }

    pub fn tick(&mut self, delta_seconds: f64) -> SessionStep {
        if self.finished || !self.sequencer.is_running() {
            return SessionStep::Idle;
        }

        self.sequencer.tick(delta_seconds);
        if !self.sequencer.is_complete() {
            return SessionStep::Continuing;
        }

        let kind = self.sequencer.kind();
        self.completed.push(kind);
        if self.advance() {
            SessionStep::ExerciseFinished(kind)
        } else {
            SessionStep::SessionFinished(kind)
        }
    }

    /// Stop the current exercise without moving on
    pub fn stop(&mut self) {
        self.sequencer.stop();
    }

    /// Abandon the current exercise and start the next one.
    ///
    /// The skipped exercise is not counted as completed. Returns the kind now
    /// running, or None if that was the last exercise.
    pub fn skip(&mut self) -> Option<ExerciseKind> {
        if self.finished {
            return None;
        }
        let skipped = self.sequencer.kind();
        self.sequencer.stop();
        tracing::info!("Skipped {}", skipped);

        if self.advance() {
            Some(self.sequencer.kind())
        } else {
            None
        }
    }

    fn advance(&mut self) -> bool {
        self.position += 1;
        match self.plans.get(self.position) {
            Some(plan) => {
                self.sequencer.replace_plan(plan.clone());
                self.sequencer.start();
                true
            }
            None => {
                self.finished = true;
                tracing::info!(
                    "Practice session finished ({} of {} completed)",
                    self.completed.len(),
                    self.plans.len()
                );
                false
            }
        }
    }
}
