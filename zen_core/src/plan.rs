//! Resolved phase timings for a single exercise.
//!
//! A [`TimingSource`] is anything that can report per-kind phase durations
//! and round counts (the settings file, a test fixture, a remote profile).
//! [`ExercisePlan`] is the validated snapshot the sequencer runs against.

use crate::{Error, ExerciseKind, Phase, Result};
use serde::Serialize;

/// Supplier of exercise timings, keyed by kind
pub trait TimingSource {
    /// Durations in seconds, one per entry of `kind.phases()`, in order
    fn phase_durations(&self, kind: ExerciseKind) -> Vec<f64>;

    /// Number of rounds for `kind`
    fn round_count(&self, kind: ExerciseKind) -> i64;
}

/// One phase of a round together with its duration
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct PhaseSpec {
    pub phase: Phase,
    pub duration_seconds: f64,
}

/// Validated timing snapshot for one exercise kind
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExercisePlan {
    kind: ExerciseKind,
    phases: Vec<PhaseSpec>,
    rounds: u32,
}

impl ExercisePlan {
    /// Resolve and validate the plan for `kind` from a timing source
    pub fn from_source<S>(kind: ExerciseKind, source: &S) -> Result<Self>
    where
        S: TimingSource + ?Sized,
    {
        Self::new(kind, &source.phase_durations(kind), source.round_count(kind))
    }

    /// Build a plan from raw durations and a round count
    ///
    /// Rejects non-positive or non-finite durations, a duration list that
    /// does not match the kind's phase list, and round counts below one.
    /// Meditation is a single round.
    pub fn new(kind: ExerciseKind, durations: &[f64], rounds: i64) -> Result<Self> {
        let phases = kind.phases();

        if durations.len() != phases.len() {
            return Err(Error::InvalidConfiguration(format!(
                "{} expects {} phase durations, got {}",
                kind.display_name(),
                phases.len(),
                durations.len()
            )));
        }

        for (phase, &duration) in phases.iter().zip(durations) {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(Error::InvalidConfiguration(format!(
                    "{} phase '{}' must last longer than 0 seconds (got {})",
                    kind.display_name(),
                    phase.label(),
                    duration
                )));
            }
        }

        if rounds <= 0 {
            return Err(Error::InvalidConfiguration(format!(
                "{} needs at least one round (got {})",
                kind.display_name(),
                rounds
            )));
        }

        if kind == ExerciseKind::Meditation && rounds != 1 {
            return Err(Error::InvalidConfiguration(format!(
                "Meditation runs exactly one round (got {})",
                rounds
            )));
        }

        let rounds = u32::try_from(rounds).map_err(|_| {
            Error::InvalidConfiguration(format!(
                "{} round count {} is too large",
                kind.display_name(),
                rounds
            ))
        })?;

        Ok(Self {
            kind,
            phases: phases
                .iter()
                .zip(durations)
                .map(|(&phase, &duration_seconds)| PhaseSpec {
                    phase,
                    duration_seconds,
                })
                .collect(),
            rounds,
        })
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        &self.phases
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Phase at `index`. Callers keep `index < phase_count()`.
    pub fn phase(&self, index: usize) -> Phase {
        self.phases[index].phase
    }

    /// Duration of the phase at `index`. Callers keep `index < phase_count()`.
    pub fn duration(&self, index: usize) -> f64 {
        self.phases[index].duration_seconds
    }

    /// Length of one full round
    pub fn round_duration(&self) -> f64 {
        self.phases.iter().map(|p| p.duration_seconds).sum()
    }

    /// Length of the whole exercise
    pub fn total_duration(&self) -> f64 {
        self.round_duration() * f64::from(self.rounds)
    }

    /// Combined duration of the phases after `index` within one round
    pub fn duration_after(&self, index: usize) -> f64 {
        self.phases
            .iter()
            .skip(index + 1)
            .map(|p| p.duration_seconds)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        durations: Vec<f64>,
        rounds: i64,
    }

    impl TimingSource for Fixed {
        fn phase_durations(&self, _kind: ExerciseKind) -> Vec<f64> {
            self.durations.clone()
        }

        fn round_count(&self, _kind: ExerciseKind) -> i64 {
            self.rounds
        }
    }

    #[test]
    fn test_totals() {
        let plan = ExercisePlan::new(ExerciseKind::BoxBreathing, &[4.0, 2.0, 6.0, 1.0], 3).unwrap();
        assert_eq!(plan.round_duration(), 13.0);
        assert_eq!(plan.total_duration(), 39.0);
        assert_eq!(plan.duration_after(0), 9.0);
        assert_eq!(plan.duration_after(3), 0.0);
        assert_eq!(plan.phase(1), Phase::HoldInhale);
    }

    #[test]
    fn test_rejects_zero_duration() {
        let err = ExercisePlan::new(ExerciseKind::Kegel, &[5.0, 0.0], 3).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(ref m) if m.contains("Relax")));
    }

    #[test]
    fn test_rejects_nan_duration() {
        let result = ExercisePlan::new(ExerciseKind::Kegel, &[f64::NAN, 5.0], 3);
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rejects_zero_rounds() {
        let result = ExercisePlan::new(ExerciseKind::Kegel, &[5.0, 5.0], 0);
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rejects_wrong_phase_count() {
        let source = Fixed {
            durations: vec![4.0, 4.0],
            rounds: 1,
        };
        let result = ExercisePlan::from_source(ExerciseKind::BoxBreathing, &source);
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_meditation_is_single_round() {
        assert!(ExercisePlan::new(ExerciseKind::Meditation, &[600.0], 1).is_ok());
        assert!(ExercisePlan::new(ExerciseKind::Meditation, &[600.0], 2).is_err());
    }
}
