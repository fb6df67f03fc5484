//! Core domain types for the Zen practice system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise kinds and their fixed phase lists
//! - Completed exercise records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Exercise Kinds
// ============================================================================

/// Type of guided exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Kegel,
    #[serde(alias = "boxBreathing")]
    BoxBreathing,
    Meditation,
}

impl ExerciseKind {
    /// Every kind, in the default practice order
    pub const ALL: [ExerciseKind; 3] = [
        ExerciseKind::Kegel,
        ExerciseKind::BoxBreathing,
        ExerciseKind::Meditation,
    ];

    /// The ordered phase list traversed once per round
    pub fn phases(self) -> &'static [Phase] {
        match self {
            ExerciseKind::Kegel => &[Phase::Contract, Phase::Relax],
            ExerciseKind::BoxBreathing => &[
                Phase::Inhale,
                Phase::HoldInhale,
                Phase::Exhale,
                Phase::HoldExhale,
            ],
            ExerciseKind::Meditation => &[Phase::Meditate],
        }
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            ExerciseKind::Kegel => "Kegel Exercise",
            ExerciseKind::BoxBreathing => "Box Breathing",
            ExerciseKind::Meditation => "Meditation",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "kegel" => Ok(ExerciseKind::Kegel),
            "boxbreathing" | "box" => Ok(ExerciseKind::BoxBreathing),
            "meditation" | "meditate" => Ok(ExerciseKind::Meditation),
            _ => Err(format!(
                "unknown exercise '{}' (expected kegel, box-breathing or meditation)",
                s
            )),
        }
    }
}

// ============================================================================
// Phases
// ============================================================================

/// A named sub-step within one round of an exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Contract,
    Relax,
    Inhale,
    HoldInhale,
    Exhale,
    HoldExhale,
    Meditate,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Contract => "Contract",
            Phase::Relax => "Relax",
            Phase::Inhale => "Inhale",
            Phase::HoldInhale => "Hold Inhale",
            Phase::Exhale => "Exhale",
            Phase::HoldExhale => "Hold Exhale",
            Phase::Meditate => "Meditate",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Records
// ============================================================================

/// A completed exercise, as written to the journal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: Uuid,
    pub kind: ExerciseKind,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Configured length of the whole exercise
    pub duration_seconds: f64,
    pub rounds: u32,
}

impl ExerciseRecord {
    pub fn new(
        kind: ExerciseKind,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        duration_seconds: f64,
        rounds: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            started_at,
            completed_at,
            duration_seconds,
            rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_lists_are_fixed() {
        assert_eq!(ExerciseKind::Kegel.phases(), &[Phase::Contract, Phase::Relax]);
        assert_eq!(ExerciseKind::BoxBreathing.phases().len(), 4);
        assert_eq!(ExerciseKind::Meditation.phases(), &[Phase::Meditate]);
    }

    #[test]
    fn test_parse_kind_spellings() {
        assert_eq!("kegel".parse::<ExerciseKind>(), Ok(ExerciseKind::Kegel));
        assert_eq!(
            "box-breathing".parse::<ExerciseKind>(),
            Ok(ExerciseKind::BoxBreathing)
        );
        assert_eq!(
            "boxBreathing".parse::<ExerciseKind>(),
            Ok(ExerciseKind::BoxBreathing)
        );
        assert_eq!(
            "Meditation".parse::<ExerciseKind>(),
            Ok(ExerciseKind::Meditation)
        );
        assert!("yoga".parse::<ExerciseKind>().is_err());
    }

    #[test]
    fn test_kind_serde_accepts_camel_case_alias() {
        let kind: ExerciseKind = serde_json::from_str("\"boxBreathing\"").unwrap();
        assert_eq!(kind, ExerciseKind::BoxBreathing);
        assert_eq!(
            serde_json::to_string(&ExerciseKind::BoxBreathing).unwrap(),
            "\"box_breathing\""
        );
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::HoldInhale.label(), "Hold Inhale");
        assert_eq!(Phase::HoldExhale.to_string(), "Hold Exhale");
    }
}
