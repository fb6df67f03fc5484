#![forbid(unsafe_code)]

//! Core domain model and business logic for the Zen practice system.
//!
//! This crate provides:
//! - Domain types (exercise kinds, phases, records)
//! - Exercise timing plans and settings
//! - The exercise sequencer state machine and its observers
//! - Multi-exercise practice sessions
//! - Persistence (daily progress, completion journal)

pub mod types;
pub mod error;
pub mod plan;
pub mod config;
pub mod logging;
pub mod events;
pub mod sequencer;
pub mod session;
pub mod progress;
pub mod journal;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use plan::{ExercisePlan, PhaseSpec, TimingSource};
pub use config::{Config, ExerciseSettings};
pub use events::{EventLog, SequencerEvent, SequencerObserver};
pub use sequencer::{ExerciseSequencer, SequencerSnapshot};
pub use session::{PracticeSession, SessionStep};
pub use progress::{DailyProgress, MonthSummary, ProgressStore};
pub use journal::{read_records, JsonlJournal, RecordSink};
