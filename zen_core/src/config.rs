//! Configuration file support for Zen.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/zen/config.toml`.

use crate::plan::{ExercisePlan, TimingSource};
use crate::{Error, ExerciseKind, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub exercises: ExerciseSettings,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Per-exercise timings, editable by the user
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ExerciseSettings {
    #[serde(default)]
    pub kegel: KegelSettings,

    #[serde(default)]
    pub box_breathing: BoxBreathingSettings,

    #[serde(default)]
    pub meditation: MeditationSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KegelSettings {
    #[serde(default = "default_kegel_phase")]
    pub contract_seconds: f64,

    #[serde(default = "default_kegel_phase")]
    pub relax_seconds: f64,

    #[serde(default = "default_kegel_rounds")]
    pub rounds: i32,
}

impl Default for KegelSettings {
    fn default() -> Self {
        Self {
            contract_seconds: default_kegel_phase(),
            relax_seconds: default_kegel_phase(),
            rounds: default_kegel_rounds(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoxBreathingSettings {
    #[serde(default = "default_box_phase")]
    pub inhale_seconds: f64,

    #[serde(default = "default_box_phase")]
    pub hold_inhale_seconds: f64,

    #[serde(default = "default_box_phase")]
    pub exhale_seconds: f64,

    #[serde(default = "default_box_phase")]
    pub hold_exhale_seconds: f64,

    #[serde(default = "default_box_rounds")]
    pub rounds: i32,
}

impl Default for BoxBreathingSettings {
    fn default() -> Self {
        Self {
            inhale_seconds: default_box_phase(),
            hold_inhale_seconds: default_box_phase(),
            exhale_seconds: default_box_phase(),
            hold_exhale_seconds: default_box_phase(),
            rounds: default_box_rounds(),
        }
    }
}

/// Meditation is configured in minutes and always runs a single round
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MeditationSettings {
    #[serde(default = "default_meditation_minutes")]
    pub duration_minutes: f64,
}

impl Default for MeditationSettings {
    fn default() -> Self {
        Self {
            duration_minutes: default_meditation_minutes(),
        }
    }
}

/// Practice session configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Exercises run by `zen run`, in order
    #[serde(default = "default_order")]
    pub order: Vec<ExerciseKind>,

    /// Clock rate used to drive the sequencer
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            tick_hz: default_tick_hz(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local/share")
    });
    base.join("zen")
}

fn default_kegel_phase() -> f64 {
    5.0
}

fn default_kegel_rounds() -> i32 {
    10
}

fn default_box_phase() -> f64 {
    4.0
}

fn default_box_rounds() -> i32 {
    4
}

fn default_meditation_minutes() -> f64 {
    5.0
}

fn default_order() -> Vec<ExerciseKind> {
    ExerciseKind::ALL.to_vec()
}

fn default_tick_hz() -> u32 {
    10
}

impl TimingSource for ExerciseSettings {
    fn phase_durations(&self, kind: ExerciseKind) -> Vec<f64> {
        match kind {
            ExerciseKind::Kegel => vec![self.kegel.contract_seconds, self.kegel.relax_seconds],
            ExerciseKind::BoxBreathing => vec![
                self.box_breathing.inhale_seconds,
                self.box_breathing.hold_inhale_seconds,
                self.box_breathing.exhale_seconds,
                self.box_breathing.hold_exhale_seconds,
            ],
            ExerciseKind::Meditation => vec![self.meditation.duration_minutes * 60.0],
        }
    }

    fn round_count(&self, kind: ExerciseKind) -> i64 {
        match kind {
            ExerciseKind::Kegel => i64::from(self.kegel.rounds),
            ExerciseKind::BoxBreathing => i64::from(self.box_breathing.rounds),
            ExerciseKind::Meditation => 1,
        }
    }
}

impl ExerciseSettings {
    /// Check every exercise, reporting the first invalid one
    pub fn validate(&self) -> Result<()> {
        for kind in ExerciseKind::ALL {
            ExercisePlan::from_source(kind, self)?;
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        base.join("zen").join("config.toml")
    }

    /// Reject settings that would stop a session from starting
    pub fn validate(&self) -> Result<()> {
        if self.session.order.is_empty() {
            return Err(Error::Config("session order must name at least one exercise".into()));
        }
        if self.session.tick_hz == 0 {
            return Err(Error::Config("tick_hz must be at least 1".into()));
        }
        self.exercises.validate()
    }

    /// Seconds between clock ticks
    pub fn tick_interval_seconds(&self) -> f64 {
        1.0 / f64::from(self.session.tick_hz.max(1))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml_string()?)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
