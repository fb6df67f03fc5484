//! Daily practice progress with file locking.
//!
//! Tracks which exercises were completed on each calendar day and persists
//! the map as JSON. Readers take a shared lock on the file; writers
//! serialize on a `.lock` sidecar and replace the file by atomic rename.

use crate::{Error, ExerciseKind, ExerciseRecord, Result};
use chrono::{Datelike, Local, NaiveDate};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Exercises completed on one day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub completed: BTreeSet<ExerciseKind>,
}

impl DailyProgress {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            completed: BTreeSet::new(),
        }
    }

    /// Fraction of all exercise kinds completed that day, 0.0 ..= 1.0
    pub fn completion_percentage(&self) -> f64 {
        self.completed.len() as f64 / ExerciseKind::ALL.len() as f64
    }

    pub fn is_full(&self) -> bool {
        self.completed.len() == ExerciseKind::ALL.len()
    }
}

/// Aggregate view of one calendar month
#[derive(Clone, Debug, PartialEq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Days with at least one completed exercise
    pub days_practiced: u32,
    /// Days with every exercise completed
    pub full_days: u32,
    /// Mean completion over every day of the month, practiced or not
    pub average_completion: f64,
}

/// Per-day progress for every recorded date
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ProgressStore {
    pub days: BTreeMap<NaiveDate, DailyProgress>,
}

impl ProgressStore {
    /// Mark `kind` as done on `date`. Recording twice on one day is harmless.
    ///
    /// Returns true if this was the first completion of `kind` that day.
    pub fn record(&mut self, kind: ExerciseKind, date: NaiveDate) -> bool {
        let inserted = self
            .days
            .entry(date)
            .or_insert_with(|| DailyProgress::new(date))
            .completed
            .insert(kind);
        tracing::debug!("Recorded {} on {} (new: {})", kind, date, inserted);
        inserted
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DailyProgress> {
        self.days.get(&date)
    }

    /// Completion fraction for `date`, 0.0 when nothing was recorded
    pub fn completion_on(&self, date: NaiveDate) -> f64 {
        self.day(date)
            .map(DailyProgress::completion_percentage)
            .unwrap_or(0.0)
    }

    /// Summarize `year`-`month`. Fails on an invalid month.
    pub fn month_summary(&self, year: i32, month: u32) -> Result<MonthSummary> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::State(format!("Invalid month {}-{:02}", year, month)))?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| Error::State(format!("Month {}-{:02} out of range", year, month)))?;

        let days_in_month = (next_first - first).num_days() as u32;

        let in_month = self
            .days
            .range(first..next_first)
            .map(|(_, day)| day)
            .filter(|day| !day.completed.is_empty());

        let mut days_practiced = 0;
        let mut full_days = 0;
        let mut completion_sum = 0.0;
        for day in in_month {
            days_practiced += 1;
            if day.is_full() {
                full_days += 1;
            }
            completion_sum += day.completion_percentage();
        }

        Ok(MonthSummary {
            year: first.year(),
            month: first.month(),
            days_in_month,
            days_practiced,
            full_days,
            average_completion: completion_sum / f64::from(days_in_month),
        })
    }

    /// Load progress from a file with shared locking
    ///
    /// Returns an empty store if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No progress file found, starting fresh");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open progress file {:?}: {}. Starting fresh.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock progress file {:?}: {}. Starting fresh.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read progress file {:?}: {}. Starting fresh.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<ProgressStore>(&contents) {
            Ok(store) => {
                tracing::debug!("Loaded {} days of progress from {:?}", store.days.len(), path);
                Ok(store)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse progress file {:?}: {}. Starting fresh.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save progress to a file
    ///
    /// Holds the store's writer lock while a temp file in the same directory
    /// is written, synced and renamed over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let lock = WriterLock::acquire(path)?;
        self.write_atomic(path)?;
        lock.release()
    }

    /// Load, modify and save back under a single writer lock
    ///
    /// Concurrent callers are serialized, so each one sees the changes of
    /// the previous one.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut ProgressStore) -> Result<()>,
    {
        let lock = WriterLock::acquire(path)?;
        let mut store = Self::load(path)?;
        f(&mut store)?;
        store.write_atomic(path)?;
        lock.release()?;
        Ok(store)
    }

    /// Record a finished exercise on the local date it completed
    pub fn record_exercise(path: &Path, record: &ExerciseRecord) -> Result<Self> {
        let completed_on = record.completed_at.with_timezone(&Local).date_naive();
        Self::update(path, |store| {
            store.record(record.kind, completed_on);
            Ok(())
        })
    }

    fn write_atomic(&self, path: &Path) -> Result<()> {
        let parent = progress_dir(path)?;
        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved progress to {:?}", path);
        Ok(())
    }
}

fn progress_dir(path: &Path) -> Result<&Path> {
    path.parent()
        .ok_or_else(|| Error::State(format!("Progress path {:?} has no parent", path)))
}

/// Exclusive lock on `<progress file>.lock`
///
/// The progress file itself is replaced on every save, so writers agree on
/// this sidecar instead. It is never deleted. Dropping the guard releases
/// the lock as well.
struct WriterLock {
    file: File,
}

impl WriterLock {
    fn acquire(path: &Path) -> Result<Self> {
        let parent = progress_dir(path)?;
        std::fs::create_dir_all(parent)?;

        let mut name = path
            .file_name()
            .ok_or_else(|| Error::State(format!("Progress path {:?} has no file name", path)))?
            .to_os_string();
        name.push(".lock");

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(parent.join(name))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    fn release(self) -> Result<()> {
        self.file.unlock()?;
        Ok(())
    }
}
