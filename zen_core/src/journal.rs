//! Journal of completed exercises.
//!
//! One JSON object per line, oldest first. Appends hold an exclusive `fs2`
//! lock for the whole write, and every record starts on a fresh line even
//! when an earlier writer died halfway through its own.

use crate::{ExerciseRecord, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Destination for completed exercise records
pub trait RecordSink {
    fn append(&mut self, record: &ExerciseRecord) -> Result<()>;
}

/// The `journal.jsonl` file under the data directory
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every readable record in the journal
    pub fn records(&self) -> Result<Vec<ExerciseRecord>> {
        read_records(&self.path)
    }
}

impl RecordSink for JsonlJournal {
    fn append(&mut self, record: &ExerciseRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut entry = serde_json::to_vec(record)?;
        entry.push(b'\n');

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        file.lock_exclusive()?;
        let written = write_entry(&mut file, &entry);
        file.unlock()?;
        written?;

        tracing::debug!("Journaled {} ({})", record.kind, record.id);
        Ok(())
    }
}

/// Whether the last line of the journal is missing its newline
fn ends_mid_line(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Caller holds the exclusive lock
fn write_entry(file: &mut File, entry: &[u8]) -> Result<()> {
    if ends_mid_line(file)? {
        tracing::warn!("Journal ends with a partial line; starting the record on a new line");
        file.write_all(b"\n")?;
    }
    file.write_all(entry)?;
    file.sync_data()?;
    Ok(())
}

/// Read all records from a journal file
///
/// A missing file is an empty journal. Lines that don't parse, such as the
/// tail of an interrupted append, are skipped with a warning.
pub fn read_records(path: &Path) -> Result<Vec<ExerciseRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut file = File::open(path)?;
    file.lock_shared()?;
    let mut contents = String::new();
    let read = file.read_to_string(&mut contents);
    file.unlock()?;
    read?;

    let mut skipped = 0;
    let records: Vec<ExerciseRecord> = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                skipped += 1;
                tracing::warn!("Skipping journal line {}: {}", index + 1, e);
                None
            }
        })
        .collect();

    tracing::debug!(
        "Read {} records from journal ({} unreadable lines)",
        records.len(),
        skipped
    );
    Ok(records)
}
