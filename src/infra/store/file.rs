//! File-backed store.
//!
//! Entries are written as JSON lines, one entry per line. A save writes a
//! sibling temp file and renames it over the previous snapshot so a crash
//! mid-write never leaves a truncated schedule behind.

use std::fs::{create_dir_all, rename, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{ScheduleEntry, ScheduleStore, SchedulerError};

/// JSON-lines schedule store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    name: String,
}

impl JsonFileStore {
    /// Open (creating the directory if needed) the store `name` under `dir`.
    pub fn new(dir: impl AsRef<Path>, name: impl Into<String>) -> Result<Self, SchedulerError> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir).map_err(|e| SchedulerError::Backend(e.to_string()))?;
        Ok(Self {
            dir,
            name: name.into(),
        })
    }

    /// Path of the snapshot file.
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(format!("{}.jsonl", self.name))
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!("{}.jsonl.tmp", self.name))
    }
}

impl ScheduleStore for JsonFileStore {
    fn load(&self) -> Result<Vec<ScheduleEntry>, SchedulerError> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&file_path).map_err(|e| SchedulerError::Backend(e.to_string()))?;
        let mut entries = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| SchedulerError::Backend(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ScheduleEntry = serde_json::from_str(&line).map_err(|e| {
                SchedulerError::Backend(format!("{}:{}: {e}", file_path.display(), lineno + 1))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn save(&mut self, entries: &[ScheduleEntry]) -> Result<(), SchedulerError> {
        let temp_path = self.temp_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| SchedulerError::Backend(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            let line =
                serde_json::to_string(entry).map_err(|e| SchedulerError::Backend(e.to_string()))?;
            writeln!(writer, "{line}").map_err(|e| SchedulerError::Backend(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| SchedulerError::Backend(e.to_string()))?;
        drop(writer);
        rename(&temp_path, self.file_path()).map_err(|e| SchedulerError::Backend(e.to_string()))
    }
}
