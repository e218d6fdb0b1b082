//! Append-only ratings log.
//!
//! One record per line, `testerId, clip, video, sound, audiovisual`. The log
//! is opened in append mode for every record and closed again, so nothing is
//! held in memory between submissions.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::{SessionError, SessionResult};
use crate::model::RatingRecord;
use crate::traits::RecordSink;

/// Ratings log on local storage with a public export directory.
#[derive(Debug, Clone)]
pub struct CsvRatingsLog {
    path: PathBuf,
    export_dir: PathBuf,
}

impl CsvRatingsLog {
    pub fn new(path: impl Into<PathBuf>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            export_dir: export_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where [`RecordSink::export`] copies the log to.
    pub fn export_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ratings.csv"));
        self.export_dir.join(file_name)
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }

    /// Read every record back from the log.
    ///
    /// A missing log reads as empty. Lines that do not parse are skipped
    /// with a warning.
    pub fn read_records(&self) -> Result<Vec<RatingRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read ratings log: {}", self.path.display()))?;

        let mut records = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<RatingRecord>() {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("{}:{}: skipping line: {e}", self.path.display(), n + 1),
            }
        }
        Ok(records)
    }
}

impl RecordSink for CsvRatingsLog {
    fn append(&self, record: &RatingRecord) -> SessionResult<()> {
        let line = record.to_string();
        self.write_line(&line)
            .map_err(|source| SessionError::SinkWrite {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!("saved rating entry: {line}");
        Ok(())
    }

    fn export(&self) -> SessionResult<PathBuf> {
        let target = self.export_path();
        let copy = || -> std::io::Result<u64> {
            std::fs::create_dir_all(&self.export_dir)?;
            // Copying a file onto itself truncates it before reading.
            if target.exists() && target.canonicalize()? == self.path.canonicalize()? {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "export target is the ratings log itself",
                ));
            }
            std::fs::copy(&self.path, &target)
        };
        let bytes = copy().map_err(|source| SessionError::Export {
            path: target.clone(),
            source,
        })?;
        tracing::info!("exported ratings log ({bytes} bytes) to {}", target.display());
        Ok(target)
    }
}
