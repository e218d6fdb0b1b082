//! In-memory collaborators for testing sessions without touching the disk.
//!
//! Clones share their state, so a test can hand one clone to the runner and
//! inspect the other.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{SessionError, SessionResult};
use crate::model::{RatingRecord, Session};
use crate::playlist::Playlist;
use crate::traits::{PlaylistSource, RecordSink, StateStore};

fn io_error(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::PermissionDenied, message.to_string())
}

/// Playlists keyed by reference; unknown references fail to load.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlaylists {
    playlists: HashMap<String, Playlist>,
}

impl MemoryPlaylists {
    pub fn with(mut self, reference: &str, clips: &[&str]) -> Self {
        self.playlists
            .insert(reference.to_string(), clips.iter().copied().collect());
        self
    }
}

impl PlaylistSource for MemoryPlaylists {
    fn load(&self, reference: &str) -> SessionResult<Playlist> {
        self.playlists
            .get(reference)
            .cloned()
            .ok_or_else(|| SessionError::PlaylistLoad {
                reference: reference.to_string(),
                path: PathBuf::from(reference),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such playlist"),
            })
    }
}

/// Records appended lines and counts export calls.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
    exports: Arc<AtomicU32>,
    failing: bool,
}

impl MemorySink {
    /// A sink whose appends and exports all fail.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    /// Lines successfully appended so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Number of export attempts, successful or not.
    pub fn export_count(&self) -> u32 {
        self.exports.load(Ordering::Relaxed)
    }
}

impl RecordSink for MemorySink {
    fn append(&self, record: &RatingRecord) -> SessionResult<()> {
        if self.failing {
            return Err(SessionError::SinkWrite {
                path: PathBuf::from("memory"),
                source: io_error("sink is read-only"),
            });
        }
        self.lines.lock().unwrap().push(record.to_string());
        Ok(())
    }

    fn export(&self) -> SessionResult<PathBuf> {
        self.exports.fetch_add(1, Ordering::Relaxed);
        if self.failing {
            return Err(SessionError::Export {
                path: PathBuf::from("memory-export"),
                source: io_error("export denied"),
            });
        }
        Ok(PathBuf::from("memory-export/ratings.csv"))
    }
}

/// Holds the last saved session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Option<Session>>>,
    corrupt: bool,
}

impl MemoryStore {
    /// A store whose contents cannot be read back.
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Default::default()
        }
    }

    pub fn saved(&self) -> Option<Session> {
        self.saved.lock().unwrap().clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> SessionResult<Option<Session>> {
        if self.corrupt {
            return Err(SessionError::StateStore {
                path: PathBuf::from("memory"),
                message: "unreadable".into(),
            });
        }
        Ok(self.saved())
    }

    fn save(&self, session: &Session) -> SessionResult<()> {
        *self.saved.lock().unwrap() = Some(session.clone());
        Ok(())
    }
}
