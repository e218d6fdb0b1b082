//! JSON persistence of the session state.
//!
//! The session is stored as one flat key-value object, replaced atomically
//! on every save:
//!
//! ```json
//! {
//!   "currentVideoIndex": 3,
//!   "testerId": 7,
//!   "trainingPlaylistName": "playlist70",
//!   "realPlaylistName": "playlist71",
//!   "isTrainingSession": false,
//!   "sessionComplete": false,
//!   "savedAt": "2025-01-01T00:00:00Z"
//! }
//! ```
//!
//! `testerId` is `-1` while no tester has been identified.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::model::{Phase, Session, TesterId};
use crate::traits::StateStore;

/// On-disk form of a [`Session`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub current_video_index: usize,
    #[serde(default = "unset_tester")]
    pub tester_id: i64,
    #[serde(default)]
    pub training_playlist_name: String,
    #[serde(default)]
    pub real_playlist_name: String,
    #[serde(default = "default_true")]
    pub is_training_session: bool,
    #[serde(default)]
    pub session_complete: bool,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

fn unset_tester() -> i64 {
    -1
}

fn default_true() -> bool {
    true
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            current_video_index: session.current_index,
            tester_id: session.tester_id.map(i64::from).unwrap_or(-1),
            training_playlist_name: session.training_playlist.clone(),
            real_playlist_name: session.real_playlist.clone(),
            is_training_session: session.phase.is_training(),
            session_complete: session.complete,
            saved_at: Some(Utc::now()),
        }
    }
}

impl From<PersistedSession> for Session {
    fn from(p: PersistedSession) -> Self {
        Self {
            tester_id: TesterId::try_from(p.tester_id).ok().filter(|&id| id > 0),
            phase: if p.is_training_session {
                Phase::Training
            } else {
                Phase::Real
            },
            current_index: p.current_video_index,
            training_playlist: p.training_playlist_name,
            real_playlist: p.real_playlist_name,
            complete: p.session_complete,
        }
    }
}

/// Stores the session as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the raw persisted record, including the save timestamp.
    pub fn load_persisted(&self) -> SessionResult<Option<PersistedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        let persisted = serde_json::from_str(&content).map_err(|e| self.error(e))?;
        Ok(Some(persisted))
    }

    fn error(&self, e: impl std::fmt::Display) -> SessionError {
        SessionError::StateStore {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> SessionResult<Option<Session>> {
        Ok(self.load_persisted()?.map(Session::from))
    }

    fn save(&self, session: &Session) -> SessionResult<()> {
        let json = serde_json::to_string_pretty(&PersistedSession::from(session))
            .map_err(|e| self.error(e))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.error(e))?;

        tracing::debug!(
            "saved session state (index {}, {} phase) to {}",
            session.current_index,
            session.phase,
            self.path.display()
        );
        Ok(())
    }
}
