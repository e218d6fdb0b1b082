//! Trait definitions for the I/O collaborators of a session.
//!
//! The controller never touches the filesystem itself. The session runner
//! executes its effects against these traits; the file-backed
//! implementations live in `playlist`, `sink` and `store`, and in-memory
//! ones for tests in `mock`.

use std::path::PathBuf;

use crate::error::SessionResult;
use crate::model::{RatingRecord, Session};
use crate::playlist::Playlist;

// ---------------------------------------------------------------------------
// Playlist source
// ---------------------------------------------------------------------------

/// Resolves a playlist reference (e.g. `playlist70`) to its clips.
pub trait PlaylistSource {
    /// Load the playlist named by `reference`.
    ///
    /// Fails with [`SessionError::PlaylistLoad`](crate::error::SessionError)
    /// if the manifest is missing or unreadable.
    fn load(&self, reference: &str) -> SessionResult<Playlist>;
}

// ---------------------------------------------------------------------------
// Ratings sink
// ---------------------------------------------------------------------------

/// Append-only destination for rating records.
pub trait RecordSink {
    /// Append one record. Each call is a complete write; nothing is buffered
    /// between calls.
    fn append(&self, record: &RatingRecord) -> SessionResult<()>;

    /// Copy the accumulated log to the user-visible export location and
    /// return where it was written. The internal log is left untouched.
    fn export(&self) -> SessionResult<PathBuf>;
}

// ---------------------------------------------------------------------------
// Session state store
// ---------------------------------------------------------------------------

/// Key-value persistence of the session across suspension.
pub trait StateStore {
    /// Load the persisted session, or `None` if nothing was saved yet.
    fn load(&self) -> SessionResult<Option<Session>>;

    /// Persist the whole session, replacing what was saved before.
    fn save(&self, session: &Session) -> SessionResult<()>;
}
