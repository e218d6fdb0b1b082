//! Playlist manifest loader.
//!
//! A manifest is plain text with one clip identifier per line. Lines are
//! trimmed but never filtered: a blank line becomes an empty identifier.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{SessionError, SessionResult};
use crate::traits::PlaylistSource;

/// Ordered clip identifiers for one phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    clips: Vec<String>,
}

impl Playlist {
    pub fn new(clips: Vec<String>) -> Self {
        Self { clips }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.clips.get(index).map(String::as_str)
    }

    pub fn clips(&self) -> &[String] {
        &self.clips
    }
}

impl<S: Into<String>> FromIterator<S> for Playlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Parse manifest text into a playlist.
pub fn parse_manifest(content: &str) -> Playlist {
    content.lines().map(str::trim).collect()
}

/// Loads manifests from `<dir>/<reference>.<extension>`.
#[derive(Debug, Clone)]
pub struct FilePlaylistSource {
    dir: PathBuf,
    extension: String,
}

impl FilePlaylistSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Path of the manifest for `reference`.
    pub fn manifest_path(&self, reference: &str) -> PathBuf {
        if self.extension.is_empty() {
            self.dir.join(reference)
        } else {
            self.dir.join(format!("{reference}.{}", self.extension))
        }
    }
}

impl PlaylistSource for FilePlaylistSource {
    fn load(&self, reference: &str) -> SessionResult<Playlist> {
        let path = self.manifest_path(reference);
        let playlist = load_manifest(&path).map_err(|source| SessionError::PlaylistLoad {
            reference: reference.to_string(),
            path: path.clone(),
            source,
        })?;
        tracing::debug!(
            "loaded playlist {reference} ({} clips) from {}",
            playlist.len(),
            path.display()
        );
        Ok(playlist)
    }
}

fn load_manifest(path: &Path) -> std::io::Result<Playlist> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_manifest(&content))
}

/// A warning from playlist validation.
#[derive(Debug, Clone)]
pub struct PlaylistWarning {
    /// Zero-based position in the playlist (if applicable).
    pub index: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check a playlist for entries that are probably mistakes.
pub fn validate_playlist(playlist: &Playlist) -> Vec<PlaylistWarning> {
    let mut warnings = Vec::new();

    if playlist.is_empty() {
        warnings.push(PlaylistWarning {
            index: None,
            message: "playlist is empty".into(),
        });
        return warnings;
    }

    let mut seen = HashSet::new();
    for (i, clip) in playlist.clips().iter().enumerate() {
        if clip.is_empty() {
            warnings.push(PlaylistWarning {
                index: Some(i),
                message: "blank line is kept as an empty clip".into(),
            });
        } else if !seen.insert(clip.as_str()) {
            warnings.push(PlaylistWarning {
                index: Some(i),
                message: format!("duplicate clip: {clip}"),
            });
        }
    }

    warnings
}
