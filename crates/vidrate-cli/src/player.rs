//! Clip playback.
//!
//! Playback itself is delegated to an external program. A clip identifier
//! such as `a.mp4` is resolved by its resource name (`a`) against the files
//! in the clip directory, so the manifest's extension does not have to match
//! the file on disk.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

/// Plays a clip and returns once playback has finished.
pub trait ClipPlayer {
    fn play(&mut self, clip: &str, resource: &str) -> Result<()>;
}

/// Finishes every clip immediately.
pub struct AutoPlayer;

impl ClipPlayer for AutoPlayer {
    fn play(&mut self, _clip: &str, _resource: &str) -> Result<()> {
        Ok(())
    }
}

/// Runs a command line such as `mpv --really-quiet {}` per clip, `{}` being
/// replaced with the clip path.
pub struct CommandPlayer {
    template: Vec<String>,
    clip_dir: PathBuf,
}

impl CommandPlayer {
    pub fn new(template: &str, clip_dir: &Path) -> Result<Self> {
        let template: Vec<String> = template.split_whitespace().map(String::from).collect();
        anyhow::ensure!(!template.is_empty(), "player_command is empty");
        Ok(Self {
            template,
            clip_dir: clip_dir.to_path_buf(),
        })
    }

    fn command_for(&self, path: &Path) -> Command {
        let path = path.to_string_lossy();
        let mut args = self.template.iter().map(|arg| arg.replace("{}", &path));
        let program = args.next().unwrap_or_default();
        let mut command = Command::new(program);
        command.args(args);
        command
    }
}

impl ClipPlayer for CommandPlayer {
    fn play(&mut self, clip: &str, resource: &str) -> Result<()> {
        let path = resolve_clip(&self.clip_dir, resource)?
            .with_context(|| format!("no file for clip {clip} in {}", self.clip_dir.display()))?;

        tracing::debug!("playing {}", path.display());
        let status = self
            .command_for(&path)
            .status()
            .with_context(|| format!("failed to start player for {}", path.display()))?;
        if !status.success() {
            tracing::warn!("player exited with {status} for {clip}");
        }
        Ok(())
    }
}

/// Find the file in `clip_dir` whose name without extension is `resource`.
pub fn resolve_clip(clip_dir: &Path, resource: &str) -> Result<Option<PathBuf>> {
    if resource.is_empty() {
        return Ok(None);
    }
    let entries = std::fs::read_dir(clip_dir)
        .with_context(|| format!("failed to read clip directory: {}", clip_dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.file_stem().is_some_and(|stem| stem == resource) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}
