//! vidrate configuration.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::controller::ControllerOptions;
use crate::playlist::FilePlaylistSource;
use crate::rating::{RatingScale, DEFAULT_SCALE};
use crate::sink::CsvRatingsLog;
use crate::store::JsonStateStore;

/// Top-level vidrate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VidrateConfig {
    /// Directory holding the playlist manifests.
    #[serde(default = "default_playlist_dir")]
    pub playlist_dir: PathBuf,
    /// Prefix of derived playlist names (`playlist` → `playlist70`).
    #[serde(default = "default_playlist_prefix")]
    pub playlist_prefix: String,
    /// Extension of manifest files, without the dot.
    #[serde(default = "default_playlist_extension")]
    pub playlist_extension: String,
    /// Directory holding the clips the player resolves against.
    #[serde(default = "default_clip_dir")]
    pub clip_dir: PathBuf,
    /// External player, e.g. `"mpv --really-quiet {}"`; `{}` is the clip path.
    #[serde(default)]
    pub player_command: Option<String>,
    /// Private storage for the ratings log and session state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Public directory the ratings log is exported to.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// File name of the ratings log inside `data_dir`.
    #[serde(default = "default_ratings_file")]
    pub ratings_file: String,
    /// File name of the persisted session inside `data_dir`.
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// Write a `UserID` marker row when a tester starts the real test.
    #[serde(default = "default_true")]
    pub session_marker: bool,
    /// Option labels shown in every rating group.
    #[serde(default = "default_rating_scale")]
    pub rating_scale: Vec<String>,
}

fn default_playlist_dir() -> PathBuf {
    PathBuf::from("./playlists")
}
fn default_playlist_prefix() -> String {
    "playlist".to_string()
}
fn default_playlist_extension() -> String {
    "cfg".to_string()
}
fn default_clip_dir() -> PathBuf {
    PathBuf::from("./clips")
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./vidrate-data")
}
fn default_export_dir() -> PathBuf {
    PathBuf::from("./exports")
}
fn default_ratings_file() -> String {
    "ratings.csv".to_string()
}
fn default_state_file() -> String {
    "session.json".to_string()
}
fn default_true() -> bool {
    true
}
fn default_rating_scale() -> Vec<String> {
    DEFAULT_SCALE.iter().map(|s| s.to_string()).collect()
}

impl Default for VidrateConfig {
    fn default() -> Self {
        Self {
            playlist_dir: default_playlist_dir(),
            playlist_prefix: default_playlist_prefix(),
            playlist_extension: default_playlist_extension(),
            clip_dir: default_clip_dir(),
            player_command: None,
            data_dir: default_data_dir(),
            export_dir: default_export_dir(),
            ratings_file: default_ratings_file(),
            state_file: default_state_file(),
            session_marker: true,
            rating_scale: default_rating_scale(),
        }
    }
}

impl VidrateConfig {
    pub fn ratings_path(&self) -> PathBuf {
        self.data_dir.join(&self.ratings_file)
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(&self.state_file)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            playlist_prefix: self.playlist_prefix.clone(),
            session_marker: self.session_marker,
        }
    }

    pub fn playlist_source(&self) -> FilePlaylistSource {
        FilePlaylistSource::new(&self.playlist_dir, &self.playlist_extension)
    }

    pub fn ratings_log(&self) -> CsvRatingsLog {
        CsvRatingsLog::new(self.ratings_path(), &self.export_dir)
    }

    pub fn state_store(&self) -> JsonStateStore {
        JsonStateStore::new(self.state_path())
    }

    pub fn scale(&self) -> Result<RatingScale> {
        RatingScale::new(self.rating_scale.clone()).map_err(|e| anyhow::anyhow!("{e}"))
    }

    /// Reject configurations the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.playlist_prefix.trim().is_empty(),
            "playlist_prefix must not be empty"
        );
        anyhow::ensure!(
            !self.ratings_file.trim().is_empty(),
            "ratings_file must not be empty"
        );
        anyhow::ensure!(
            !self.state_file.trim().is_empty(),
            "state_file must not be empty"
        );
        anyhow::ensure!(
            self.ratings_file != self.state_file,
            "ratings_file and state_file must differ"
        );
        anyhow::ensure!(
            !same_location(&self.data_dir, &self.export_dir),
            "export_dir must differ from data_dir: {}",
            self.export_dir.display()
        );
        self.scale()?;
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Whether two directory paths name the same place, lexically or on disk.
fn same_location(a: &Path, b: &Path) -> bool {
    let lexical = |p: &Path| -> PathBuf {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };
    if lexical(a) == lexical(b) {
        return true;
    }
    matches!((a.canonicalize(), b.canonicalize()), (Ok(x), Ok(y)) if x == y)
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `vidrate.toml` in the current directory
/// 2. `~/.config/vidrate/config.toml`
///
/// Environment variable overrides: `VIDRATE_PLAYLIST_DIR`, `VIDRATE_DATA_DIR`,
/// `VIDRATE_EXPORT_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<VidrateConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("vidrate.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<VidrateConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => VidrateConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("VIDRATE_PLAYLIST_DIR") {
        config.playlist_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("VIDRATE_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("VIDRATE_EXPORT_DIR") {
        config.export_dir = PathBuf::from(dir);
    }

    config.playlist_dir = resolve_path(&config.playlist_dir);
    config.clip_dir = resolve_path(&config.clip_dir);
    config.data_dir = resolve_path(&config.data_dir);
    config.export_dir = resolve_path(&config.export_dir);

    config
        .validate()
        .with_context(|| match &config_path {
            Some(path) => format!("invalid config: {}", path.display()),
            None => "invalid default config".to_string(),
        })?;

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("vidrate"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_VIDRATE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_VIDRATE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_VIDRATE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_VIDRATE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = VidrateConfig::default();
        assert_eq!(config.playlist_prefix, "playlist");
        assert_eq!(config.playlist_extension, "cfg");
        assert_eq!(config.ratings_path(), PathBuf::from("./vidrate-data/ratings.csv"));
        assert!(config.session_marker);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
playlist_dir = "/srv/playlists"
export_dir = "/srv/exports"
session_marker = false
rating_scale = ["1 - Bad", "2 - Ok", "3 - Good"]
"#;
        let config: VidrateConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.playlist_dir, PathBuf::from("/srv/playlists"));
        assert_eq!(config.state_file, "session.json");
        assert!(!config.session_marker);
        assert_eq!(config.scale().unwrap().values(), vec![1, 2, 3]);
    }

    #[test]
    fn validate_rejects_bad_scale() {
        let config = VidrateConfig {
            rating_scale: vec!["Bad".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_clashing_files() {
        let config = VidrateConfig {
            state_file: "ratings.csv".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_export_into_data_dir() {
        let config = VidrateConfig {
            data_dir: PathBuf::from("./vidrate-data"),
            export_dir: PathBuf::from("vidrate-data"),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("export_dir must differ from data_dir"));
    }

    #[test]
    fn validate_rejects_export_dir_reaching_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::create_dir_all(dir.path().join("exports")).unwrap();
        let config = VidrateConfig {
            data_dir: data,
            export_dir: dir.path().join("exports/../data"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_rejects_export_into_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vidrate.toml");
        std::fs::write(
            &path,
            "data_dir = \"/srv/vidrate\"\nexport_dir = \"/srv/vidrate\"\n",
        )
        .unwrap();

        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("export_dir must differ from data_dir"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vidrate.toml");
        std::fs::write(&path, "playlist_prefix = \"list\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.playlist_prefix, "list");
        assert_eq!(config.controller_options().playlist_prefix, "list");
    }

    #[test]
    fn load_missing_explicit_file() {
        let err = load_config_from(Some(Path::new("/no/such/vidrate.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
