//! The `vidrate validate` command.

use std::path::PathBuf;

use anyhow::Result;

use vidrate_core::config::load_config_from;
use vidrate_core::model::{clip_resource_name, playlist_references};
use vidrate_core::playlist::validate_playlist;
use vidrate_core::traits::PlaylistSource;

use crate::player::resolve_clip;

pub fn execute(config_path: Option<PathBuf>, tester_id: u32) -> Result<()> {
    anyhow::ensure!(tester_id > 0, "tester id must be a positive number");
    let config = load_config_from(config_path.as_deref())?;
    let source = config.playlist_source();
    let check_clips = config.clip_dir.is_dir();

    let (training, real) = playlist_references(&config.playlist_prefix, tester_id);
    let mut total_warnings = 0;
    let mut failed = 0;

    for (phase, reference) in [("training", training), ("real", real)] {
        let playlist = match source.load(&reference) {
            Ok(playlist) => playlist,
            Err(e) => {
                println!("Playlist: {reference} ({phase})");
                println!("  ERROR: {e}");
                failed += 1;
                continue;
            }
        };
        println!("Playlist: {reference} ({phase}, {} clips)", playlist.len());

        let mut warnings: Vec<(Option<usize>, String)> = validate_playlist(&playlist)
            .into_iter()
            .map(|w| (w.index, w.message))
            .collect();

        if check_clips {
            for (i, clip) in playlist.clips().iter().enumerate() {
                let resource = clip_resource_name(clip);
                if !resource.is_empty() && resolve_clip(&config.clip_dir, resource)?.is_none() {
                    warnings.push((Some(i), format!("no file for {clip} in clip directory")));
                }
            }
        }

        for (index, message) in &warnings {
            let prefix = index
                .map(|i| format!("  [line {}]", i + 1))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {message}");
        }
        total_warnings += warnings.len();
    }

    anyhow::ensure!(failed == 0, "{failed} playlist(s) could not be loaded");

    if total_warnings == 0 {
        println!("All playlists valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
