//! The `vidrate export` command.

use std::path::PathBuf;

use anyhow::Result;

use vidrate_core::config::load_config_from;
use vidrate_core::traits::RecordSink;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let log = config.ratings_log();

    anyhow::ensure!(
        log.path().exists(),
        "no ratings recorded yet: {} does not exist",
        log.path().display()
    );

    let target = log.export()?;
    println!("Ratings file exported to {}", target.display());
    Ok(())
}
