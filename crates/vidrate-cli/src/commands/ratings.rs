//! The `vidrate ratings` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use vidrate_core::config::load_config_from;

pub fn execute(
    config_path: Option<PathBuf>,
    tester: Option<u32>,
    include_markers: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let records: Vec<_> = config
        .ratings_log()
        .read_records()?
        .into_iter()
        .filter(|r| tester.map_or(true, |id| r.tester_id == id))
        .filter(|r| include_markers || !r.is_session_marker())
        .collect();

    if records.is_empty() {
        println!("No ratings recorded.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Tester", "Clip", "Video", "Sound", "Audiovisual"]);
    for r in &records {
        table.add_row(vec![
            Cell::new(r.tester_id),
            Cell::new(&r.clip),
            Cell::new(r.scores.video),
            Cell::new(r.scores.sound),
            Cell::new(r.scores.audiovisual),
        ]);
    }

    println!("{table}");
    println!("{} rating(s)", records.len());
    Ok(())
}
