//! The `vidrate status` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use comfy_table::{Cell, Table};

use vidrate_core::config::load_config_from;
use vidrate_core::model::Session;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = config.state_store();

    let Some(persisted) = store.load_persisted()? else {
        println!("No saved session in {}", store.path().display());
        return Ok(());
    };
    let saved_at = persisted
        .saved_at
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let session = Session::from(persisted);

    let Some(tester_id) = session.tester_id else {
        println!("No tester identified yet (saved {saved_at}).");
        return Ok(());
    };

    let progress = if session.complete {
        "complete".to_string()
    } else {
        format!("{} phase, clip {}", session.phase, session.current_index + 1)
    };

    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Tester"), Cell::new(tester_id)]);
    table.add_row(vec![Cell::new("Progress"), Cell::new(progress)]);
    table.add_row(vec![
        Cell::new("Training playlist"),
        Cell::new(&session.training_playlist),
    ]);
    table.add_row(vec![
        Cell::new("Real playlist"),
        Cell::new(&session.real_playlist),
    ]);
    table.add_row(vec![Cell::new("Saved"), Cell::new(saved_at)]);

    println!("{table}");
    Ok(())
}
