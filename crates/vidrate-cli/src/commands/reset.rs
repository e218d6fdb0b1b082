//! The `vidrate reset` command.

use std::path::PathBuf;

use anyhow::Result;

use vidrate_core::config::load_config_from;
use vidrate_core::controller::SessionController;
use vidrate_core::traits::StateStore;
use vidrate_core::Effect;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = config.state_store();

    let session = store.load().unwrap_or_else(|e| {
        tracing::warn!("{e}; overwriting");
        None
    });
    let Some(session) = session.filter(|s| s.tester_id.is_some()) else {
        println!("No tester in progress, nothing to reset.");
        return Ok(());
    };

    let (mut controller, _) = SessionController::resume(config.controller_options(), session);
    for effect in controller.restart() {
        if let Effect::PersistState(session) = effect {
            store.save(&session)?;
        }
    }

    println!("Session reset. The next `vidrate session` asks for a tester ID.");
    println!("Recorded ratings in {} are kept.", config.ratings_path().display());
    Ok(())
}
