//! Sessions driven against the on-disk playlist, ratings log and state file.

use std::path::Path;

use tempfile::TempDir;
use vidrate_core::model::{Phase, RatingTriple};
use vidrate_core::playlist::FilePlaylistSource;
use vidrate_core::sink::CsvRatingsLog;
use vidrate_core::store::JsonStateStore;
use vidrate_core::{ControllerOptions, Effect, Event, SessionRunner, SessionState};

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    let playlists = dir.path().join("playlists");
    std::fs::create_dir_all(&playlists).unwrap();
    std::fs::write(playlists.join("playlist70.cfg"), "t.mp4\n").unwrap();
    std::fs::write(playlists.join("playlist71.cfg"), "a.mp4\nb.mp4\n").unwrap();
    dir
}

fn start(root: &Path) -> (SessionRunner, Vec<Effect>) {
    SessionRunner::start(
        ControllerOptions::default(),
        Box::new(FilePlaylistSource::new(root.join("playlists"), "cfg")),
        Box::new(CsvRatingsLog::new(
            root.join("data/ratings.csv"),
            root.join("exports"),
        )),
        Box::new(JsonStateStore::new(root.join("data/session.json"))),
    )
    .unwrap()
}

fn rate(runner: &mut SessionRunner, v: u8, s: u8, av: u8) -> Vec<Effect> {
    runner.dispatch(Event::ClipFinished).unwrap();
    runner
        .dispatch(Event::RatingSubmitted(RatingTriple::new(v, s, av).into()))
        .unwrap()
}

#[test]
fn complete_session_writes_log_and_export() {
    let dir = setup();
    let root = dir.path();

    let (mut runner, first) = start(root);
    assert_eq!(first, vec![Effect::PromptTesterId]);

    runner.dispatch(Event::TesterIdEntered("7".into())).unwrap();
    let effects = rate(&mut runner, 1, 1, 1);
    assert!(effects.contains(&Effect::OfferRealPhase));
    assert_eq!(runner.state(), SessionState::TrainingComplete);

    runner.dispatch(Event::StartRealPhase).unwrap();
    rate(&mut runner, 3, 4, 3);
    let effects = rate(&mut runner, 5, 5, 5);
    assert_eq!(effects.last(), Some(&Effect::ShowCompletion));
    assert_eq!(runner.state(), SessionState::SessionComplete);

    let log = std::fs::read_to_string(root.join("data/ratings.csv")).unwrap();
    assert_eq!(
        log,
        "7, UserID: 7, 0, 0, 0\n7, a.mp4, 3, 4, 3\n7, b.mp4, 5, 5, 5\n"
    );
    assert_eq!(
        std::fs::read_to_string(root.join("exports/ratings.csv")).unwrap(),
        log
    );
}

#[test]
fn interrupted_session_resumes_in_real_phase() {
    let dir = setup();
    let root = dir.path();

    {
        let (mut runner, _) = start(root);
        runner.dispatch(Event::TesterIdEntered("7".into())).unwrap();
        rate(&mut runner, 1, 1, 1);
        runner.dispatch(Event::StartRealPhase).unwrap();
        rate(&mut runner, 3, 4, 3);
        runner.suspend().unwrap();
    }

    let state: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(root.join("data/session.json")).unwrap())
            .unwrap();
    assert_eq!(state["testerId"], 7);
    assert_eq!(state["isTrainingSession"], false);
    assert_eq!(state["currentVideoIndex"], 1);
    assert_eq!(state["realPlaylistName"], "playlist71");

    let (mut runner, first) = start(root);
    assert_eq!(runner.state(), SessionState::Playing(Phase::Real));
    assert!(matches!(
        first.as_slice(),
        [Effect::PlayClip { index: 1, clip, .. }] if clip == "b.mp4"
    ));

    rate(&mut runner, 5, 5, 5);
    assert_eq!(runner.state(), SessionState::SessionComplete);

    // The marker row is written once, when the real phase first starts.
    let log = std::fs::read_to_string(root.join("data/ratings.csv")).unwrap();
    assert_eq!(log.matches("UserID").count(), 1);
    assert!(log.ends_with("7, b.mp4, 5, 5, 5\n"));
}

#[test]
fn corrupt_state_file_starts_fresh() {
    let dir = setup();
    let root = dir.path();
    std::fs::create_dir_all(root.join("data")).unwrap();
    std::fs::write(root.join("data/session.json"), "{ not json").unwrap();

    let (runner, first) = start(root);
    assert_eq!(runner.state(), SessionState::AwaitingTesterId);
    assert!(first.contains(&Effect::PromptTesterId));
}
