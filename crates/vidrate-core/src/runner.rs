//! Session runner.
//!
//! Wires a [`SessionController`] to its I/O collaborators. Events go in,
//! the controller's I/O effects are executed here, and only the effects the
//! front-end has to show come back out. Recoverable I/O failures never abort
//! the session: they are logged and turned into [`Notice`]s.

use std::collections::VecDeque;

use crate::controller::{ControllerOptions, Effect, Event, Notice, SessionController, SessionState};
use crate::error::SessionResult;
use crate::model::Session;
use crate::playlist::Playlist;
use crate::traits::{PlaylistSource, RecordSink, StateStore};

/// Drives one session against a playlist source, a ratings sink and a
/// state store.
pub struct SessionRunner {
    controller: SessionController,
    playlists: Box<dyn PlaylistSource>,
    sink: Box<dyn RecordSink>,
    store: Box<dyn StateStore>,
}

impl SessionRunner {
    /// Restore the persisted session (if any) and return the first things
    /// to show.
    pub fn start(
        options: ControllerOptions,
        playlists: Box<dyn PlaylistSource>,
        sink: Box<dyn RecordSink>,
        store: Box<dyn StateStore>,
    ) -> SessionResult<(Self, Vec<Effect>)> {
        let mut notices = Vec::new();
        let session = match store.load() {
            Ok(session) => session.unwrap_or_default(),
            Err(e) if e.is_recoverable() => {
                tracing::warn!("{e}; starting a fresh session");
                notices.push(Effect::Notify(Notice::StateNotSaved));
                Session::default()
            }
            Err(e) => return Err(e),
        };

        let (controller, effects) = SessionController::resume(options, session);
        let mut runner = Self {
            controller,
            playlists,
            sink,
            store,
        };
        let mut updates = notices;
        updates.extend(runner.execute(effects)?);
        Ok((runner, updates))
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    /// Deliver an event and perform the resulting I/O.
    ///
    /// Errors are the tester-facing ones (`InvalidTesterId`,
    /// `IncompleteRating`, `InvalidTransition`), after which the session is
    /// unchanged, or an error a collaborator reports as not recoverable.
    pub fn dispatch(&mut self, event: Event) -> SessionResult<Vec<Effect>> {
        let effects = self.controller.handle(event)?;
        self.execute(effects)
    }

    /// Flush the session at a suspension point.
    pub fn suspend(&self) -> SessionResult<()> {
        self.store.save(self.controller.session())
    }

    fn execute(&mut self, effects: Vec<Effect>) -> SessionResult<Vec<Effect>> {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut updates = Vec::new();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::LoadPlaylist { phase, reference } => {
                    let playlist = match self.playlists.load(&reference) {
                        Ok(playlist) => playlist,
                        Err(e) if e.is_recoverable() => {
                            tracing::warn!("{e}; continuing {phase} phase with no clips");
                            updates.push(Effect::Notify(Notice::PlaylistUnavailable {
                                reference,
                            }));
                            Playlist::default()
                        }
                        Err(e) => return Err(e),
                    };
                    let next = self.controller.playlist_loaded(playlist)?;
                    for effect in next.into_iter().rev() {
                        queue.push_front(effect);
                    }
                }
                Effect::AppendRecord(record) => match self.sink.append(&record) {
                    Ok(()) => {}
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!("{e}; rating for {} lost", record.clip);
                        updates.push(Effect::Notify(Notice::RatingNotSaved { clip: record.clip }));
                    }
                    Err(e) => return Err(e),
                },
                Effect::ExportRatings => match self.sink.export() {
                    Ok(path) => updates.push(Effect::Notify(Notice::Exported { path })),
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!("{e}; internal ratings log kept");
                        updates.push(Effect::Notify(Notice::ExportFailed));
                    }
                    Err(e) => return Err(e),
                },
                Effect::PersistState(session) => match self.store.save(&session) {
                    Ok(()) => {}
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!("{e}");
                        updates.push(Effect::Notify(Notice::StateNotSaved));
                    }
                    Err(e) => return Err(e),
                },
                other => updates.push(other),
            }
        }

        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::mock::{MemoryPlaylists, MemorySink, MemoryStore};
    use crate::model::{Phase, RatingTriple};

    fn runner_with(
        playlists: MemoryPlaylists,
        sink: MemorySink,
        store: MemoryStore,
    ) -> (SessionRunner, Vec<Effect>) {
        SessionRunner::start(
            ControllerOptions::default(),
            Box::new(playlists),
            Box::new(sink),
            Box::new(store),
        )
        .unwrap()
    }

    fn submit(runner: &mut SessionRunner, v: u8, s: u8, av: u8) -> Vec<Effect> {
        runner.dispatch(Event::ClipFinished).unwrap();
        runner
            .dispatch(Event::RatingSubmitted(RatingTriple::new(v, s, av).into()))
            .unwrap()
    }

    #[test]
    fn full_session_writes_real_ratings_only() {
        let playlists = MemoryPlaylists::default()
            .with("playlist70", &["t1.mp4"])
            .with("playlist71", &["a.mp4", "b.mp4"]);
        let sink = MemorySink::default();
        let store = MemoryStore::default();
        let (mut runner, first) = runner_with(playlists, sink.clone(), store.clone());
        assert_eq!(first, vec![Effect::PromptTesterId]);

        let effects = runner.dispatch(Event::TesterIdEntered("7".into())).unwrap();
        assert!(matches!(effects[0], Effect::PlayClip { ref clip, .. } if clip == "t1.mp4"));

        let effects = submit(&mut runner, 3, 3, 3);
        assert!(effects.contains(&Effect::OfferRealPhase));
        assert!(sink.lines().is_empty());

        runner.dispatch(Event::StartRealPhase).unwrap();
        submit(&mut runner, 3, 4, 3);
        let effects = submit(&mut runner, 5, 5, 5);

        assert_eq!(
            sink.lines(),
            vec![
                "7, UserID: 7, 0, 0, 0",
                "7, a.mp4, 3, 4, 3",
                "7, b.mp4, 5, 5, 5"
            ]
        );
        assert_eq!(sink.export_count(), 1);
        assert!(effects.contains(&Effect::ShowCompletion));
        assert_eq!(runner.state(), SessionState::SessionComplete);
        assert!(store.saved().unwrap().complete);
    }

    #[test]
    fn missing_playlist_degrades_to_empty() {
        let (mut runner, _) = runner_with(
            MemoryPlaylists::default(),
            MemorySink::default(),
            MemoryStore::default(),
        );
        let effects = runner.dispatch(Event::TesterIdEntered("7".into())).unwrap();

        assert!(effects.contains(&Effect::Notify(Notice::PlaylistUnavailable {
            reference: "playlist70".into(),
        })));
        assert!(effects.contains(&Effect::OfferRealPhase));
        assert_eq!(runner.state(), SessionState::TrainingComplete);
    }

    struct RejectingPlaylists;

    impl PlaylistSource for RejectingPlaylists {
        fn load(&self, reference: &str) -> SessionResult<Playlist> {
            Err(SessionError::InvalidTesterId(reference.to_string()))
        }
    }

    #[test]
    fn unrecoverable_collaborator_error_propagates() {
        let (mut runner, _) = SessionRunner::start(
            ControllerOptions::default(),
            Box::new(RejectingPlaylists),
            Box::new(MemorySink::default()),
            Box::new(MemoryStore::default()),
        )
        .unwrap();

        let err = runner
            .dispatch(Event::TesterIdEntered("7".into()))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidTesterId(ref r) if r == "playlist70"));
    }

    #[test]
    fn sink_failure_is_a_notice() {
        let playlists = MemoryPlaylists::default().with("playlist71", &["a.mp4"]);
        let sink = MemorySink::failing();
        let (mut runner, _) = runner_with(playlists, sink.clone(), MemoryStore::default());
        runner.dispatch(Event::TesterIdEntered("7".into())).unwrap();

        let effects = runner.dispatch(Event::StartRealPhase).unwrap();
        assert!(effects.contains(&Effect::Notify(Notice::RatingNotSaved {
            clip: "UserID: 7".into(),
        })));

        let effects = submit(&mut runner, 1, 2, 3);
        assert!(effects.contains(&Effect::Notify(Notice::RatingNotSaved {
            clip: "a.mp4".into(),
        })));
        assert!(effects.contains(&Effect::Notify(Notice::ExportFailed)));
        assert!(effects.contains(&Effect::ShowCompletion));
        assert_eq!(sink.export_count(), 1);
        assert_eq!(runner.state(), SessionState::SessionComplete);
    }

    #[test]
    fn resume_picks_up_where_suspended() {
        let playlists = MemoryPlaylists::default()
            .with("playlist70", &["t1.mp4"])
            .with("playlist71", &["a.mp4", "b.mp4", "c.mp4"]);
        let store = MemoryStore::default();
        let sink = MemorySink::default();

        let (mut runner, _) = runner_with(playlists.clone(), sink.clone(), store.clone());
        runner.dispatch(Event::TesterIdEntered("7".into())).unwrap();
        submit(&mut runner, 3, 3, 3);
        runner.dispatch(Event::StartRealPhase).unwrap();
        submit(&mut runner, 3, 4, 3);
        runner.suspend().unwrap();
        drop(runner);

        let (runner, effects) = runner_with(playlists, sink.clone(), store.clone());
        assert_eq!(runner.state(), SessionState::Playing(Phase::Real));
        assert_eq!(
            effects,
            vec![Effect::PlayClip {
                index: 1,
                clip: "b.mp4".into(),
                resource: "b".into(),
            }]
        );
    }

    #[test]
    fn resuming_completed_session_does_not_export_again() {
        let playlists = MemoryPlaylists::default().with("playlist71", &["a.mp4"]);
        let store = MemoryStore::default();
        let sink = MemorySink::default();

        let (mut runner, _) = runner_with(playlists.clone(), sink.clone(), store.clone());
        runner.dispatch(Event::TesterIdEntered("7".into())).unwrap();
        runner.dispatch(Event::StartRealPhase).unwrap();
        submit(&mut runner, 2, 2, 2);
        assert_eq!(sink.export_count(), 1);

        let (runner, effects) = runner_with(playlists, sink.clone(), store);
        assert_eq!(runner.state(), SessionState::SessionComplete);
        assert_eq!(effects, vec![Effect::ShowCompletion]);
        assert_eq!(sink.export_count(), 1);
    }

    #[test]
    fn restart_clears_persisted_state() {
        let playlists = MemoryPlaylists::default().with("playlist70", &["t1.mp4"]);
        let store = MemoryStore::default();
        let (mut runner, _) = runner_with(playlists, MemorySink::default(), store.clone());
        runner.dispatch(Event::TesterIdEntered("7".into())).unwrap();
        assert_eq!(store.saved().unwrap().tester_id, Some(7));

        let effects = runner.dispatch(Event::Restart).unwrap();
        assert_eq!(effects, vec![Effect::PromptTesterId]);
        assert_eq!(store.saved(), Some(Session::default()));
    }

    #[test]
    fn unreadable_state_starts_fresh() {
        let (runner, effects) = runner_with(
            MemoryPlaylists::default(),
            MemorySink::default(),
            MemoryStore::corrupt(),
        );
        assert_eq!(runner.state(), SessionState::AwaitingTesterId);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::StateNotSaved), Effect::PromptTesterId]
        );
    }
}
