//! Session controller: the playlist and session state machine.
//!
//! The controller owns the [`Session`] and the playlist of the current phase
//! and never performs I/O. Each operation validates the current state,
//! mutates the session and returns the [`Effect`]s the caller has to carry
//! out. Loading a playlist is one of those effects; its result comes back in
//! through [`SessionController::playlist_loaded`].
//!
//! ```text
//! AwaitingTesterId → Loading(Training) → Playing(Training) ⇄ Rating(Training)
//!                  → TrainingComplete → Loading(Real) → Playing(Real) ⇄ Rating(Real)
//!                  → SessionComplete
//! ```
//!
//! `restart` returns to `AwaitingTesterId` from anywhere.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::model::{
    clip_resource_name, parse_tester_id, Phase, RatingRecord, RatingSelection, Session,
};
use crate::playlist::Playlist;
use crate::rating::validate_triple;

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No tester yet; the front-end must ask for an id.
    AwaitingTesterId,
    /// Waiting for the playlist of the phase to be loaded.
    Loading(Phase),
    /// A clip is being shown.
    Playing(Phase),
    /// The rating form for the current clip is open.
    Rating(Phase),
    /// Training playlist exhausted; waiting for the tester to start the real test.
    TrainingComplete,
    /// Real playlist exhausted and exported. Terminal until restart.
    SessionComplete,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingTesterId => write!(f, "awaiting tester id"),
            Self::Loading(phase) => write!(f, "loading {phase} playlist"),
            Self::Playing(phase) => write!(f, "playing {phase} clip"),
            Self::Rating(phase) => write!(f, "rating {phase} clip"),
            Self::TrainingComplete => write!(f, "training complete"),
            Self::SessionComplete => write!(f, "session complete"),
        }
    }
}

/// Something that happened outside the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The tester typed an id into the prompt.
    TesterIdEntered(String),
    /// A requested playlist has been loaded (possibly empty).
    PlaylistLoaded(Playlist),
    /// The player reached the end of the clip.
    ClipFinished,
    /// The tester pressed submit on the rating form.
    RatingSubmitted(RatingSelection),
    /// The tester pressed "start real test".
    StartRealPhase,
    /// The tester confirmed a restart.
    Restart,
}

/// Work the caller must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Show the tester-id prompt.
    PromptTesterId,
    /// Load the playlist and feed it back as [`Event::PlaylistLoaded`].
    LoadPlaylist { phase: Phase, reference: String },
    /// Start playback and send [`Event::ClipFinished`] when it ends.
    PlayClip {
        index: usize,
        clip: String,
        resource: String,
    },
    /// Open the rating form for the clip that just finished.
    ShowRatingForm { index: usize, clip: String },
    /// Append a record to the ratings log.
    AppendRecord(RatingRecord),
    /// Copy the ratings log to the export location.
    ExportRatings,
    /// Save this snapshot of the session.
    PersistState(Session),
    /// Show a transient message.
    Notify(Notice),
    /// Show the "start real test" action.
    OfferRealPhase,
    /// Show the thank-you screen with its restart action.
    ShowCompletion,
}

/// Transient messages for the tester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    TrainingComplete,
    PlaylistUnavailable { reference: String },
    RatingNotSaved { clip: String },
    Exported { path: PathBuf },
    ExportFailed,
    StateNotSaved,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TrainingComplete => {
                write!(f, "Training completed. Press Start Real Test to begin.")
            }
            Notice::PlaylistUnavailable { reference } => {
                write!(f, "Playlist {reference} could not be loaded.")
            }
            Notice::RatingNotSaved { clip } => {
                write!(f, "Rating for {clip} could not be saved.")
            }
            Notice::Exported { path } => {
                write!(f, "Ratings file exported to {}", path.display())
            }
            Notice::ExportFailed => write!(f, "Failed to export ratings file"),
            Notice::StateNotSaved => write!(f, "Session progress could not be saved."),
        }
    }
}

/// Knobs the controller needs from configuration.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Prefix of the derived playlist references (`playlist` → `playlist70`).
    pub playlist_prefix: String,
    /// Append a `UserID` marker row when the real phase starts.
    pub session_marker: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            playlist_prefix: "playlist".to_string(),
            session_marker: true,
        }
    }
}

/// The session state machine.
#[derive(Debug, Clone)]
pub struct SessionController {
    options: ControllerOptions,
    session: Session,
    playlist: Playlist,
    state: SessionState,
}

impl SessionController {
    /// A controller for a first launch, waiting for a tester id.
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            options,
            session: Session::default(),
            playlist: Playlist::default(),
            state: SessionState::AwaitingTesterId,
        }
    }

    /// Rebuild a controller from persisted state.
    pub fn resume(options: ControllerOptions, session: Session) -> (Self, Vec<Effect>) {
        if session.tester_id.is_none() {
            return (Self::new(options), vec![Effect::PromptTesterId]);
        }

        let mut controller = Self {
            options,
            session,
            playlist: Playlist::default(),
            state: SessionState::AwaitingTesterId,
        };

        if controller.session.complete {
            controller.state = SessionState::SessionComplete;
            return (controller, vec![Effect::ShowCompletion]);
        }

        let phase = controller.session.phase;
        tracing::info!(
            "resuming {phase} phase at clip {}",
            controller.session.current_index
        );
        controller.state = SessionState::Loading(phase);
        let effects = vec![controller.load_effect()];
        (controller, effects)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// The clip at the current index, if the playlist has one there.
    pub fn current_clip(&self) -> Option<&str> {
        self.playlist.get(self.session.current_index)
    }

    /// Route an event to the matching operation.
    pub fn handle(&mut self, event: Event) -> SessionResult<Vec<Effect>> {
        match event {
            Event::TesterIdEntered(input) => self.identify_tester(&input),
            Event::PlaylistLoaded(playlist) => self.playlist_loaded(playlist),
            Event::ClipFinished => self.advance(),
            Event::RatingSubmitted(selection) => self.submit_rating(selection),
            Event::StartRealPhase => self.begin_real_phase(),
            Event::Restart => Ok(self.restart()),
        }
    }

    /// Accept a tester id and request the training playlist.
    pub fn identify_tester(&mut self, input: &str) -> SessionResult<Vec<Effect>> {
        self.expect(SessionState::AwaitingTesterId, "identify a tester")?;
        let tester_id =
            parse_tester_id(input).ok_or_else(|| SessionError::InvalidTesterId(input.to_string()))?;

        self.session = Session::for_tester(&self.options.playlist_prefix, tester_id);
        self.playlist = Playlist::default();
        self.state = SessionState::Loading(Phase::Training);
        tracing::info!(
            "tester {tester_id} identified (training {}, real {})",
            self.session.training_playlist,
            self.session.real_playlist
        );

        Ok(vec![self.persist(), self.load_effect()])
    }

    /// Install the playlist requested by the last `LoadPlaylist` effect.
    pub fn playlist_loaded(&mut self, playlist: Playlist) -> SessionResult<Vec<Effect>> {
        let SessionState::Loading(phase) = self.state else {
            return Err(self.invalid("accept a playlist"));
        };
        tracing::debug!("{phase} playlist ready with {} clips", playlist.len());
        self.playlist = playlist;
        Ok(self.next_clip())
    }

    /// The current clip finished playing.
    pub fn advance(&mut self) -> SessionResult<Vec<Effect>> {
        let SessionState::Playing(phase) = self.state else {
            return Err(self.invalid("finish a clip"));
        };
        let index = self.session.current_index;
        match self.playlist.get(index) {
            Some(clip) => {
                let clip = clip.to_string();
                self.state = SessionState::Rating(phase);
                Ok(vec![Effect::ShowRatingForm { index, clip }])
            }
            None => Ok(self.complete_phase()),
        }
    }

    /// Record the ratings for the current clip and move on.
    pub fn submit_rating(&mut self, selection: RatingSelection) -> SessionResult<Vec<Effect>> {
        let SessionState::Rating(phase) = self.state else {
            return Err(self.invalid("submit a rating"));
        };
        let scores = validate_triple(selection)?;
        let clip = self.current_clip().unwrap_or("Unknown").to_string();
        tracing::debug!(
            "{phase} rating for {clip}: video {}, sound {}, audiovisual {}",
            scores.video,
            scores.sound,
            scores.audiovisual
        );

        let mut effects = Vec::new();
        if phase == Phase::Real {
            if let Some(tester_id) = self.session.tester_id {
                effects.push(Effect::AppendRecord(RatingRecord::new(
                    tester_id, clip, scores,
                )));
            }
        }

        self.session.current_index += 1;
        effects.push(self.persist());
        effects.extend(self.next_clip());
        Ok(effects)
    }

    /// Leave `TrainingComplete` and request the real playlist.
    pub fn begin_real_phase(&mut self) -> SessionResult<Vec<Effect>> {
        self.expect(SessionState::TrainingComplete, "start the real test")?;

        self.session.phase = Phase::Real;
        self.session.current_index = 0;
        self.playlist = Playlist::default();
        self.state = SessionState::Loading(Phase::Real);
        tracing::info!("starting real phase with {}", self.session.real_playlist);

        let mut effects = Vec::new();
        if self.options.session_marker {
            if let Some(tester_id) = self.session.tester_id {
                effects.push(Effect::AppendRecord(RatingRecord::session_marker(tester_id)));
            }
        }
        effects.push(self.persist());
        effects.push(self.load_effect());
        Ok(effects)
    }

    /// Forget everything and go back to the tester-id prompt.
    pub fn restart(&mut self) -> Vec<Effect> {
        tracing::info!("restarting session from state: {}", self.state);
        self.session = Session::default();
        self.playlist = Playlist::default();
        self.state = SessionState::AwaitingTesterId;
        vec![self.persist(), Effect::PromptTesterId]
    }

    fn next_clip(&mut self) -> Vec<Effect> {
        let index = self.session.current_index;
        match self.playlist.get(index) {
            Some(clip) => {
                let effect = Effect::PlayClip {
                    index,
                    clip: clip.to_string(),
                    resource: clip_resource_name(clip).to_string(),
                };
                self.state = SessionState::Playing(self.session.phase);
                vec![effect]
            }
            None => self.complete_phase(),
        }
    }

    fn complete_phase(&mut self) -> Vec<Effect> {
        match self.session.phase {
            Phase::Training => {
                tracing::info!("training playlist exhausted");
                self.state = SessionState::TrainingComplete;
                vec![
                    self.persist(),
                    Effect::Notify(Notice::TrainingComplete),
                    Effect::OfferRealPhase,
                ]
            }
            Phase::Real => {
                tracing::info!("real playlist exhausted, session complete");
                self.session.complete = true;
                self.state = SessionState::SessionComplete;
                vec![self.persist(), Effect::ExportRatings, Effect::ShowCompletion]
            }
        }
    }

    fn load_effect(&self) -> Effect {
        Effect::LoadPlaylist {
            phase: self.session.phase,
            reference: self.session.active_playlist().to_string(),
        }
    }

    fn persist(&self) -> Effect {
        Effect::PersistState(self.session.clone())
    }

    fn expect(&self, state: SessionState, operation: &'static str) -> SessionResult<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            operation,
            state: self.state,
        }
    }
}
