//! Core data model types for vidrate.
//!
//! These are the fundamental types that the session controller, the ratings
//! sink and the state store share: the session record, the rating triple and
//! the rating record written to the log.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Positive integer identifying a tester.
pub type TesterId = u32;

/// One Likert score.
pub type Score = u8;

/// Which playlist the session is working through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Warm-up clips; ratings are collected but discarded.
    #[default]
    Training,
    /// Rated clips; every submission is appended to the ratings log.
    Real,
}

impl Phase {
    pub fn is_training(self) -> bool {
        matches!(self, Phase::Training)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Training => write!(f, "training"),
            Phase::Real => write!(f, "real"),
        }
    }
}

/// Scalar session state owned by the controller and persisted across
/// suspension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    /// `None` until the tester has identified themselves.
    pub tester_id: Option<TesterId>,
    pub phase: Phase,
    /// Index into the playlist of the current phase.
    pub current_index: usize,
    pub training_playlist: String,
    pub real_playlist: String,
    /// Set once the real playlist has been exhausted and exported.
    pub complete: bool,
}

impl Session {
    /// A session for a newly identified tester, at the start of training.
    pub fn for_tester(prefix: &str, tester_id: TesterId) -> Self {
        let (training_playlist, real_playlist) = playlist_references(prefix, tester_id);
        Self {
            tester_id: Some(tester_id),
            phase: Phase::Training,
            current_index: 0,
            training_playlist,
            real_playlist,
            complete: false,
        }
    }

    /// Reference of the playlist for the current phase.
    pub fn active_playlist(&self) -> &str {
        match self.phase {
            Phase::Training => &self.training_playlist,
            Phase::Real => &self.real_playlist,
        }
    }
}

/// Derive the training and real playlist references for a tester.
///
/// Tester `7` with prefix `playlist` gets `playlist70` and `playlist71`.
pub fn playlist_references(prefix: &str, tester_id: TesterId) -> (String, String) {
    (
        format!("{prefix}{tester_id}0"),
        format!("{prefix}{tester_id}1"),
    )
}

/// Parse tester input into a positive id.
pub fn parse_tester_id(input: &str) -> Option<TesterId> {
    match input.trim().parse::<TesterId>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}

/// Strip the extension from a clip identifier to get the name of the
/// playable resource.
pub fn clip_resource_name(clip: &str) -> &str {
    match clip.rfind('.') {
        Some(pos) => &clip[..pos],
        None => clip,
    }
}

/// The three rating groups shown after each clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingAxis {
    Video,
    Sound,
    Audiovisual,
}

impl RatingAxis {
    pub const ALL: [RatingAxis; 3] = [
        RatingAxis::Video,
        RatingAxis::Sound,
        RatingAxis::Audiovisual,
    ];

    /// Question shown above the group.
    pub fn title(self) -> &'static str {
        match self {
            RatingAxis::Video => "Video quality",
            RatingAxis::Sound => "Sound quality",
            RatingAxis::Audiovisual => "Audiovisual quality",
        }
    }
}

impl fmt::Display for RatingAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingAxis::Video => write!(f, "video"),
            RatingAxis::Sound => write!(f, "sound"),
            RatingAxis::Audiovisual => write!(f, "audiovisual"),
        }
    }
}

/// A complete set of scores for one clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingTriple {
    pub video: Score,
    pub sound: Score,
    pub audiovisual: Score,
}

impl RatingTriple {
    pub fn new(video: Score, sound: Score, audiovisual: Score) -> Self {
        Self {
            video,
            sound,
            audiovisual,
        }
    }
}

/// Per-axis selections as they come out of the rating form; any of them may
/// still be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingSelection {
    pub video: Option<Score>,
    pub sound: Option<Score>,
    pub audiovisual: Option<Score>,
}

impl From<RatingTriple> for RatingSelection {
    fn from(t: RatingTriple) -> Self {
        Self {
            video: Some(t.video),
            sound: Some(t.sound),
            audiovisual: Some(t.audiovisual),
        }
    }
}

/// One line of the ratings log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub tester_id: TesterId,
    pub clip: String,
    pub scores: RatingTriple,
}

impl RatingRecord {
    pub fn new(tester_id: TesterId, clip: impl Into<String>, scores: RatingTriple) -> Self {
        Self {
            tester_id,
            clip: clip.into(),
            scores,
        }
    }

    /// The row written when a tester starts the real phase, so several
    /// testers sharing one log can be told apart.
    pub fn session_marker(tester_id: TesterId) -> Self {
        Self::new(
            tester_id,
            format!("UserID: {tester_id}"),
            RatingTriple::new(0, 0, 0),
        )
    }

    pub fn is_session_marker(&self) -> bool {
        self.clip.starts_with("UserID: ")
    }
}

impl fmt::Display for RatingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.tester_id,
            self.clip,
            self.scores.video,
            self.scores.sound,
            self.scores.audiovisual
        )
    }
}

impl FromStr for RatingRecord {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 5 {
            return Err(format!("expected 5 fields, got {}: {line:?}", fields.len()));
        }

        let n = fields.len();
        let parse_score = |s: &str| {
            s.parse::<Score>()
                .map_err(|_| format!("invalid score {s:?} in {line:?}"))
        };

        let tester_id = fields[0]
            .parse::<TesterId>()
            .map_err(|_| format!("invalid tester id {:?} in {line:?}", fields[0]))?;

        Ok(RatingRecord {
            tester_id,
            clip: fields[1..n - 3].join(", "),
            scores: RatingTriple {
                video: parse_score(fields[n - 3])?,
                sound: parse_score(fields[n - 2])?,
                audiovisual: parse_score(fields[n - 1])?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_derived_from_tester_id() {
        assert_eq!(
            playlist_references("playlist", 7),
            ("playlist70".to_string(), "playlist71".to_string())
        );
        assert_eq!(
            playlist_references("playlist", 7),
            playlist_references("playlist", 7)
        );
        assert_eq!(playlist_references("pl", 12).1, "pl121");
    }

    #[test]
    fn tester_id_must_be_positive_integer() {
        assert_eq!(parse_tester_id("7"), Some(7));
        assert_eq!(parse_tester_id("  42\n"), Some(42));
        assert_eq!(parse_tester_id("0"), None);
        assert_eq!(parse_tester_id("-3"), None);
        assert_eq!(parse_tester_id("abc"), None);
        assert_eq!(parse_tester_id(""), None);
    }

    #[test]
    fn resource_name_strips_last_extension() {
        assert_eq!(clip_resource_name("a.mp4"), "a");
        assert_eq!(clip_resource_name("clip.v2.mp4"), "clip.v2");
        assert_eq!(clip_resource_name("noext"), "noext");
        assert_eq!(clip_resource_name(""), "");
    }

    #[test]
    fn record_line_format() {
        let record = RatingRecord::new(7, "a.mp4", RatingTriple::new(3, 4, 3));
        assert_eq!(record.to_string(), "7, a.mp4, 3, 4, 3");
        assert_eq!(
            RatingRecord::session_marker(7).to_string(),
            "7, UserID: 7, 0, 0, 0"
        );
    }

    #[test]
    fn record_parses_back() {
        let record: RatingRecord = "7, b.mp4, 5, 5, 5".parse().unwrap();
        assert_eq!(record.tester_id, 7);
        assert_eq!(record.clip, "b.mp4");
        assert_eq!(record.scores, RatingTriple::new(5, 5, 5));

        let marker: RatingRecord = "7, UserID: 7, 0, 0, 0".parse().unwrap();
        assert!(marker.is_session_marker());

        assert!("7, a.mp4, 3".parse::<RatingRecord>().is_err());
        assert!("x, a.mp4, 3, 4, 3".parse::<RatingRecord>().is_err());
    }

    #[test]
    fn active_playlist_follows_phase() {
        let mut session = Session::for_tester("playlist", 3);
        assert_eq!(session.active_playlist(), "playlist30");
        session.phase = Phase::Real;
        assert_eq!(session.active_playlist(), "playlist31");
    }
}
