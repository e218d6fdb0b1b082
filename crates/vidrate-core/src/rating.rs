//! Rating collection.
//!
//! A [`RatingForm`] holds one [`SelectionGroup`] per [`RatingAxis`]. Each
//! option is a label such as `"4 - Good"`; the score is the label's leading
//! integer token.

use crate::error::{SessionError, SessionResult};
use crate::model::{RatingAxis, RatingSelection, RatingTriple, Score};

/// Default five-point absolute category rating labels.
pub const DEFAULT_SCALE: [&str; 5] = [
    "1 - Bad",
    "2 - Poor",
    "3 - Fair",
    "4 - Good",
    "5 - Excellent",
];

/// Extract the score encoded in an option label.
///
/// Only the leading whitespace-delimited token is considered, so
/// `"4 - Excellent"` is 4 and `"4-Excellent"` is not a score.
pub fn extract_score(label: &str) -> Option<Score> {
    label.split_whitespace().next()?.parse().ok()
}

/// The closed set of options shown in every group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingScale {
    labels: Vec<String>,
}

impl RatingScale {
    /// Build a scale, rejecting labels that do not start with a score.
    pub fn new(labels: Vec<String>) -> Result<Self, String> {
        if labels.is_empty() {
            return Err("rating scale must have at least one option".into());
        }
        if let Some(bad) = labels.iter().find(|l| extract_score(l).is_none()) {
            return Err(format!("rating label {bad:?} does not start with a score"));
        }
        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Scores the scale can produce, in label order.
    pub fn values(&self) -> Vec<Score> {
        self.labels.iter().filter_map(|l| extract_score(l)).collect()
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self {
            labels: DEFAULT_SCALE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One radio-button style group: a question and at most one chosen option.
#[derive(Debug, Clone)]
pub struct SelectionGroup {
    axis: RatingAxis,
    options: Vec<String>,
    selected: Option<usize>,
}

impl SelectionGroup {
    pub fn new(axis: RatingAxis, scale: &RatingScale) -> Self {
        Self {
            axis,
            options: scale.labels().to_vec(),
            selected: None,
        }
    }

    pub fn axis(&self) -> RatingAxis {
        self.axis
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Select the option at `index`. Returns `false` if out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.options.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Select the option whose label encodes `score`.
    pub fn select_score(&mut self, score: Score) -> bool {
        match self
            .options
            .iter()
            .position(|l| extract_score(l) == Some(score))
        {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.selected.map(|i| self.options[i].as_str())
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// The score of the current selection, if any.
    pub fn extract_selection(&self) -> Option<Score> {
        let label = self.selected_label()?;
        let score = extract_score(label);
        if score.is_none() {
            tracing::warn!("{} option {label:?} has no leading score", self.axis);
        }
        score
    }
}

/// Check that every axis has a score.
pub fn validate_triple(selection: RatingSelection) -> SessionResult<RatingTriple> {
    match (selection.video, selection.sound, selection.audiovisual) {
        (Some(video), Some(sound), Some(audiovisual)) => {
            Ok(RatingTriple::new(video, sound, audiovisual))
        }
        (video, sound, audiovisual) => {
            let missing = [
                (RatingAxis::Video, video),
                (RatingAxis::Sound, sound),
                (RatingAxis::Audiovisual, audiovisual),
            ]
            .into_iter()
            .filter(|(_, score)| score.is_none())
            .map(|(axis, _)| axis)
            .collect();
            Err(SessionError::IncompleteRating { missing })
        }
    }
}

/// The three groups shown after a clip finishes.
#[derive(Debug, Clone)]
pub struct RatingForm {
    video: SelectionGroup,
    sound: SelectionGroup,
    audiovisual: SelectionGroup,
}

impl RatingForm {
    pub fn new(scale: &RatingScale) -> Self {
        Self {
            video: SelectionGroup::new(RatingAxis::Video, scale),
            sound: SelectionGroup::new(RatingAxis::Sound, scale),
            audiovisual: SelectionGroup::new(RatingAxis::Audiovisual, scale),
        }
    }

    pub fn group(&self, axis: RatingAxis) -> &SelectionGroup {
        match axis {
            RatingAxis::Video => &self.video,
            RatingAxis::Sound => &self.sound,
            RatingAxis::Audiovisual => &self.audiovisual,
        }
    }

    pub fn group_mut(&mut self, axis: RatingAxis) -> &mut SelectionGroup {
        match axis {
            RatingAxis::Video => &mut self.video,
            RatingAxis::Sound => &mut self.sound,
            RatingAxis::Audiovisual => &mut self.audiovisual,
        }
    }

    /// Whether the submit control should be enabled.
    pub fn is_complete(&self) -> bool {
        RatingAxis::ALL
            .iter()
            .all(|&axis| self.group(axis).selected_label().is_some())
    }

    pub fn selection(&self) -> RatingSelection {
        RatingSelection {
            video: self.video.extract_selection(),
            sound: self.sound.extract_selection(),
            audiovisual: self.audiovisual.extract_selection(),
        }
    }

    /// Validate the current selections and clear the form on success.
    ///
    /// On failure the selections are left as they are so the tester can
    /// complete them.
    pub fn take_triple(&mut self) -> SessionResult<RatingTriple> {
        let triple = validate_triple(self.selection())?;
        self.clear();
        Ok(triple)
    }

    pub fn clear(&mut self) {
        self.video.clear();
        self.sound.clear();
        self.audiovisual.clear();
    }
}
