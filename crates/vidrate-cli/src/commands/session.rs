//! The `vidrate session` command.
//!
//! Runs the session on the terminal: the tester-id prompt, clip playback,
//! the three rating groups and the phase transitions. Typing `restart` at any
//! prompt restarts the test after confirmation; `quit` or end of input saves
//! progress and exits so the next run resumes where this one stopped.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use vidrate_core::config::load_config_from;
use vidrate_core::model::{RatingAxis, Score};
use vidrate_core::rating::RatingForm;
use vidrate_core::{Effect, Event, SessionError, SessionRunner};

use crate::console::{Console, Input};
use crate::player::{AutoPlayer, ClipPlayer, CommandPlayer};

pub fn execute(config_path: Option<PathBuf>, auto_play: bool) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let scale = config.scale()?;

    let player: Option<Box<dyn ClipPlayer>> = if auto_play {
        Some(Box::new(AutoPlayer))
    } else {
        match &config.player_command {
            Some(template) => Some(Box::new(CommandPlayer::new(template, &config.clip_dir)?)),
            None => None,
        }
    };

    let (runner, first) = SessionRunner::start(
        config.controller_options(),
        Box::new(config.playlist_source()),
        Box::new(config.ratings_log()),
        Box::new(config.state_store()),
    )?;

    let stdin = std::io::stdin();
    let mut frontend = Frontend {
        runner,
        console: Console::new(stdin.lock(), std::io::stdout()),
        player,
        form: RatingForm::new(&scale),
    };
    frontend.run(first)
}

/// What to do after handling one effect.
enum Step {
    /// Queue these effects after the pending ones.
    Next(Vec<Effect>),
    /// Drop everything pending; the session was restarted.
    Reset(Vec<Effect>),
    /// Save and leave.
    Quit,
}

struct Frontend<R, W> {
    runner: SessionRunner,
    console: Console<R, W>,
    /// `None` means the tester reports the end of each clip by pressing Enter.
    player: Option<Box<dyn ClipPlayer>>,
    form: RatingForm,
}

impl<R: BufRead, W: Write> Frontend<R, W> {
    fn run(&mut self, first: Vec<Effect>) -> Result<()> {
        let mut pending: VecDeque<Effect> = first.into();

        while let Some(effect) = pending.pop_front() {
            let step = match effect {
                Effect::PromptTesterId => self.prompt_tester_id()?,
                Effect::PlayClip {
                    index,
                    clip,
                    resource,
                } => self.play(index, &clip, &resource)?,
                Effect::ShowRatingForm { index, clip } => self.rate(index, &clip)?,
                Effect::OfferRealPhase => self.offer_real_phase()?,
                Effect::ShowCompletion => self.show_completion()?,
                Effect::Notify(notice) => {
                    self.console.say(notice)?;
                    Step::Next(Vec::new())
                }
                other => {
                    tracing::warn!(?other, "unhandled effect");
                    Step::Next(Vec::new())
                }
            };

            match step {
                Step::Next(effects) => pending.extend(effects),
                Step::Reset(effects) => {
                    pending.clear();
                    pending.extend(effects);
                }
                Step::Quit => break,
            }
        }

        self.suspend()
    }

    fn suspend(&mut self) -> Result<()> {
        match self.runner.suspend() {
            Ok(()) => self
                .console
                .say("Progress saved. Run `vidrate session` to continue."),
            Err(e) => {
                tracing::warn!("{e}");
                self.console.say("Session progress could not be saved.")
            }
        }
    }

    fn prompt_tester_id(&mut self) -> Result<Step> {
        loop {
            match self.console.ask("Enter Tester ID: ")? {
                Input::Quit => return Ok(Step::Quit),
                Input::Restart => continue,
                Input::Line(line) => match self.runner.dispatch(Event::TesterIdEntered(line)) {
                    Ok(effects) => return Ok(Step::Next(effects)),
                    Err(SessionError::InvalidTesterId(input)) => {
                        tracing::debug!("rejected tester id {input:?}");
                        self.console.say("Tester ID must be a positive number.")?;
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }
    }

    fn play(&mut self, index: usize, clip: &str, resource: &str) -> Result<Step> {
        let total = self.runner.controller().playlist().len();
        self.console
            .say(format_args!("[{}/{total}] Playing {clip}", index + 1))?;

        if let Some(player) = self.player.as_mut() {
            if let Err(e) = player.play(clip, resource) {
                tracing::warn!("playback of {clip} failed: {e:#}");
            }
        } else {
            match self.console.ask("Press Enter when the clip has finished: ")? {
                Input::Quit => return Ok(Step::Quit),
                Input::Restart => {
                    return self.confirm_restart(Effect::PlayClip {
                        index,
                        clip: clip.to_string(),
                        resource: resource.to_string(),
                    })
                }
                Input::Line(_) => {}
            }
        }

        Ok(Step::Next(self.runner.dispatch(Event::ClipFinished)?))
    }

    fn rate(&mut self, index: usize, clip: &str) -> Result<Step> {
        self.console
            .say(format_args!("Rate clip {} ({clip})", index + 1))?;

        loop {
            for axis in RatingAxis::ALL {
                if self.form.group(axis).selected_label().is_some() {
                    continue;
                }
                self.console.say(axis.title())?;
                for label in self.form.group(axis).options() {
                    self.console.say(format_args!("  {label}"))?;
                }

                match self.console.ask("> ")? {
                    Input::Quit => return Ok(Step::Quit),
                    Input::Restart => {
                        return self.confirm_restart(Effect::ShowRatingForm {
                            index,
                            clip: clip.to_string(),
                        })
                    }
                    Input::Line(line) => {
                        let chosen = line
                            .parse::<Score>()
                            .is_ok_and(|score| self.form.group_mut(axis).select_score(score));
                        if !chosen && !line.is_empty() {
                            self.console.say(format_args!("Not an option: {line}"))?;
                        }
                    }
                }
            }

            match self.form.take_triple() {
                Ok(scores) => {
                    let effects = self.runner.dispatch(Event::RatingSubmitted(scores.into()))?;
                    return Ok(Step::Next(effects));
                }
                Err(SessionError::IncompleteRating { .. }) => {
                    self.console.say("Please select all ratings.")?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn offer_real_phase(&mut self) -> Result<Step> {
        match self.console.ask("Press Enter to start the real test: ")? {
            Input::Quit => Ok(Step::Quit),
            Input::Restart => self.confirm_restart(Effect::OfferRealPhase),
            Input::Line(_) => Ok(Step::Next(self.runner.dispatch(Event::StartRealPhase)?)),
        }
    }

    fn show_completion(&mut self) -> Result<Step> {
        self.console.say("Thank you for rating all videos!")?;
        match self
            .console
            .ask("Type `restart` for a new tester, or press Enter to exit: ")?
        {
            Input::Restart => self.confirm_restart(Effect::ShowCompletion),
            _ => Ok(Step::Quit),
        }
    }

    /// Ask before restarting; on "no", `retry` is shown again.
    fn confirm_restart(&mut self, retry: Effect) -> Result<Step> {
        match self
            .console
            .ask("Are you sure you want to restart the test? [y/N] ")?
        {
            Input::Line(answer) if matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes") => {
                self.form.clear();
                Ok(Step::Reset(self.runner.dispatch(Event::Restart)?))
            }
            Input::Quit => Ok(Step::Quit),
            _ => Ok(Step::Next(vec![retry])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidrate_core::mock::{MemoryPlaylists, MemorySink, MemoryStore};
    use vidrate_core::rating::RatingScale;
    use vidrate_core::{ControllerOptions, SessionState};

    fn frontend<'a>(
        script: &'a str,
        out: &'a mut Vec<u8>,
        sink: MemorySink,
        store: MemoryStore,
    ) -> (Frontend<&'a [u8], &'a mut Vec<u8>>, Vec<Effect>) {
        let playlists = MemoryPlaylists::default()
            .with("playlist70", &["t.mp4"])
            .with("playlist71", &["a.mp4", "b.mp4"]);
        let (runner, first) = SessionRunner::start(
            ControllerOptions::default(),
            Box::new(playlists),
            Box::new(sink),
            Box::new(store),
        )
        .unwrap();
        let frontend = Frontend {
            runner,
            console: Console::new(script.as_bytes(), out),
            player: Some(Box::new(AutoPlayer)),
            form: RatingForm::new(&RatingScale::default()),
        };
        (frontend, first)
    }

    #[test]
    fn scripted_session_records_real_ratings() {
        let sink = MemorySink::default();
        let mut out = Vec::new();
        let script = "7\n3\n3\n3\n\n3\n4\n3\n5\n5\n5\n\n";
        let (mut f, first) = frontend(script, &mut out, sink.clone(), MemoryStore::default());
        f.run(first).unwrap();
        assert_eq!(f.runner.state(), SessionState::SessionComplete);
        drop(f);

        assert_eq!(
            sink.lines(),
            vec![
                "7, UserID: 7, 0, 0, 0",
                "7, a.mp4, 3, 4, 3",
                "7, b.mp4, 5, 5, 5"
            ]
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Training completed"));
        assert!(text.contains("Thank you for rating all videos!"));
    }

    #[test]
    fn missing_selection_is_asked_again() {
        let sink = MemorySink::default();
        let mut out = Vec::new();
        // Sound left blank, then supplied on the second pass.
        let script = "7\n3\n\n3\n9\n3\n";
        let (mut f, first) = frontend(script, &mut out, sink, MemoryStore::default());
        f.run(first).unwrap();
        assert_eq!(f.runner.state(), SessionState::TrainingComplete);
        drop(f);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Please select all ratings."));
        assert!(text.contains("Not an option: 9"));
    }

    #[test]
    fn invalid_tester_id_reprompts() {
        let mut out = Vec::new();
        let (mut f, first) = frontend(
            "abc\n0\n7\n",
            &mut out,
            MemorySink::default(),
            MemoryStore::default(),
        );
        f.run(first).unwrap();
        assert_eq!(f.runner.state(), SessionState::Rating(vidrate_core::model::Phase::Training));
        drop(f);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Tester ID must be a positive number.").count(), 2);
    }

    #[test]
    fn restart_needs_confirmation() {
        let store = MemoryStore::default();
        let mut out = Vec::new();
        let script = "7\nrestart\nn\nrestart\ny\n";
        let (mut f, first) = frontend(script, &mut out, MemorySink::default(), store.clone());
        f.run(first).unwrap();
        assert_eq!(f.runner.state(), SessionState::AwaitingTesterId);
        drop(f);

        assert_eq!(store.saved().unwrap().tester_id, None);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Enter Tester ID: ").count(), 2);
    }

    #[test]
    fn quit_saves_progress() {
        let store = MemoryStore::default();
        let mut out = Vec::new();
        let (mut f, first) = frontend(
            "7\n2\nquit\n",
            &mut out,
            MemorySink::default(),
            store.clone(),
        );
        f.run(first).unwrap();
        drop(f);

        let saved = store.saved().unwrap();
        assert_eq!(saved.tester_id, Some(7));
        assert_eq!(saved.current_index, 0);
        assert!(String::from_utf8(out).unwrap().contains("Progress saved"));
    }
}
