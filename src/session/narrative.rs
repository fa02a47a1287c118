//! Top-level narrative step machine.
//!
//! `Intro -> Selection -> Final`, strictly forward. The flip to `Final`
//! is deferred by a short delay so the selection screen can play its
//! completion animation first; until the timer fires the step stays
//! `Selection` with `finale_pending` raised.

use std::time::Duration;

use crate::audio::{AudioCueEmitter, Cue};

use super::error::SessionError;
use super::timer::{Deferred, Scope, Timers};

/// Delay between session completion and the final step being shown.
pub const FINAL_STEP_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Intro,
    Selection,
    Final,
}

#[derive(Debug)]
pub struct Narrative {
    step: Step,
    finale_pending: bool,
}

impl Narrative {
    pub fn new() -> Self {
        Self {
            step: Step::Intro,
            finale_pending: false,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn finale_pending(&self) -> bool {
        self.finale_pending
    }

    pub fn advance_from_intro(&mut self) -> Result<(), SessionError> {
        match self.step {
            Step::Intro => {
                self.step = Step::Selection;
                tracing::info!("narrative advanced to selection");
                Ok(())
            }
            Step::Selection => Err(SessionError::invalid("advance_from_intro", "already past the intro")),
            Step::Final => Err(SessionError::invalid("advance_from_intro", "the reveal is over")),
        }
    }

    /// The session finished; schedule the flip to the final step. Firing
    /// more than once is refused so the transition is emitted exactly
    /// once.
    pub fn on_session_complete(&mut self, timers: &mut Timers) -> Result<(), SessionError> {
        if self.step != Step::Selection {
            return Err(SessionError::invalid(
                "on_session_complete",
                "not in the selection step",
            ));
        }
        if self.finale_pending {
            return Err(SessionError::invalid(
                "on_session_complete",
                "the finale is already pending",
            ));
        }
        self.finale_pending = true;
        timers.schedule(Scope::Session, FINAL_STEP_DELAY, Deferred::EnterFinal);
        tracing::info!("session complete, finale scheduled");
        Ok(())
    }

    /// Timer callback: show the final reveal. Terminal; nothing
    /// transitions out of it.
    pub fn enter_final(&mut self, audio: &mut dyn AudioCueEmitter) {
        self.step = Step::Final;
        self.finale_pending = false;
        audio.emit(Cue::Finale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullEmitter;
    use std::time::Instant;

    #[test]
    fn advances_only_from_intro() {
        let mut narrative = Narrative::new();
        assert_eq!(narrative.step(), Step::Intro);
        narrative.advance_from_intro().unwrap();
        assert_eq!(narrative.step(), Step::Selection);
        assert!(narrative.advance_from_intro().is_err());
    }

    #[test]
    fn completion_requires_selection_step() {
        let mut narrative = Narrative::new();
        let mut timers = Timers::new();
        assert!(narrative.on_session_complete(&mut timers).is_err());
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut narrative = Narrative::new();
        let mut timers = Timers::new();
        narrative.advance_from_intro().unwrap();

        narrative.on_session_complete(&mut timers).unwrap();
        assert!(narrative.on_session_complete(&mut timers).is_err());

        let fired = timers.drain_due(Instant::now() + FINAL_STEP_DELAY);
        assert_eq!(fired, vec![Deferred::EnterFinal]);
    }

    #[test]
    fn final_step_is_terminal() {
        let mut narrative = Narrative::new();
        let mut timers = Timers::new();
        let mut audio = NullEmitter;
        narrative.advance_from_intro().unwrap();
        narrative.on_session_complete(&mut timers).unwrap();
        narrative.enter_final(&mut audio);

        assert_eq!(narrative.step(), Step::Final);
        assert!(narrative.advance_from_intro().is_err());
        assert!(narrative.on_session_complete(&mut timers).is_err());
    }
}
