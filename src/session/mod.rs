//! The game session core.
//!
//! `Surprise` composes the narrative step machine, the per-pack game
//! session and the deferred-effect queue behind one facade. The renderer
//! talks to it in intents and reads it as snapshots; nothing in here
//! draws, sleeps or blocks. All state lives on this side of the boundary
//! and is mutated only from intent handlers and `tick`.

pub mod error;
pub mod escape;
pub mod game;
pub mod narrative;
pub mod timer;
pub mod wheel;

use std::time::Instant;

use crate::audio::{AudioCueEmitter, Cue};
use crate::pack::GamePack;

pub use error::SessionError;
pub use escape::{AnswerOutcome, CodeOutcome, PuzzleChain};
pub use game::{ActiveGame, GameSession, Machine, SimpleGame};
pub use narrative::{Narrative, Step};
pub use timer::{Deferred, Scope, Timers};
pub use wheel::PrizeSequencer;

pub struct Surprise {
    narrative: Narrative,
    session: GameSession,
    timers: Timers,
    audio: Box<dyn AudioCueEmitter>,
}

impl Surprise {
    pub fn new(pack: GamePack, audio: Box<dyn AudioCueEmitter>) -> Self {
        Self {
            narrative: Narrative::new(),
            session: GameSession::new(pack),
            timers: Timers::new(),
            audio,
        }
    }

    // --- snapshots -------------------------------------------------------

    pub fn step(&self) -> Step {
        self.narrative.step()
    }

    pub fn finale_pending(&self) -> bool {
        self.narrative.finale_pending()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn escape(&self) -> Option<&PuzzleChain> {
        match &self.session.active()?.machine {
            Machine::Escape(chain) => Some(chain),
            _ => None,
        }
    }

    pub fn wheel(&self) -> Option<&PrizeSequencer> {
        match &self.session.active()?.machine {
            Machine::Wheel(wheel) => Some(wheel),
            _ => None,
        }
    }

    pub fn simple(&self) -> Option<&SimpleGame> {
        match &self.session.active()?.machine {
            Machine::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    /// Earliest pending deadline; the event loop polls input no longer
    /// than this.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // --- intents ---------------------------------------------------------

    pub fn advance_from_intro(&mut self) -> Result<(), SessionError> {
        self.narrative.advance_from_intro()
    }

    pub fn select_game(&mut self, id: &str) -> Result<(), SessionError> {
        self.require_selection("select_game")?;
        self.session.select_game(id, &mut self.timers)
    }

    pub fn deselect_game(&mut self) {
        self.session.deselect_game(&mut self.timers);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.set_muted(muted);
    }

    pub fn enter_room(&mut self, id: &str) -> Result<(), SessionError> {
        let (chain, _) = Self::escape_mut(&mut self.session, "enter_room")?;
        chain.enter_room(id)
    }

    pub fn close_room(&mut self) -> Result<(), SessionError> {
        let (chain, _) = Self::escape_mut(&mut self.session, "close_room")?;
        chain.close_room();
        Ok(())
    }

    pub fn submit_answer(&mut self, room_id: &str, option: usize) -> Result<AnswerOutcome, SessionError> {
        let (chain, scope) = Self::escape_mut(&mut self.session, "submit_answer")?;
        chain.submit_answer(room_id, option, &mut self.timers, scope, self.audio.as_mut())
    }

    pub fn submit_final_code(&mut self, code: &str) -> Result<CodeOutcome, SessionError> {
        let (chain, scope) = Self::escape_mut(&mut self.session, "submit_final_code")?;
        chain.submit_final_code(code, &mut self.timers, scope, self.audio.as_mut())
    }

    pub fn spin(&mut self) -> Result<(), SessionError> {
        let (wheel, scope) = Self::wheel_mut(&mut self.session, "spin")?;
        wheel.spin(&mut self.timers, scope, self.audio.as_mut())?;
        Ok(())
    }

    pub fn acknowledge(&mut self) -> Result<(), SessionError> {
        let (wheel, _) = Self::wheel_mut(&mut self.session, "acknowledge")?;
        wheel.acknowledge();
        Ok(())
    }

    /// Finish the active single-step game. Completion is recorded and the
    /// session returns to the selection screen.
    pub fn finish_simple(&mut self) -> Result<(), SessionError> {
        let id = {
            let active = self
                .session
                .active_mut()
                .ok_or_else(|| SessionError::invalid("finish_simple", "no game is active"))?;
            match &mut active.machine {
                Machine::Simple(simple) if simple.is_done() => {
                    return Err(SessionError::invalid(
                        "finish_simple",
                        "the game is already finished",
                    ))
                }
                Machine::Simple(simple) => simple.finish(),
                _ => {
                    return Err(SessionError::invalid(
                        "finish_simple",
                        "the active game is not a single-step game",
                    ))
                }
            }
            active.id.clone()
        };
        self.audio.emit(Cue::Correct);
        self.session
            .report_completion(&id, &mut self.narrative, &mut self.timers)?;
        self.session.deselect_game(&mut self.timers);
        Ok(())
    }

    // --- timer dispatch --------------------------------------------------

    /// Apply every deferred effect due at `now`, including effects that
    /// became due because an earlier one scheduled them.
    pub fn tick(&mut self, now: Instant) {
        loop {
            let due = self.timers.drain_due(now);
            if due.is_empty() {
                return;
            }
            for effect in due {
                self.apply(effect);
            }
        }
    }

    fn apply(&mut self, effect: Deferred) {
        tracing::debug!(?effect, "deferred effect fired");
        match effect {
            Deferred::EnterFinal => self.narrative.enter_final(self.audio.as_mut()),
            Deferred::ClearWrongBanner => {
                if let Some(ActiveGame {
                    machine: Machine::Escape(chain),
                    ..
                }) = self.session.active_mut()
                {
                    chain.clear_wrong_banner();
                }
            }
            Deferred::RevealPrize => {
                if let Some(ActiveGame {
                    machine: Machine::Wheel(wheel),
                    scope,
                    ..
                }) = self.session.active_mut()
                {
                    let scope = *scope;
                    wheel.reveal(&mut self.timers, scope, self.audio.as_mut());
                }
            }
            Deferred::CelebrateWheel => {
                if let Some(ActiveGame {
                    machine: Machine::Wheel(wheel),
                    scope,
                    ..
                }) = self.session.active_mut()
                {
                    let scope = *scope;
                    wheel.celebrate(&mut self.timers, scope, self.audio.as_mut());
                }
            }
            Deferred::ReportCompletion => {
                if let Some(active) = self.session.active() {
                    let id = active.id.clone();
                    if let Err(err) =
                        self.session
                            .report_completion(&id, &mut self.narrative, &mut self.timers)
                    {
                        tracing::warn!(%err, game = %id, "completion report failed");
                    }
                }
            }
        }
    }

    // --- plumbing --------------------------------------------------------

    fn require_selection(&self, intent: &'static str) -> Result<(), SessionError> {
        match self.narrative.step() {
            Step::Selection => Ok(()),
            Step::Intro => Err(SessionError::invalid(intent, "still on the intro screen")),
            Step::Final => Err(SessionError::invalid(intent, "the reveal is over")),
        }
    }

    fn escape_mut<'a>(
        session: &'a mut GameSession,
        intent: &'static str,
    ) -> Result<(&'a mut PuzzleChain, Scope), SessionError> {
        match session.active_mut() {
            Some(ActiveGame {
                machine: Machine::Escape(chain),
                scope,
                ..
            }) => Ok((chain, *scope)),
            Some(_) => Err(SessionError::invalid(intent, "the active game is not the escape room")),
            None => Err(SessionError::invalid(intent, "no game is active")),
        }
    }

    fn wheel_mut<'a>(
        session: &'a mut GameSession,
        intent: &'static str,
    ) -> Result<(&'a mut PrizeSequencer, Scope), SessionError> {
        match session.active_mut() {
            Some(ActiveGame {
                machine: Machine::Wheel(wheel),
                scope,
                ..
            }) => Ok((wheel, *scope)),
            Some(_) => Err(SessionError::invalid(intent, "the active game is not the wheel")),
            None => Err(SessionError::invalid(intent, "no game is active")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::RecordingEmitter;
    use crate::pack::types::{
        EscapeDef, GameContent, GameDef, GameKind, GameMeta, PrizeDef, PuzzleDef, RoomDef,
        SimpleDef, WheelDef,
    };
    use std::time::Duration;

    fn escape_game() -> GameDef {
        let room = |id: &str, correct: usize| RoomDef {
            id: id.to_string(),
            name: id.to_string(),
            emoji: "R".to_string(),
            description: String::new(),
            clue: format!("clue-{id}"),
            puzzle: PuzzleDef {
                question: "?".to_string(),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct,
                hint: String::new(),
            },
        };
        GameDef {
            meta: GameMeta {
                id: "escape-room".to_string(),
                title: "Escape Room".to_string(),
                tagline: String::new(),
                kind: GameKind::EscapeRoom,
                terminal: true,
            },
            content: GameContent::Escape(EscapeDef {
                secret_code: "LOVE".to_string(),
                code_hint: String::new(),
                rooms: vec![room("one", 0), room("two", 1), room("three", 2)],
            }),
        }
    }

    fn wheel_game() -> GameDef {
        GameDef {
            meta: GameMeta {
                id: "spin-wheel".to_string(),
                title: "Spin the Wheel".to_string(),
                tagline: String::new(),
                kind: GameKind::SpinWheel,
                terminal: true,
            },
            content: GameContent::Wheel(WheelDef {
                prizes: (1..=3)
                    .map(|ordinal| PrizeDef {
                        ordinal,
                        title: format!("prize-{ordinal}"),
                        message: None,
                        emoji: "P".to_string(),
                        button: "Next".to_string(),
                    })
                    .collect(),
            }),
        }
    }

    fn simple_game(id: &str) -> GameDef {
        GameDef {
            meta: GameMeta {
                id: id.to_string(),
                title: id.to_string(),
                tagline: String::new(),
                kind: GameKind::Simple,
                terminal: false,
            },
            content: GameContent::Simple(SimpleDef {
                prompt: "go".to_string(),
                message: "done".to_string(),
            }),
        }
    }

    fn surprise(games: Vec<GameDef>) -> (Surprise, std::rc::Rc<std::cell::RefCell<Vec<Cue>>>) {
        let (audio, cues) = RecordingEmitter::new();
        let pack = GamePack {
            id: "test".to_string(),
            title: "Test".to_string(),
            games,
        };
        (Surprise::new(pack, Box::new(audio)), cues)
    }

    fn long_after() -> Instant {
        Instant::now() + Duration::from_secs(120)
    }

    #[test]
    fn escape_room_end_to_end() {
        let (mut app, _cues) = surprise(vec![escape_game()]);
        app.advance_from_intro().unwrap();
        app.select_game("escape-room").unwrap();

        for (room, correct) in [("one", 0), ("two", 1), ("three", 2)] {
            app.enter_room(room).unwrap();
            assert_eq!(
                app.submit_answer(room, correct).unwrap(),
                AnswerOutcome::Correct {
                    all_solved: room == "three"
                }
            );
        }
        assert_eq!(app.submit_final_code("love").unwrap(), CodeOutcome::Accepted);
        assert_eq!(app.step(), Step::Selection);

        // Completion report, then the scheduled final-step flip.
        app.tick(long_after());
        assert_eq!(app.session().completed(), ["escape-room"]);
        assert_eq!(app.step(), Step::Final);
    }

    #[test]
    fn wheel_end_to_end_completes_once() {
        let (mut app, cues) = surprise(vec![wheel_game()]);
        app.advance_from_intro().unwrap();
        app.select_game("spin-wheel").unwrap();

        for expected in ["prize-1", "prize-2", "prize-3"] {
            app.spin().unwrap();
            assert_eq!(app.wheel().unwrap().last_revealed().unwrap().title, expected);
            app.tick(long_after());
            app.acknowledge().unwrap();
        }

        assert_eq!(app.step(), Step::Final);
        assert_eq!(app.session().completed(), ["spin-wheel"]);
        let finales = cues.borrow().iter().filter(|c| **c == Cue::Finale).count();
        assert!(finales >= 1);
        // Exactly one completion: the set holds one entry and the wheel
        // refuses further spins.
        assert_eq!(app.session().completed().len(), 1);
    }

    #[test]
    fn spins_are_deterministic_back_to_back() {
        let (mut app, _cues) = surprise(vec![wheel_game()]);
        app.advance_from_intro().unwrap();
        app.select_game("spin-wheel").unwrap();

        for expected in ["prize-1", "prize-2", "prize-3"] {
            app.spin().unwrap();
            assert_eq!(app.wheel().unwrap().last_revealed().unwrap().title, expected);
        }
        assert_eq!(app.spin().unwrap_err(), SessionError::Exhausted);
    }

    #[test]
    fn deselect_discards_pending_reveal() {
        let (mut app, cues) = surprise(vec![wheel_game()]);
        app.advance_from_intro().unwrap();
        app.select_game("spin-wheel").unwrap();
        app.spin().unwrap();
        app.deselect_game();

        app.tick(long_after());
        // No reveal cue, no completion: the spin died with the machine.
        assert!(!cues.borrow().contains(&Cue::PrizeReveal));
        assert!(app.session().completed().is_empty());
        assert_eq!(app.step(), Step::Selection);
    }

    #[test]
    fn wrong_answer_banner_clears_on_its_own() {
        let (mut app, _cues) = surprise(vec![escape_game()]);
        app.advance_from_intro().unwrap();
        app.select_game("escape-room").unwrap();
        app.enter_room("one").unwrap();

        assert_eq!(app.submit_answer("one", 2).unwrap(), AnswerOutcome::Wrong);
        assert!(app.escape().unwrap().wrong_banner("one"));
        app.tick(long_after());
        assert!(!app.escape().unwrap().wrong_banner("one"));
    }

    #[test]
    fn simple_game_returns_to_selection() {
        let (mut app, _cues) = surprise(vec![simple_game("tap-heart"), escape_game()]);
        app.advance_from_intro().unwrap();
        app.select_game("tap-heart").unwrap();
        app.finish_simple().unwrap();

        assert!(app.session().active().is_none());
        assert_eq!(app.session().completed(), ["tap-heart"]);
        assert!((app.session().progress_fraction() - 0.5).abs() < f64::EPSILON);
        app.tick(long_after());
        // Non-terminal: the session stays open.
        assert_eq!(app.step(), Step::Selection);
    }

    #[test]
    fn intents_are_rejected_outside_their_step() {
        let (mut app, _cues) = surprise(vec![escape_game()]);
        assert!(app.select_game("escape-room").is_err());
        assert!(app.spin().is_err());

        app.advance_from_intro().unwrap();
        assert!(app.advance_from_intro().is_err());
        assert!(app.submit_answer("one", 0).is_err());

        app.select_game("escape-room").unwrap();
        assert!(app.spin().is_err());
        assert!(matches!(
            app.select_game("nope"),
            Err(SessionError::UnknownGame(_))
        ));
    }
}
