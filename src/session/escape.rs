//! The escape room: a linear chain of locked rooms.
//!
//! Rooms unlock strictly in catalog order; solving room *i* opens room
//! *i+1*. There is no branching and no skipping. Once every room is
//! solved the chain asks for the secret code, compared
//! case-insensitively, and only then is the game finished.

use std::time::Duration;

use crate::audio::{AudioCueEmitter, Cue};
use crate::pack::types::{EscapeDef, RoomDef};

use super::error::SessionError;
use super::timer::{Deferred, Scope, Timers};

/// How long the wrong-answer banner stays up.
pub const WRONG_BANNER_CLEAR: Duration = Duration::from_secs(2);
/// Pause between accepting the secret code and recording completion, so
/// the unlock moment gets a beat on screen.
pub const CODE_ACCEPT_DELAY: Duration = Duration::from_secs(2);

/// Result of an answer submission. A wrong answer is a normal outcome,
/// not an error: nothing about the chain changes except the transient
/// banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct { all_solved: bool },
    Wrong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeOutcome {
    Accepted,
    Rejected,
}

#[derive(Debug)]
pub struct PuzzleChain {
    def: EscapeDef,
    unlocked: Vec<String>,
    solved: Vec<String>,
    clue_log: Vec<String>,
    open_room: Option<String>,
    wrong_banner: Option<String>,
    code_rejected: bool,
    finished: bool,
}

impl PuzzleChain {
    pub fn new(def: EscapeDef) -> Self {
        let first = def.rooms[0].id.clone();
        Self {
            def,
            unlocked: vec![first],
            solved: Vec::new(),
            clue_log: Vec::new(),
            open_room: None,
            wrong_banner: None,
            code_rejected: false,
            finished: false,
        }
    }

    pub fn rooms(&self) -> &[RoomDef] {
        &self.def.rooms
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|r| r == id)
    }

    pub fn is_solved(&self, id: &str) -> bool {
        self.solved.iter().any(|r| r == id)
    }

    pub fn all_solved(&self) -> bool {
        self.solved.len() == self.def.rooms.len()
    }

    pub fn clue_log(&self) -> &[String] {
        &self.clue_log
    }

    pub fn open_room(&self) -> Option<&RoomDef> {
        let id = self.open_room.as_deref()?;
        self.room(id)
    }

    pub fn wrong_banner(&self, room_id: &str) -> bool {
        self.wrong_banner.as_deref() == Some(room_id)
    }

    pub fn code_rejected(&self) -> bool {
        self.code_rejected
    }

    pub fn code_hint(&self) -> &str {
        &self.def.code_hint
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    fn room(&self, id: &str) -> Option<&RoomDef> {
        self.def.rooms.iter().find(|r| r.id == id)
    }

    /// Open a room for play. Locked rooms refuse.
    pub fn enter_room(&mut self, id: &str) -> Result<(), SessionError> {
        if !self.is_unlocked(id) {
            return Err(SessionError::LockedRoom(id.to_string()));
        }
        self.open_room = Some(id.to_string());
        Ok(())
    }

    /// Back out of the open room without answering.
    pub fn close_room(&mut self) {
        self.open_room = None;
        self.wrong_banner = None;
    }

    pub fn submit_answer(
        &mut self,
        room_id: &str,
        option: usize,
        timers: &mut Timers,
        scope: Scope,
        audio: &mut dyn AudioCueEmitter,
    ) -> Result<AnswerOutcome, SessionError> {
        if !self.is_unlocked(room_id) {
            return Err(SessionError::LockedRoom(room_id.to_string()));
        }
        let index = self
            .def
            .rooms
            .iter()
            .position(|r| r.id == room_id)
            .ok_or_else(|| SessionError::LockedRoom(room_id.to_string()))?;

        if option != self.def.rooms[index].puzzle.correct {
            self.wrong_banner = Some(room_id.to_string());
            audio.emit(Cue::Wrong);
            timers.schedule(scope, WRONG_BANNER_CLEAR, Deferred::ClearWrongBanner);
            return Ok(AnswerOutcome::Wrong);
        }

        if !self.is_solved(room_id) {
            self.solved.push(room_id.to_string());
            self.clue_log.push(self.def.rooms[index].clue.clone());
            if let Some(next) = self.def.rooms.get(index + 1) {
                self.unlocked.push(next.id.clone());
            }
            audio.emit(Cue::Correct);
            tracing::info!(room = room_id, solved = self.solved.len(), "room solved");
        }
        self.wrong_banner = None;
        self.open_room = None;
        Ok(AnswerOutcome::Correct {
            all_solved: self.all_solved(),
        })
    }

    pub fn submit_final_code(
        &mut self,
        code: &str,
        timers: &mut Timers,
        scope: Scope,
        audio: &mut dyn AudioCueEmitter,
    ) -> Result<CodeOutcome, SessionError> {
        if !self.all_solved() {
            return Err(SessionError::invalid(
                "submit_final_code",
                "rooms are still unsolved",
            ));
        }
        if self.finished {
            return Err(SessionError::invalid(
                "submit_final_code",
                "the chain is already finished",
            ));
        }

        if code.trim().eq_ignore_ascii_case(&self.def.secret_code) {
            self.finished = true;
            self.code_rejected = false;
            audio.emit(Cue::Correct);
            timers.schedule(scope, CODE_ACCEPT_DELAY, Deferred::ReportCompletion);
            tracing::info!("secret code accepted");
            Ok(CodeOutcome::Accepted)
        } else {
            self.code_rejected = true;
            audio.emit(Cue::Wrong);
            timers.schedule(scope, WRONG_BANNER_CLEAR, Deferred::ClearWrongBanner);
            Ok(CodeOutcome::Rejected)
        }
    }

    /// Timer callback: the transient rejection feedback expires.
    pub fn clear_wrong_banner(&mut self) {
        self.wrong_banner = None;
        self.code_rejected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::RecordingEmitter;
    use crate::audio::NullEmitter;
    use crate::pack::types::{PuzzleDef, RoomDef};
    use std::time::Instant;

    fn room(id: &str, correct: usize) -> RoomDef {
        RoomDef {
            id: id.to_string(),
            name: id.to_string(),
            emoji: "R".to_string(),
            description: "a room".to_string(),
            clue: format!("clue-{id}"),
            puzzle: PuzzleDef {
                question: "?".to_string(),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct,
                hint: "hint".to_string(),
            },
        }
    }

    fn chain() -> PuzzleChain {
        PuzzleChain::new(EscapeDef {
            secret_code: "LOVE".to_string(),
            code_hint: "four letters".to_string(),
            rooms: vec![room("one", 0), room("two", 1), room("three", 2)],
        })
    }

    fn solve_all(chain: &mut PuzzleChain, timers: &mut Timers) {
        let mut audio = NullEmitter;
        for (id, correct) in [("one", 0), ("two", 1), ("three", 2)] {
            chain
                .submit_answer(id, correct, timers, Scope::Game(1), &mut audio)
                .unwrap();
        }
    }

    #[test]
    fn only_first_room_starts_unlocked() {
        let chain = chain();
        assert!(chain.is_unlocked("one"));
        assert!(!chain.is_unlocked("two"));
        assert!(!chain.is_unlocked("three"));
    }

    #[test]
    fn entering_locked_room_fails() {
        let mut chain = chain();
        assert_eq!(
            chain.enter_room("two"),
            Err(SessionError::LockedRoom("two".to_string()))
        );
        assert!(chain.enter_room("one").is_ok());
    }

    #[test]
    fn solving_unlocks_the_next_room_only() {
        let mut chain = chain();
        let mut timers = Timers::new();
        let mut audio = NullEmitter;

        let outcome = chain
            .submit_answer("one", 0, &mut timers, Scope::Game(1), &mut audio)
            .unwrap();
        assert_eq!(outcome, AnswerOutcome::Correct { all_solved: false });
        assert!(chain.is_unlocked("two"));
        assert!(!chain.is_unlocked("three"));
    }

    #[test]
    fn answering_a_locked_room_is_rejected() {
        let mut chain = chain();
        let mut timers = Timers::new();
        let mut audio = NullEmitter;
        let err = chain
            .submit_answer("three", 2, &mut timers, Scope::Game(1), &mut audio)
            .unwrap_err();
        assert_eq!(err, SessionError::LockedRoom("three".to_string()));
    }

    #[test]
    fn wrong_answer_changes_nothing_but_the_banner() {
        let mut chain = chain();
        let mut timers = Timers::new();
        let (mut audio, cues) = RecordingEmitter::new();

        let outcome = chain
            .submit_answer("one", 2, &mut timers, Scope::Game(1), &mut audio)
            .unwrap();
        assert_eq!(outcome, AnswerOutcome::Wrong);
        assert!(!chain.is_solved("one"));
        assert!(!chain.is_unlocked("two"));
        assert!(chain.wrong_banner("one"));
        assert!(chain.clue_log().is_empty());
        assert_eq!(*cues.borrow(), vec![Cue::Wrong]);

        // Banner clears when the timer fires.
        assert_eq!(
            timers.drain_due(Instant::now() + WRONG_BANNER_CLEAR),
            vec![Deferred::ClearWrongBanner]
        );
        chain.clear_wrong_banner();
        assert!(!chain.wrong_banner("one"));
    }

    #[test]
    fn clue_is_logged_at_most_once() {
        let mut chain = chain();
        let mut timers = Timers::new();
        let mut audio = NullEmitter;

        for _ in 0..3 {
            chain
                .submit_answer("one", 0, &mut timers, Scope::Game(1), &mut audio)
                .unwrap();
        }
        assert_eq!(chain.clue_log(), ["clue-one"]);
    }

    #[test]
    fn final_code_requires_all_rooms_solved() {
        let mut chain = chain();
        let mut timers = Timers::new();
        let mut audio = NullEmitter;
        let err = chain
            .submit_final_code("love", &mut timers, Scope::Game(1), &mut audio)
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[test]
    fn final_code_is_case_insensitive() {
        for attempt in ["LOVE", "love", "LoVe"] {
            let mut chain = chain();
            let mut timers = Timers::new();
            solve_all(&mut chain, &mut timers);

            let mut audio = NullEmitter;
            let outcome = chain
                .submit_final_code(attempt, &mut timers, Scope::Game(1), &mut audio)
                .unwrap();
            assert_eq!(outcome, CodeOutcome::Accepted, "attempt {attempt}");
            assert!(chain.finished());
        }
    }

    #[test]
    fn near_miss_code_is_rejected() {
        let mut chain = chain();
        let mut timers = Timers::new();
        solve_all(&mut chain, &mut timers);

        let mut audio = NullEmitter;
        let outcome = chain
            .submit_final_code("loves", &mut timers, Scope::Game(1), &mut audio)
            .unwrap();
        assert_eq!(outcome, CodeOutcome::Rejected);
        assert!(!chain.finished());
        assert!(chain.code_rejected());
        // No retry limit: the next good attempt still works.
        let outcome = chain
            .submit_final_code(" love ", &mut timers, Scope::Game(1), &mut audio)
            .unwrap();
        assert_eq!(outcome, CodeOutcome::Accepted);
    }

    #[test]
    fn accepted_code_schedules_completion_report() {
        let mut chain = chain();
        let mut timers = Timers::new();
        solve_all(&mut chain, &mut timers);
        timers.drain_due(Instant::now() + Duration::from_secs(60));

        let mut audio = NullEmitter;
        chain
            .submit_final_code("love", &mut timers, Scope::Game(1), &mut audio)
            .unwrap();
        assert_eq!(
            timers.drain_due(Instant::now() + CODE_ACCEPT_DELAY),
            vec![Deferred::ReportCompletion]
        );
    }
}
