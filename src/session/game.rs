//! Per-pack game session.
//!
//! Tracks which games of the active pack are done, owns at most one
//! active sub-machine at a time, and decides when the session as a whole
//! is complete: a terminal game finishing, or every game in the pack
//! being done.

use crate::pack::types::SimpleDef;
use crate::pack::{GameContent, GamePack};

use super::error::SessionError;
use super::escape::PuzzleChain;
use super::narrative::Narrative;
use super::timer::{Scope, Timers};
use super::wheel::PrizeSequencer;

/// A one-intent game: read the prompt, press the button, done. The
/// originals (tap-heart and friends) exist to exercise the non-terminal
/// completion path.
#[derive(Debug)]
pub struct SimpleGame {
    def: SimpleDef,
    done: bool,
}

impl SimpleGame {
    pub fn new(def: SimpleDef) -> Self {
        Self { def, done: false }
    }

    pub fn prompt(&self) -> &str {
        &self.def.prompt
    }

    pub fn message(&self) -> &str {
        &self.def.message
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn finish(&mut self) {
        self.done = true;
    }
}

#[derive(Debug)]
pub enum Machine {
    Escape(PuzzleChain),
    Wheel(PrizeSequencer),
    Simple(SimpleGame),
}

#[derive(Debug)]
pub struct ActiveGame {
    pub id: String,
    pub scope: Scope,
    pub machine: Machine,
}

#[derive(Debug)]
pub struct GameSession {
    pack: GamePack,
    completed: Vec<String>,
    active: Option<ActiveGame>,
    generation: u64,
}

impl GameSession {
    pub fn new(pack: GamePack) -> Self {
        Self {
            pack,
            completed: Vec::new(),
            active: None,
            generation: 0,
        }
    }

    pub fn pack(&self) -> &GamePack {
        &self.pack
    }

    /// Completed game ids in insertion order. Only ever grows.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.iter().any(|g| g == id)
    }

    pub fn progress_fraction(&self) -> f64 {
        self.completed.len() as f64 / self.pack.len() as f64
    }

    pub fn active(&self) -> Option<&ActiveGame> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveGame> {
        self.active.as_mut()
    }

    /// Make `id` the active game, building a fresh sub-machine for it.
    /// Any previously active game is discarded first, timers included.
    pub fn select_game(&mut self, id: &str, timers: &mut Timers) -> Result<(), SessionError> {
        let def = self
            .pack
            .game(id)
            .ok_or_else(|| SessionError::UnknownGame(id.to_string()))?;

        let machine = match &def.content {
            GameContent::Escape(escape) => Machine::Escape(PuzzleChain::new(escape.clone())),
            GameContent::Wheel(wheel) => Machine::Wheel(PrizeSequencer::new(wheel.clone())),
            GameContent::Simple(simple) => Machine::Simple(SimpleGame::new(simple.clone())),
        };
        let id = def.meta.id.clone();

        self.deselect_game(timers);
        self.generation += 1;
        let scope = Scope::Game(self.generation);
        tracing::info!(game = %id, ?scope, "game selected");
        self.active = Some(ActiveGame { id, scope, machine });
        Ok(())
    }

    /// Drop the active game without recording anything. Its pending
    /// timers die with it; re-selecting starts over from scratch.
    pub fn deselect_game(&mut self, timers: &mut Timers) {
        if let Some(active) = self.active.take() {
            timers.cancel_scope(active.scope);
            tracing::info!(game = %active.id, "game deselected");
        }
    }

    /// Record a finished game. Idempotent: a game already in the
    /// completed set changes nothing and triggers nothing. A freshly
    /// recorded terminal game (or the last remaining game) completes the
    /// session.
    pub fn report_completion(
        &mut self,
        id: &str,
        narrative: &mut Narrative,
        timers: &mut Timers,
    ) -> Result<(), SessionError> {
        let terminal = self
            .pack
            .game(id)
            .ok_or_else(|| SessionError::UnknownGame(id.to_string()))?
            .meta
            .terminal;

        if self.is_completed(id) {
            return Ok(());
        }
        self.completed.push(id.to_string());
        tracing::info!(game = id, done = self.completed.len(), total = self.pack.len(), "game completed");

        if terminal || self.completed.len() == self.pack.len() {
            // The narrative guards against double-firing on its own.
            if let Err(err) = narrative.on_session_complete(timers) {
                tracing::debug!(%err, "session completion already handled");
            }
        }
        Ok(())
    }
}
