//! The prize wheel: a fixed-length sequence of reveals.
//!
//! The outcome of a spin is never random. Spin *k* reveals prize *k*,
//! full stop; the wheel's rotation on screen is cosmetic. What is timed:
//! the reveal cue fires after the wheel "settles", and the terminal spin
//! earns a celebration beat before completion is recorded.

use std::time::Duration;

use crate::audio::{AudioCueEmitter, Cue};
use crate::pack::types::{PrizeDef, WheelDef};

use super::error::SessionError;
use super::timer::{Deferred, Scope, Timers};

/// Time the wheel spends visually settling before the reveal cue.
pub const REVEAL_DELAY: Duration = Duration::from_secs(4);
/// Beat between the terminal reveal and the celebration.
pub const CELEBRATE_DELAY: Duration = Duration::from_secs(2);
/// Beat between the celebration and the completion report.
pub const COMPLETE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct PrizeSequencer {
    def: WheelDef,
    spins_used: usize,
    last_revealed: Option<usize>,
    spinning: bool,
    celebrating: bool,
    finished: bool,
}

impl PrizeSequencer {
    pub fn new(def: WheelDef) -> Self {
        Self {
            def,
            spins_used: 0,
            last_revealed: None,
            spinning: false,
            celebrating: false,
            finished: false,
        }
    }

    pub fn prizes(&self) -> &[PrizeDef] {
        &self.def.prizes
    }

    pub fn spins_used(&self) -> usize {
        self.spins_used
    }

    pub fn total_spins(&self) -> usize {
        self.def.prizes.len()
    }

    pub fn last_revealed(&self) -> Option<&PrizeDef> {
        self.last_revealed.map(|i| &self.def.prizes[i])
    }

    /// True between `spin()` and the reveal timer firing.
    pub fn spinning(&self) -> bool {
        self.spinning
    }

    pub fn celebrating(&self) -> bool {
        self.celebrating
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Use up one spin. The revealed prize is chosen deterministically;
    /// only its presentation is delayed.
    pub fn spin(
        &mut self,
        timers: &mut Timers,
        scope: Scope,
        audio: &mut dyn AudioCueEmitter,
    ) -> Result<&PrizeDef, SessionError> {
        if self.spins_used == self.def.prizes.len() {
            return Err(SessionError::Exhausted);
        }
        let index = self.spins_used;
        self.spins_used += 1;
        self.last_revealed = Some(index);
        self.spinning = true;
        if self.spins_used == self.def.prizes.len() {
            self.finished = true;
        }

        audio.emit(Cue::SpinStart);
        timers.schedule(scope, REVEAL_DELAY, Deferred::RevealPrize);
        tracing::info!(spin = self.spins_used, total = self.def.prizes.len(), "wheel spun");
        Ok(&self.def.prizes[index])
    }

    /// Timer callback: the wheel settles on its segment.
    pub fn reveal(
        &mut self,
        timers: &mut Timers,
        scope: Scope,
        audio: &mut dyn AudioCueEmitter,
    ) {
        self.spinning = false;
        audio.emit(Cue::PrizeReveal);
        if self.finished && !self.celebrating {
            timers.schedule(scope, CELEBRATE_DELAY, Deferred::CelebrateWheel);
        }
    }

    /// Timer callback: confetti and the finale cue, then the completion
    /// report a beat later.
    pub fn celebrate(
        &mut self,
        timers: &mut Timers,
        scope: Scope,
        audio: &mut dyn AudioCueEmitter,
    ) {
        self.celebrating = true;
        audio.emit(Cue::Finale);
        timers.schedule(scope, COMPLETE_DELAY, Deferred::ReportCompletion);
    }

    /// Dismiss the revealed prize so the wheel is ready again.
    pub fn acknowledge(&mut self) {
        self.last_revealed = None;
    }
}
