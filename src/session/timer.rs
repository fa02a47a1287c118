//! Deferred-effect queue.
//!
//! Every delayed behavior in the game (the final-step transition, the
//! wrong-answer banner clearing, the wheel reveal and celebration) is an
//! entry here. The event loop sleeps until the earliest deadline, then
//! hands expired effects back to the session for application. Entries are
//! scoped so that discarding a sub-machine cancels everything it
//! scheduled; a stale timer can never mutate a game that is gone.

use std::time::{Duration, Instant};

/// Who owns a pending entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Session-wide timers (the final-step transition).
    Session,
    /// Timers owned by one incarnation of the active game. The counter
    /// bumps on every `select_game`, so a new run of the same game never
    /// inherits timers from a previous one.
    Game(u64),
}

/// What to do when a deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Flip the narrative step to the final reveal.
    EnterFinal,
    /// Hide the transient wrong-answer banner in the escape room.
    ClearWrongBanner,
    /// The wheel stops: surface the already-chosen prize.
    RevealPrize,
    /// Play the wheel's celebration (finale cue + confetti).
    CelebrateWheel,
    /// The active game finished; record its completion.
    ReportCompletion,
}

#[derive(Debug)]
struct Entry {
    due: Instant,
    scope: Scope,
    effect: Deferred,
}

/// Pending deferred effects, ordered by deadline on drain.
#[derive(Debug, Default)]
pub struct Timers {
    entries: Vec<Entry>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, scope: Scope, delay: Duration, effect: Deferred) {
        self.schedule_at(Instant::now() + delay, scope, effect);
    }

    fn schedule_at(&mut self, due: Instant, scope: Scope, effect: Deferred) {
        tracing::debug!(?scope, ?effect, "timer scheduled");
        self.entries.push(Entry { due, scope, effect });
    }

    /// Drop every pending entry belonging to `scope`.
    pub fn cancel_scope(&mut self, scope: Scope) {
        let before = self.entries.len();
        self.entries.retain(|e| e.scope != scope);
        if self.entries.len() != before {
            tracing::debug!(?scope, dropped = before - self.entries.len(), "timers cancelled");
        }
    }

    /// Earliest pending deadline, for the event-loop poll timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Remove and return every entry due at or before `now`, earliest
    /// first.
    pub fn drain_due(&mut self, now: Instant) -> Vec<Deferred> {
        let mut due: Vec<(Instant, Deferred)> = Vec::new();
        self.entries.retain(|e| {
            if e.due <= now {
                due.push((e.due, e.effect));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, effect)| effect).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
