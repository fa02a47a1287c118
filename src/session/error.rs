//! Session error taxonomy.
//!
//! Everything here is recoverable: the renderer shows the message and
//! keeps displaying the current valid state. A wrong puzzle answer is not
//! an error at all; it comes back as a normal result variant.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// An intent arrived in a step or game state where it means nothing.
    /// The renderer should have disabled it, but the session still
    /// refuses rather than corrupt state.
    #[error("'{intent}' is not valid right now: {state}")]
    InvalidTransition {
        intent: &'static str,
        state: &'static str,
    },

    #[error("the pack has no game called '{0}'")]
    UnknownGame(String),

    #[error("room '{0}' is still locked")]
    LockedRoom(String),

    #[error("no spins left on the wheel")]
    Exhausted,
}

impl SessionError {
    pub fn invalid(intent: &'static str, state: &'static str) -> Self {
        SessionError::InvalidTransition { intent, state }
    }
}
