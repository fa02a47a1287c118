//! Audio cue boundary.
//!
//! The session emits named cues; what they sound like is not its
//! business. Emission is fire-and-forget: no return value, never blocks.

use std::io::Write;

/// The cues the session can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    SpinStart,
    PrizeReveal,
    Correct,
    Wrong,
    Finale,
}

impl Cue {
    pub fn name(self) -> &'static str {
        match self {
            Cue::SpinStart => "spin-start",
            Cue::PrizeReveal => "prize-reveal",
            Cue::Correct => "correct",
            Cue::Wrong => "wrong",
            Cue::Finale => "finale",
        }
    }
}

pub trait AudioCueEmitter {
    fn emit(&mut self, cue: Cue);

    /// Presentation-level mute; emitters without a sound device ignore it.
    fn set_muted(&mut self, _muted: bool) {}
}

/// Rings the terminal bell. The closest thing to a speaker a TUI has.
#[derive(Debug, Default)]
pub struct BellEmitter {
    muted: bool,
}

impl AudioCueEmitter for BellEmitter {
    fn emit(&mut self, cue: Cue) {
        tracing::debug!(cue = cue.name(), muted = self.muted, "audio cue");
        if self.muted {
            return;
        }
        // BEL is dropped silently if the terminal doesn't support it.
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// Discards every cue. Used headless.
#[derive(Debug, Default)]
pub struct NullEmitter;

impl AudioCueEmitter for NullEmitter {
    fn emit(&mut self, _cue: Cue) {}
}

#[cfg(test)]
pub mod test_support {
    use super::{AudioCueEmitter, Cue};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records emitted cues so tests can assert on them after handing the
    /// emitter to the session.
    #[derive(Debug, Default)]
    pub struct RecordingEmitter {
        log: Rc<RefCell<Vec<Cue>>>,
    }

    impl RecordingEmitter {
        pub fn new() -> (Self, Rc<RefCell<Vec<Cue>>>) {
            let log = Rc::new(RefCell::new(Vec::new()));
            (Self { log: log.clone() }, log)
        }
    }

    impl AudioCueEmitter for RecordingEmitter {
        fn emit(&mut self, cue: Cue) {
            self.log.borrow_mut().push(cue);
        }
    }
}
