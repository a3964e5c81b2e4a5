//! Two-phase state machine
//!
//! Transitions are *requested* at any time (from commands, signals or timer
//! expiry) and *committed* once, at the start of the next update. The commit
//! reports the `(from, to)` pair so the owner can run its leave/enter hooks.
//! A forced transition is a request followed by an immediate commit.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
}

#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    current: S,
    requested: S,
}

impl<S: Copy + PartialEq> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            requested: initial,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn requested(&self) -> S {
        self.requested
    }

    /// Last request wins until the next commit
    pub fn request(&mut self, state: S) {
        self.requested = state;
    }

    pub fn is_pending(&self) -> bool {
        self.current != self.requested
    }

    /// Apply the pending request, if any
    pub fn commit(&mut self) -> Option<Transition<S>> {
        if !self.is_pending() {
            return None;
        }
        let from = self.current;
        self.current = self.requested;
        Some(Transition {
            from,
            to: self.current,
        })
    }
}
