//! Key mapping from terminal events to input channels.
//!
//! Terminals rarely report key releases, so every mapped key is a one-frame
//! trigger (`clear = true`). Holding a key relies on auto-repeat.

use arrayvec::ArrayVec;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::manager::{Channel, InputManager};

/// One channel write produced by a key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySignal {
    pub channel: Channel,
    pub value: f64,
}

pub type KeySignals = ArrayVec<KeySignal, 2>;

fn signals(pairs: &[(Channel, f64)]) -> KeySignals {
    pairs
        .iter()
        .map(|&(channel, value)| KeySignal { channel, value })
        .collect()
}

/// Map a key to the channel values a depth sensor would produce for the
/// equivalent gesture.
pub fn key_signals(key: KeyEvent) -> KeySignals {
    match key.code {
        // Movement (hands forward)
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('h') => {
            signals(&[(Channel::X1, -1.0)])
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('l') => {
            signals(&[(Channel::X1, 1.0)])
        }
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('j') => {
            signals(&[(Channel::Y1, -1.0)])
        }

        // Turns (hands pulled back)
        KeyCode::Up
        | KeyCode::Char('w')
        | KeyCode::Char('W')
        | KeyCode::Char('k')
        | KeyCode::Char('x')
        | KeyCode::Char('X') => signals(&[(Channel::Z1, -1.0), (Channel::R1, 1.0)]),
        KeyCode::Char('z') | KeyCode::Char('Z') | KeyCode::Char('y') | KeyCode::Char('Y') => {
            signals(&[(Channel::Z1, -1.0), (Channel::L1, 1.0)])
        }

        // Both hands down: drop; both hands up: hold
        KeyCode::Char(' ') => signals(&[(Channel::Y1, -1.0), (Channel::Y2, -1.0)]),
        KeyCode::Char('c') | KeyCode::Char('C') => {
            signals(&[(Channel::Y1, 1.0), (Channel::Y2, 1.0)])
        }

        KeyCode::Enter | KeyCode::Char('p') | KeyCode::Char('P') => {
            signals(&[(Channel::Play, 1.0)])
        }
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
            signals(&[(Channel::Quit, 1.0)])
        }

        _ => KeySignals::new(),
    }
}

/// Feed a key into the input manager; returns false for unmapped keys
pub fn apply_key(key: KeyEvent, input: &mut InputManager) -> bool {
    let mapped = key_signals(key);
    for signal in &mapped {
        input.set(signal.channel, signal.value, true);
    }
    !mapped.is_empty()
}

/// Ctrl-C leaves immediately, skipping the quit confirmation.
pub fn should_quit(key: KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}
