//! Input glue (engine-facing).
//!
//! Providers write channel values into an [`InputManager`]; once per frame the
//! [`Player`] reads them and issues commands through
//! [`MatrixControl`](crate::core::MatrixControl). The keyboard provider maps
//! `crossterm` key events onto the same channels a depth sensor would drive.

pub mod manager;
pub mod map;
pub mod player;

pub use kinetris_core as core;
pub use kinetris_types as types;

pub use manager::{Channel, InputManager, CHANNELS};
pub use map::{apply_key, key_signals, should_quit, KeySignal};
pub use player::{Player, PlayerSignal, PlayerSignals, PlayerState};
