//! Kinetris (workspace facade crate).
//!
//! Re-exports the workspace crates under one roof and adds the pieces only
//! the binary needs: process configuration and logging observers.

pub use kinetris_adapter as adapter;
pub use kinetris_core as core;
pub use kinetris_input as input;
pub use kinetris_types as types;

pub mod config;
pub mod observe;
