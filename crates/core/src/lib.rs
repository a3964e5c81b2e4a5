//! Core rules engine - pure, deterministic, and testable
//!
//! This crate holds every game rule and no I/O:
//!
//! - **Deterministic**: the same seed and the same command/tick sequence
//!   always produce the same game
//! - **Synchronous**: nothing blocks or suspends; time only moves when the
//!   caller passes a delta to [`Matrix::tick`]
//! - **Single writer**: all mutation goes through one `&mut Matrix`
//!
//! # Module Structure
//!
//! - [`ruleset`]: rotation shapes, wall-kick nudges, scoring and speed curves
//! - [`rng`]: LCG and the bag-fed next queue
//! - [`field`]: the 10x22 grid and the [`Occupancy`] collision oracle
//! - [`tetromino`]: bounded move/turn/fall/drop/lock for one piece
//! - [`state`]: two-phase (request, then commit) state machine
//! - [`matrix`]: the aggregate root driving the piece lifecycle
//! - [`control`]: the command trait input providers talk to
//! - [`session`]: one matrix plus its observers
//!
//! # Example
//!
//! ```
//! use kinetris_core::{Matrix, MatrixControl};
//! use kinetris_types::{MatrixState, PieceKind};
//!
//! let mut matrix = Matrix::new(12345);
//! matrix.preload(&[PieceKind::O]);
//!
//! matrix.tick(0); // spawn
//! matrix.tick(1000); // cast delay
//! matrix.tick(0); // commit FALL
//! assert_eq!(matrix.state(), MatrixState::Fall);
//!
//! matrix.hard_drop();
//! assert_eq!(matrix.score(), 40); // 20 rows, 2 points each at level 1
//! ```

pub mod control;
pub mod field;
pub mod matrix;
pub mod rng;
pub mod ruleset;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod tetromino;

pub use kinetris_types as types;

pub use control::MatrixControl;
pub use field::{Field, Occupancy};
pub use matrix::Matrix;
pub use rng::{PieceQueue, SimpleRng};
pub use ruleset::Ruleset;
pub use session::{MatrixObserver, Session};
pub use snapshot::{MatrixSnapshot, TimersSnapshot};
pub use state::{StateMachine, Transition};
pub use tetromino::{PieceSignal, Tetromino};
