use crate::types::{MatrixState, PieceKind, PieceSnapshot, COLS, QUEUE_MIN, ROWS};

/// Millisecond timers, truncated from the matrix's fractional accumulators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimersSnapshot {
    pub elapsed_ms: u32,
    pub cast_ms: u32,
    pub fall_ms: u32,
    pub lock_ms: u32,
    pub next_ms: u32,
    pub move_ms: u32,
}

/// Read-only copy of everything a presentation layer draws
///
/// `field[row][col]` holds cell codes (0 empty, 1..=7 piece kind), row 0 at
/// the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixSnapshot {
    pub field: [[u8; COLS]; ROWS],
    pub piece: Option<PieceSnapshot>,
    pub ghost: Option<PieceSnapshot>,
    pub next: [PieceKind; QUEUE_MIN],
    pub hold: Option<PieceKind>,
    pub hold_used: bool,
    pub lines: u32,
    pub level: u32,
    pub score: u32,
    pub state: MatrixState,
    pub push: bool,
    pub timers: TimersSnapshot,
}

impl MatrixSnapshot {
    pub fn game_over(&self) -> bool {
        self.state == MatrixState::Over
    }
}

impl Default for MatrixSnapshot {
    fn default() -> Self {
        Self {
            field: [[0u8; COLS]; ROWS],
            piece: None,
            ghost: None,
            next: [PieceKind::I; QUEUE_MIN],
            hold: None,
            hold_used: false,
            lines: 0,
            level: 1,
            score: 0,
            state: MatrixState::None,
            push: false,
            timers: TimersSnapshot::default(),
        }
    }
}
