//! Core types module - shared data structures and constants
//!
//! This crate defines the vocabulary shared by the rules engine, the input
//! glue and the remote bridge. Everything here is plain data with no external
//! dependencies, so presentation layers can consume it without pulling in the
//! engine.
//!
//! # Field Geometry
//!
//! The field is `ROWS x COLS` = 22 x 10 cells. Rows grow **upward**: row 0 is
//! the floor, rows 20 and 21 form the hidden "attic" where pieces spawn.
//! Columns grow rightward.
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 33 | Fixed update interval (~30 Hz) |
//! | `DELAY_BEFORE_NEXT_MS` | 0 | Wait after lock / line clear before the next spawn |
//! | `DELAY_BEFORE_CAST_MS` | 1000 | Wait between spawn and the start of gravity |
//! | `DELAY_BEFORE_LOCK_MS` | 1500 | Lock delay once a piece has landed |
//! | `MOVE_SPEED` | 8.0 | Lateral moves per second (repeat throttle) |
//! | `PUSH_SPEED_MULTIPLIER` | 10.0 | Gravity multiplier while pushing down |
//!
//! # Examples
//!
//! ```
//! use kinetris_types::{Pair, PieceKind, MatrixState, ROWS, COLS};
//!
//! let kind = PieceKind::from_str("t").unwrap();
//! assert_eq!(kind, PieceKind::T);
//! assert_eq!(kind.code(), 3);
//!
//! let anchor = Pair::new(18, 3);
//! assert_eq!(anchor + Pair::new(2, 1), Pair::new(20, 4));
//!
//! assert!(MatrixState::Fall.accepts_commands());
//! assert!(!MatrixState::Next.accepts_commands());
//!
//! assert_eq!(ROWS, 22);
//! assert_eq!(COLS, 10);
//! ```

use std::ops::{Add, AddAssign};

/// Field height in cells, including the attic
pub const ROWS: usize = 22;

/// Field width in cells
pub const COLS: usize = 10;

/// First attic row; blocks at or above this row are hidden
pub const ATTIC_ROW: i32 = 20;

/// Fixed update interval in milliseconds (~30 Hz)
pub const TICK_MS: u32 = 33;

/// Wait after a lock (or a line clear) before the next piece spawns
pub const DELAY_BEFORE_NEXT_MS: u32 = 0;

/// Wait between spawn and the start of gravity
pub const DELAY_BEFORE_CAST_MS: u32 = 1000;

/// Lock delay once a piece cannot fall any further
pub const DELAY_BEFORE_LOCK_MS: u32 = 1500;

/// Lateral move repeat rate (columns per second)
pub const MOVE_SPEED: f64 = 8.0;

/// Gravity multiplier while the push (soft drop) input is held
pub const PUSH_SPEED_MULTIPLIER: f64 = 10.0;

/// Minimum number of queued upcoming pieces
pub const QUEUE_MIN: usize = 3;

/// Number of distinct piece kinds
pub const PIECE_KINDS: usize = 7;

/// Rotation states per piece
pub const ORIENTATIONS: usize = 4;

/// Blocks per piece
pub const BLOCKS: usize = 4;

/// Wall-kick candidates tried per turn step
pub const NUDGES: usize = 5;

/// Turn directions (clockwise, counter-clockwise)
pub const TURN_DIRECTIONS: usize = 2;

/// Most quarter turns a single turn command may apply
pub const MAX_TURN_STEPS: u32 = ORIENTATIONS as u32;


/// The seven tetromino piece kinds
///
/// An empty cell is modelled as `None` in [`Cell`] rather than as an extra
/// variant, so a `PieceKind` always names a real shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// All kinds in table order
    pub const ALL: [PieceKind; PIECE_KINDS] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Zero-based table index
    pub fn index(&self) -> usize {
        match self {
            PieceKind::I => 0,
            PieceKind::O => 1,
            PieceKind::T => 2,
            PieceKind::S => 3,
            PieceKind::Z => 4,
            PieceKind::J => 5,
            PieceKind::L => 6,
        }
    }

    /// One-based cell code (0 is reserved for an empty cell)
    pub fn code(&self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=7 => Some(Self::ALL[code as usize - 1]),
            _ => None,
        }
    }

    /// Parse piece kind from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::J => "j",
            PieceKind::L => "l",
        }
    }
}

/// A cell on the field: `None` is empty, `Some(kind)` is a locked block.
pub type Cell = Option<PieceKind>;

/// A (row, col) coordinate or offset
///
/// Used for field cells, block offsets inside a 4x4 shape box, and wall-kick
/// nudges. Row grows upward, col grows rightward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pair {
    pub row: i32,
    pub col: i32,
}

impl Pair {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// This offset repeated `factor` times
    pub fn scaled(self, factor: i32) -> Self {
        Self {
            row: self.row * factor,
            col: self.col * factor,
        }
    }
}

impl Add for Pair {
    type Output = Pair;

    fn add(self, rhs: Pair) -> Pair {
        Pair::new(self.row + rhs.row, self.col + rhs.col)
    }
}

impl AddAssign for Pair {
    fn add_assign(&mut self, rhs: Pair) {
        self.row += rhs.row;
        self.col += rhs.col;
    }
}

/// Turn direction, selected by the sign of a turn request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnDirection {
    Clockwise,
    CounterClockwise,
}

impl TurnDirection {
    /// Negative values turn counter-clockwise, everything else clockwise.
    pub fn from_sign(direction: i32) -> Self {
        if direction < 0 {
            TurnDirection::CounterClockwise
        } else {
            TurnDirection::Clockwise
        }
    }

    /// Orientation delta for one step
    pub fn step(&self) -> i32 {
        match self {
            TurnDirection::Clockwise => 1,
            TurnDirection::CounterClockwise => -1,
        }
    }

    /// Column of this direction in the nudge table
    pub fn index(&self) -> usize {
        match self {
            TurnDirection::Clockwise => 0,
            TurnDirection::CounterClockwise => 1,
        }
    }
}

/// Set of field rows, used to report which rows were cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowMask([bool; ROWS]);

impl RowMask {
    pub fn new() -> Self {
        Self([false; ROWS])
    }

    /// Mark `row`; rows outside the field are ignored
    pub fn insert(&mut self, row: i32) {
        if let Some(slot) = usize::try_from(row).ok().and_then(|r| self.0.get_mut(r)) {
            *slot = true;
        }
    }

    pub fn remove(&mut self, row: i32) {
        if let Some(slot) = usize::try_from(row).ok().and_then(|r| self.0.get_mut(r)) {
            *slot = false;
        }
    }

    pub fn contains(&self, row: i32) -> bool {
        usize::try_from(row)
            .ok()
            .and_then(|r| self.0.get(r))
            .copied()
            .unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Marked rows, bottom to top
    pub fn rows(&self) -> impl Iterator<Item = i32> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(r, _)| r as i32)
    }
}

impl Default for RowMask {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-piece lifecycle states of the matrix
///
/// `None -> Next -> {Fall <-> Land} -> Lock -> [Line] -> Next -> ... -> Over`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixState {
    /// Not started yet
    None,
    /// Piece spawned, waiting for the cast delay
    Next,
    /// Gravity is pulling the piece down
    Fall,
    /// Piece is resting; lock delay is running
    Land,
    /// Piece has been written into the field
    Lock,
    /// Rows were cleared; presentation may animate
    Line,
    /// Topped out (terminal)
    Over,
}

impl MatrixState {
    /// Player commands are only honored while the piece is in play.
    pub fn accepts_commands(&self) -> bool {
        matches!(self, MatrixState::Fall | MatrixState::Land)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixState::None => "none",
            MatrixState::Next => "next",
            MatrixState::Fall => "fall",
            MatrixState::Land => "land",
            MatrixState::Lock => "lock",
            MatrixState::Line => "line",
            MatrixState::Over => "over",
        }
    }
}

/// Read-only view of a live or ghost piece carried by events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSnapshot {
    pub kind: PieceKind,
    /// Bottom-left corner of the 4x4 shape box
    pub position: Pair,
    /// Normalized orientation, 0..=3
    pub orientation: i32,
    pub blocks: [Pair; BLOCKS],
}

/// Notifications emitted by the matrix for presentation layers
///
/// Ordering within one update is significant: `Spawned` precedes
/// `GhostSpawned` and `Cast`; `Moved` precedes `GhostMoved`; `Turned` precedes
/// `GhostTurned`; `Locked` precedes `LinesCleared`, which precedes
/// `LevelChanged` and `ScoreChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixEvent {
    Spawned(PieceSnapshot),
    GhostSpawned(PieceSnapshot),
    Cast(PieceSnapshot),
    Moved { piece: PieceSnapshot, delta: i32 },
    MoveFailed(PieceSnapshot),
    Turned { piece: PieceSnapshot, steps: i32 },
    TurnFailed(PieceSnapshot),
    Fell { piece: PieceSnapshot, rows: u32 },
    Dropped { piece: PieceSnapshot, rows: u32 },
    Landed(PieceSnapshot),
    Locked(PieceSnapshot),
    /// The piece that was swapped into the hold slot
    Held(PieceSnapshot),
    GhostMoved(PieceSnapshot),
    GhostTurned(PieceSnapshot),
    LinesCleared(RowMask),
    LevelChanged(u32),
    ScoreChanged(u32),
    ToppedOut,
}

impl MatrixEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MatrixEvent::Spawned(_) => "spawned",
            MatrixEvent::GhostSpawned(_) => "ghostSpawned",
            MatrixEvent::Cast(_) => "cast",
            MatrixEvent::Moved { .. } => "moved",
            MatrixEvent::MoveFailed(_) => "moveFailed",
            MatrixEvent::Turned { .. } => "turned",
            MatrixEvent::TurnFailed(_) => "turnFailed",
            MatrixEvent::Fell { .. } => "fell",
            MatrixEvent::Dropped { .. } => "dropped",
            MatrixEvent::Landed(_) => "landed",
            MatrixEvent::Locked(_) => "locked",
            MatrixEvent::Held(_) => "held",
            MatrixEvent::GhostMoved(_) => "ghostMoved",
            MatrixEvent::GhostTurned(_) => "ghostTurned",
            MatrixEvent::LinesCleared(_) => "linesCleared",
            MatrixEvent::LevelChanged(_) => "levelChanged",
            MatrixEvent::ScoreChanged(_) => "scoreChanged",
            MatrixEvent::ToppedOut => "toppedOut",
        }
    }
}

/// Discrete player commands accepted by the matrix
///
/// `Move` and `Turn` carry a signed magnitude; `Push` toggles soft-drop
/// gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(i32),
    Turn(i32),
    Drop,
    Hold,
    Push(bool),
}

impl Command {
    /// Parse an argument-free command name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "drop" => Some(Command::Drop),
            "hold" => Some(Command::Hold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Move(_) => "move",
            Command::Turn(_) => "turn",
            Command::Drop => "drop",
            Command::Hold => "hold",
            Command::Push(_) => "push",
        }
    }
}
