//! Ruleset module - rotation tables, wall kicks, scoring and timing curves
//!
//! All tables are flat, fixed-size arrays:
//!
//! - shapes: `piece * ORIENTATIONS * BLOCKS + orientation * BLOCKS + block`
//! - nudges: `piece * ORIENTATIONS * TURN_DIRECTIONS * NUDGES
//!   + orientation * TURN_DIRECTIONS * NUDGES + direction * NUDGES + k`
//!
//! Offsets are `(row, col)` inside a 4x4 box whose bottom-left corner is the
//! piece anchor. Orientations wrap modulo 4, including negative values coming
//! from counter-clockwise turns.

use crate::rng::SimpleRng;
use crate::types::{
    Pair, PieceKind, TurnDirection, ATTIC_ROW, BLOCKS, COLS, DELAY_BEFORE_CAST_MS,
    DELAY_BEFORE_LOCK_MS, DELAY_BEFORE_NEXT_MS, MOVE_SPEED, NUDGES, ORIENTATIONS, PIECE_KINDS,
    PUSH_SPEED_MULTIPLIER, ROWS, TURN_DIRECTIONS,
};

const fn p(row: i32, col: i32) -> Pair {
    Pair::new(row, col)
}

const SHAPE_LEN: usize = PIECE_KINDS * ORIENTATIONS * BLOCKS;
const NUDGE_LEN: usize = PIECE_KINDS * ORIENTATIONS * TURN_DIRECTIONS * NUDGES;

#[rustfmt::skip]
static ROTATION_SHAPE: [Pair; SHAPE_LEN] = [
    // I
    p(2, 0), p(2, 1), p(2, 2), p(2, 3),
    p(0, 2), p(1, 2), p(2, 2), p(3, 2),
    p(1, 0), p(1, 1), p(1, 2), p(1, 3),
    p(0, 1), p(1, 1), p(2, 1), p(3, 1),
    // O
    p(2, 1), p(2, 2), p(3, 1), p(3, 2),
    p(2, 1), p(2, 2), p(3, 1), p(3, 2),
    p(2, 1), p(2, 2), p(3, 1), p(3, 2),
    p(2, 1), p(2, 2), p(3, 1), p(3, 2),
    // T
    p(2, 0), p(2, 1), p(2, 2), p(3, 1),
    p(1, 1), p(2, 1), p(2, 2), p(3, 1),
    p(1, 1), p(2, 0), p(2, 1), p(2, 2),
    p(1, 1), p(2, 0), p(2, 1), p(3, 1),
    // S
    p(2, 0), p(2, 1), p(3, 1), p(3, 2),
    p(1, 2), p(2, 1), p(2, 2), p(3, 1),
    p(1, 0), p(1, 1), p(2, 1), p(2, 2),
    p(1, 1), p(2, 0), p(2, 1), p(3, 0),
    // Z
    p(2, 1), p(2, 2), p(3, 0), p(3, 1),
    p(1, 1), p(2, 1), p(2, 2), p(3, 2),
    p(1, 1), p(1, 2), p(2, 0), p(2, 1),
    p(1, 0), p(2, 0), p(2, 1), p(3, 1),
    // J
    p(2, 0), p(2, 1), p(2, 2), p(3, 0),
    p(1, 1), p(2, 1), p(3, 1), p(3, 2),
    p(1, 2), p(2, 0), p(2, 1), p(2, 2),
    p(1, 0), p(1, 1), p(2, 1), p(3, 1),
    // L
    p(2, 0), p(2, 1), p(2, 2), p(3, 2),
    p(1, 1), p(1, 2), p(2, 1), p(3, 1),
    p(1, 0), p(2, 0), p(2, 1), p(2, 2),
    p(1, 1), p(2, 1), p(3, 0), p(3, 1),
];

// Each orientation holds five clockwise kicks then five counter-clockwise.
#[rustfmt::skip]
const NUDGE_I: [Pair; ORIENTATIONS * TURN_DIRECTIONS * NUDGES] = [
    p(0, 0), p(0, 1), p(0, -2), p(-1, -2), p(2, 1),
    p(0, 0), p(0, -1), p(0, 2), p(-1, 2), p(2, -1),

    p(0, 0), p(0, -1), p(0, 2), p(-1, 2), p(2, -1),
    p(0, 0), p(0, -1), p(0, 2), p(-2, -1), p(1, 2),

    p(0, 0), p(0, -1), p(0, 2), p(-1, -1), p(1, 2),
    p(0, 0), p(0, 1), p(0, -2), p(-1, 1), p(1, -2),

    p(0, 0), p(0, 1), p(0, -2), p(-2, 1), p(1, -2),
    p(0, 0), p(0, 1), p(0, -2), p(-1, -2), p(2, 1),
];

const NUDGE_O: [Pair; ORIENTATIONS * TURN_DIRECTIONS * NUDGES] =
    [p(0, 0); ORIENTATIONS * TURN_DIRECTIONS * NUDGES];

// J, L, S, T and Z share one kick table.
#[rustfmt::skip]
const NUDGE_JLSTZ: [Pair; ORIENTATIONS * TURN_DIRECTIONS * NUDGES] = [
    p(0, 0), p(0, -1), p(1, -1), p(-2, 0), p(-2, -1),
    p(0, 0), p(0, 1), p(1, 1), p(-2, 0), p(-2, 1),

    p(0, 0), p(0, 1), p(-1, 1), p(2, 0), p(2, 1),
    p(0, 0), p(0, 1), p(-1, 1), p(2, 0), p(2, 1),

    p(0, 0), p(0, 1), p(1, 1), p(-2, 0), p(-2, 1),
    p(0, 0), p(0, -1), p(1, -1), p(-2, 0), p(-2, -1),

    p(0, 0), p(0, -1), p(-1, -1), p(2, 0), p(2, -1),
    p(0, 0), p(0, -1), p(-1, -1), p(2, 0), p(2, -1),
];

static ROTATION_NUDGE: [Pair; NUDGE_LEN] = concat_nudges();

const fn concat_nudges() -> [Pair; NUDGE_LEN] {
    // Table order follows PieceKind::ALL: I O T S Z J L
    let per_piece = ORIENTATIONS * TURN_DIRECTIONS * NUDGES;
    let mut out = [p(0, 0); NUDGE_LEN];
    let mut piece = 0;
    while piece < PIECE_KINDS {
        let src = match piece {
            0 => NUDGE_I,
            1 => NUDGE_O,
            _ => NUDGE_JLSTZ,
        };
        let mut k = 0;
        while k < per_piece {
            out[piece * per_piece + k] = src[k];
            k += 1;
        }
        piece += 1;
    }
    out
}

/// Normalize an orientation into `0..ORIENTATIONS`
pub fn normalize_orientation(orientation: i32) -> usize {
    orientation.rem_euclid(ORIENTATIONS as i32) as usize
}

/// Immutable rules: geometry tables, curves and timing constants
///
/// The ruleset is a zero-sized value; every query is a pure function of its
/// arguments. Pass it by value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ruleset;

impl Ruleset {
    pub fn new() -> Self {
        Self
    }

    /// Block offsets of `piece` at `orientation`
    pub fn rotation_shape(&self, piece: PieceKind, orientation: i32) -> [Pair; BLOCKS] {
        let o = normalize_orientation(orientation);
        let base = piece.index() * ORIENTATIONS * BLOCKS + o * BLOCKS;
        assert!(base + BLOCKS <= SHAPE_LEN, "rotation shape index out of range");
        let mut out = [Pair::default(); BLOCKS];
        out.copy_from_slice(&ROTATION_SHAPE[base..base + BLOCKS]);
        out
    }

    /// Wall-kick candidates for turning `piece` away from `orientation`
    ///
    /// The first candidate is always `(0, 0)`.
    pub fn rotation_nudge(
        &self,
        piece: PieceKind,
        orientation: i32,
        direction: TurnDirection,
    ) -> [Pair; NUDGES] {
        let o = normalize_orientation(orientation);
        let base = piece.index() * ORIENTATIONS * TURN_DIRECTIONS * NUDGES
            + o * TURN_DIRECTIONS * NUDGES
            + direction.index() * NUDGES;
        assert!(base + NUDGES <= NUDGE_LEN, "rotation nudge index out of range");
        let mut out = [Pair::default(); NUDGES];
        out.copy_from_slice(&ROTATION_NUDGE[base..base + NUDGES]);
        out
    }

    /// Spawn anchor; every piece starts two rows below the top, one column left of center
    pub fn start_position(&self, _piece: PieceKind) -> Pair {
        Pair::new(18, 3)
    }

    /// Lower-left corner of the hidden attic
    pub fn attic_position(&self) -> Pair {
        Pair::new(ATTIC_ROW, 0)
    }

    pub fn rows(&self) -> usize {
        ROWS
    }

    pub fn cols(&self) -> usize {
        COLS
    }

    /// Lines required to reach `level`
    pub fn lines_for_level(&self, level: u32) -> u32 {
        level.saturating_sub(1) * 4
    }

    pub fn level_for_lines(&self, lines: u32) -> u32 {
        lines / 4 + 1
    }

    /// Gravity in rows per second
    pub fn speed_for_level(&self, level: u32) -> f64 {
        1.0 + (level.max(1) - 1) as f64 * 0.5
    }

    /// Award for clearing `count` rows at `level`
    ///
    /// Follows 100, 300, 500, 800, 1100, 1400, 1800, 2200, ... (times level):
    /// the n-th cleared row is worth `d * 100` where `d` is the inverse
    /// triangular index `floor((1 + sqrt(1 + 8 (n - 1))) / 2)`.
    pub fn score_for_line_clear(&self, count: u32, level: u32) -> u32 {
        if count == 0 || level == 0 {
            return 0;
        }
        (1..=count)
            .map(|n| {
                let d = ((1.0 + (1.0 + 8.0 * (n - 1) as f64).sqrt()) / 2.0).floor() as u32;
                d * 100 * level
            })
            .sum()
    }

    /// Award for rows fallen while pushing (soft drop)
    pub fn score_for_soft_drop_push(&self, count: u32, level: u32) -> u32 {
        count * level
    }

    pub fn score_for_hard_drop(&self, count: u32, level: u32) -> u32 {
        2 * count * level
    }

    /// Lateral moves per second
    pub fn move_speed(&self) -> f64 {
        MOVE_SPEED
    }

    pub fn push_speed_multiplier(&self) -> f64 {
        PUSH_SPEED_MULTIPLIER
    }

    pub fn delay_before_next_ms(&self) -> f64 {
        DELAY_BEFORE_NEXT_MS as f64
    }

    pub fn delay_before_cast_ms(&self) -> f64 {
        DELAY_BEFORE_CAST_MS as f64
    }

    pub fn delay_before_lock_ms(&self) -> f64 {
        DELAY_BEFORE_LOCK_MS as f64
    }

    /// One shuffled permutation of all seven kinds
    pub fn next_piece_batch(&self, rng: &mut SimpleRng) -> [PieceKind; PIECE_KINDS] {
        let mut batch = PieceKind::ALL;
        rng.shuffle(&mut batch);
        batch
    }
}
