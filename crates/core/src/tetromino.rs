//! Tetromino module - a single live or ghost piece
//!
//! Every operation is bounded: it computes the largest feasible step against
//! an [`Occupancy`] oracle, applies it atomically and reports what happened
//! as a [`PieceSignal`]. Nothing here panics on blocked movement; a blocked
//! action is a `MoveFailed` / `TurnFailed` / `Landed` signal.

use arrayvec::ArrayVec;

use crate::field::Occupancy;
use crate::ruleset::{normalize_orientation, Ruleset};
use crate::types::{
    Pair, PieceKind, PieceSnapshot, TurnDirection, BLOCKS, COLS, MAX_TURN_STEPS, ROWS,
};

/// Outcome of a piece operation, consumed by the owning matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceSignal {
    /// Signed column delta actually applied
    Moved(i32),
    MoveFailed,
    /// Signed orientation steps actually applied
    Turned(i32),
    TurnFailed,
    Fell(u32),
    Dropped(u32),
    Landed,
    Locked,
}

/// Signals produced by one operation (at most two: `Dropped` then `Landed`)
pub type Signals = ArrayVec<PieceSignal, 2>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tetromino {
    kind: PieceKind,
    /// Bottom-left corner of the 4x4 shape box
    position: Pair,
    /// Unbounded; normalized when indexing tables
    orientation: i32,
    shape: [Pair; BLOCKS],
    locked: bool,
}

impl Tetromino {
    /// New piece at the kind's start position, orientation 0
    pub fn spawn(kind: PieceKind, rules: &Ruleset) -> Self {
        Self {
            kind,
            position: rules.start_position(kind),
            orientation: 0,
            shape: rules.rotation_shape(kind, 0),
            locked: false,
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn position(&self) -> Pair {
        self.position
    }

    pub fn set_position(&mut self, position: Pair) {
        self.position = position;
    }

    pub fn orientation(&self) -> i32 {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: i32, rules: &Ruleset) {
        self.orientation = orientation;
        self.shape = rules.rotation_shape(self.kind, orientation);
    }

    pub fn shape(&self) -> &[Pair; BLOCKS] {
        &self.shape
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Absolute field cells of the four blocks
    pub fn blocks(&self) -> [Pair; BLOCKS] {
        let mut out = self.shape;
        for b in out.iter_mut() {
            *b += self.position;
        }
        out
    }

    pub fn overlaps(&self, field: &impl Occupancy) -> bool {
        self.blocks().iter().any(|&b| field.occupied(b))
    }

    /// Largest step in `0..=magnitude` along `unit` before any block is obstructed
    fn reach(&self, unit: Pair, magnitude: i32, field: &impl Occupancy) -> i32 {
        let mut min = magnitude;
        for block in self.blocks() {
            for i in 1..=min {
                if field.occupied(block + unit.scaled(i)) {
                    min = i - 1;
                    break;
                }
            }
        }
        min
    }

    /// Shift sideways by up to `direction` columns (sign gives the side)
    ///
    /// The magnitude is capped at the field width.
    pub fn move_by(&mut self, direction: i32, field: &impl Occupancy) -> Signals {
        let mut out = Signals::new();
        if self.locked {
            return out;
        }
        let dir = if direction < 0 { -1 } else { 1 };
        let magnitude = direction.unsigned_abs().min(COLS as u32) as i32;
        let d = self.reach(Pair::new(0, dir), magnitude, field);
        if d <= 0 {
            out.push(PieceSignal::MoveFailed);
        } else {
            self.position.col += dir * d;
            out.push(PieceSignal::Moved(dir * d));
        }
        out
    }

    /// Rotate by up to `direction` quarter turns, trying wall kicks for each step
    ///
    /// Stops at the first step for which no kick fits; earlier steps stay applied.
    /// At most `MAX_TURN_STEPS` steps are tried.
    pub fn turn(&mut self, direction: i32, rules: &Ruleset, field: &impl Occupancy) -> Signals {
        let mut out = Signals::new();
        if self.locked {
            return out;
        }
        let turn_dir = TurnDirection::from_sign(direction);
        let dir = turn_dir.step();
        let magnitude = direction.unsigned_abs().min(MAX_TURN_STEPS) as i32;

        let mut applied = 0;
        let mut position = self.position;
        for i in 1..=magnitude {
            let from = self.orientation + dir * (i - 1);
            let nudges = rules.rotation_nudge(self.kind, from, turn_dir);
            let shape = rules.rotation_shape(self.kind, self.orientation + dir * i);
            let fit = nudges.iter().copied().find(|&nudge| {
                shape
                    .iter()
                    .all(|&block| !field.occupied(position + block + nudge))
            });
            match fit {
                Some(nudge) => {
                    position += nudge;
                    applied = i;
                }
                None => break,
            }
        }

        if applied == 0 {
            out.push(PieceSignal::TurnFailed);
        } else {
            let d = dir * applied;
            self.position = position;
            self.set_orientation(self.orientation + d, rules);
            out.push(PieceSignal::Turned(d));
        }
        out
    }

    /// Fall by up to `magnitude` rows; `Landed` when already resting
    pub fn fall(&mut self, magnitude: u32, field: &impl Occupancy) -> Signals {
        let mut out = Signals::new();
        if self.locked {
            return out;
        }
        let d = self.descend(magnitude, field);
        if d == 0 {
            out.push(PieceSignal::Landed);
        } else {
            out.push(PieceSignal::Fell(d));
        }
        out
    }

    fn descend(&mut self, magnitude: u32, field: &impl Occupancy) -> u32 {
        let magnitude = magnitude.min(ROWS as u32) as i32;
        let d = self.reach(Pair::new(-1, 0), magnitude, field).max(0);
        self.position.row -= d;
        d as u32
    }

    /// Hard drop to the resting row
    ///
    /// Emits `Dropped(d)` then `Landed`, or nothing when already resting.
    /// Does not lock.
    pub fn hard_drop(&mut self, rules: &Ruleset, field: &impl Occupancy) -> Signals {
        let mut out = Signals::new();
        if self.locked {
            return out;
        }
        let d = self.descend(rules.rows() as u32, field);
        if d > 0 {
            out.push(PieceSignal::Dropped(d));
            out.push(PieceSignal::Landed);
        }
        out
    }

    /// Lock in place; only the first call emits `Locked`
    pub fn lock(&mut self) -> Signals {
        let mut out = Signals::new();
        if !self.locked {
            self.locked = true;
            out.push(PieceSignal::Locked);
        }
        out
    }

    /// Copy the live piece's position and orientation, then sink to the
    /// resting row. Used to keep the ghost in sync.
    pub fn mirror(&mut self, live: &Tetromino, rules: &Ruleset, field: &impl Occupancy) {
        self.position = live.position;
        self.set_orientation(live.orientation, rules);
        self.locked = false;
        self.descend(rules.rows() as u32, field);
    }

    pub fn snapshot(&self) -> PieceSnapshot {
        PieceSnapshot {
            kind: self.kind,
            position: self.position,
            orientation: normalize_orientation(self.orientation) as i32,
            blocks: self.blocks(),
        }
    }
}
