//! RNG module - deterministic LCG and the bag-fed next queue
//!
//! The next queue never runs dry: whenever fewer than `QUEUE_MIN` pieces are
//! waiting, whole shuffled batches of all seven kinds are appended. A held
//! piece returned to play is pushed back onto the front.

use arrayvec::ArrayVec;

use crate::ruleset::Ruleset;
use crate::types::{PieceKind, PIECE_KINDS, QUEUE_MIN};

/// Room for the minimum backlog, one fresh batch and one returned hold piece
const QUEUE_CAPACITY: usize = QUEUE_MIN + PIECE_KINDS + 1;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Random value in `[0, max)`
    pub fn next_range(&mut self, max: u32) -> u32 {
        // High bits of an LCG are far better distributed than the low ones
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// Upcoming pieces, refilled from shuffled batches
#[derive(Debug, Clone)]
pub struct PieceQueue {
    pieces: ArrayVec<PieceKind, QUEUE_CAPACITY>,
    rng: SimpleRng,
}

impl PieceQueue {
    /// Create a queue already holding at least `QUEUE_MIN` pieces
    pub fn new(seed: u32, rules: &Ruleset) -> Self {
        let mut queue = Self {
            pieces: ArrayVec::new(),
            rng: SimpleRng::new(seed),
        };
        queue.refill(rules);
        queue
    }

    /// Append whole batches until the minimum backlog is met
    pub fn refill(&mut self, rules: &Ruleset) {
        while self.pieces.len() < QUEUE_MIN {
            let batch = rules.next_piece_batch(&mut self.rng);
            for kind in batch {
                self.pieces.push(kind);
            }
        }
    }

    /// Take the front piece, refilling afterwards
    pub fn dequeue(&mut self, rules: &Ruleset) -> PieceKind {
        if self.pieces.is_empty() {
            self.refill(rules);
        }
        let kind = self.pieces.remove(0);
        self.refill(rules);
        kind
    }

    /// Return a piece to the front of the queue (used by hold)
    pub fn push_front(&mut self, kind: PieceKind) {
        if self.pieces.is_full() {
            // Drop the tail; it is regenerated by the next refill
            self.pieces.pop();
        }
        self.pieces.insert(0, kind);
    }

    /// Replace the queue contents (fixed piece sequences for tests and replays)
    pub fn preload(&mut self, kinds: &[PieceKind], rules: &Ruleset) {
        self.pieces.clear();
        for &kind in kinds.iter().take(QUEUE_CAPACITY) {
            self.pieces.push(kind);
        }
        self.refill(rules);
    }

    /// The next `n` pieces without consuming them
    pub fn peek(&self, n: usize) -> &[PieceKind] {
        &self.pieces[..n.min(self.pieces.len())]
    }

    pub fn as_slice(&self) -> &[PieceKind] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}
