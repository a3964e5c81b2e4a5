//! Matrix module - the field, the piece lifecycle and scoring
//!
//! The matrix is the aggregate root of one game. It owns the field, the live
//! piece and its ghost, the next queue, the hold slot and the counters, and
//! drives the per-piece state machine:
//!
//! ```text
//! None -> Next -> Fall <-> Land -> Lock -> [Line] -> Next -> ... -> Over
//! ```
//!
//! # Update Model
//!
//! [`Matrix::tick`] first commits any transition requested since the last
//! tick (running leave/enter hooks), then advances the timers of the current
//! state. Commands ([`MatrixControl`]) may arrive between ticks; they act on
//! the live piece immediately and request transitions, which take effect on
//! the next tick. Forced transitions (top out, line clear, hold) commit at
//! once.
//!
//! Everything observable is appended to an event queue, drained by the
//! caller with [`Matrix::drain_events`].

use crate::control::MatrixControl;
use crate::field::{Field, Occupancy};
use crate::rng::PieceQueue;
use crate::ruleset::Ruleset;
use crate::snapshot::{MatrixSnapshot, TimersSnapshot};
use crate::state::{StateMachine, Transition};
use crate::tetromino::{PieceSignal, Signals, Tetromino};
use crate::types::{
    Cell, MatrixEvent, MatrixState, Pair, PieceKind, RowMask, COLS, QUEUE_MIN, ROWS,
};

#[derive(Debug, Clone, Copy, Default)]
struct Timers {
    elapsed: f64,
    next: f64,
    cast: f64,
    movement: f64,
    fall: f64,
    lock: f64,
}

#[derive(Debug, Clone)]
pub struct Matrix {
    rules: Ruleset,
    field: Field,
    piece: Option<Tetromino>,
    ghost: Option<Tetromino>,
    queue: PieceQueue,
    hold: Option<PieceKind>,
    hold_used: bool,
    lines: u32,
    level: u32,
    score: u32,
    speed: f64,
    speed_multiplier: f64,
    push: bool,
    state: StateMachine<MatrixState>,
    timers: Timers,
    events: Vec<MatrixEvent>,
}

impl Matrix {
    /// Fresh game on an empty field
    pub fn new(seed: u32) -> Self {
        Self::with_field(seed, Field::new())
    }

    /// Fresh game on a prepared field
    pub fn with_field(seed: u32, field: Field) -> Self {
        let rules = Ruleset::new();
        let level = 1;
        Self {
            rules,
            field,
            piece: None,
            ghost: None,
            queue: PieceQueue::new(seed, &rules),
            hold: None,
            hold_used: false,
            lines: 0,
            level,
            score: 0,
            speed: rules.speed_for_level(level),
            speed_multiplier: 1.0,
            push: false,
            state: StateMachine::new(MatrixState::None),
            timers: Timers::default(),
            events: Vec::with_capacity(16),
        }
    }

    /// Put `kinds` at the front of the next queue
    pub fn preload(&mut self, kinds: &[PieceKind]) {
        self.queue.preload(kinds, &self.rules);
    }

    /// Advance the matrix by `dt_ms` milliseconds
    pub fn tick(&mut self, dt_ms: u32) {
        let dt = dt_ms as f64;
        self.commit_state();

        match self.state.current() {
            MatrixState::None => self.force_state(MatrixState::Next),
            MatrixState::Next => {
                self.advance(dt);
                self.timers.cast += dt;
                if self.timers.cast >= self.rules.delay_before_cast_ms() {
                    self.cast();
                }
            }
            MatrixState::Fall => {
                self.advance(dt);
                let interval = 1000.0 / (self.speed * self.speed_multiplier);
                self.timers.fall += dt;
                if self.timers.fall >= interval {
                    let rows = (self.timers.fall / interval).floor();
                    self.timers.fall -= rows * interval;
                    if let Some(piece) = self.piece.as_mut() {
                        let signals = piece.fall(rows as u32, &self.field);
                        self.handle(signals);
                    }
                }
            }
            MatrixState::Land => {
                self.advance(dt);
                self.timers.lock += dt;
                if self.timers.lock >= self.rules.delay_before_lock_ms() {
                    if let Some(piece) = self.piece.as_mut() {
                        let signals = piece.lock();
                        self.handle(signals);
                    }
                }
            }
            MatrixState::Lock | MatrixState::Line => {
                self.advance(dt);
                self.timers.next += dt;
                if self.timers.next >= self.rules.delay_before_next_ms() {
                    self.state.request(MatrixState::Next);
                }
            }
            MatrixState::Over => {}
        }
    }

    fn advance(&mut self, dt: f64) {
        self.timers.elapsed += dt;
        self.timers.movement += dt;
    }

    fn force_state(&mut self, state: MatrixState) {
        self.state.request(state);
        self.commit_state();
    }

    fn commit_state(&mut self) {
        while let Some(Transition { from, to }) = self.state.commit() {
            self.on_state_leave(from);
            self.on_state_enter(to);
        }
    }

    fn on_state_leave(&mut self, _state: MatrixState) {}

    fn on_state_enter(&mut self, state: MatrixState) {
        match state {
            MatrixState::None => {}
            MatrixState::Next => {
                self.timers.cast = 0.0;
                self.spawn();
            }
            MatrixState::Fall => self.timers.fall = 0.0,
            MatrixState::Land => self.timers.lock = 0.0,
            MatrixState::Lock => {
                self.timers.next = 0.0;
                self.hold_used = false;
                self.place();
            }
            MatrixState::Line => self.timers.next = 0.0,
            MatrixState::Over => {
                self.piece = None;
                self.ghost = None;
            }
        }
    }

    fn spawn(&mut self) {
        let kind = self.queue.dequeue(&self.rules);
        let piece = Tetromino::spawn(kind, &self.rules);
        let mut ghost = piece.clone();
        ghost.mirror(&piece, &self.rules, &self.field);

        self.events.push(MatrixEvent::Spawned(piece.snapshot()));
        self.events.push(MatrixEvent::GhostSpawned(ghost.snapshot()));

        let overlapped = piece.overlaps(&self.field);
        self.piece = Some(piece);
        self.ghost = Some(ghost);

        if overlapped {
            self.events.push(MatrixEvent::ToppedOut);
            self.force_state(MatrixState::Over);
        }
    }

    fn cast(&mut self) {
        if let Some(piece) = &self.piece {
            self.events.push(MatrixEvent::Cast(piece.snapshot()));
        }
        self.state.request(MatrixState::Fall);
    }

    /// Write the locked piece into the field, then check for top out and lines
    fn place(&mut self) {
        self.ghost = None;
        let Some(piece) = self.piece.take() else {
            return;
        };

        let mut touched = RowMask::new();
        for block in piece.blocks() {
            self.field.set(block, Some(piece.kind()));
            touched.insert(block.row);
        }

        let attic = self.rules.attic_position().row;
        if piece.blocks().iter().any(|b| b.row >= attic) {
            self.events.push(MatrixEvent::ToppedOut);
            self.force_state(MatrixState::Over);
            return;
        }

        let full = self.field.full_rows(&touched);
        if !full.is_empty() {
            self.clear_lines(full);
            self.force_state(MatrixState::Line);
        }
    }

    fn clear_lines(&mut self, full: RowMask) {
        let count = full.count() as u32;
        self.lines += count;
        self.events.push(MatrixEvent::LinesCleared(full));

        let level = self.rules.level_for_lines(self.lines);
        if level > self.level {
            let delta = level - self.level;
            self.level = level;
            self.speed = self.rules.speed_for_level(level);
            self.events.push(MatrixEvent::LevelChanged(delta));
        }

        self.field.collapse(&full);
        self.award(self.rules.score_for_line_clear(count, self.level));
    }

    fn award(&mut self, points: u32) {
        if points == 0 {
            return;
        }
        self.score += points;
        self.events.push(MatrixEvent::ScoreChanged(points));
    }

    /// Translate piece signals into events, ghost updates and transitions
    fn handle(&mut self, signals: Signals) {
        let mut points = 0;
        for signal in signals {
            let Some(piece) = self.piece.as_ref() else {
                return;
            };
            let snap = piece.snapshot();
            match signal {
                PieceSignal::Moved(delta) => {
                    self.events.push(MatrixEvent::Moved { piece: snap, delta });
                    self.sync_ghost(false);
                }
                PieceSignal::Turned(steps) => {
                    self.events.push(MatrixEvent::Turned { piece: snap, steps });
                    self.sync_ghost(true);
                }
                PieceSignal::MoveFailed => self.events.push(MatrixEvent::MoveFailed(snap)),
                PieceSignal::TurnFailed => self.events.push(MatrixEvent::TurnFailed(snap)),
                PieceSignal::Fell(rows) => {
                    self.events.push(MatrixEvent::Fell { piece: snap, rows });
                    if self.push {
                        points += self.rules.score_for_soft_drop_push(rows, self.level);
                    }
                }
                PieceSignal::Dropped(rows) => {
                    self.events.push(MatrixEvent::Dropped { piece: snap, rows });
                    points += self.rules.score_for_hard_drop(rows, self.level);
                }
                PieceSignal::Landed => {
                    self.events.push(MatrixEvent::Landed(snap));
                    self.state.request(MatrixState::Land);
                }
                PieceSignal::Locked => {
                    self.events.push(MatrixEvent::Locked(snap));
                    self.state.request(MatrixState::Lock);
                }
            }
        }
        self.award(points);
    }

    /// Re-drop the ghost under the live piece after a move or turn
    fn sync_ghost(&mut self, turned: bool) {
        let (Some(piece), Some(ghost)) = (self.piece.as_ref(), self.ghost.as_mut()) else {
            return;
        };
        ghost.mirror(piece, &self.rules, &self.field);
        let snap = ghost.snapshot();
        self.events.push(if turned {
            MatrixEvent::GhostTurned(snap)
        } else {
            MatrixEvent::GhostMoved(snap)
        });

        // a landing requested this frame counts as landed
        let landing = self.state.current() == MatrixState::Land
            || self.state.requested() == MatrixState::Land;
        if landing {
            self.timers.lock = 0.0;
            if ghost.position().row != piece.position().row {
                self.state.request(MatrixState::Fall);
            }
        }
    }

    fn accepts_commands(&self) -> bool {
        self.state.current().accepts_commands() && self.piece.is_some()
    }

    /// Hand every queued event to the caller, oldest first
    pub fn drain_events(&mut self) -> Vec<MatrixEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn occupied(&self, cell: Pair) -> bool {
        self.field.occupied(cell)
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn cell(&self, cell: Pair) -> Option<Cell> {
        self.field.get(cell)
    }

    pub fn piece(&self) -> Option<&Tetromino> {
        self.piece.as_ref()
    }

    pub fn ghost(&self) -> Option<&Tetromino> {
        self.ghost.as_ref()
    }

    pub fn next_queue(&self) -> &[PieceKind] {
        self.queue.as_slice()
    }

    pub fn hold_piece(&self) -> Option<PieceKind> {
        self.hold
    }

    /// Set by `hold`, cleared on lock; informational only
    pub fn hold_used(&self) -> bool {
        self.hold_used
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Gravity in rows per second, before the push multiplier
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn push(&self) -> bool {
        self.push
    }

    pub fn state(&self) -> MatrixState {
        self.state.current()
    }

    pub fn requested_state(&self) -> MatrixState {
        self.state.requested()
    }

    pub fn is_over(&self) -> bool {
        self.state.current() == MatrixState::Over
    }

    /// Time spent in active states
    pub fn elapsed_ms(&self) -> f64 {
        self.timers.elapsed
    }

    pub fn lock_timer_ms(&self) -> f64 {
        self.timers.lock
    }

    pub fn timers(&self) -> TimersSnapshot {
        TimersSnapshot {
            elapsed_ms: self.timers.elapsed as u32,
            cast_ms: self.timers.cast as u32,
            fall_ms: self.timers.fall as u32,
            lock_ms: self.timers.lock as u32,
            next_ms: self.timers.next as u32,
            move_ms: self.timers.movement as u32,
        }
    }

    pub fn snapshot(&self) -> MatrixSnapshot {
        let mut out = MatrixSnapshot::default();
        self.snapshot_into(&mut out);
        out
    }

    /// Fill a caller-owned snapshot in place
    pub fn snapshot_into(&self, out: &mut MatrixSnapshot) {
        let codes = self.field.codes();
        for (row, dst) in out.field.iter_mut().enumerate() {
            dst.copy_from_slice(&codes[row * COLS..(row + 1) * COLS]);
        }
        debug_assert_eq!(out.field.len(), ROWS);
        out.piece = self.piece.as_ref().map(Tetromino::snapshot);
        out.ghost = self.ghost.as_ref().map(Tetromino::snapshot);
        let next = self.queue.peek(QUEUE_MIN);
        for (dst, kind) in out.next.iter_mut().zip(next.iter()) {
            *dst = *kind;
        }
        out.hold = self.hold;
        out.hold_used = self.hold_used;
        out.lines = self.lines;
        out.level = self.level;
        out.score = self.score;
        out.state = self.state.current();
        out.push = self.push;
        out.timers = self.timers();
    }
}

impl MatrixControl for Matrix {
    /// Throttled to the ruleset's move speed
    fn move_piece(&mut self, direction: i32) {
        if !self.accepts_commands() {
            return;
        }
        if self.timers.movement < 1000.0 / self.rules.move_speed() {
            return;
        }
        self.timers.movement = 0.0;
        if let Some(piece) = self.piece.as_mut() {
            let signals = piece.move_by(direction, &self.field);
            self.handle(signals);
        }
    }

    fn turn_piece(&mut self, direction: i32) {
        if !self.accepts_commands() {
            return;
        }
        if let Some(piece) = self.piece.as_mut() {
            let signals = piece.turn(direction, &self.rules, &self.field);
            self.handle(signals);
        }
    }

    fn hard_drop(&mut self) {
        if !self.accepts_commands() {
            return;
        }
        if let Some(piece) = self.piece.as_mut() {
            let signals = piece.hard_drop(&self.rules, &self.field);
            self.handle(signals);
        }
    }

    /// Swap the live piece into the hold slot and re-spawn immediately
    ///
    /// Not limited to once per piece; `hold_used` only records that it happened.
    fn hold(&mut self) {
        if !self.accepts_commands() {
            return;
        }
        let Some(piece) = self.piece.take() else {
            return;
        };
        if piece.is_locked() {
            self.piece = Some(piece);
            return;
        }
        self.events.push(MatrixEvent::Held(piece.snapshot()));
        self.ghost = None;
        if let Some(previous) = self.hold.replace(piece.kind()) {
            self.queue.push_front(previous);
        }
        self.hold_used = true;
        self.force_state(MatrixState::Next);
    }

    fn set_push(&mut self, active: bool) {
        self.push = active;
        self.speed_multiplier = if active {
            self.rules.push_speed_multiplier()
        } else {
            1.0
        };
    }
}

impl Occupancy for Matrix {
    fn occupied(&self, cell: Pair) -> bool {
        self.field.occupied(cell)
    }
}
