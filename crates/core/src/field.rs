//! Field module - the 10x22 grid of locked blocks
//!
//! Uses a flat, row-major array so the whole field stays on the stack and
//! can be cloned cheaply. Row 0 is the floor.

use crate::types::{Cell, Pair, PieceKind, RowMask, COLS, ROWS};

/// Total number of cells
pub const FIELD_SIZE: usize = ROWS * COLS;

/// Collision oracle consulted by piece geometry
pub trait Occupancy {
    /// True when `cell` is out of bounds on any side or holds a locked block
    fn occupied(&self, cell: Pair) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    cells: [Cell; FIELD_SIZE],
}

impl Field {
    pub fn new() -> Self {
        Self {
            cells: [None; FIELD_SIZE],
        }
    }

    #[inline(always)]
    fn index(row: i32, col: i32) -> Option<usize> {
        if (0..ROWS as i32).contains(&row) && (0..COLS as i32).contains(&col) {
            Some(row as usize * COLS + col as usize)
        } else {
            None
        }
    }

    /// Cell content, or `None` outside the field
    pub fn get(&self, cell: Pair) -> Option<Cell> {
        Self::index(cell.row, cell.col).map(|i| self.cells[i])
    }

    /// Returns false when `cell` is out of bounds
    pub fn set(&mut self, cell: Pair, value: Cell) -> bool {
        match Self::index(cell.row, cell.col) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Fill a whole row (test and setup helper)
    pub fn fill_row(&mut self, row: i32, kind: PieceKind, except: &[i32]) {
        for col in 0..COLS as i32 {
            if !except.contains(&col) {
                self.set(Pair::new(row, col), Some(kind));
            }
        }
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        if row >= ROWS {
            return false;
        }
        self.cells[row * COLS..(row + 1) * COLS]
            .iter()
            .all(|c| c.is_some())
    }

    /// Narrow `candidates` down to the rows that are actually full
    pub fn full_rows(&self, candidates: &RowMask) -> RowMask {
        let mut full = RowMask::new();
        for row in candidates.rows() {
            if self.is_row_full(row as usize) {
                full.insert(row);
            }
        }
        full
    }

    /// Remove every row in `rows` at once, shifting the rest down and padding
    /// the top with empty rows.
    pub fn collapse(&mut self, rows: &RowMask) -> usize {
        let mut write = 0usize;
        for read in 0..ROWS {
            if rows.contains(read as i32) {
                continue;
            }
            if write != read {
                self.cells
                    .copy_within(read * COLS..(read + 1) * COLS, write * COLS);
            }
            write += 1;
        }
        let removed = ROWS - write;
        self.cells[write * COLS..].fill(None);
        removed
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row * COLS..(row + 1) * COLS]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell codes (0 = empty, 1..=7 = piece kind), row-major from the floor
    pub fn codes(&self) -> [u8; FIELD_SIZE] {
        let mut out = [0u8; FIELD_SIZE];
        for (dst, cell) in out.iter_mut().zip(self.cells.iter()) {
            *dst = cell.map(|k| k.code()).unwrap_or(0);
        }
        out
    }
}

impl Occupancy for Field {
    fn occupied(&self, cell: Pair) -> bool {
        match Self::index(cell.row, cell.col) {
            Some(i) => self.cells[i].is_some(),
            None => true,
        }
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}
