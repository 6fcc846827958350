//! Snapshot module - immutable per-tick view of the game
//!
//! Consumers (renderers, the remote-control adapter) never see the live
//! board: every snapshot is a fresh value composed from the settled grid
//! plus the falling piece, so holding one across ticks is always safe and
//! no generation of the board is ever mutated after publication.

use neon_blocks_types::{Cell, CellState, GameStatus};

use crate::board::Board;
use crate::game::ActivePiece;
use crate::scoring::SessionState;

/// One composited cell: the settled kind, or the falling piece's kind tagged
/// `Clearing` (it will be overwritten on the next composite unless it
/// settles).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewCell {
    pub kind: Cell,
    pub state: CellState,
}

impl ViewCell {
    /// An empty settled cell, the background of every composite.
    pub const EMPTY: ViewCell = ViewCell {
        kind: None,
        state: CellState::Settled,
    };
}

/// Full outbound view: composited grid plus session counters and status.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    rows: usize,
    cols: usize,
    cells: Vec<ViewCell>,
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
    pub status: GameStatus,
    /// Interval the external tick scheduler should currently run at.
    pub drop_interval_ms: u32,
}

impl GameSnapshot {
    /// Compose a fresh snapshot from the settled board and the falling piece.
    pub(crate) fn compose(
        board: &Board,
        active: Option<&ActivePiece>,
        session: SessionState,
        status: GameStatus,
    ) -> Self {
        let rows = board.rows();
        let cols = board.cols();
        let mut cells: Vec<ViewCell> = board
            .cells()
            .iter()
            .map(|&kind| ViewCell {
                kind,
                state: CellState::Settled,
            })
            .collect();

        if let Some(piece) = active {
            for (mx, my, kind) in piece.matrix.occupied() {
                let x = piece.x + mx as i32;
                let y = piece.y + my as i32;
                if x >= 0 && (x as usize) < cols && y >= 0 && (y as usize) < rows {
                    cells[y as usize * cols + x as usize] = ViewCell {
                        kind: Some(kind),
                        state: CellState::Clearing,
                    };
                }
            }
        }

        Self {
            rows,
            cols,
            cells,
            score: session.score,
            level: session.level,
            lines_cleared: session.lines_cleared,
            status,
            drop_interval_ms: session.drop_interval_ms,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Composited cell at (x, y); `None` out of bounds.
    pub fn cell(&self, x: usize, y: usize) -> Option<ViewCell> {
        if x < self.cols && y < self.rows {
            Some(self.cells[y * self.cols + x])
        } else {
            None
        }
    }

    /// One composited row, left to right.
    pub fn row(&self, y: usize) -> &[ViewCell] {
        &self.cells[y * self.cols..(y + 1) * self.cols]
    }

    pub fn playable(&self) -> bool {
        self.status == GameStatus::Playing
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            rows: 0,
            cols: 0,
            cells: Vec::new(),
            score: 0,
            level: 1,
            lines_cleared: 0,
            status: GameStatus::Home,
            drop_interval_ms: 0,
        }
    }
}
