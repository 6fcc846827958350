//! Pieces module - shape catalog and geometric rotation
//!
//! Each of the seven kinds is defined by a single square spawn-orientation
//! matrix (2x2 for O, 3x3 for J/L/S/T/Z, 4x4 for I). Rotation is computed
//! geometrically from the matrix - transpose, then reverse each row for a
//! 90-degree clockwise turn - rather than looked up in an orientation table.
//! Wall conflicts after a rotation are resolved by the bounded alternating
//! kick search in the game module.

use neon_blocks_types::{Cell, PieceKind};

/// Largest catalog matrix side (the I piece).
pub const MATRIX_MAX: usize = 4;

/// Square cell matrix of a piece, in some orientation.
///
/// Backed by a fixed 4x4 array with an explicit side length so values stay
/// `Copy` and rotation never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matrix {
    size: usize,
    cells: [[Cell; MATRIX_MAX]; MATRIX_MAX],
}

impl Matrix {
    /// Spawn-orientation matrix for a piece kind.
    pub fn spawn(kind: PieceKind) -> Self {
        let k = Some(kind);
        let e: Cell = None;
        match kind {
            PieceKind::I => Self::from_rows(
                4,
                [
                    [e, k, e, e],
                    [e, k, e, e],
                    [e, k, e, e],
                    [e, k, e, e],
                ],
            ),
            PieceKind::J => Self::from_rows(
                3,
                [
                    [e, k, e, e],
                    [e, k, e, e],
                    [k, k, e, e],
                    [e, e, e, e],
                ],
            ),
            PieceKind::L => Self::from_rows(
                3,
                [
                    [e, k, e, e],
                    [e, k, e, e],
                    [e, k, k, e],
                    [e, e, e, e],
                ],
            ),
            PieceKind::O => Self::from_rows(
                2,
                [
                    [k, k, e, e],
                    [k, k, e, e],
                    [e, e, e, e],
                    [e, e, e, e],
                ],
            ),
            PieceKind::S => Self::from_rows(
                3,
                [
                    [e, k, k, e],
                    [k, k, e, e],
                    [e, e, e, e],
                    [e, e, e, e],
                ],
            ),
            PieceKind::T => Self::from_rows(
                3,
                [
                    [e, e, e, e],
                    [k, k, k, e],
                    [e, k, e, e],
                    [e, e, e, e],
                ],
            ),
            PieceKind::Z => Self::from_rows(
                3,
                [
                    [k, k, e, e],
                    [e, k, k, e],
                    [e, e, e, e],
                    [e, e, e, e],
                ],
            ),
        }
    }

    fn from_rows(size: usize, cells: [[Cell; MATRIX_MAX]; MATRIX_MAX]) -> Self {
        Self { size, cells }
    }

    /// Side length of the matrix (2, 3 or 4).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cell at matrix coordinates (x, y); empty outside the side length.
    pub fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.size && y < self.size {
            self.cells[y][x]
        } else {
            None
        }
    }

    /// Iterate occupied cells as (x, y, kind) triples.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, PieceKind)> + '_ {
        (0..self.size).flat_map(move |y| {
            (0..self.size).filter_map(move |x| self.cells[y][x].map(|kind| (x, y, kind)))
        })
    }

    /// A new matrix rotated 90 degrees clockwise: transpose, then reverse
    /// each row. `new[y][x] = old[n-1-x][y]`.
    #[must_use]
    pub fn rotated_cw(&self) -> Self {
        let n = self.size;
        let mut out = Self {
            size: n,
            cells: [[None; MATRIX_MAX]; MATRIX_MAX],
        };
        for y in 0..n {
            for x in 0..n {
                out.cells[y][x] = self.cells[n - 1 - x][y];
            }
        }
        out
    }
}
