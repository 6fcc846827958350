//! Game module - active piece control and the session state machine
//!
//! Ties the board, shape catalog, RNG and scoring together. `Game` owns the
//! settled board, the falling piece and the per-session counters, and gates
//! every command on the top-level status: movement, rotation and drops only
//! act while `Playing`; everything else is a silent no-op rather than an
//! error, since bumping a wall is normal gameplay friction.
//!
//! The drop scheduler lives outside: an external clock calls [`Game::tick`]
//! at the interval the session currently advertises, and reschedules itself
//! whenever that interval changes (level-up, soft drop, pause).

use std::fmt;

use neon_blocks_types::{
    Difficulty, GameCommand, GameStatus, PieceKind, DEFAULT_COLS, DEFAULT_ROWS,
};

use crate::board::Board;
use crate::pieces::Matrix;
use crate::rng::{PieceSource, UniformSource};
use crate::scoring::SessionState;
use crate::snapshot::GameSnapshot;

/// The falling piece.
///
/// Replaced wholesale on every spawn; there is no identity carried from one
/// piece to the next. `collided` is a one-tick flag meaning "this piece was
/// just blocked from descending and must be merged on the settle pass".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub matrix: Matrix,
    pub x: i32,
    pub y: i32,
    pub collided: bool,
}

impl ActivePiece {
    /// New piece at the spawn point: horizontally near the middle
    /// (`cols / 2 - 2`), top row.
    fn spawn(kind: PieceKind, cols: usize) -> Self {
        Self {
            kind,
            matrix: Matrix::spawn(kind),
            x: cols as i32 / 2 - 2,
            y: 0,
            collided: false,
        }
    }
}

/// Session parameters that cannot produce a playable board.
///
/// The one fail-fast error in the engine: a zero-sized grid admits no legal
/// piece placement, so `start_session` refuses it outright instead of
/// producing a session that ends on its first tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidBoardSize {
    pub rows: usize,
    pub cols: usize,
}

impl fmt::Display for InvalidBoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "board dimensions must be positive, got {}x{}",
            self.rows, self.cols
        )
    }
}

impl std::error::Error for InvalidBoardSize {}

/// Complete engine state: status, board, falling piece, session counters.
#[derive(Debug)]
pub struct Game {
    status: GameStatus,
    board: Board,
    active: Option<ActivePiece>,
    session: SessionState,
    source: Box<dyn PieceSource>,
}

impl Game {
    /// Create an idle engine (Home screen) with the given piece source.
    pub fn new(source: Box<dyn PieceSource>) -> Self {
        Self {
            status: GameStatus::Home,
            board: Board::new(DEFAULT_ROWS, DEFAULT_COLS),
            active: None,
            session: SessionState::new(Difficulty::Normal),
            source,
        }
    }

    /// Convenience constructor with the default uniform source.
    pub fn with_seed(seed: u32) -> Self {
        Self::new(Box::new(UniformSource::new(seed)))
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn level(&self) -> u32 {
        self.session.level
    }

    pub fn lines_cleared(&self) -> u32 {
        self.session.lines_cleared
    }

    /// Interval the external scheduler should currently tick at.
    pub fn drop_interval_ms(&self) -> u32 {
        self.session.drop_interval_ms
    }

    #[cfg(test)]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Begin a fresh session: new board, new counters, first spawn, Playing.
    ///
    /// Board and session are replaced in one step; no partially-reset state
    /// is ever observable. Rejected silently while a game is in progress or
    /// the leaderboard view is open.
    pub fn start_session(
        &mut self,
        difficulty: Difficulty,
        rows: usize,
        cols: usize,
    ) -> Result<(), InvalidBoardSize> {
        if rows == 0 || cols == 0 {
            return Err(InvalidBoardSize { rows, cols });
        }
        if !matches!(
            self.status,
            GameStatus::Home | GameStatus::Paused | GameStatus::GameOver
        ) {
            return Ok(());
        }

        self.board = Board::new(rows, cols);
        self.session = SessionState::new(difficulty);
        self.status = GameStatus::Playing;
        self.spawn();
        Ok(())
    }

    /// Restart with the same difficulty and board size (Paused or GameOver).
    pub fn restart(&mut self) -> bool {
        if !matches!(self.status, GameStatus::Paused | GameStatus::GameOver) {
            return false;
        }
        let difficulty = self.session.difficulty;
        let (rows, cols) = (self.board.rows(), self.board.cols());
        // Dimensions were validated when the session started.
        self.start_session(difficulty, rows, cols).is_ok()
    }

    /// Freeze gameplay; the scheduler must deliver no ticks while paused.
    pub fn pause(&mut self) -> bool {
        if self.status == GameStatus::Playing {
            self.status = GameStatus::Paused;
            true
        } else {
            false
        }
    }

    /// Resume from pause with board and counters intact.
    pub fn resume(&mut self) -> bool {
        if self.status == GameStatus::Paused {
            self.status = GameStatus::Playing;
            true
        } else {
            false
        }
    }

    /// Abandon the session (Paused or GameOver) and return to Home.
    /// All in-flight session state is discarded atomically.
    pub fn quit_to_home(&mut self) -> bool {
        if !matches!(self.status, GameStatus::Paused | GameStatus::GameOver) {
            return false;
        }
        self.board = Board::new(self.board.rows(), self.board.cols());
        self.session = SessionState::new(self.session.difficulty);
        self.active = None;
        self.status = GameStatus::Home;
        true
    }

    /// Open the leaderboard view from Home. Gameplay state is untouched.
    pub fn open_leaderboard(&mut self) -> bool {
        if self.status == GameStatus::Home {
            self.status = GameStatus::Leaderboard;
            true
        } else {
            false
        }
    }

    /// Return from the leaderboard view to Home.
    pub fn close_leaderboard(&mut self) -> bool {
        if self.status == GameStatus::Leaderboard {
            self.status = GameStatus::Home;
            true
        } else {
            false
        }
    }

    /// Shift the falling piece one column left or right.
    /// Blocked moves are silently rejected.
    pub fn move_horizontal(&mut self, dir: i32) -> bool {
        if self.status != GameStatus::Playing {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if self.board.collides(&active.matrix, active.x, active.y, dir, 0) {
            return false;
        }
        active.x += dir;
        true
    }

    /// Rotate the falling piece 90 degrees clockwise, resolving wall and
    /// stack conflicts with the bounded alternating kick search.
    ///
    /// The candidate matrix is produced purely and committed only when a
    /// legal offset is found; an abandoned rotation leaves the live piece
    /// untouched (matrix and position both).
    pub fn rotate(&mut self) -> bool {
        if self.status != GameStatus::Playing {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let rotated = active.matrix.rotated_cw();
        match resolve_kick(&self.board, &rotated, active.x, active.y) {
            Some(kicked_x) => {
                active.matrix = rotated;
                active.x = kicked_x;
                true
            }
            None => false,
        }
    }

    /// Engage the soft-drop override: gravity pinned to the fast interval
    /// while the down command is held. Idempotent.
    pub fn soft_drop_start(&mut self) -> bool {
        if self.status != GameStatus::Playing || self.session.fast_drop {
            return false;
        }
        self.session = self.session.with_fast_drop();
        true
    }

    /// Release the soft-drop override and restore the level interval.
    pub fn soft_drop_stop(&mut self) -> bool {
        if self.status != GameStatus::Playing || !self.session.fast_drop {
            return false;
        }
        self.session = self.session.without_fast_drop();
        true
    }

    /// Single immediate one-row descent triggered by a discrete command.
    /// Equivalent to one gravity tick, including the settle pass.
    pub fn hard_drop_step(&mut self) -> bool {
        if self.status != GameStatus::Playing {
            return false;
        }
        self.advance();
        true
    }

    /// One gravity tick from the external clock.
    ///
    /// Ticks arriving outside `Playing` (a late timer fire after pause or
    /// game over) are ignored.
    pub fn tick(&mut self) {
        if self.status != GameStatus::Playing {
            return;
        }
        self.advance();
    }

    /// Apply a discrete player command. Returns whether anything changed.
    pub fn apply(&mut self, command: GameCommand) -> bool {
        match command {
            GameCommand::MoveLeft => self.move_horizontal(-1),
            GameCommand::MoveRight => self.move_horizontal(1),
            GameCommand::Rotate => self.rotate(),
            GameCommand::SoftDropStart => self.soft_drop_start(),
            GameCommand::SoftDropStop => self.soft_drop_stop(),
            GameCommand::HardDropStep => self.hard_drop_step(),
            GameCommand::Pause => self.pause(),
            GameCommand::Resume => self.resume(),
            GameCommand::Restart => self.restart(),
            GameCommand::QuitToHome => self.quit_to_home(),
        }
    }

    /// Fresh immutable snapshot of the board with the falling piece
    /// composited on top, plus the session counters.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::compose(&self.board, self.active.as_ref(), self.session, self.status)
    }

    /// Gravity step plus settle pass.
    fn advance(&mut self) {
        self.drop_step();
        if self.status == GameStatus::Playing
            && self.active.as_ref().is_some_and(|piece| piece.collided)
        {
            self.settle();
        }
    }

    /// Descend one row, or flag the piece as settled.
    ///
    /// A piece blocked before it ever cleared the spawn row means the stack
    /// has reached the top: the session ends immediately and the overflowing
    /// piece is left unmerged.
    fn drop_step(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !self.board.collides(&active.matrix, active.x, active.y, 0, 1) {
            active.y += 1;
            return;
        }
        active.collided = true;
        if active.y < 1 {
            self.status = GameStatus::GameOver;
        }
    }

    /// Merge the settled piece, sweep full rows, account the clear, respawn.
    /// Any soft-drop override ends with the settling piece.
    fn settle(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.board.merge(&active.matrix, active.x, active.y);
        let cleared = self.board.sweep().len();
        self.session = self.session.apply_clear(cleared).without_fast_drop();
        self.spawn();
    }

    /// Draw a kind and place a fresh piece at the spawn point. A spawn that
    /// immediately overlaps the stack ends the session.
    fn spawn(&mut self) {
        let kind = self.source.next_kind();
        let piece = ActivePiece::spawn(kind, self.board.cols());
        if self.board.collides(&piece.matrix, piece.x, piece.y, 0, 0) {
            self.status = GameStatus::GameOver;
        }
        self.active = Some(piece);
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::with_seed(1)
    }
}

/// Bounded horizontal kick search for a rotation candidate.
///
/// Starting offset +1, alternating sign with growing magnitude (+1, -2, +3,
/// -4, ...), shifting the candidate and retesting until it fits. The search
/// gives up once the pending offset's magnitude exceeds the matrix width;
/// the caller then abandons the rotation entirely.
fn resolve_kick(board: &Board, matrix: &Matrix, x: i32, y: i32) -> Option<i32> {
    let width = matrix.size() as i32;
    let mut kicked_x = x;
    let mut offset: i32 = 1;
    while board.collides(matrix, kicked_x, y, 0, 0) {
        kicked_x += offset;
        offset = -(offset + offset.signum());
        if offset.abs() > width {
            return None;
        }
    }
    Some(kicked_x)
}
