//! Core game engine - pure, deterministic, and testable
//!
//! This crate contains all the game rules, state management, and simulation
//! logic. It has **zero dependencies** on UI, networking, or I/O, making it:
//!
//! - **Deterministic**: a seeded (or scripted) piece source produces
//!   identical games, for tests and external drivers
//! - **Testable**: comprehensive unit tests for all game rules
//! - **Portable**: runs in any environment (headless, terminal, web shell)
//!
//! # Module Structure
//!
//! - [`board`]: settled grid with the collision oracle, merge and line sweep
//! - [`pieces`]: shape catalog and geometric clockwise rotation
//! - [`game`]: active-piece control, settle pass, and the state machine
//! - [`rng`]: bag-free uniform piece selection behind a pluggable trait
//! - [`scoring`]: line-clear scores and the per-session value record
//! - [`speed`]: difficulty-driven gravity curve with the 100ms floor
//! - [`snapshot`]: immutable composited view published to consumers
//!
//! # Game Rules
//!
//! This implementation follows the handheld-classic ruleset:
//!
//! - **Uniform randomizer**: every spawn is an independent draw; repeats are
//!   allowed (no 7-bag)
//! - **Geometric rotation**: transpose-and-reverse clockwise turns with a
//!   bounded alternating wall-kick search (+1, -2, +3, ... up to the piece
//!   width), abandoned wholesale when no offset fits
//! - **Scoring**: 40/100/300/1200 times the current level per 1-4 line clear
//! - **Speed curve**: `base / (level * multiplier + 0.2)` per difficulty,
//!   never below 100ms; soft drop pins the interval to 50ms
//! - **Session flow**: Home -> Playing <-> Paused -> GameOver, with restart
//!   and quit from either terminal state
//!
//! # Example
//!
//! ```
//! use neon_blocks_core::Game;
//! use neon_blocks_types::{Difficulty, GameCommand, GameStatus};
//!
//! let mut game = Game::with_seed(12345);
//! game.start_session(Difficulty::Normal, 20, 10).unwrap();
//!
//! game.apply(GameCommand::MoveLeft);
//! game.apply(GameCommand::Rotate);
//! game.tick(); // one gravity step from the external clock
//!
//! let snapshot = game.snapshot();
//! assert_eq!(snapshot.status, GameStatus::Playing);
//! ```
//!
//! # Timing
//!
//! The engine is tick-driven and owns no clock. An external scheduler calls
//! [`Game::tick`] at the interval advertised by
//! [`Game::drop_interval_ms`], rescheduling whenever that value changes and
//! delivering nothing while the game is paused.

pub mod board;
pub mod game;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;
pub mod speed;

pub use neon_blocks_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use game::{ActivePiece, Game, InvalidBoardSize};
pub use pieces::Matrix;
pub use rng::{PieceSource, ScriptedSource, SimpleRng, UniformSource};
pub use scoring::{line_clear_score, SessionState};
pub use snapshot::{GameSnapshot, ViewCell};
pub use speed::drop_interval_ms;
