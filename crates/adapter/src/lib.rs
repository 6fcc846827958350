//! Adapter module - remote control via TCP socket with JSON protocol
//!
//! This crate is the engine's boundary with the outside world. External
//! drivers (a rendering shell, an AI, a test harness) connect over a TCP
//! socket, send commands, and receive a stream of game observations. The
//! leaderboard collaborator also lives here: final scores are handed to a
//! pluggable [`ScoreStore`](leaderboard::ScoreStore) on game over.
//!
//! # Protocol Overview
//!
//! Line-delimited JSON over TCP:
//!
//! 1. **Connection**: client connects (default: 127.0.0.1:7777)
//! 2. **Handshake**: client sends `hello`, server responds with `welcome`
//! 3. **Controller assignment**: first client to hello becomes the
//!    controller; later clients observe
//! 4. **Observation streaming**: every engine step publishes a full snapshot
//!    to all handshaken clients
//! 5. **Commanding**: the controller starts sessions and sends gameplay
//!    actions
//!
//! # Message Types
//!
//! Client to server: `hello`, `command` (`startSession` / `action` /
//! `leaderboardTop`). Server to client: `welcome`, `observation`, `ack`,
//! `error`, `leaderboard`.
//!
//! # Scheduling
//!
//! The session loop in [`runtime`] owns the engine and the drop timer. The
//! timer is re-armed whenever the engine's advertised interval changes and
//! parked while the game is paused; commands and gravity ticks are strictly
//! serialized on one task.
//!
//! # Environment Variables
//!
//! - `NEONBLOCKS_HOST`: bind address (default: "127.0.0.1")
//! - `NEONBLOCKS_PORT`: port number (default: 7777)
//! - `NEONBLOCKS_MAX_PENDING`: request channel capacity (default: 32)
//! - `NEONBLOCKS_DISABLED`: set to "1" or "true" to disable the server
//!
//! # Manual Testing
//!
//! ```bash
//! nc 127.0.0.1 7777
//! {"type":"hello","seq":1,"client":{"name":"probe","version":"0.1.0"}}
//! {"type":"command","seq":2,"name":"startSession","difficulty":"normal","rows":20,"cols":10}
//! {"type":"command","seq":3,"name":"action","action":"moveLeft"}
//! ```

pub mod leaderboard;
pub mod protocol;
pub mod runtime;
pub mod server;

pub use neon_blocks_core as core;
pub use neon_blocks_types as types;

pub use leaderboard::{HighScore, MemoryScoreStore, ScoreStore};
pub use protocol::*;
pub use runtime::{run_session, SessionRequest};
pub use server::{run_server, ServerConfig};

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use neon_blocks_core::Game;

/// Serve one game over TCP until the listener fails.
///
/// Creates the tokio runtime internally so a synchronous binary can call it
/// directly; the session loop and the server share the runtime.
pub fn serve_blocking(config: ServerConfig, game: Game, store: Arc<dyn ScoreStore>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let (req_tx, req_rx) = mpsc::channel(config.max_pending_commands.max(1));
        let (obs_tx, obs_rx) = mpsc::unbounded_channel();

        let session = tokio::spawn(run_session(game, req_rx, obs_tx, store));
        let result = run_server(config, req_tx, obs_rx, None).await;
        session.abort();
        result
    })
}
