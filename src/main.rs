//! Headless game server (default binary).
//!
//! Runs the engine behind the TCP remote-control adapter: external shells
//! connect, start sessions, send commands and render the observation stream.
//! There is no local rendering or input handling here.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use neon_blocks::adapter::{serve_blocking, MemoryScoreStore, ScoreStore, ServerConfig};
use neon_blocks::core::Game;

fn main() -> Result<()> {
    if ServerConfig::is_disabled() {
        eprintln!("remote-control server disabled via NEONBLOCKS_DISABLED");
        return Ok(());
    }

    let config = ServerConfig::from_env();
    let store: Arc<dyn ScoreStore> = Arc::new(MemoryScoreStore::new());
    let game = Game::with_seed(wall_clock_seed());

    eprintln!("listening on {}:{}", config.host, config.port);
    serve_blocking(config, game, store)
}

/// Seed piece selection from the wall clock; sessions are not replayable
/// across runs and don't need to be.
fn wall_clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos().wrapping_add(d.as_secs() as u32))
        .unwrap_or(1)
}
