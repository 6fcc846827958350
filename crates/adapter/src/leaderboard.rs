//! Leaderboard module - the ranked-score collaborator
//!
//! On game over the final score and active difficulty are handed to a
//! [`ScoreStore`]; retrieval returns a top-N list keyed by difficulty. The
//! store is strictly a collaborator: submissions are fire-and-forget and a
//! failing store never alters engine state or blocks the session loop.
//!
//! The in-memory implementation here is the default backend; a remote
//! ranked-storage service plugs in behind the same trait.

use std::sync::Mutex;

use anyhow::Result;

use neon_blocks_types::Difficulty;

/// One ranked entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScore {
    pub player: String,
    pub score: u32,
    pub difficulty: Difficulty,
}

/// Ranked-score storage keyed by difficulty.
pub trait ScoreStore: Send + Sync {
    /// Record a finished session's score.
    fn submit(&self, entry: HighScore) -> Result<()>;

    /// Best scores for one difficulty, highest first, at most `limit`.
    fn top_n(&self, difficulty: Difficulty, limit: usize) -> Result<Vec<HighScore>>;
}

/// Process-local score store.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    entries: Mutex<Vec<HighScore>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn submit(&self, entry: HighScore) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("score store poisoned"))?;
        entries.push(entry);
        Ok(())
    }

    fn top_n(&self, difficulty: Difficulty, limit: usize) -> Result<Vec<HighScore>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("score store poisoned"))?;
        let mut ranked: Vec<HighScore> = entries
            .iter()
            .filter(|entry| entry.difficulty == difficulty)
            .cloned()
            .collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(limit);
        Ok(ranked)
    }
}
