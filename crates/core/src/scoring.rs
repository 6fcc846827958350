//! Scoring module - line-clear scores and the per-session state record
//!
//! Scoring follows the classic single/double/triple/tetris curve: clearing
//! `n` rows in one settle awards `LINE_SCORES[n-1] * level`. Session counters
//! live in [`SessionState`], an immutable-per-tick value record: engine steps
//! take the current record and return an updated copy instead of mutating
//! shared counters.

use neon_blocks_types::{Difficulty, FAST_DROP_MS, LINES_PER_LEVEL, LINE_SCORES};

use crate::speed::drop_interval_ms;

/// Points for clearing `cleared` rows at `level`.
///
/// Zero rows score nothing; more than four rows cannot clear from a single
/// settled piece, so larger counts score nothing rather than indexing past
/// the table.
pub fn line_clear_score(cleared: usize, level: u32) -> u32 {
    if cleared == 0 || cleared > LINE_SCORES.len() {
        return 0;
    }
    LINE_SCORES[cleared - 1] * level
}

/// Per-session counters and scheduling inputs.
///
/// Created fresh at session start, replaced wholesale on restart/quit, and
/// threaded through the settle pass as a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    pub score: u32,
    pub lines_cleared: u32,
    pub level: u32,
    pub difficulty: Difficulty,
    /// Interval the external scheduler should use for the next gravity tick.
    pub drop_interval_ms: u32,
    /// Soft-drop override: while held, the interval is pinned to
    /// `FAST_DROP_MS` irrespective of level.
    pub fast_drop: bool,
}

impl SessionState {
    /// Fresh session at level 1 with the difficulty's base interval.
    pub fn new(difficulty: Difficulty) -> Self {
        let level = 1;
        Self {
            score: 0,
            lines_cleared: 0,
            level,
            difficulty,
            drop_interval_ms: drop_interval_ms(difficulty, level),
            fast_drop: false,
        }
    }

    /// Account for a settle that cleared `cleared` rows: score, line total,
    /// and the level-up rule (`lines_cleared > (level + 1) * 10`). A level-up
    /// reschedules gravity unless the fast-drop override is active.
    #[must_use]
    pub fn apply_clear(self, cleared: usize) -> Self {
        let mut next = self;
        if cleared > 0 {
            next.score = next
                .score
                .saturating_add(line_clear_score(cleared, next.level));
            next.lines_cleared += cleared as u32;
        }
        if next.lines_cleared > (next.level + 1) * LINES_PER_LEVEL {
            next.level += 1;
            if !next.fast_drop {
                next.drop_interval_ms = drop_interval_ms(next.difficulty, next.level);
            }
        }
        next
    }

    /// Engage the soft-drop override (idempotent).
    #[must_use]
    pub fn with_fast_drop(self) -> Self {
        Self {
            fast_drop: true,
            drop_interval_ms: FAST_DROP_MS,
            ..self
        }
    }

    /// Release the soft-drop override and restore the level interval.
    #[must_use]
    pub fn without_fast_drop(self) -> Self {
        Self {
            fast_drop: false,
            drop_interval_ms: drop_interval_ms(self.difficulty, self.level),
            ..self
        }
    }
}
