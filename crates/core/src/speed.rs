//! Speed module - difficulty-driven gravity curve
//!
//! Maps (difficulty, level) to the gravity interval. The curve is
//! `base / (level * multiplier + 0.2)` with a 100ms floor so high levels
//! never degenerate into runaway scheduling. The transient fast-drop
//! override (fixed 50ms) is applied by the session state, not here.

use neon_blocks_types::{Difficulty, DROP_INTERVAL_FLOOR_MS, SPEED_CURVE_OFFSET};

/// Gravity interval in milliseconds for a difficulty and level.
pub fn drop_interval_ms(difficulty: Difficulty, level: u32) -> u32 {
    let (base, multiplier) = difficulty.speed_params();
    let raw = base / (level as f64 * multiplier + SPEED_CURVE_OFFSET);
    raw.round().max(DROP_INTERVAL_FLOOR_MS as f64) as u32
}
