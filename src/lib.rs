//! NEON BLOCKS (workspace facade crate).
//!
//! This package keeps a stable `neon_blocks::{core,adapter,types}` public
//! API while the implementation lives in dedicated crates under `crates/`.

pub use neon_blocks_adapter as adapter;
pub use neon_blocks_core as core;
pub use neon_blocks_types as types;
