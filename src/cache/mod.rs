//! Durable per-run frame storage.

/// Frame cache directory and entries.
pub mod frame_cache;

pub use frame_cache::{FrameCache, FrameCacheEntry, run_id, save_png};
