//! Run orchestration: frame production, movie assembly and static montages.

/// Parallel and sequential frame production.
pub mod coordinator;
/// Movie runs: preflight, caching, encoding.
pub mod movie;
/// Static multi-tile montages.
pub mod panel;
