//! Drawing: the CPU surface, subplot geometry and the per-frame render context.

/// Per-frame render context.
pub mod context;
/// Subplot geometry.
pub mod region;
/// CPU drawing surface.
pub mod surface;
pub(crate) mod text;
