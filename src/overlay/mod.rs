//! Overlay layer: declarative drawing units painted on top of composited regions.

/// Overlay equality and fingerprints.
pub(crate) mod equality;
/// Overlay configurations.
pub mod model;
/// Overlay painting.
pub mod paint;
/// Layered style options.
pub mod style;
/// Elapsed-time formatting.
pub mod timefmt;
