//! Channel compositing: per-channel 2-D arrays plus styles in, one RGB raster out.

/// Compositor and per-region wiring.
pub mod channel;
