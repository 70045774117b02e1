//! Video assembly: time-based sampling of the frame cache and encoders.

/// System `ffmpeg` encoder.
pub mod ffmpeg;
/// Time to cached frame mapping.
pub mod sampler;
/// Encoder trait, jobs and the in-memory encoder.
pub mod sink;
