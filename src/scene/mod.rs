//! Run configuration model.
//!
//! `config` holds the validated, immutable [`RenderConfig`](config::RenderConfig) shared by every
//! render context; `file` is the JSON boundary that lists movies and static panels.

/// Rendering parameters.
pub mod config;
/// Configuration files.
pub mod file;
