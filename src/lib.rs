//! Stackreel renders multi-channel microscopy image stacks into annotated videos.
//!
//! A run goes through a fixed pipeline:
//!
//! - Load a [`ConfigFile`] (or build a [`RenderConfig`]) and open an [`ImageSource`]
//! - A [`LayoutComposer`] turns the layout into subplots, channel compositors and overlays
//! - The coordinator paints every frame on per-worker replicas into a [`FrameCache`]
//! - A [`FrameSampler`] reads the cache back in time order and a [`VideoEncoder`] writes the video
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Durable per-run frame storage.
pub mod cache;
/// Channel compositing.
pub mod compose;
/// Video assembly.
pub mod encode;
/// Layout composition.
pub mod layout;
/// Overlays painted on top of composited regions.
pub mod overlay;
/// Drawing surface and render contexts.
pub mod render;
/// Run and configuration-file model.
pub mod scene;
/// Run orchestration.
pub mod session;
/// Image stack access.
pub mod source;

pub use crate::foundation::core::{Canvas, Color, Frame, Plane, Point, Rect, SampleType};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::cache::{FrameCache, FrameCacheEntry};
pub use crate::compose::channel::{ChannelCompositor, RgbRaster, compose};
pub use crate::encode::ffmpeg::FfmpegEncoder;
pub use crate::encode::sampler::FrameSampler;
pub use crate::encode::sink::{EncodeJob, InMemoryEncoder, VideoEncoder, VideoMetadata};
pub use crate::layout::composer::{ComposerSnapshot, LayoutComposer};
pub use crate::overlay::model::{OverlayConfig, OverlayKind};
pub use crate::overlay::style::{OverlayStyle, TimeFormat};
pub use crate::render::context::{FrameStatus, RenderContext};
pub use crate::scene::config::{ChannelStyle, LayoutKind, Origin, RenderConfig, Rescale, ZSelection};
pub use crate::scene::file::{ConfigFile, MovieDef, PanelDef, SourceDef};
pub use crate::session::coordinator::{RenderOpts, RenderStats};
pub use crate::session::movie::{MovieJob, MovieReport, RunOpts};
pub use crate::source::folder::FolderSource;
pub use crate::source::memory::MemorySource;
pub use crate::source::projection::Projection;
pub use crate::source::{ImageSource, SourceMeta};
