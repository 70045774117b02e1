//! Image stack access.
//!
//! A source exposes one 2-D plane per (channel, z, frame). Z-projections are computed here, never
//! by the compositor.

/// Folder-of-files source decoded with `image`.
pub mod folder;
/// In-memory source for tests and embedding.
pub mod memory;
/// Z-axis reductions.
pub mod projection;

use crate::foundation::core::Plane;
use crate::foundation::error::ReelResult;
use crate::scene::config::ZSelection;
use crate::source::projection::Projection;

/// Static description of an image stack.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SourceMeta {
    /// Plane width in pixels.
    pub width: u32,
    /// Plane height in pixels.
    pub height: u32,
    /// Physical units (µm) per pixel, when calibrated.
    pub um_per_pix: Option<f64>,
    /// Number of frames.
    pub frames: u64,
    /// Number of channels.
    pub channels: u32,
    /// Number of z-levels.
    pub zstacks: u32,
    /// Acquisition time of each frame in seconds (may be empty).
    pub timestamps: Vec<f64>,
    /// Nominal time between frames in seconds.
    pub time_interval: f64,
}

impl SourceMeta {
    /// Physical units per pixel, `1.0` when uncalibrated.
    pub fn units_per_pixel(&self) -> f64 {
        self.um_per_pix.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(1.0)
    }

    /// Physical `(width, height)` of a full plane.
    pub fn physical_extent(&self) -> (f64, f64) {
        let s = self.units_per_pixel();
        (f64::from(self.width) * s, f64::from(self.height) * s)
    }
}

/// Read-only access to an image stack, shared by every render worker.
pub trait ImageSource: Send + Sync {
    /// Stack description.
    fn meta(&self) -> &SourceMeta;

    /// Plane at `(channel, z, frame)`; `Ok(None)` when that plane is absent.
    fn plane(&self, channel: u32, z: u32, frame: u64) -> ReelResult<Option<Plane>>;

    /// Reduce every available z-plane of `(channel, frame)`.
    fn projection(
        &self,
        channel: u32,
        frame: u64,
        projection: Projection,
    ) -> ReelResult<Option<Plane>> {
        let mut planes = Vec::new();
        for z in 0..self.meta().zstacks.max(1) {
            if let Some(p) = self.plane(channel, z, frame)? {
                planes.push(p);
            }
        }
        if planes.is_empty() {
            return Ok(None);
        }
        projection.reduce(&planes).map(Some)
    }

    /// Resolve a z-selection for `(channel, frame)`.
    fn select(&self, channel: u32, frame: u64, sel: ZSelection) -> ReelResult<Option<Plane>> {
        match sel {
            ZSelection::Index(z) => self.plane(channel, z, frame),
            ZSelection::Projection(p) => self.projection(channel, frame, p),
        }
    }
}
