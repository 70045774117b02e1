use std::collections::HashMap;

use crate::foundation::core::Plane;
use crate::foundation::error::{ReelError, ReelResult};
use crate::source::{ImageSource, SourceMeta};

/// Image stack held in memory.
#[derive(Clone, Debug)]
pub struct MemorySource {
    meta: SourceMeta,
    planes: HashMap<(u32, u32, u64), Plane>,
}

impl MemorySource {
    /// Empty stack of `width x height` planes with the given axis sizes.
    pub fn new(width: u32, height: u32, channels: u32, zstacks: u32, frames: u64) -> Self {
        Self {
            meta: SourceMeta {
                width,
                height,
                um_per_pix: None,
                frames,
                channels,
                zstacks,
                timestamps: Vec::new(),
                time_interval: 1.0,
            },
            planes: HashMap::new(),
        }
    }

    /// Set the physical calibration.
    pub fn with_um_per_pix(mut self, um: f64) -> Self {
        self.meta.um_per_pix = Some(um);
        self
    }

    /// Store a plane; planes may deliberately differ in shape from the stack size.
    pub fn insert(&mut self, channel: u32, z: u32, frame: u64, plane: Plane) -> ReelResult<()> {
        if channel >= self.meta.channels || z >= self.meta.zstacks || frame >= self.meta.frames {
            return Err(ReelError::configuration(format!(
                "plane (c={channel}, z={z}, t={frame}) is outside the stack"
            )));
        }
        self.planes.insert((channel, z, frame), plane);
        Ok(())
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with_plane(mut self, channel: u32, z: u32, frame: u64, plane: Plane) -> ReelResult<Self> {
        self.insert(channel, z, frame, plane)?;
        Ok(self)
    }
}

impl ImageSource for MemorySource {
    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn plane(&self, channel: u32, z: u32, frame: u64) -> ReelResult<Option<Plane>> {
        Ok(self.planes.get(&(channel, z, frame)).cloned())
    }
}
