use crate::cache::FrameCache;
use crate::foundation::core::Frame;
use crate::foundation::error::ReelResult;
use crate::foundation::math::round_half_even;

/// Maps output time to cached frames.
///
/// `index(t) = round(fps * t) + first_frame`, clamped to the last configured frame. Indices
/// missing from the cache fall back to the last raster read (black before the first read), so gaps
/// left by failed frames never break the video. Each index is looked up once per run of
/// consecutive samples.
pub struct FrameSampler<'a> {
    cache: &'a FrameCache,
    fps: u32,
    offset: u64,
    max: u64,
    black: Frame,
    shown: Option<u64>,
    last: Option<Frame>,
}

impl<'a> FrameSampler<'a> {
    /// Sampler over `cache` for frames `first..=last` at `fps`, producing `width x height` rasters.
    pub fn new(cache: &'a FrameCache, fps: u32, first: u64, last: u64, width: u32, height: u32) -> Self {
        Self {
            cache,
            fps: fps.max(1),
            offset: first,
            max: last.max(first),
            black: Frame::black(width, height),
            shown: None,
            last: None,
        }
    }

    /// Frame index shown at time `t` seconds.
    pub fn index_at(&self, t: f64) -> u64 {
        let step = round_half_even(f64::from(self.fps) * t.max(0.0));
        let idx = if step.is_finite() { step as u64 } else { 0 };
        idx.saturating_add(self.offset).min(self.max)
    }

    /// Raster shown at time `t` seconds.
    pub fn sample(&mut self, t: f64) -> ReelResult<&Frame> {
        let idx = self.index_at(t);
        if self.shown != Some(idx) {
            match self.cache.read(idx)? {
                Some(frame) => self.last = Some(frame),
                None => {
                    tracing::warn!(frame = idx, "frame missing from cache, repeating previous frame");
                }
            }
            self.shown = Some(idx);
        }
        Ok(self.last.as_ref().unwrap_or(&self.black))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sampler.rs"]
mod tests;
