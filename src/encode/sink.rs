use std::path::PathBuf;

use crate::encode::sampler::FrameSampler;
use crate::foundation::core::Frame;
use crate::foundation::error::{ReelError, ReelResult};

/// Container metadata written into the output file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    /// Title tag.
    pub title: Option<String>,
    /// Author tag.
    pub author: Option<String>,
    /// Copyright tag.
    pub copyright: Option<String>,
}

/// One video to assemble from the frame cache.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeJob {
    /// Output file.
    pub out_path: PathBuf,
    /// Output frame rate.
    pub fps: u32,
    /// Target bitrate in ffmpeg notation.
    pub bitrate: String,
    /// Number of output frames.
    pub frame_count: usize,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Container metadata.
    pub metadata: VideoMetadata,
    /// Replace an existing output.
    pub overwrite: bool,
}

impl EncodeJob {
    /// Check sizes and rate.
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::encode("encode width/height must be non-zero"));
        }
        if self.fps == 0 {
            return Err(ReelError::encode("encode fps must be non-zero"));
        }
        if self.frame_count == 0 {
            return Err(ReelError::encode("nothing to encode"));
        }
        Ok(())
    }

    /// Sample times of every output frame: `k / fps`.
    pub fn sample_times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.frame_count).map(|k| k as f64 / f64::from(self.fps))
    }

    pub(crate) fn check_frame(&self, frame: &Frame) -> ReelResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(ReelError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.data.len() != (self.width as usize) * (self.height as usize) * 4 {
            return Err(ReelError::encode(
                "frame.data size mismatch with width*height*4",
            ));
        }
        Ok(())
    }
}

/// Consumes sampled frames in output order and produces a video.
pub trait VideoEncoder {
    /// Encode every sample time of `job`.
    fn encode(&mut self, job: &EncodeJob, sampler: &mut FrameSampler<'_>) -> ReelResult<()>;
}

/// Encoder that keeps the sampled frames in memory (tests and previews).
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    job: Option<EncodeJob>,
    frames: Vec<Frame>,
}

impl InMemoryEncoder {
    /// Empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Job of the last `encode` call.
    pub fn job(&self) -> Option<&EncodeJob> {
        self.job.as_ref()
    }

    /// Frames of the last `encode` call, in output order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl VideoEncoder for InMemoryEncoder {
    fn encode(&mut self, job: &EncodeJob, sampler: &mut FrameSampler<'_>) -> ReelResult<()> {
        job.validate()?;
        self.frames.clear();
        for t in job.sample_times() {
            let frame = sampler.sample(t)?;
            job.check_frame(frame)?;
            self.frames.push(frame.clone());
        }
        self.job = Some(job.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
