use std::path::{Path, PathBuf};

use crate::foundation::core::{Plane, SampleType};
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::file::SourceDef;
use crate::source::{ImageSource, SourceMeta};

/// Image stack stored as one grayscale file per (channel, z, frame).
#[derive(Clone, Debug)]
pub struct FolderSource {
    folder: PathBuf,
    pattern: String,
    meta: SourceMeta,
}

impl FolderSource {
    /// Open a stack; plane dimensions come from the first frame of channel 0 at z 0.
    pub fn open(def: &SourceDef) -> ReelResult<Self> {
        let mut src = Self {
            folder: def.folder.clone(),
            pattern: def.pattern.clone(),
            meta: SourceMeta {
                width: 0,
                height: 0,
                um_per_pix: def.um_per_pix,
                frames: def.frames,
                channels: def.channels,
                zstacks: def.zstacks,
                timestamps: def.timestamps.clone(),
                time_interval: def.time_interval,
            },
        };
        let probe = (0..def.frames)
            .map(|t| src.path_for(0, 0, t))
            .find(|p| p.is_file())
            .ok_or_else(|| {
                ReelError::configuration(format!(
                    "no planes for channel 0 found in '{}'",
                    def.folder.display()
                ))
            })?;
        let (width, height) = image::image_dimensions(&probe).map_err(|e| {
            ReelError::configuration(format!("failed to probe '{}': {e}", probe.display()))
        })?;
        src.meta.width = width;
        src.meta.height = height;
        tracing::debug!(
            folder = %def.folder.display(),
            width,
            height,
            "opened image stack"
        );
        Ok(src)
    }

    /// File path of one plane.
    pub fn path_for(&self, channel: u32, z: u32, frame: u64) -> PathBuf {
        self.folder
            .join(expand_pattern(&self.pattern, channel, z, frame))
    }
}

impl ImageSource for FolderSource {
    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn plane(&self, channel: u32, z: u32, frame: u64) -> ReelResult<Option<Plane>> {
        let path = self.path_for(channel, z, frame);
        if !path.is_file() {
            return Ok(None);
        }
        decode_plane(&path).map(Some)
    }
}

fn decode_plane(path: &Path) -> ReelResult<Plane> {
    use anyhow::Context as _;

    let img = image::open(path).with_context(|| format!("decode plane '{}'", path.display()))?;
    let (width, height) = (img.width(), img.height());
    let (sample, data) = match img {
        image::DynamicImage::ImageLuma8(buf) => (
            SampleType::U8,
            buf.into_raw().into_iter().map(f32::from).collect(),
        ),
        image::DynamicImage::ImageLuma16(buf) => (
            SampleType::U16,
            buf.into_raw().into_iter().map(f32::from).collect(),
        ),
        other => (SampleType::F32, other.to_luma32f().into_raw()),
    };
    Plane::new(width, height, sample, data)
}

/// Substitute `{c}`, `{z}`, `{t}` and zero-padded `{c:N}`, `{z:N}`, `{t:N}` placeholders.
pub(crate) fn expand_pattern(pattern: &str, channel: u32, z: u32, frame: u64) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let token = &rest[start + 1..start + len];
        let (key, width) = match token.split_once(':') {
            Some((k, w)) => (k, w.parse::<usize>().ok()),
            None => (token, None),
        };
        let value = match key {
            "c" => Some(u64::from(channel)),
            "z" => Some(u64::from(z)),
            "t" => Some(frame),
            _ => None,
        };
        match (value, width) {
            (Some(v), Some(w)) => out.push_str(&format!("{v:0w$}")),
            (Some(v), None) => out.push_str(&v.to_string()),
            (None, _) => out.push_str(&rest[start..=start + len]),
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/source/folder.rs"]
mod tests;
