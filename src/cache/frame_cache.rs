use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context as _;

use crate::foundation::core::Frame;
use crate::foundation::error::{ReelError, ReelResult};

/// One cached frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameCacheEntry {
    /// Frame index the raster belongs to.
    pub frame_index: u64,
    /// Decoded raster.
    pub raster: Frame,
    /// When the entry was written.
    pub written_at: SystemTime,
}

/// Durable frame store keyed by frame index.
///
/// Entries are PNG files named `fNNNNN.png`. Writes are no-clobber: the first writer of an index
/// wins and later writes are no-ops, so concurrent writers and resumed runs are safe.
#[derive(Clone, Debug)]
pub struct FrameCache {
    dir: PathBuf,
}

impl FrameCache {
    /// Cache rooted at `dir` (created if missing).
    pub fn open(dir: impl Into<PathBuf>) -> ReelResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create frame cache '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Fresh cache for one run under `root`.
    pub fn for_run(root: &Path, run_id: &str) -> ReelResult<Self> {
        Self::open(root.join(run_id))
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path of `frame`.
    pub fn path_for(&self, frame: u64) -> PathBuf {
        self.dir.join(format!("f{frame:05}.png"))
    }

    /// `true` when `frame` has a final entry.
    pub fn exists(&self, frame: u64) -> bool {
        self.path_for(frame).is_file()
    }

    /// Store `raster` under `frame` unless an entry exists.
    ///
    /// Returns `true` when this call created the entry.
    pub fn write(&self, frame: u64, raster: &Frame) -> ReelResult<bool> {
        let dst = self.path_for(frame);
        if dst.is_file() {
            tracing::warn!(frame, path = %dst.display(), "frame already cached, not overwriting");
            return Ok(false);
        }

        let tmp = self.dir.join(format!(
            ".f{frame:05}.{}.{}.{}.tmp.png",
            std::process::id(),
            RUN_SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        let guard = TempFileGuard(Some(tmp.clone()));
        save_png(raster, &tmp)?;

        // Hard links never replace an existing destination, unlike rename.
        let created = match std::fs::hard_link(&tmp, &dst) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::warn!(frame, "frame cached concurrently, keeping first entry");
                false
            }
            Err(e) => {
                return Err(ReelError::Other(anyhow::Error::new(e).context(format!(
                    "publish cached frame '{}'",
                    dst.display()
                ))));
            }
        };
        drop(guard);
        Ok(created)
    }

    /// Raster of `frame`, `None` when absent.
    pub fn read(&self, frame: u64) -> ReelResult<Option<Frame>> {
        let path = self.path_for(frame);
        if !path.is_file() {
            return Ok(None);
        }
        let img = image::open(&path)
            .with_context(|| format!("read cached frame '{}'", path.display()))?
            .into_rgba8();
        Ok(Some(Frame {
            width: img.width(),
            height: img.height(),
            data: img.into_raw(),
        }))
    }

    /// Entry of `frame` with its write time, `None` when absent.
    pub fn read_entry(&self, frame: u64) -> ReelResult<Option<FrameCacheEntry>> {
        let Some(raster) = self.read(frame)? else {
            return Ok(None);
        };
        let written_at = std::fs::metadata(self.path_for(frame))
            .and_then(|m| m.modified())
            .with_context(|| format!("stat cached frame {frame}"))?;
        Ok(Some(FrameCacheEntry {
            frame_index: frame,
            raster,
            written_at,
        }))
    }

    /// Sorted indices of every cached frame.
    pub fn frames(&self) -> ReelResult<Vec<u64>> {
        let mut out = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("list frame cache '{}'", self.dir.display()))?;
        for entry in entries {
            let name = entry.context("list frame cache")?.file_name();
            let name = name.to_string_lossy();
            if let Some(idx) = name
                .strip_prefix('f')
                .and_then(|n| n.strip_suffix(".png"))
                .and_then(|n| n.parse::<u64>().ok())
            {
                out.push(idx);
            }
        }
        out.sort_unstable();
        Ok(out)
    }

    /// Delete the cache directory and everything in it.
    pub fn remove(self) -> ReelResult<()> {
        std::fs::remove_dir_all(&self.dir)
            .with_context(|| format!("remove frame cache '{}'", self.dir.display()))?;
        Ok(())
    }
}

/// Write `raster` as an RGBA PNG.
pub fn save_png(raster: &Frame, path: &Path) -> ReelResult<()> {
    image::save_buffer_with_format(
        path,
        &raster.data,
        raster.width,
        raster.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

static RUN_SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Unique id for one rendering run: xxh3 of process id, wall-clock nanos and output path.
pub fn run_id(out_path: &Path) -> String {
    let mut h = xxhash_rust::xxh3::Xxh3::new();
    h.update(&std::process::id().to_le_bytes());
    let seq = RUN_SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    h.update(&seq.to_le_bytes());
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    h.update(&nanos.to_le_bytes());
    h.update(out_path.as_os_str().as_encoded_bytes());
    format!("{:016x}", h.digest())
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/frame_cache.rs"]
mod tests;
