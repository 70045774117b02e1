use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{FrameCache, run_id, save_png};
use crate::encode::sampler::FrameSampler;
use crate::encode::sink::{EncodeJob, VideoEncoder, VideoMetadata};
use crate::foundation::error::{ReelError, ReelResult};
use crate::layout::composer::LayoutComposer;
use crate::scene::config::RenderConfig;
use crate::session::coordinator::{RenderOpts, RenderStats, render_frames};
use crate::source::ImageSource;

/// Outputs smaller than this are leftovers of failed runs and may be replaced.
pub const MIN_VALID_OUTPUT_BYTES: u64 = 300;

/// Run-level switches shared by every movie of an invocation.
#[derive(Clone, Debug, Default)]
pub struct RunOpts {
    /// Replace existing outputs.
    pub overwrite: bool,
    /// Paint only the first frame to `<output>.test.png`.
    pub test: bool,
    /// Frame production options.
    pub render: RenderOpts,
    /// Directory under which per-run caches are created (system temp dir when `None`).
    pub cache_root: Option<PathBuf>,
}

/// One movie to produce.
pub struct MovieJob {
    /// Rendering parameters (not yet resolved against the source).
    pub config: RenderConfig,
    /// Image stack.
    pub source: Arc<dyn ImageSource>,
    /// Output video path.
    pub out_path: PathBuf,
    /// Fixed cache directory; such caches are resumable and never removed.
    pub cache_dir: Option<PathBuf>,
    /// Keep a per-run cache after encoding.
    pub keep_cache: bool,
    /// Copyright metadata.
    pub copyright: Option<String>,
}

/// What a movie run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieReport {
    /// File written (video, or still image in test mode).
    pub output: PathBuf,
    /// Frame statistics; empty in test mode.
    pub stats: RenderStats,
}

/// Fail with [`ReelError::AlreadyExists`] when `out` holds a real output and `overwrite` is off.
pub fn preflight(out: &Path, overwrite: bool) -> ReelResult<()> {
    if overwrite {
        return Ok(());
    }
    match std::fs::metadata(out) {
        Ok(meta) if meta.len() >= MIN_VALID_OUTPUT_BYTES => {
            Err(ReelError::already_exists(out.to_path_buf()))
        }
        Ok(_) => {
            tracing::warn!(out = %out.display(), "replacing truncated output");
            Ok(())
        }
        Err(_) => Ok(()),
    }
}

/// Path of the still written in test mode.
pub fn test_still_path(out: &Path) -> PathBuf {
    out.with_extension("test.png")
}

/// Render, cache and encode one movie.
#[tracing::instrument(level = "info", skip_all, fields(out = %job.out_path.display()))]
pub fn render_movie(
    job: MovieJob,
    opts: &RunOpts,
    encoder: &mut dyn VideoEncoder,
) -> ReelResult<MovieReport> {
    let config = job.config.resolved(job.source.meta().frames);
    config.validate()?;
    if let Some(last) = config.last_frame()
        && last >= job.source.meta().frames
    {
        return Err(ReelError::configuration(format!(
            "frame {last} is outside the source ({} frames)",
            job.source.meta().frames
        )));
    }

    if opts.test {
        let still = test_still_path(&job.out_path);
        preflight(&still, opts.overwrite)?;
        return render_still(config, job.source, &still, &cache_root(opts));
    }
    preflight(&job.out_path, opts.overwrite)?;

    let fixed_cache = job.cache_dir.is_some();
    let cache = match &job.cache_dir {
        Some(dir) => FrameCache::open(dir)?,
        None => FrameCache::for_run(&cache_root(opts), &run_id(&job.out_path))?,
    };
    tracing::info!(cache = %cache.dir().display(), frames = config.frames.len(), "rendering movie");

    let config = Arc::new(config);
    let mut composer = LayoutComposer::new(Arc::clone(&config), job.source, cache.clone());
    let stats = match render_frames(&mut composer, &opts.render) {
        Ok(stats) => stats,
        Err(e) => {
            if !fixed_cache {
                discard_cache(cache);
            }
            return Err(e);
        }
    };
    if stats.frames_failed > 0 {
        tracing::warn!(failed = ?stats.failed, "some frames failed; neighbours fill the gaps");
    }

    let (width, height) = composer.make_layout()?.size();
    let (first, last) = match (config.first_frame(), config.last_frame()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(ReelError::configuration("frames must be non-empty")),
    };
    let encode_job = EncodeJob {
        out_path: job.out_path.clone(),
        fps: config.fps,
        bitrate: config.bitrate.clone(),
        frame_count: config.frames.len(),
        width,
        height,
        metadata: VideoMetadata {
            title: Some(config.title.clone()).filter(|t| !t.is_empty()),
            author: config.author.clone(),
            copyright: job.copyright,
        },
        overwrite: true,
    };
    let mut sampler = FrameSampler::new(&cache, config.fps, first, last, width, height);
    let encoded = encoder.encode(&encode_job, &mut sampler);

    if !fixed_cache && !job.keep_cache {
        discard_cache(cache);
    }
    encoded?;

    Ok(MovieReport {
        output: job.out_path,
        stats,
    })
}

fn cache_root(opts: &RunOpts) -> PathBuf {
    opts.cache_root
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("stackreel-cache"))
}

fn discard_cache(cache: FrameCache) {
    if let Err(e) = cache.remove() {
        tracing::warn!(error = %e, "failed to remove frame cache");
    }
}

fn render_still(
    config: RenderConfig,
    source: Arc<dyn ImageSource>,
    still: &Path,
    root: &Path,
) -> ReelResult<MovieReport> {
    let first = config
        .first_frame()
        .ok_or_else(|| ReelError::configuration("frames must be non-empty"))?;
    let scratch = FrameCache::for_run(root, &run_id(still))?;
    let mut composer = LayoutComposer::new(Arc::new(config), source, scratch.clone());
    let painted = composer.make_layout().and_then(|ctx| ctx.paint_frame(first));
    discard_cache(scratch);
    crate::encode::ffmpeg::ensure_parent_dir(still)?;
    save_png(&painted?, still)?;
    tracing::info!(still = %still.display(), frame = first, "wrote test still");
    Ok(MovieReport {
        output: still.to_path_buf(),
        stats: RenderStats::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/session/movie.rs"]
mod tests;
