use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;

use crate::foundation::error::{ReelError, ReelResult};
use crate::layout::composer::{ComposerSnapshot, LayoutComposer};
use crate::render::context::FrameStatus;

/// Options controlling how frames are produced.
#[derive(Clone, Debug, Default)]
pub struct RenderOpts {
    /// Render on one context in the calling thread instead of a worker pool.
    pub sequential: bool,
    /// Worker count override. `None` uses the available CPU count.
    pub threads: Option<usize>,
}

/// Frame production statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames requested.
    pub frames_total: u64,
    /// Frames painted and cached by this run.
    pub frames_rendered: u64,
    /// Frames found in the cache.
    pub frames_cached: u64,
    /// Frames that failed (error or panic).
    pub frames_failed: u64,
    /// Sorted indices of the failed frames.
    pub failed: Vec<u64>,
}

impl RenderStats {
    fn record(&mut self, frame: u64, outcome: &Result<FrameStatus, String>) {
        match outcome {
            Ok(FrameStatus::Rendered) => self.frames_rendered += 1,
            Ok(FrameStatus::Cached) => self.frames_cached += 1,
            Err(_) => {
                self.frames_failed += 1;
                self.failed.push(frame);
            }
        }
    }
}

struct FrameMsg {
    frame: u64,
    replica: usize,
    outcome: Result<FrameStatus, String>,
}

/// Split `frames` over `replicas` by position: frame `k` goes to replica `k % replicas`.
pub fn assign_round_robin(frames: &[u64], replicas: usize) -> Vec<Vec<u64>> {
    let replicas = replicas.max(1);
    let mut out = vec![Vec::new(); replicas];
    for (k, &f) in frames.iter().enumerate() {
        out[k % replicas].push(f);
    }
    out
}

/// Rayon pool with `threads` workers (rayon default when `None`).
pub fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::configuration("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::render(format!("failed to build rayon thread pool: {e}")))
}

/// Produce every configured frame into the cache of `primary`.
///
/// Per-frame failures are logged and counted, never returned.
pub fn render_frames(primary: &mut LayoutComposer, opts: &RenderOpts) -> ReelResult<RenderStats> {
    let stats = if opts.sequential {
        render_sequential(primary)?
    } else {
        render_parallel(primary, opts.threads)?
    };
    // Later steps (assembly, stills) run on the primary.
    primary.make_layout()?;
    tracing::info!(
        total = stats.frames_total,
        rendered = stats.frames_rendered,
        cached = stats.frames_cached,
        failed = stats.frames_failed,
        "frames produced"
    );
    Ok(stats)
}

/// Render on the primary context, frames in ascending order.
pub fn render_sequential(primary: &mut LayoutComposer) -> ReelResult<RenderStats> {
    let mut frames = primary.config().frames.clone();
    frames.sort_unstable();
    let mut stats = RenderStats {
        frames_total: frames.len() as u64,
        ..RenderStats::default()
    };
    let ctx = primary.make_layout()?;
    for frame in frames {
        let outcome = match catch_unwind(AssertUnwindSafe(|| ctx.render_frame(frame))) {
            Ok(r) => r.map_err(|e| e.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        };
        log_outcome(frame, 0, &outcome);
        stats.record(frame, &outcome);
    }
    Ok(stats)
}

/// Render on per-worker replicas rebuilt from a snapshot of `primary`.
///
/// The primary is built first, so layout and overlay errors surface here before any worker runs.
pub fn render_parallel(
    primary: &mut LayoutComposer,
    threads: Option<usize>,
) -> ReelResult<RenderStats> {
    primary.make_layout()?;
    let frames = primary.config().frames.clone();
    let mut stats = RenderStats {
        frames_total: frames.len() as u64,
        ..RenderStats::default()
    };
    if frames.is_empty() {
        return Ok(stats);
    }

    let snapshot = primary.snapshot();
    let pool = build_thread_pool(threads)?;
    let replicas = pool.current_num_threads().min(frames.len()).max(1);
    tracing::info!(
        frames = frames.len(),
        replicas,
        "rendering frames in parallel"
    );

    let (tx, rx) = mpsc::channel::<FrameMsg>();
    for (k, assigned) in assign_round_robin(&frames, replicas).into_iter().enumerate() {
        let tx = tx.clone();
        let snapshot = snapshot.clone();
        pool.spawn(move || run_replica(k, assigned, &snapshot, &tx));
    }
    drop(tx);

    for msg in rx {
        log_outcome(msg.frame, msg.replica, &msg.outcome);
        stats.record(msg.frame, &msg.outcome);
    }
    stats.failed.sort_unstable();
    Ok(stats)
}

fn run_replica(
    replica_idx: usize,
    frames: Vec<u64>,
    snapshot: &ComposerSnapshot,
    tx: &mpsc::Sender<FrameMsg>,
) {
    let mut replica: Option<LayoutComposer> = None;
    for frame in frames {
        let unit = catch_unwind(AssertUnwindSafe(|| -> ReelResult<FrameStatus> {
            if replica.is_none() {
                replica = Some(LayoutComposer::from_snapshot(snapshot)?);
            }
            match replica.as_mut() {
                Some(composer) => composer.make_layout()?.render_frame(frame),
                None => Err(ReelError::render("replica unavailable")),
            }
        }));
        let outcome = match unit {
            Ok(r) => r.map_err(|e| e.to_string()),
            Err(payload) => {
                // Rebuilt from the snapshot before the next unit.
                replica = None;
                Err(panic_message(payload.as_ref()))
            }
        };
        if tx
            .send(FrameMsg {
                frame,
                replica: replica_idx,
                outcome,
            })
            .is_err()
        {
            return;
        }
    }
}

fn log_outcome(frame: u64, replica: usize, outcome: &Result<FrameStatus, String>) {
    match outcome {
        Ok(status) => tracing::debug!(frame, replica, ?status, "frame done"),
        Err(e) => tracing::error!(frame, replica, error = %e, "frame failed"),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("panicked: {msg}")
}

#[cfg(test)]
#[path = "../../tests/unit/session/coordinator.rs"]
mod tests;
