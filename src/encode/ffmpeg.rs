use std::io::{Read as _, Write as _};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::encode::sampler::FrameSampler;
use crate::encode::sink::{EncodeJob, VideoEncoder};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255;

/// H.264 MP4 encoder that streams raw RGBA8 frames into the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    bg_rgba: [u8; 4],
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self {
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

impl FfmpegEncoder {
    /// Encoder flattening translucent pixels over black.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Command-line arguments for `job` (without the `ffmpeg` program name).
pub(crate) fn ffmpeg_args(job: &EncodeJob) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    args.push(if job.overwrite { "-y" } else { "-n" }.into());
    args.extend(
        [
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
        ]
        .map(String::from),
    );
    args.push(format!("{}x{}", job.width, job.height));
    args.push("-r".into());
    args.push(job.fps.to_string());
    args.extend(["-i", "pipe:0", "-an", "-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"].map(String::from));
    args.extend(["-c:v", "libx264", "-b:v"].map(String::from));
    args.push(job.bitrate.clone());
    args.extend(["-pix_fmt", "yuv420p", "-movflags", "+faststart"].map(String::from));

    let tags = [
        ("title", &job.metadata.title),
        ("artist", &job.metadata.author),
        ("copyright", &job.metadata.copyright),
    ];
    for (key, value) in tags {
        if let Some(v) = value {
            args.push("-metadata".into());
            args.push(format!("{key}={v}"));
        }
    }
    args.push(job.out_path.to_string_lossy().into_owned());
    args
}

impl VideoEncoder for FfmpegEncoder {
    fn encode(&mut self, job: &EncodeJob, sampler: &mut FrameSampler<'_>) -> ReelResult<()> {
        job.validate()?;
        ensure_parent_dir(&job.out_path)?;
        if !job.overwrite && job.out_path.exists() {
            return Err(ReelError::already_exists(job.out_path.clone()));
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut child = Command::new("ffmpeg")
            .args(ffmpeg_args(job))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok::<_, std::io::Error>(bytes)
        });

        tracing::info!(
            out = %job.out_path.display(),
            frames = job.frame_count,
            fps = job.fps,
            "encoding video"
        );
        let mut scratch = vec![0u8; (job.width as usize) * (job.height as usize) * 4];
        let mut write_result = Ok(());
        for t in job.sample_times() {
            let pushed = sampler.sample(t).and_then(|frame| {
                job.check_frame(frame)?;
                flatten_premul_over_bg(&mut scratch, &frame.data, self.bg_rgba);
                stdin.write_all(&scratch).map_err(|e| {
                    ReelError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
                })
            });
            if let Err(e) = pushed {
                write_result = Err(e);
                break;
            }
        }
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| ReelError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| ReelError::encode("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| ReelError::encode(format!("ffmpeg stderr read failed: {e}")))?;
        if !status.success() {
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        write_result
    }
}

fn flatten_premul_over_bg(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let inv = 255 - u16::from(s[3]);
        for ((dc, &sc), &bc) in d[..3].iter_mut().zip(&s[..3]).zip(&bg_rgba[..3]) {
            *dc = (u16::from(sc) + mul_div255(u16::from(bc), inv)).min(255) as u8;
        }
        d[3] = 255;
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
