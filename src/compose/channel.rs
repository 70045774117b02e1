use std::collections::BTreeMap;

use crate::foundation::core::{Plane, SampleType};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::percentile;
use crate::scene::config::{ChannelStyle, Rescale, ZSelection};
use crate::source::ImageSource;

/// Composited RGB raster (HDR: values past the sample type's range are kept).
#[derive(Clone, Debug, PartialEq)]
pub struct RgbRaster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Sample type the values are expressed in.
    pub sample: SampleType,
    /// Interleaved RGB, `width * height * 3` long.
    pub data: Vec<f32>,
}

impl RgbRaster {
    /// RGB triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// One channel handed to [`compose`].
#[derive(Clone, Copy, Debug)]
pub struct ChannelInput<'a> {
    /// Channel id, used to look up its style.
    pub channel: u32,
    /// Plane data, `None` when unavailable for this frame.
    pub plane: Option<&'a Plane>,
}

/// Per-channel outcome of a composite.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeOutput {
    /// Composited raster.
    pub raster: RgbRaster,
    /// `Some(channel)` for every contributing input, `None` for skipped ones, in input order.
    pub layers: Vec<Option<u32>>,
}

/// Composite channels into one RGB raster.
///
/// Each available channel is rescaled, broadcast to RGB, weighted by its color and intensity, and
/// summed in input order. Unavailable channels are skipped; if none is available the frame is
/// [`ReelError::FrameUnavailable`]. Shapes must agree across available channels.
pub fn compose(
    inputs: &[ChannelInput<'_>],
    styles: &BTreeMap<u32, ChannelStyle>,
    frame: u64,
) -> ReelResult<ComposeOutput> {
    let mut shape = None;
    for p in inputs.iter().filter_map(|i| i.plane) {
        match shape {
            None => shape = Some(p.shape()),
            Some(s) if s != p.shape() => {
                return Err(ReelError::dimension_mismatch(format!(
                    "channel planes differ in shape: {}x{} vs {}x{}",
                    s.0, s.1, p.width, p.height
                )));
            }
            Some(_) => {}
        }
    }
    let Some((width, height)) = shape else {
        let channel = inputs.first().map(|i| i.channel).unwrap_or(0);
        return Err(ReelError::frame_unavailable(channel, frame));
    };

    let n = (width as usize) * (height as usize);
    let mut acc = vec![0.0f32; n * 3];
    let mut out_sample = None;
    let mut layers = Vec::with_capacity(inputs.len());

    for input in inputs {
        let Some(plane) = input.plane else {
            tracing::warn!(channel = input.channel, frame, "channel unavailable, skipping");
            layers.push(None);
            continue;
        };
        let style = styles.get(&input.channel).ok_or_else(|| {
            ReelError::configuration(format!("no style for channel {}", input.channel))
        })?;
        let (values, sample) = rescale(plane, style.rescale);
        out_sample.get_or_insert(sample);

        let w = [
            style.color[0] * style.intensity,
            style.color[1] * style.intensity,
            style.color[2] * style.intensity,
        ];
        for (px, v) in acc.chunks_exact_mut(3).zip(values.iter()) {
            px[0] += v * w[0];
            px[1] += v * w[1];
            px[2] += v * w[2];
        }
        layers.push(Some(input.channel));
    }

    let sample = out_sample.unwrap_or(SampleType::F32);
    if sample.is_integer() {
        for v in &mut acc {
            *v = sample.quantize(*v);
        }
    }

    Ok(ComposeOutput {
        raster: RgbRaster {
            width,
            height,
            sample,
            data: acc,
        },
        layers,
    })
}

/// Apply a channel's intensity mapping; rescaled output is `f32` in `[0, 1]`.
pub(crate) fn rescale(plane: &Plane, mode: Rescale) -> (Vec<f32>, SampleType) {
    let (lo, hi) = match mode {
        Rescale::None => return (plane.data.clone(), plane.sample),
        Rescale::Range { min, max } => (min, max),
        Rescale::Percentile { lo, hi } => match (
            percentile(&plane.data, lo),
            percentile(&plane.data, hi),
        ) {
            (Some(a), Some(b)) => (a, b),
            _ => return (vec![0.0; plane.data.len()], SampleType::F32),
        },
    };
    if lo.is_nan() || hi.is_nan() || hi <= lo {
        return (vec![0.0; plane.data.len()], SampleType::F32);
    }
    let span = hi - lo;
    let data = plane
        .data
        .iter()
        .map(|&v| ((f64::from(v) - lo) / span).clamp(0.0, 1.0) as f32)
        .collect();
    (data, SampleType::F32)
}

/// Per-region compositing wiring: which channels, which z-planes, which styles.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelCompositor {
    /// Composite of the listed channels.
    Channels {
        /// Channel ids in compositing order.
        channels: Vec<u32>,
        /// z-plane selection.
        zstack: ZSelection,
    },
    /// Blank grid cell.
    Null,
}

/// Raster plus the raw planes that produced it (for histogram overlays).
#[derive(Clone, Debug)]
pub struct RegionImage {
    /// Composited raster; `None` for blank cells.
    pub raster: Option<RgbRaster>,
    /// Raw plane of every contributing channel.
    pub planes: Vec<(u32, Plane)>,
}

impl ChannelCompositor {
    /// Fetch planes for `frame` and composite them.
    pub fn render(
        &self,
        source: &dyn ImageSource,
        styles: &BTreeMap<u32, ChannelStyle>,
        frame: u64,
    ) -> ReelResult<RegionImage> {
        let (channels, zstack) = match self {
            Self::Null => {
                return Ok(RegionImage {
                    raster: None,
                    planes: Vec::new(),
                });
            }
            Self::Channels { channels, zstack } => (channels, *zstack),
        };

        let mut fetched = Vec::with_capacity(channels.len());
        for &c in channels {
            fetched.push((c, source.select(c, frame, zstack)?));
        }
        let inputs: Vec<ChannelInput<'_>> = fetched
            .iter()
            .map(|(c, p)| ChannelInput {
                channel: *c,
                plane: p.as_ref(),
            })
            .collect();
        let out = compose(&inputs, styles, frame)?;
        let planes = fetched
            .into_iter()
            .filter_map(|(c, p)| p.map(|p| (c, p)))
            .collect();
        Ok(RegionImage {
            raster: Some(out.raster),
            planes,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/channel.rs"]
mod tests;
