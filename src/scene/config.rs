use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::foundation::core::Color;
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::model::OverlayConfig;
use crate::source::projection::Projection;

/// How raw channel intensities are mapped to `[0, 1]` before coloring.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rescale {
    /// Pass values through unchanged.
    None,
    /// Clip to the `[lo, hi]` percentiles of the channel's values, then stretch.
    Percentile {
        /// Lower percentile in `[0, 100)`.
        lo: f64,
        /// Upper percentile in `(lo, 100]`.
        hi: f64,
    },
    /// Clip to a fixed intensity range, then stretch.
    Range {
        /// Value mapped to 0.
        min: f64,
        /// Value mapped to 1.
        max: f64,
    },
}

impl Default for Rescale {
    fn default() -> Self {
        Self::Percentile { lo: 0.1, hi: 99.9 }
    }
}

/// Per-channel coloring.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelStyle {
    /// Display name (grid labels).
    pub name: String,
    /// Linear RGB weights in `[0, 1]`.
    pub color: [f32; 3],
    /// Intensity mapping.
    pub rescale: Rescale,
    /// Multiplier applied after coloring.
    pub intensity: f32,
}

impl Default for ChannelStyle {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: [1.0, 1.0, 1.0],
            rescale: Rescale::default(),
            intensity: 1.0,
        }
    }
}

impl ChannelStyle {
    /// Style with a color and default rescale.
    pub fn colored(name: impl Into<String>, color: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            color,
            ..Self::default()
        }
    }

    fn validate(&self, channel: u32) -> ReelResult<()> {
        if !(self.intensity.is_finite() && self.intensity > 0.0) {
            return Err(ReelError::configuration(format!(
                "channel {channel}: intensity must be finite and > 0"
            )));
        }
        if self
            .color
            .iter()
            .any(|c| !c.is_finite() || !(0.0..=1.0).contains(c))
        {
            return Err(ReelError::configuration(format!(
                "channel {channel}: color components must be in [0, 1]"
            )));
        }
        match self.rescale {
            Rescale::Percentile { lo, hi } if !(0.0 <= lo && lo < hi && hi <= 100.0) => {
                Err(ReelError::configuration(format!(
                    "channel {channel}: percentiles must satisfy 0 <= lo < hi <= 100"
                )))
            }
            Rescale::Range { min, max } if !(min.is_finite() && max.is_finite() && min < max) => {
                Err(ReelError::configuration(format!(
                    "channel {channel}: rescale range must satisfy min < max"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Which z-plane(s) feed a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ZSelectionRepr", into = "ZSelectionRepr")]
pub enum ZSelection {
    /// A single z-level.
    Index(u32),
    /// A reduction over every z-level.
    Projection(Projection),
}

impl Default for ZSelection {
    fn default() -> Self {
        Self::Projection(Projection::Max)
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum ZSelectionRepr {
    Index(u32),
    Name(String),
}

impl TryFrom<ZSelectionRepr> for ZSelection {
    type Error = ReelError;

    fn try_from(value: ZSelectionRepr) -> Result<Self, Self::Error> {
        match value {
            ZSelectionRepr::Index(z) => Ok(Self::Index(z)),
            ZSelectionRepr::Name(name) => Projection::parse(&name).map(Self::Projection),
        }
    }
}

impl From<ZSelection> for ZSelectionRepr {
    fn from(value: ZSelection) -> Self {
        match value {
            ZSelection::Index(z) => Self::Index(z),
            ZSelection::Projection(p) => Self::Name(p.name().to_string()),
        }
    }
}

/// Subplot arrangement, selected by name.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum LayoutKind {
    /// One full-frame region showing the first channel.
    Single,
    /// One region overlaying every channel.
    #[default]
    Composite,
    /// Grid with one region per channel.
    ChannelColumns {
        /// Grid columns.
        columns: u32,
    },
    /// Grid with one region per z-level.
    ZStackColumns {
        /// Grid columns (clamped to the z count at build time).
        columns: u32,
    },
}

const MAX_GRID_COLUMNS: u32 = 8;

impl LayoutKind {
    /// Parse a layout name.
    pub fn parse(name: &str) -> ReelResult<Self> {
        let n = name.trim().to_ascii_lowercase();
        match n.as_str() {
            "single" => return Ok(Self::Single),
            "composite" | "twoch-comp" => return Ok(Self::Composite),
            "twoch" | "two-ch" | "two-col" => return Ok(Self::ChannelColumns { columns: 2 }),
            _ => {}
        }
        let grid = |prefix: &str| {
            n.strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix("-col"))
                .and_then(|c| c.parse::<u32>().ok())
                .filter(|c| (1..=MAX_GRID_COLUMNS).contains(c))
        };
        if let Some(columns) = grid("z-") {
            return Ok(Self::ZStackColumns { columns });
        }
        if let Some(columns) = grid("ch-") {
            return Ok(Self::ChannelColumns { columns });
        }
        Err(ReelError::configuration(format!(
            "unsupported layout '{name}'"
        )))
    }

    /// Canonical name.
    pub fn name(&self) -> String {
        match self {
            Self::Single => "single".to_string(),
            Self::Composite => "composite".to_string(),
            Self::ChannelColumns { columns } => format!("ch-{columns}-col"),
            Self::ZStackColumns { columns } => format!("z-{columns}-col"),
        }
    }
}

impl TryFrom<String> for LayoutKind {
    type Error = ReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LayoutKind> for String {
    fn from(value: LayoutKind) -> Self {
        value.name()
    }
}

/// Vertical orientation of painted images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Row 0 at the bottom, y grows upwards.
    #[default]
    Lower,
    /// Row 0 at the top, y grows downwards.
    Upper,
}

/// Immutable description of one rendering run.
///
/// Shared read-only (behind `Arc`) by every render context and worker.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frame indices to render, strictly increasing. Empty means every frame of the source.
    pub frames: Vec<u64>,
    /// Channel styles keyed by channel id.
    pub channels: BTreeMap<u32, ChannelStyle>,
    /// z-plane selection for every channel.
    pub zstack: ZSelection,
    /// Output frame rate.
    pub fps: u32,
    /// Target bitrate in ffmpeg notation.
    pub bitrate: String,
    /// Default scale-bar length in physical units.
    pub scalebar_um: f64,
    /// Figure title; no title band when empty.
    pub title: String,
    /// Subplot arrangement.
    pub layout: LayoutKind,
    /// Overlays attached when the layout is built.
    pub overlays: Vec<OverlayConfig>,
    /// Fixed time step replacing the acquisition timestamps.
    pub override_dt: Option<f64>,
    /// Image orientation.
    pub origin: Origin,
    /// TTF/OTF file used for every text overlay.
    pub font: Option<PathBuf>,
    /// Pixel width of one subplot.
    pub panel_px: u32,
    /// Author metadata written to the container.
    pub author: Option<String>,
    /// Surface clear color.
    pub background: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            channels: BTreeMap::new(),
            zstack: ZSelection::default(),
            fps: 10,
            bitrate: "4000k".to_string(),
            scalebar_um: 10.0,
            title: String::new(),
            layout: LayoutKind::default(),
            overlays: Vec::new(),
            override_dt: None,
            origin: Origin::default(),
            font: None,
            panel_px: 512,
            author: None,
            background: Color::BLACK,
        }
    }
}

impl RenderConfig {
    /// Fill source-dependent defaults: every frame when `frames` is empty.
    pub fn resolved(mut self, source_frames: u64) -> Self {
        if self.frames.is_empty() {
            self.frames = (0..source_frames).collect();
        }
        self
    }

    /// Check every invariant; errors here abort the run before any rendering.
    pub fn validate(&self) -> ReelResult<()> {
        if self.frames.is_empty() {
            return Err(ReelError::configuration("frames must be non-empty"));
        }
        if self.frames.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ReelError::configuration(
                "frames must be strictly increasing",
            ));
        }
        if self.channels.is_empty() {
            return Err(ReelError::configuration(
                "at least one channel must be configured",
            ));
        }
        for (id, style) in &self.channels {
            style.validate(*id)?;
        }
        if self.fps == 0 {
            return Err(ReelError::configuration("fps must be > 0"));
        }
        if self.bitrate.trim().is_empty() {
            return Err(ReelError::configuration("bitrate must be non-empty"));
        }
        if !(self.scalebar_um.is_finite() && self.scalebar_um > 0.0) {
            return Err(ReelError::configuration(
                "scalebar_um must be finite and > 0",
            ));
        }
        if self.panel_px < 16 {
            return Err(ReelError::configuration("panel_px must be >= 16"));
        }
        if let Some(dt) = self.override_dt
            && !(dt.is_finite() && dt >= 0.0)
        {
            return Err(ReelError::configuration(
                "override_dt must be finite and >= 0",
            ));
        }
        for ov in &self.overlays {
            ov.validate()?;
        }
        Ok(())
    }

    /// Channel ids in render order.
    pub fn channel_ids(&self) -> Vec<u32> {
        self.channels.keys().copied().collect()
    }

    /// Smallest configured frame.
    pub fn first_frame(&self) -> Option<u64> {
        self.frames.first().copied()
    }

    /// Largest configured frame.
    pub fn last_frame(&self) -> Option<u64> {
        self.frames.last().copied()
    }

    /// Output duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / f64::from(self.fps.max(1))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;
