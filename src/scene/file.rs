use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::foundation::core::Color;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::config::{ChannelStyle, Origin, RenderConfig, Rescale, ZSelection};

/// File suffix searched for by folder rendering.
pub const CONFIG_SUFFIX: &str = ".reel.json";

/// Where the planes of an image stack live on disk.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDef {
    /// Directory holding one grayscale file per plane.
    pub folder: PathBuf,
    /// File name pattern with `{c}`, `{z}` and `{t}` (or zero-padded `{t:N}`) placeholders.
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Channel count.
    pub channels: u32,
    /// z-level count.
    #[serde(default = "one")]
    pub zstacks: u32,
    /// Frame count.
    pub frames: u64,
    /// Physical units per pixel.
    #[serde(default)]
    pub um_per_pix: Option<f64>,
    /// Seconds between frames.
    #[serde(default = "one_f64")]
    pub time_interval: f64,
    /// Acquisition time of each frame in seconds.
    #[serde(default)]
    pub timestamps: Vec<f64>,
}

fn default_pattern() -> String {
    "c{c}_z{z}_t{t}.tif".to_string()
}

fn one() -> u32 {
    1
}

fn one_f64() -> f64 {
    1.0
}

impl SourceDef {
    fn validate(&self) -> ReelResult<()> {
        if self.channels == 0 || self.zstacks == 0 || self.frames == 0 {
            return Err(ReelError::configuration(
                "source channels, zstacks and frames must be > 0",
            ));
        }
        if !(self.time_interval.is_finite() && self.time_interval >= 0.0) {
            return Err(ReelError::configuration(
                "source time_interval must be finite and >= 0",
            ));
        }
        if !self.pattern.contains("{t") {
            return Err(ReelError::configuration(
                "source pattern must contain a {t} placeholder",
            ));
        }
        Ok(())
    }
}

/// One movie entry of a configuration file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MovieDef {
    /// Image stack.
    pub source: SourceDef,
    /// Output file name, relative to the configuration file.
    #[serde(default)]
    pub filename: Option<String>,
    /// Fixed frame-cache directory; reusing it resumes an interrupted run.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Keep the frame cache after a successful encode.
    #[serde(default)]
    pub keep_cache: bool,
    /// Rendering parameters.
    #[serde(flatten)]
    pub render: RenderConfig,
}

/// Facet axis of a static montage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    /// One tile per frame.
    Frame,
    /// One tile per channel.
    Channel,
    /// One tile per z-level.
    Z,
}

/// One static montage entry of a configuration file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PanelDef {
    /// Image stack.
    pub source: SourceDef,
    /// Output PNG name, relative to the configuration file.
    #[serde(default)]
    pub filename: Option<String>,
    /// Channel styles; panels default to a `(2, 99)` percentile stretch.
    #[serde(default)]
    pub channels: BTreeMap<u32, ChannelStyle>,
    /// Frames shown (first frame only when empty and frames are not a facet).
    #[serde(default)]
    pub frames: Vec<u64>,
    /// z-levels shown when `z` is a facet.
    #[serde(default)]
    pub zstacks: Vec<u32>,
    /// Projection used when `z` is not a facet.
    #[serde(default)]
    pub zstack: ZSelection,
    /// Row facet.
    #[serde(default)]
    pub rows: Option<Facet>,
    /// Column facet.
    #[serde(default)]
    pub columns: Option<Facet>,
    /// Scale-bar length.
    #[serde(default = "default_scalebar")]
    pub scalebar_um: f64,
    /// Tile width in pixels.
    #[serde(default = "default_tile_px")]
    pub panel_px: u32,
    /// Draw an intensity histogram inset on every tile.
    #[serde(default)]
    pub histogram: bool,
    /// Display level every stretched channel is scaled to.
    #[serde(default = "default_level")]
    pub level: f32,
    /// Font for labels.
    #[serde(default)]
    pub font: Option<PathBuf>,
    /// Image orientation.
    #[serde(default = "upper")]
    pub origin: Origin,
    /// Background color.
    #[serde(default = "black")]
    pub background: Color,
}

fn default_scalebar() -> f64 {
    10.0
}

fn default_tile_px() -> u32 {
    384
}

fn default_level() -> f32 {
    0.85
}

fn upper() -> Origin {
    Origin::Upper
}

fn black() -> Color {
    Color::BLACK
}

impl PanelDef {
    /// Channel styles with the panel default stretch filled in.
    pub fn channel_styles(&self) -> BTreeMap<u32, ChannelStyle> {
        if !self.channels.is_empty() {
            return self.channels.clone();
        }
        (0..self.source.channels)
            .map(|c| {
                let style = ChannelStyle {
                    rescale: Rescale::Percentile { lo: 2.0, hi: 99.0 },
                    ..ChannelStyle::default()
                };
                (c, style)
            })
            .collect()
    }

    fn validate(&self) -> ReelResult<()> {
        self.source.validate()?;
        if self.rows.is_some() && self.rows == self.columns {
            return Err(ReelError::configuration(
                "panel rows and columns must facet different axes",
            ));
        }
        if self.panel_px < 16 {
            return Err(ReelError::configuration("panel_px must be >= 16"));
        }
        if !(self.level.is_finite() && self.level > 0.0) {
            return Err(ReelError::configuration("panel level must be > 0"));
        }
        Ok(())
    }
}

/// Parsed configuration file: any number of movies and static panels.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Movies to render.
    pub movies: Vec<MovieDef>,
    /// Static montages to render.
    pub panels: Vec<PanelDef>,
    /// Copyright notice stored as container metadata.
    pub copyright: Option<String>,
    /// Path the file was loaded from.
    #[serde(skip)]
    pub path: PathBuf,
}

impl ConfigFile {
    /// Parse a configuration from JSON text; relative paths resolve against `base_dir`.
    pub fn from_json_str(s: &str, base_dir: &Path) -> ReelResult<Self> {
        let mut cfg: ConfigFile = serde_json::from_str(s)
            .map_err(|e| ReelError::configuration(format!("config json: {e}")))?;
        cfg.resolve_paths(base_dir);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        use anyhow::Context as _;

        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let mut cfg = Self::from_json_str(&text, base)?;
        cfg.path = path.to_path_buf();
        Ok(cfg)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for m in &mut self.movies {
            join(&mut m.source.folder);
            if let Some(c) = m.cache_dir.as_mut() {
                join(c);
            }
            if let Some(f) = m.render.font.as_mut() {
                join(f);
            }
        }
        for p in &mut self.panels {
            join(&mut p.source.folder);
            if let Some(f) = p.font.as_mut() {
                join(f);
            }
        }
        self.path = base.join("config");
    }

    fn validate(&self) -> ReelResult<()> {
        if self.movies.is_empty() && self.panels.is_empty() {
            return Err(ReelError::configuration(
                "configuration declares no movies and no panels",
            ));
        }
        for m in &self.movies {
            m.source.validate()?;
            if m.render.channels.keys().any(|c| *c >= m.source.channels) {
                return Err(ReelError::configuration(
                    "movie references a channel outside the source",
                ));
            }
        }
        for p in &self.panels {
            p.validate()?;
        }
        Ok(())
    }

    fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn stem(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name
            .strip_suffix(CONFIG_SUFFIX)
            .or_else(|| name.strip_suffix(".json"))
            .unwrap_or(&name);
        if stem.is_empty() || stem == "config" {
            "movie".to_string()
        } else {
            stem.to_string()
        }
    }

    /// Output path of movie `i`: its `filename`, else `<stem>[-i]-<layout>.mp4`, next to the file.
    pub fn movie_output(&self, i: usize) -> PathBuf {
        let m = &self.movies[i];
        let name = match &m.filename {
            Some(f) if f.ends_with(".mp4") => f.clone(),
            Some(f) => format!("{f}.mp4"),
            None if self.movies.len() > 1 => {
                format!("{}-{i}-{}.mp4", self.stem(), m.render.layout.name())
            }
            None => format!("{}-{}.mp4", self.stem(), m.render.layout.name()),
        };
        self.base_dir().join(name)
    }

    /// Output path of panel `i`.
    pub fn panel_output(&self, i: usize) -> PathBuf {
        let p = &self.panels[i];
        let name = match &p.filename {
            Some(f) if f.ends_with(".png") => f.clone(),
            Some(f) => format!("{f}.png"),
            None => format!("{}-panel-{i}.png", self.stem()),
        };
        self.base_dir().join(name)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/file.rs"]
mod tests;
