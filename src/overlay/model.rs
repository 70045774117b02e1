use std::collections::{BTreeMap, HashMap};

use crate::foundation::core::Color;
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::equality::{ConfigFingerprint, deep_eq, fingerprint};
use crate::overlay::style::OverlayStyle;

/// Rectangular region of interest in image pixel coordinates (row 0 at the top).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Roi {
    /// Left column.
    pub left: f64,
    /// Top row.
    pub top: f64,
    /// Right column.
    pub right: f64,
    /// Bottom row.
    pub bottom: f64,
}

/// One row of a time-series table.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SeriesPoint {
    /// Measured unit (cell, track, ...).
    pub unit: String,
    /// Signal name.
    pub signal: String,
    /// Time of the measurement in seconds.
    pub time: f64,
    /// Measured value.
    pub value: f64,
    /// Frame the measurement belongs to.
    pub frame: u64,
}

/// Closed set of overlay variants.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayKind {
    /// Horizontal bar of a physical length.
    ScaleBar {
        /// Bar length in physical units; the run's `scalebar_um` when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        um: Option<f64>,
    },
    /// Elapsed acquisition time of the current frame.
    Timestamp,
    /// Literal text.
    Text {
        /// Text to draw.
        text: String,
    },
    /// Outlined regions of interest.
    RoiBox {
        /// Rectangles in image pixels.
        rois: Vec<Roi>,
    },
    /// Intensity histogram inset of the region's raw channel data.
    Histogram {
        /// Channel to bin; the region's first channel when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<u32>,
    },
    /// Cumulative traces of measured signals.
    TimeSeries {
        /// Table rows.
        points: Vec<SeriesPoint>,
        /// Trace color per signal name.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        signal_colors: BTreeMap<String, Color>,
    },
}

impl OverlayKind {
    /// Short variant name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScaleBar { .. } => "scale_bar",
            Self::Timestamp => "timestamp",
            Self::Text { .. } => "text",
            Self::RoiBox { .. } => "roi_box",
            Self::Histogram { .. } => "histogram",
            Self::TimeSeries { .. } => "time_series",
        }
    }
}

/// Serializable configuration of one overlay.
///
/// Configurations are value-like: two overlays with equal configurations draw the same thing, so
/// equality is structural (see [`OverlayConfig::eq`]).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OverlayConfig {
    /// Variant and its data.
    #[serde(flatten)]
    pub overlay: OverlayKind,
    /// Construction-time style.
    #[serde(default, skip_serializing_if = "is_default_style")]
    pub style: OverlayStyle,
    /// Attach only to the region showing this z-level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<u32>,
    /// Attach to this region index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<usize>,
}

fn is_default_style(s: &OverlayStyle) -> bool {
    *s == OverlayStyle::default()
}

impl OverlayConfig {
    /// New overlay with an empty style and no routing.
    pub fn new(overlay: OverlayKind) -> Self {
        Self {
            overlay,
            style: OverlayStyle::default(),
            z: None,
            region: None,
        }
    }

    /// Set the construction-time style.
    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// Route to a z-level.
    pub fn on_z(mut self, z: u32) -> Self {
        self.z = Some(z);
        self
    }

    /// Route to a region index.
    pub fn in_region(mut self, region: usize) -> Self {
        self.region = Some(region);
        self
    }

    /// Check variant data and style.
    pub fn validate(&self) -> ReelResult<()> {
        self.style.validate()?;
        match &self.overlay {
            OverlayKind::ScaleBar { um: Some(um) } if !(um.is_finite() && *um > 0.0) => Err(
                ReelError::configuration("scale bar length must be finite and > 0"),
            ),
            OverlayKind::RoiBox { rois } if rois.iter().any(|r| {
                ![r.left, r.top, r.right, r.bottom]
                    .iter()
                    .all(|v| v.is_finite())
            }) =>
            {
                Err(ReelError::configuration("roi coordinates must be finite"))
            }
            _ => Ok(()),
        }
    }

    /// JSON value used for equality and fingerprinting.
    pub(crate) fn to_value(&self) -> ReelResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| ReelError::serde(format!("overlay config: {e}")))
    }

    pub(crate) fn fingerprint(&self) -> ReelResult<ConfigFingerprint> {
        Ok(fingerprint(&self.to_value()?))
    }
}

impl PartialEq for OverlayConfig {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_value(), other.to_value()) {
            (Ok(a), Ok(b)) => deep_eq(&a, &b),
            _ => false,
        }
    }
}

/// Overlays of `expected` that have no equal counterpart in `present`.
///
/// Each distinct configuration is reported at most once, so re-attaching the result and calling
/// this again yields an empty list.
pub fn missing_overlays(
    expected: &[OverlayConfig],
    present: &[OverlayConfig],
) -> ReelResult<Vec<OverlayConfig>> {
    let mut buckets: HashMap<ConfigFingerprint, Vec<serde_json::Value>> = HashMap::new();
    for ov in present {
        let v = ov.to_value()?;
        buckets.entry(fingerprint(&v)).or_default().push(v);
    }

    let mut missing = Vec::new();
    for ov in expected {
        let v = ov.to_value()?;
        let bucket = buckets.entry(fingerprint(&v)).or_default();
        if bucket.iter().any(|w| deep_eq(&v, w)) {
            continue;
        }
        bucket.push(v);
        missing.push(ov.clone());
    }
    Ok(missing)
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/model.rs"]
mod tests;
