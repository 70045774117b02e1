use crate::foundation::core::Color;
use crate::foundation::error::{ReelError, ReelResult};

/// Elapsed-time rendering used by timestamp overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TimeFormat {
    /// `hh:mm:ss`.
    #[default]
    #[serde(rename = "hh:mm:ss")]
    HoursMinutesSeconds,
    /// `hh:mm`.
    #[serde(rename = "hh:mm")]
    HoursMinutes,
    /// `mm:ss`, widening to `hh:mm:ss` past the first hour.
    #[serde(rename = "mm:ss")]
    MinutesSeconds,
}

/// Optional drawing parameters of an overlay.
///
/// Three of these are merged per paint: call-time, the overlay's own, and the render-context
/// defaults. Unset fields fall through to the next set, then to [`ResolvedStyle`] defaults.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayStyle {
    /// Anchor in physical units of the region (axes fractions for insets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    /// Font size in points of a 256 px wide panel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Line width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    /// Stroke/text color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Timestamp formatting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<TimeFormat>,
    /// Prefix timestamps with the frame number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_frame_number: Option<bool>,
    /// Draw the length label under a scale bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<bool>,
    /// Histogram bin count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    /// Draw sample dots on time-series traces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_dots: Option<bool>,
    /// Inset rectangle `[x, y, w, h]` in region fractions, origin bottom-left.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inset: Option<[f64; 4]>,
}

impl OverlayStyle {
    /// Field-wise merge where `self` wins over `lower`.
    pub fn or(&self, lower: &OverlayStyle) -> OverlayStyle {
        OverlayStyle {
            xy: self.xy.or(lower.xy),
            font_size: self.font_size.or(lower.font_size),
            line_width: self.line_width.or(lower.line_width),
            color: self.color.or(lower.color),
            time_format: self.time_format.or(lower.time_format),
            show_frame_number: self.show_frame_number.or(lower.show_frame_number),
            label: self.label.or(lower.label),
            bins: self.bins.or(lower.bins),
            plot_dots: self.plot_dots.or(lower.plot_dots),
            inset: self.inset.or(lower.inset),
        }
    }

    /// Layered lookup: `call` > `own` > `context`, then `fallback` for whatever is still unset.
    pub fn layered(
        call: &OverlayStyle,
        own: &OverlayStyle,
        context: &OverlayStyle,
        fallback: ResolvedStyle,
    ) -> ResolvedStyle {
        let merged = call.or(own).or(context);
        ResolvedStyle {
            xy: merged.xy.unwrap_or(fallback.xy),
            font_size: merged.font_size.unwrap_or(fallback.font_size),
            line_width: merged.line_width.unwrap_or(fallback.line_width),
            color: merged.color.unwrap_or(fallback.color),
            time_format: merged.time_format.unwrap_or(fallback.time_format),
            show_frame_number: merged.show_frame_number.unwrap_or(fallback.show_frame_number),
            label: merged.label.unwrap_or(fallback.label),
            bins: merged.bins.unwrap_or(fallback.bins),
            plot_dots: merged.plot_dots.unwrap_or(fallback.plot_dots),
            inset: merged.inset.unwrap_or(fallback.inset),
        }
    }

    /// Reject values no overlay can draw with.
    pub fn validate(&self) -> ReelResult<()> {
        if let Some(fs) = self.font_size
            && !(fs.is_finite() && fs > 0.0)
        {
            return Err(ReelError::configuration("font_size must be finite and > 0"));
        }
        if let Some(lw) = self.line_width
            && !(lw.is_finite() && lw > 0.0)
        {
            return Err(ReelError::configuration("line_width must be finite and > 0"));
        }
        if self.bins == Some(0) {
            return Err(ReelError::configuration("histogram bins must be > 0"));
        }
        if let Some([x, y, w, h]) = self.inset
            && !(w > 0.0 && h > 0.0 && [x, y, w, h].iter().all(|v| v.is_finite()))
        {
            return Err(ReelError::configuration("inset must have a positive size"));
        }
        Ok(())
    }
}

/// Fully resolved drawing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedStyle {
    /// Anchor.
    pub xy: [f64; 2],
    /// Font size.
    pub font_size: f32,
    /// Line width.
    pub line_width: f64,
    /// Color.
    pub color: Color,
    /// Timestamp formatting.
    pub time_format: TimeFormat,
    /// Prefix timestamps with the frame number.
    pub show_frame_number: bool,
    /// Draw scale-bar labels.
    pub label: bool,
    /// Histogram bins.
    pub bins: usize,
    /// Time-series dots.
    pub plot_dots: bool,
    /// Inset rectangle.
    pub inset: [f64; 4],
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            xy: [0.0, 0.0],
            font_size: 12.0,
            line_width: 1.0,
            color: Color::WHITE,
            time_format: TimeFormat::default(),
            show_frame_number: true,
            label: true,
            bins: 10,
            plot_dots: true,
            inset: [0.5, 0.5, 0.47, 0.47],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/style.rs"]
mod tests;
