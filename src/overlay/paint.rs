use std::collections::BTreeMap;

use kurbo::{Point, Rect};

use crate::compose::channel::RegionImage;
use crate::foundation::core::Color;
use crate::foundation::error::ReelResult;
use crate::foundation::math::histogram;
use crate::overlay::model::{OverlayConfig, OverlayKind, SeriesPoint};
use crate::overlay::style::{OverlayStyle, ResolvedStyle};
use crate::overlay::timefmt::{elapsed_secs, format_elapsed};
use crate::render::region::Region;
use crate::render::surface::{HAlign, Surface, VAlign};
use crate::scene::config::RenderConfig;
use crate::source::SourceMeta;

/// Everything an overlay may read while painting one frame.
pub struct PaintContext<'a> {
    /// Frame being painted.
    pub frame: u64,
    /// Region the overlay is attached to.
    pub region: &'a Region,
    /// Stack description (calibration, timestamps).
    pub meta: &'a SourceMeta,
    /// Run configuration.
    pub config: &'a RenderConfig,
    /// Context-wide style defaults.
    pub defaults: &'a OverlayStyle,
    /// The region's composited image and raw planes, when it has one.
    pub image: Option<&'a RegionImage>,
}

impl OverlayConfig {
    /// Hard-coded defaults of this variant.
    fn fallback_style(&self) -> ResolvedStyle {
        let base = ResolvedStyle::default();
        match &self.overlay {
            OverlayKind::RoiBox { .. } => ResolvedStyle {
                color: Color::YELLOW,
                ..base
            },
            OverlayKind::Histogram { .. } => ResolvedStyle {
                color: Color::MAGENTA,
                ..base
            },
            OverlayKind::TimeSeries { .. } => ResolvedStyle {
                color: Color::RED,
                line_width: 2.0,
                inset: [0.05, 0.05, 0.9, 0.3],
                ..base
            },
            _ => base,
        }
    }

    /// Paint onto `surface` with `call` taking precedence over the construction-time style.
    pub fn plot(
        &self,
        surface: &mut Surface,
        ctx: &PaintContext<'_>,
        call: &OverlayStyle,
    ) -> ReelResult<()> {
        let style = OverlayStyle::layered(call, &self.style, ctx.defaults, self.fallback_style());
        match &self.overlay {
            OverlayKind::ScaleBar { um } => {
                plot_scale_bar(surface, ctx, &style, um.unwrap_or(ctx.config.scalebar_um))
            }
            OverlayKind::Timestamp => plot_timestamp(surface, ctx, &style),
            OverlayKind::Text { text } => {
                let at = ctx.region.to_px(style.xy[0], style.xy[1]);
                surface.draw_text(
                    text,
                    at,
                    ctx.region.font_px(style.font_size),
                    style.color,
                    (HAlign::Start, VAlign::Bottom),
                )
            }
            OverlayKind::RoiBox { rois } => {
                let s = ctx.meta.units_per_pixel();
                let height = f64::from(ctx.meta.height);
                for roi in rois {
                    let w = (roi.right - roi.left).abs() * s;
                    let h = (roi.top - roi.bottom).abs() * s;
                    let (x, y) = (roi.left * s, (height - roi.bottom) * s);
                    let rect = Rect::from_points(ctx.region.to_px(x, y), ctx.region.to_px(x + w, y + h));
                    surface.stroke_rect(rect, style.line_width, style.color);
                }
                Ok(())
            }
            OverlayKind::Histogram { channel } => plot_histogram(surface, ctx, &style, *channel),
            OverlayKind::TimeSeries {
                points,
                signal_colors,
            } => {
                plot_time_series(surface, ctx, &style, points, signal_colors);
                Ok(())
            }
        }
    }
}

fn plot_scale_bar(
    surface: &mut Surface,
    ctx: &PaintContext<'_>,
    style: &ResolvedStyle,
    um: f64,
) -> ReelResult<()> {
    let [x0, y0] = style.xy;
    let a = ctx.region.to_px(x0, y0);
    let b = ctx.region.to_px(x0 + um, y0);
    surface.stroke_polyline(&[a, b], style.line_width, style.color);
    if style.label {
        let mid = Point::new((a.x + b.x) / 2.0, a.y + style.line_width);
        surface.draw_text(
            &format!("{um} um"),
            mid,
            ctx.region.font_px(style.font_size),
            style.color,
            (HAlign::Center, VAlign::Top),
        )?;
    }
    Ok(())
}

fn plot_timestamp(
    surface: &mut Surface,
    ctx: &PaintContext<'_>,
    style: &ResolvedStyle,
) -> ReelResult<()> {
    let secs = elapsed_secs(
        ctx.frame,
        &ctx.meta.timestamps,
        ctx.meta.time_interval,
        ctx.config.override_dt,
    );
    let clock = format_elapsed(secs, style.time_format);
    let text = if style.show_frame_number {
        format!("{}  {clock}", ctx.frame)
    } else {
        clock
    };
    let at = ctx.region.to_px(style.xy[0], style.xy[1]);
    surface.draw_text(
        &text,
        at,
        ctx.region.font_px(style.font_size),
        style.color,
        (HAlign::Start, VAlign::Bottom),
    )
}

fn plot_histogram(
    surface: &mut Surface,
    ctx: &PaintContext<'_>,
    style: &ResolvedStyle,
    channel: Option<u32>,
) -> ReelResult<()> {
    let Some(image) = ctx.image else {
        tracing::debug!(frame = ctx.frame, "histogram on a region without image, skipping");
        return Ok(());
    };
    let plane = match channel {
        Some(c) => image.planes.iter().find(|(pc, _)| *pc == c),
        None => image.planes.first(),
    };
    let Some((_, plane)) = plane else {
        tracing::debug!(frame = ctx.frame, ?channel, "histogram channel not present, skipping");
        return Ok(());
    };

    let (counts, edges) = histogram(&plane.data, style.bins);
    let peak = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let inset = ctx.region.inset(style.inset);
    let (lo, hi) = (edges[0], edges[edges.len() - 1]);
    let x_of = |e: f64| inset.x0 + (e - lo) / (hi - lo) * inset.width();
    let y_of = |c: u64| inset.y1 - c as f64 / peak * inset.height();

    let mut pts = Vec::with_capacity(counts.len() * 2 + 2);
    pts.push(Point::new(x_of(lo), inset.y1));
    for (i, &c) in counts.iter().enumerate() {
        pts.push(Point::new(x_of(edges[i]), y_of(c)));
        pts.push(Point::new(x_of(edges[i + 1]), y_of(c)));
    }
    pts.push(Point::new(x_of(hi), inset.y1));
    surface.stroke_polyline(&pts, style.line_width, style.color);
    Ok(())
}

fn plot_time_series(
    surface: &mut Surface,
    ctx: &PaintContext<'_>,
    style: &ResolvedStyle,
    points: &[SeriesPoint],
    signal_colors: &BTreeMap<String, Color>,
) {
    let finite = |v: f64| v.is_finite();
    let (mut tmin, mut tmax) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut vmin, mut vmax) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        tmin = tmin.min(p.time);
        tmax = tmax.max(p.time);
        vmin = vmin.min(p.value);
        vmax = vmax.max(p.value);
    }
    if ![tmin, tmax, vmin, vmax].into_iter().all(finite) {
        tracing::debug!(frame = ctx.frame, "time series has no finite range, skipping");
        return;
    }
    if tmax <= tmin {
        tmax = tmin + 1.0;
    }
    if vmax <= vmin {
        vmax = vmin + 1.0;
    }

    let inset = ctx.region.inset(style.inset);
    let to_px = |p: &SeriesPoint| {
        Point::new(
            inset.x0 + (p.time - tmin) / (tmax - tmin) * inset.width(),
            inset.y1 - (p.value - vmin) / (vmax - vmin) * inset.height(),
        )
    };

    let mut groups: BTreeMap<(&str, &str), Vec<&SeriesPoint>> = BTreeMap::new();
    for p in points {
        groups
            .entry((p.unit.as_str(), p.signal.as_str()))
            .or_default()
            .push(p);
    }
    for series in groups.values_mut() {
        series.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    let faint = Color::GRAY.with_alpha(160);
    for series in groups.values() {
        let pts: Vec<Point> = series.iter().map(|p| to_px(p)).collect();
        surface.stroke_polyline(&pts, 0.5, faint);
    }
    for ((_, signal), series) in &groups {
        let color = signal_colors.get(*signal).copied().unwrap_or(style.color);
        let pts: Vec<Point> = series
            .iter()
            .filter(|p| p.frame <= ctx.frame)
            .map(|p| to_px(p))
            .collect();
        surface.stroke_polyline(&pts, style.line_width, color);
    }
    if style.plot_dots {
        for p in points.iter().filter(|p| p.frame <= ctx.frame) {
            surface.fill_circle(to_px(p), 1.0, Color::GRAY);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/paint.rs"]
mod tests;
