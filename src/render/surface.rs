use std::sync::Arc;

use kurbo::{BezPath, Point, Rect, Shape as _};

use crate::compose::channel::RgbRaster;
use crate::foundation::core::{Color, Frame};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::text::{TextBrushRgba8, TextLayoutEngine};
use crate::scene::config::Origin;

/// Horizontal text alignment relative to the anchor point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    /// Anchor at the left edge.
    Start,
    /// Anchor at the horizontal center.
    Center,
}

/// Vertical text alignment relative to the anchor point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    /// Anchor at the top edge.
    Top,
    /// Anchor at the bottom edge.
    Bottom,
}

/// CPU drawing surface for one render context.
///
/// Wraps a `vello_cpu` render context and its target pixmap. Never shared between workers.
pub struct Surface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    text: Option<TextLayoutEngine>,
}

impl Surface {
    /// Surface of `width x height` pixels; text is drawn only when `font` is given.
    pub fn new(width: u32, height: u32, font: Option<&[u8]>) -> ReelResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| ReelError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| ReelError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(ReelError::render("surface must be non-empty"));
        }
        let text = font.map(TextLayoutEngine::new).transpose()?;
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            text,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// `true` when text can be drawn.
    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Drop recorded commands and clear to `background`.
    pub fn begin(&mut self, background: Color) {
        self.ctx.reset();
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.fill_rect(
            Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height)),
            background,
        );
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }

    /// Stroke an open polyline.
    pub fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Color) {
        if points.len() < 2 {
            return;
        }
        let mut path = BezPath::new();
        path.move_to(points[0]);
        for p in &points[1..] {
            path.line_to(*p);
        }
        self.stroke_path(&path, width, color);
    }

    /// Stroke the outline of a rectangle.
    pub fn stroke_rect(&mut self, rect: Rect, width: f64, color: Color) {
        self.stroke_path(&rect.to_path(0.1), width, color);
    }

    /// Fill a circle.
    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx
            .fill_path(&bezpath_to_cpu(&kurbo::Circle::new(center, radius).to_path(0.1)));
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Color) {
        let style = kurbo::Stroke::new(width).with_caps(kurbo::Cap::Butt);
        let outline = kurbo::stroke(path.iter(), &style, &kurbo::StrokeOpts::default(), 0.1);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.fill_path(&bezpath_to_cpu(&outline));
    }

    /// Paint a composited raster into `dest`, clamped to the display range of its sample type.
    pub fn draw_raster(&mut self, raster: &RgbRaster, dest: Rect, origin: Origin) -> ReelResult<()> {
        let pixmap = raster_to_pixmap(raster, origin)?;
        let image = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let sx = dest.width() / f64::from(raster.width);
        let sy = dest.height() / f64::from(raster.height);
        self.ctx.set_transform(
            vello_cpu::kurbo::Affine::translate((dest.x0, dest.y0))
                * vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy),
        );
        self.ctx.set_paint(image);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(raster.width),
            f64::from(raster.height),
        ));
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    /// Draw one line of text; a no-op (logged) when the surface has no font.
    pub fn draw_text(
        &mut self,
        text: &str,
        anchor: Point,
        size_px: f32,
        color: Color,
        align: (HAlign, VAlign),
    ) -> ReelResult<()> {
        let Some(engine) = self.text.as_mut() else {
            tracing::debug!(text, "no font configured, skipping text");
            return Ok(());
        };
        let brush = TextBrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let layout = engine.layout_line(text, size_px, brush)?;
        let dx = match align.0 {
            HAlign::Start => 0.0,
            HAlign::Center => -f64::from(layout.width()) / 2.0,
        };
        let dy = match align.1 {
            VAlign::Top => 0.0,
            VAlign::Bottom => -f64::from(layout.height()),
        };
        self.ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            anchor.x + dx,
            anchor.y + dy,
        )));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(engine.font())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    /// Rasterize recorded commands into a frame.
    pub fn finish(&mut self) -> Frame {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Frame {
            width: self.width(),
            height: self.height(),
            data: self.pixmap.data_as_u8_slice().to_vec(),
        }
    }
}

/// Display-range RGBA8 of a raster: `value / max` clamped to `[0, 1]`.
pub(crate) fn raster_to_rgba8(raster: &RgbRaster, origin: Origin) -> Vec<u8> {
    let w = raster.width as usize;
    let h = raster.height as usize;
    let max = raster.sample.max_value();
    let mut out = Vec::with_capacity(w * h * 4);
    for row in 0..h {
        let src_row = match origin {
            Origin::Upper => row,
            Origin::Lower => h - 1 - row,
        };
        for px in raster.data[src_row * w * 3..(src_row + 1) * w * 3].chunks_exact(3) {
            for v in px {
                let n = if v.is_finite() { v / max } else { 0.0 };
                out.push((n.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
            out.push(255);
        }
    }
    out
}

fn raster_to_pixmap(raster: &RgbRaster, origin: Origin) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = raster
        .width
        .try_into()
        .map_err(|_| ReelError::render("raster width exceeds u16"))?;
    let h: u16 = raster
        .height
        .try_into()
        .map_err(|_| ReelError::render("raster height exceeds u16"))?;
    if raster.data.len() != (raster.width as usize) * (raster.height as usize) * 3 {
        return Err(ReelError::dimension_mismatch(
            "raster data length does not match its size",
        ));
    }
    // Opaque pixels are already premultiplied.
    let pixels = raster_to_rgba8(raster, origin)
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, false,
    ))
}

fn to_cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
