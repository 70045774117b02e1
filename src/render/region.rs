use kurbo::{Point, Rect};

use crate::scene::config::Origin;

/// One subplot: a pixel rectangle on the surface showing a physical extent of the specimen.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    /// Pixel rectangle on the surface.
    pub rect: Rect,
    /// Physical `(width, height)` shown by the region.
    pub extent: (f64, f64),
    /// Image orientation.
    pub origin: Origin,
    /// z-level shown, for z-stack grids.
    pub z: Option<u32>,
    /// Frame shown regardless of the frame being painted, for montages.
    pub frame: Option<u64>,
    /// Label (channel name or z-level).
    pub label: String,
}

impl Region {
    /// Region covering `rect` with a physical extent.
    pub fn new(rect: Rect, extent: (f64, f64), origin: Origin) -> Self {
        Self {
            rect,
            extent,
            origin,
            z: None,
            frame: None,
            label: String::new(),
        }
    }

    /// Surface pixel of a physical coordinate.
    pub fn to_px(&self, x: f64, y: f64) -> Point {
        let px = self.rect.x0 + x / self.extent.0 * self.rect.width();
        let fy = y / self.extent.1 * self.rect.height();
        let py = match self.origin {
            Origin::Lower => self.rect.y1 - fy,
            Origin::Upper => self.rect.y0 + fy,
        };
        Point::new(px, py)
    }

    /// Physical coordinate of a fraction of the extent.
    pub fn ratio_to_units(&self, fx: f64, fy: f64) -> [f64; 2] {
        [fx * self.extent.0, fy * self.extent.1]
    }

    /// Surface rectangle of an inset given in region fractions `[x, y, w, h]`, origin bottom-left.
    pub fn inset(&self, frac: [f64; 4]) -> Rect {
        let [x, y, w, h] = frac;
        let x0 = self.rect.x0 + x * self.rect.width();
        let y1 = self.rect.y1 - y * self.rect.height();
        Rect::new(
            x0,
            y1 - h * self.rect.height(),
            x0 + w * self.rect.width(),
            y1,
        )
    }

    /// Pixels per physical unit along x.
    pub fn px_per_unit(&self) -> f64 {
        self.rect.width() / self.extent.0
    }

    /// Pixel size of a font size given in points of a 256 px wide reference panel.
    pub fn font_px(&self, size: f32) -> f32 {
        (f64::from(size) * self.rect.width() / 256.0).max(1.0) as f32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/region.rs"]
mod tests;
