use std::sync::Arc;

use anyhow::Context as _;
use kurbo::{Point, Rect};

use crate::cache::FrameCache;
use crate::compose::channel::{ChannelCompositor, RegionImage};
use crate::foundation::core::{Color, Frame};
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::model::OverlayConfig;
use crate::overlay::paint::PaintContext;
use crate::overlay::style::OverlayStyle;
use crate::render::region::Region;
use crate::render::surface::{HAlign, Surface, VAlign};
use crate::scene::config::RenderConfig;
use crate::source::ImageSource;

/// Outcome of [`RenderContext::render_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Painted and written to the cache by this call.
    Rendered,
    /// Already present in the cache; nothing was painted.
    Cached,
}

/// One drawing surface with its subplots, compositors and overlays.
///
/// Built once by the layout composer and repainted in place for every frame. A context is owned
/// by exactly one thread; parallel runs build one per worker.
pub struct RenderContext {
    config: Arc<RenderConfig>,
    source: Arc<dyn ImageSource>,
    cache: Option<FrameCache>,
    surface: Surface,
    regions: Vec<Region>,
    compositors: Vec<(ChannelCompositor, usize)>,
    overlays: Vec<(OverlayConfig, usize)>,
    defaults: OverlayStyle,
    title_band: Option<Rect>,
    frame: Option<u64>,
}

impl RenderContext {
    /// Context with a `width x height` surface; loads the configured font if any.
    ///
    /// Without a cache the context can only [`paint`](RenderContext::paint_frame).
    pub fn new(
        config: Arc<RenderConfig>,
        source: Arc<dyn ImageSource>,
        cache: Option<FrameCache>,
        width: u32,
        height: u32,
    ) -> ReelResult<Self> {
        let font = match &config.font {
            Some(path) => Some(
                std::fs::read(path)
                    .with_context(|| format!("read font '{}'", path.display()))?,
            ),
            None => None,
        };
        let surface = Surface::new(width, height, font.as_deref())?;
        Ok(Self {
            config,
            source,
            cache,
            surface,
            regions: Vec::new(),
            compositors: Vec::new(),
            overlays: Vec::new(),
            defaults: OverlayStyle::default(),
            title_band: None,
            frame: None,
        })
    }

    /// Run configuration.
    pub fn config(&self) -> &Arc<RenderConfig> {
        &self.config
    }

    /// Image source.
    pub fn source(&self) -> &Arc<dyn ImageSource> {
        &self.source
    }

    /// Frame cache this context writes to.
    pub fn cache(&self) -> Option<&FrameCache> {
        self.cache.as_ref()
    }

    /// Surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    /// Subplots in creation order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Last frame painted.
    pub fn current_frame(&self) -> Option<u64> {
        self.frame
    }

    /// Context-wide overlay style defaults.
    pub fn set_defaults(&mut self, defaults: OverlayStyle) {
        self.defaults = defaults;
    }

    /// Reserve a band at the top of the surface for the configured title.
    pub fn set_title_band(&mut self, band: Rect) {
        self.title_band = Some(band);
    }

    /// Add a subplot; returns its index.
    pub fn add_region(&mut self, region: Region) -> usize {
        self.regions.push(region);
        self.regions.len() - 1
    }

    /// Wire a compositor to region `region`.
    pub fn add_compositor(&mut self, compositor: ChannelCompositor, region: usize) -> ReelResult<()> {
        self.check_region(region)?;
        self.compositors.push((compositor, region));
        Ok(())
    }

    /// Attach an overlay to region `region`.
    pub fn attach_overlay(&mut self, overlay: OverlayConfig, region: usize) -> ReelResult<()> {
        self.check_region(region)?;
        tracing::trace!(kind = overlay.overlay.name(), region, "attach overlay");
        self.overlays.push((overlay, region));
        Ok(())
    }

    /// Configurations of every attached overlay.
    pub fn attached_overlays(&self) -> Vec<OverlayConfig> {
        self.overlays.iter().map(|(ov, _)| ov.clone()).collect()
    }

    /// Attached overlays with their region index.
    pub fn overlay_bindings(&self) -> &[(OverlayConfig, usize)] {
        &self.overlays
    }

    fn check_region(&self, region: usize) -> ReelResult<()> {
        if region >= self.regions.len() {
            return Err(ReelError::configuration(format!(
                "region {region} does not exist (context has {})",
                self.regions.len()
            )));
        }
        Ok(())
    }

    /// Repaint every region and overlay for `frame` and return the raster.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn paint_frame(&mut self, frame: u64) -> ReelResult<Frame> {
        self.frame = Some(frame);
        self.surface.begin(self.config.background);

        let mut images: Vec<Option<RegionImage>> = vec![None; self.regions.len()];
        for (compositor, idx) in &self.compositors {
            let region = &self.regions[*idx];
            let shown = region.frame.unwrap_or(frame);
            let image = compositor.render(self.source.as_ref(), &self.config.channels, shown)?;
            if let Some(raster) = &image.raster {
                self.surface
                    .draw_raster(raster, region.rect, region.origin)?;
            }
            if images[*idx].is_none() {
                images[*idx] = Some(image);
            }
        }

        let meta = self.source.meta();
        let call = OverlayStyle::default();
        for (overlay, idx) in &self.overlays {
            let region = &self.regions[*idx];
            let ctx = PaintContext {
                frame: region.frame.unwrap_or(frame),
                region,
                meta,
                config: &self.config,
                defaults: &self.defaults,
                image: images[*idx].as_ref(),
            };
            overlay.plot(&mut self.surface, &ctx, &call)?;
        }

        if let Some(band) = self.title_band
            && !self.config.title.is_empty()
        {
            let size = (band.height() * 0.5).max(1.0) as f32;
            self.surface.draw_text(
                &self.config.title,
                Point::new(band.center().x, band.center().y + f64::from(size) / 2.0),
                size,
                Color::WHITE,
                (HAlign::Center, VAlign::Bottom),
            )?;
        }

        Ok(self.surface.finish())
    }

    /// Paint `frame` into the cache unless it is already there.
    pub fn render_frame(&mut self, frame: u64) -> ReelResult<FrameStatus> {
        let Some(cache) = self.cache.clone() else {
            return Err(ReelError::render("render context has no frame cache"));
        };
        if cache.exists(frame) {
            tracing::debug!(frame, "frame already cached");
            return Ok(FrameStatus::Cached);
        }
        let raster = self.paint_frame(frame)?;
        if cache.write(frame, &raster)? {
            tracing::debug!(frame, "frame rendered");
            Ok(FrameStatus::Rendered)
        } else {
            Ok(FrameStatus::Cached)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/context.rs"]
mod tests;
