use std::collections::VecDeque;
use std::sync::Arc;

use kurbo::Rect;

use crate::cache::FrameCache;
use crate::compose::channel::ChannelCompositor;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::model::{OverlayConfig, OverlayKind, missing_overlays};
use crate::overlay::style::OverlayStyle;
use crate::render::context::RenderContext;
use crate::render::region::Region;
use crate::scene::config::{LayoutKind, RenderConfig, ZSelection};
use crate::source::ImageSource;

/// Everything needed to rebuild an equivalent composer on another thread.
#[derive(Clone)]
pub struct ComposerSnapshot {
    /// Shared run configuration (carries the layout).
    pub config: Arc<RenderConfig>,
    /// Shared image source.
    pub source: Arc<dyn ImageSource>,
    /// Cache every replica writes to.
    pub cache: FrameCache,
    /// Attached and still-pending overlay configurations of the captured composer.
    pub overlays: Vec<OverlayConfig>,
}

enum ComposerState {
    Unbuilt,
    Built(Box<RenderContext>),
}

/// Builds a [`RenderContext`] for the configured layout and routes overlays onto its regions.
pub struct LayoutComposer {
    config: Arc<RenderConfig>,
    source: Arc<dyn ImageSource>,
    cache: FrameCache,
    pending: VecDeque<OverlayConfig>,
    state: ComposerState,
}

struct Cell {
    region: Region,
    compositor: ChannelCompositor,
    grid_label: bool,
}

impl LayoutComposer {
    /// Unbuilt composer; the configured overlays are queued until [`LayoutComposer::make_layout`].
    pub fn new(config: Arc<RenderConfig>, source: Arc<dyn ImageSource>, cache: FrameCache) -> Self {
        let pending = config.overlays.iter().cloned().collect();
        Self {
            config,
            source,
            cache,
            pending,
            state: ComposerState::Unbuilt,
        }
    }

    /// Rebuild a composer from `snapshot`: lay it out, then re-attach every snapshot overlay the
    /// fresh layout does not already carry.
    pub fn from_snapshot(snapshot: &ComposerSnapshot) -> ReelResult<Self> {
        let mut composer = Self::new(
            Arc::clone(&snapshot.config),
            Arc::clone(&snapshot.source),
            snapshot.cache.clone(),
        );
        composer.make_layout()?;
        composer.reconcile(&snapshot.overlays)?;
        Ok(composer)
    }

    /// Capture this composer for replication.
    pub fn snapshot(&self) -> ComposerSnapshot {
        let mut overlays = match &self.state {
            ComposerState::Built(ctx) => ctx.attached_overlays(),
            ComposerState::Unbuilt => Vec::new(),
        };
        overlays.extend(self.pending.iter().cloned());
        ComposerSnapshot {
            config: Arc::clone(&self.config),
            source: Arc::clone(&self.source),
            cache: self.cache.clone(),
            overlays,
        }
    }

    /// `true` once the layout has been built.
    pub fn is_built(&self) -> bool {
        matches!(self.state, ComposerState::Built(_))
    }

    /// Run configuration.
    pub fn config(&self) -> &Arc<RenderConfig> {
        &self.config
    }

    /// Built context, if any.
    pub fn context(&self) -> Option<&RenderContext> {
        match &self.state {
            ComposerState::Built(ctx) => Some(&**ctx),
            ComposerState::Unbuilt => None,
        }
    }

    /// Overlays waiting for the layout to be built.
    pub fn pending_overlays(&self) -> impl Iterator<Item = &OverlayConfig> {
        self.pending.iter()
    }

    /// Queue an overlay, or attach it right away when the layout is already built.
    pub fn add_overlay(&mut self, overlay: OverlayConfig) -> ReelResult<()> {
        overlay.validate()?;
        match &mut self.state {
            ComposerState::Built(ctx) => route_overlay(ctx, overlay),
            ComposerState::Unbuilt => {
                self.pending.push_back(overlay);
                Ok(())
            }
        }
    }

    /// Attach the overlays of `expected` missing from the built context. Returns how many.
    pub fn reconcile(&mut self, expected: &[OverlayConfig]) -> ReelResult<usize> {
        let ctx = self.make_layout()?;
        let missing = missing_overlays(expected, &ctx.attached_overlays())?;
        let n = missing.len();
        for ov in missing {
            route_overlay(ctx, ov)?;
        }
        if n > 0 {
            tracing::debug!(reattached = n, "reconciled overlays");
        }
        Ok(n)
    }

    /// Build the context for the configured layout; a no-op once built.
    pub fn make_layout(&mut self) -> ReelResult<&mut RenderContext> {
        if let ComposerState::Unbuilt = self.state {
            let mut ctx = self.build()?;
            while let Some(ov) = self.pending.pop_front() {
                route_overlay(&mut ctx, ov)?;
            }
            self.state = ComposerState::Built(Box::new(ctx));
        }
        match &mut self.state {
            ComposerState::Built(ctx) => Ok(&mut **ctx),
            ComposerState::Unbuilt => Err(ReelError::render("layout was not built")),
        }
    }

    fn build(&self) -> ReelResult<RenderContext> {
        let meta = self.source.meta();
        let channels = self.config.channel_ids();
        let Some(&first) = channels.first() else {
            return Err(ReelError::configuration(
                "at least one channel must be configured",
            ));
        };
        let zstack = self.config.zstack;

        let (columns, cells): (u32, Vec<(ChannelCompositor, Option<u32>, String)>) =
            match self.config.layout {
                LayoutKind::Single => (
                    1,
                    vec![(
                        ChannelCompositor::Channels {
                            channels: vec![first],
                            zstack,
                        },
                        None,
                        String::new(),
                    )],
                ),
                LayoutKind::Composite => (
                    1,
                    vec![(
                        ChannelCompositor::Channels {
                            channels: channels.clone(),
                            zstack,
                        },
                        None,
                        String::new(),
                    )],
                ),
                LayoutKind::ChannelColumns { columns } => (
                    columns.min(channels.len() as u32).max(1),
                    channels
                        .iter()
                        .map(|&c| {
                            let name = self
                                .config
                                .channels
                                .get(&c)
                                .map(|s| s.name.clone())
                                .filter(|n| !n.is_empty())
                                .unwrap_or_else(|| format!("ch{c}"));
                            (
                                ChannelCompositor::Channels {
                                    channels: vec![c],
                                    zstack,
                                },
                                None,
                                name,
                            )
                        })
                        .collect(),
                ),
                LayoutKind::ZStackColumns { columns } => {
                    let zs = meta.zstacks.max(1);
                    let columns = columns.min(zs).max(1);
                    let cells = zs.div_ceil(columns) * columns;
                    (
                        columns,
                        (0..cells)
                            .map(|z| {
                                if z < zs {
                                    (
                                        ChannelCompositor::Channels {
                                            channels: vec![first],
                                            zstack: ZSelection::Index(z),
                                        },
                                        Some(z),
                                        format!("z{z:02}"),
                                    )
                                } else {
                                    (ChannelCompositor::Null, None, String::new())
                                }
                            })
                            .collect(),
                    )
                }
            };
        let grid = !matches!(
            self.config.layout,
            LayoutKind::Single | LayoutKind::Composite
        );

        let panel_w = self.config.panel_px;
        let panel_h = ((f64::from(panel_w) * f64::from(meta.height) / f64::from(meta.width.max(1)))
            .round() as u32)
            .max(1);
        let title_h = if self.config.title.is_empty() {
            0
        } else {
            (panel_w / 8).max(16)
        };
        let rows = (cells.len() as u32).div_ceil(columns);
        let canvas = Canvas {
            width: columns * panel_w,
            height: rows * panel_h + title_h,
        }
        .even();

        let extent = meta.physical_extent();
        let cells: Vec<Cell> = cells
            .into_iter()
            .enumerate()
            .map(|(i, (compositor, z, label))| {
                let (row, col) = (i as u32 / columns, i as u32 % columns);
                let x0 = f64::from(col * panel_w);
                let y0 = f64::from(title_h + row * panel_h);
                let mut region = Region::new(
                    Rect::new(x0, y0, x0 + f64::from(panel_w), y0 + f64::from(panel_h)),
                    extent,
                    self.config.origin,
                );
                region.z = z;
                region.label = label;
                Cell {
                    region,
                    grid_label: grid && !matches!(compositor, ChannelCompositor::Null),
                    compositor,
                }
            })
            .collect();

        tracing::debug!(
            layout = %self.config.layout.name(),
            width = canvas.width,
            height = canvas.height,
            regions = cells.len(),
            "building layout"
        );
        let mut ctx = RenderContext::new(
            Arc::clone(&self.config),
            Arc::clone(&self.source),
            Some(self.cache.clone()),
            canvas.width,
            canvas.height,
        )?;
        if title_h > 0 {
            ctx.set_title_band(Rect::new(0.0, 0.0, f64::from(canvas.width), f64::from(title_h)));
        }
        for cell in cells {
            let blank = matches!(cell.compositor, ChannelCompositor::Null);
            let label = cell.region.label.clone();
            let scalebar_xy = cell.region.ratio_to_units(0.80, 0.05);
            let stamp_xy = cell.region.ratio_to_units(0.02, 0.95);
            let label_xy = cell.region.ratio_to_units(0.70, 0.95);
            let idx = ctx.add_region(cell.region);
            ctx.add_compositor(cell.compositor, idx)?;
            if blank {
                continue;
            }
            ctx.attach_overlay(
                OverlayConfig::new(OverlayKind::ScaleBar { um: None })
                    .with_style(OverlayStyle {
                        xy: Some(scalebar_xy),
                        line_width: Some(3.0),
                        font_size: Some(9.0),
                        ..Default::default()
                    })
                    .in_region(idx),
                idx,
            )?;
            ctx.attach_overlay(
                OverlayConfig::new(OverlayKind::Timestamp)
                    .with_style(OverlayStyle {
                        xy: Some(stamp_xy),
                        ..Default::default()
                    })
                    .in_region(idx),
                idx,
            )?;
            if cell.grid_label {
                ctx.attach_overlay(
                    OverlayConfig::new(OverlayKind::Text { text: label })
                        .with_style(OverlayStyle {
                            xy: Some(label_xy),
                            font_size: Some(7.0),
                            ..Default::default()
                        })
                        .in_region(idx),
                    idx,
                )?;
            }
        }
        Ok(ctx)
    }
}

fn route_overlay(ctx: &mut RenderContext, overlay: OverlayConfig) -> ReelResult<()> {
    if let Some(z) = overlay.z {
        let Some(idx) = ctx.regions().iter().position(|r| r.z == Some(z)) else {
            tracing::debug!(kind = overlay.overlay.name(), z, "no region shows this z-level, dropping overlay");
            return Ok(());
        };
        return ctx.attach_overlay(overlay, idx);
    }
    let idx = overlay.region.unwrap_or(0);
    ctx.attach_overlay(overlay, idx)
}

#[cfg(test)]
#[path = "../../tests/unit/layout/composer.rs"]
mod tests;
