use std::path::{Path, PathBuf};
use std::sync::Arc;

use kurbo::Rect;

use crate::cache::save_png;
use crate::compose::channel::ChannelCompositor;
use crate::foundation::core::{Canvas, Frame};
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::model::{OverlayConfig, OverlayKind};
use crate::overlay::style::OverlayStyle;
use crate::render::context::RenderContext;
use crate::render::region::Region;
use crate::scene::config::{RenderConfig, Rescale, ZSelection};
use crate::scene::file::{Facet, PanelDef};
use crate::session::movie::preflight;
use crate::source::ImageSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pick {
    Frame(u64),
    Channel(u32),
    Z(u32),
}

/// One montage tile: which frame, channels and z-selection it shows.
#[derive(Clone, Debug, PartialEq)]
struct Tile {
    frame: u64,
    channels: Vec<u32>,
    zstack: ZSelection,
    label: String,
}

fn facet_values(def: &PanelDef, facet: Option<Facet>, channels: &[u32]) -> Vec<Option<Pick>> {
    match facet {
        None => vec![None],
        Some(Facet::Frame) => {
            if def.frames.is_empty() {
                (0..def.source.frames).map(|t| Some(Pick::Frame(t))).collect()
            } else {
                def.frames.iter().map(|&t| Some(Pick::Frame(t))).collect()
            }
        }
        Some(Facet::Channel) => channels.iter().map(|&c| Some(Pick::Channel(c))).collect(),
        Some(Facet::Z) => {
            if def.zstacks.is_empty() {
                (0..def.source.zstacks).map(|z| Some(Pick::Z(z))).collect()
            } else {
                def.zstacks.iter().map(|&z| Some(Pick::Z(z))).collect()
            }
        }
    }
}

fn tiles(def: &PanelDef, channels: &[u32]) -> (usize, Vec<Tile>) {
    let rows = facet_values(def, def.rows, channels);
    let cols = facet_values(def, def.columns, channels);
    let mut out = Vec::with_capacity(rows.len() * cols.len());
    for r in &rows {
        for c in &cols {
            let mut tile = Tile {
                frame: def.frames.first().copied().unwrap_or(0),
                channels: channels.to_vec(),
                zstack: def.zstack,
                label: String::new(),
            };
            let mut labels = Vec::new();
            for pick in [r, c].into_iter().flatten() {
                match *pick {
                    Pick::Frame(t) => {
                        tile.frame = t;
                        labels.push(format!("t{t}"));
                    }
                    Pick::Channel(ch) => {
                        tile.channels = vec![ch];
                        labels.push(format!("ch{ch}"));
                    }
                    Pick::Z(z) => {
                        tile.zstack = ZSelection::Index(z);
                        labels.push(format!("z{z:02}"));
                    }
                }
            }
            tile.label = labels.join(" ");
            out.push(tile);
        }
    }
    (cols.len(), out)
}

/// Paint the montage described by `def`.
pub fn compose_panel(def: &PanelDef, source: Arc<dyn ImageSource>) -> ReelResult<Frame> {
    let meta = source.meta().clone();
    let mut styles = def.channel_styles();
    for style in styles.values_mut() {
        if style.rescale != Rescale::None {
            style.intensity *= def.level;
        }
    }
    let channels: Vec<u32> = styles.keys().copied().collect();
    if channels.is_empty() {
        return Err(ReelError::configuration("panel shows no channels"));
    }
    let (columns, tiles) = tiles(def, &channels);

    let tile_w = def.panel_px;
    let tile_h = ((f64::from(tile_w) * f64::from(meta.height) / f64::from(meta.width.max(1)))
        .round() as u32)
        .max(1);
    let rows = tiles.len().div_ceil(columns) as u32;
    let canvas = Canvas {
        width: columns as u32 * tile_w,
        height: rows * tile_h,
    }
    .even();

    let config = RenderConfig {
        frames: tiles.iter().map(|t| t.frame).collect(),
        channels: styles,
        scalebar_um: def.scalebar_um,
        font: def.font.clone(),
        origin: def.origin,
        panel_px: def.panel_px,
        background: def.background,
        ..RenderConfig::default()
    };
    let mut ctx = RenderContext::new(Arc::new(config), source, None, canvas.width, canvas.height)?;

    let extent = meta.physical_extent();
    for (i, tile) in tiles.into_iter().enumerate() {
        let (row, col) = ((i / columns) as u32, (i % columns) as u32);
        let (x0, y0) = (f64::from(col * tile_w), f64::from(row * tile_h));
        let mut region = Region::new(
            Rect::new(x0, y0, x0 + f64::from(tile_w), y0 + f64::from(tile_h)),
            extent,
            def.origin,
        );
        region.frame = Some(tile.frame);
        region.label = tile.label.clone();
        let scalebar_xy = region.ratio_to_units(0.80, 0.05);
        let label_xy = region.ratio_to_units(0.02, 0.95);
        let idx = ctx.add_region(region);
        ctx.add_compositor(
            ChannelCompositor::Channels {
                channels: tile.channels,
                zstack: tile.zstack,
            },
            idx,
        )?;
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
        if !tile.label.is_empty() {
            ctx.attach_overlay(
                OverlayConfig::new(OverlayKind::Text { text: tile.label })
                    .with_style(OverlayStyle {
                        xy: Some(label_xy),
                        font_size: Some(9.0),
                        ..Default::default()
                    })
                    .in_region(idx),
                idx,
            )?;
        }
        if def.histogram {
            ctx.attach_overlay(
                OverlayConfig::new(OverlayKind::Histogram { channel: None }).in_region(idx),
                idx,
            )?;
        }
    }
    ctx.paint_frame(0)
}

/// Paint the montage and write it to `out`.
#[tracing::instrument(level = "info", skip(def, source))]
pub fn render_panel(
    def: &PanelDef,
    source: Arc<dyn ImageSource>,
    out: &Path,
    overwrite: bool,
) -> ReelResult<PathBuf> {
    preflight(out, overwrite)?;
    let frame = compose_panel(def, source)?;
    crate::encode::ffmpeg::ensure_parent_dir(out)?;
    save_png(&frame, out)?;
    tracing::info!(out = %out.display(), "wrote panel");
    Ok(out.to_path_buf())
}

#[cfg(test)]
#[path = "../../tests/unit/session/panel.rs"]
mod tests;
