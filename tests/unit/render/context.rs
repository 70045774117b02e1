use super::*;
use crate::cache::run_id;
use crate::foundation::core::{Plane, SampleType};
use crate::overlay::model::OverlayKind;
use crate::scene::config::{ChannelStyle, Origin, Rescale, ZSelection};
use crate::source::memory::MemorySource;

fn setup(tag: &str, planes: Vec<(u64, Plane)>) -> RenderContext {
    let mut src = MemorySource::new(4, 4, 1, 1, 3);
    for (t, p) in planes {
        src.insert(0, 0, t, p).unwrap();
    }
    let mut channels = std::collections::BTreeMap::new();
    channels.insert(
        0,
        ChannelStyle {
            rescale: Rescale::None,
            ..ChannelStyle::colored("red", [1.0, 0.0, 0.0])
        },
    );
    let config = RenderConfig {
        channels,
        frames: vec![0, 1, 2],
        ..RenderConfig::default()
    };
    let root = std::env::temp_dir().join(format!("stackreel_ctx_{tag}"));
    let cache = FrameCache::for_run(&root, &run_id(&root)).unwrap();
    let mut ctx = RenderContext::new(Arc::new(config), Arc::new(src), Some(cache), 8, 8).unwrap();
    let r = ctx.add_region(Region::new(Rect::new(0.0, 0.0, 8.0, 8.0), (4.0, 4.0), Origin::Upper));
    ctx.add_compositor(
        ChannelCompositor::Channels {
            channels: vec![0],
            zstack: ZSelection::Index(0),
        },
        r,
    )
    .unwrap();
    ctx
}

#[test]
fn paints_composited_raster_into_region() {
    let plane = Plane::filled(4, 4, SampleType::F32, 1.0);
    let mut ctx = setup("paint", vec![(0, plane)]);
    let frame = ctx.paint_frame(0).unwrap();
    assert_eq!(frame.pixel(3, 3), [255, 0, 0, 255]);
    assert_eq!(ctx.current_frame(), Some(0));
}

#[test]
fn render_frame_skips_cached_frames() {
    let plane = Plane::filled(4, 4, SampleType::F32, 0.5);
    let mut ctx = setup("skip", vec![(1, plane)]);
    assert_eq!(ctx.render_frame(1).unwrap(), FrameStatus::Rendered);
    assert_eq!(ctx.render_frame(1).unwrap(), FrameStatus::Cached);
    assert_eq!(ctx.cache().unwrap().frames().unwrap(), vec![1]);
    ctx.cache().unwrap().clone().remove().unwrap();
}

#[test]
fn missing_planes_fail_the_frame_without_caching() {
    let mut ctx = setup("missing", Vec::new());
    let err = ctx.render_frame(2).unwrap_err();
    assert!(matches!(err, ReelError::FrameUnavailable { channel: 0, frame: 2 }));
    assert!(!ctx.cache().unwrap().exists(2));
}

#[test]
fn overlays_need_an_existing_region() {
    let mut ctx = setup("bind", Vec::new());
    let ov = OverlayConfig::new(OverlayKind::Timestamp);
    assert!(ctx.attach_overlay(ov.clone(), 3).is_err());
    ctx.attach_overlay(ov.clone(), 0).unwrap();
    assert_eq!(ctx.attached_overlays(), vec![ov]);
}

#[test]
fn pinned_regions_show_their_own_frame() {
    let mut ctx = setup("pinned", vec![(2, Plane::filled(4, 4, SampleType::F32, 1.0))]);
    ctx.regions[0].frame = Some(2);
    let frame = ctx.paint_frame(0).unwrap();
    assert_eq!(frame.pixel(0, 0), [255, 0, 0, 255]);
}

#[test]
fn contexts_without_cache_only_paint() {
    let src = MemorySource::new(4, 4, 1, 1, 1);
    let mut ctx = RenderContext::new(
        Arc::new(RenderConfig::default()),
        Arc::new(src),
        None,
        8,
        8,
    )
    .unwrap();
    assert_eq!(ctx.paint_frame(0).unwrap(), Frame::black(8, 8));
    assert!(ctx.render_frame(0).is_err());
}
