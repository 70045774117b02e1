use super::*;
use crate::foundation::core::{Plane, SampleType};
use crate::source::memory::MemorySource;

fn def(json: &str) -> PanelDef {
    serde_json::from_str(json).unwrap()
}

const GRID: &str = r#"{
    "source": {"folder": "stack", "channels": 2, "frames": 3},
    "channels": {
        "0": {"color": [1, 0, 0], "rescale": {"range": {"min": 0, "max": 100}}},
        "1": {"color": [0, 1, 0], "rescale": {"range": {"min": 0, "max": 100}}}
    },
    "frames": [0, 2],
    "rows": "frame",
    "columns": "channel",
    "panel_px": 16,
    "level": 1.0
}"#;

fn stack() -> Arc<dyn ImageSource> {
    let mut src = MemorySource::new(4, 4, 2, 1, 3);
    for t in 0..3 {
        let v = if t == 2 { 100.0 } else { 0.0 };
        src.insert(0, 0, t, Plane::filled(4, 4, SampleType::U8, v)).unwrap();
        src.insert(1, 0, t, Plane::filled(4, 4, SampleType::U8, v)).unwrap();
    }
    Arc::new(src)
}

#[test]
fn facets_cross_rows_with_columns() {
    let d = def(GRID);
    let (columns, tiles) = tiles(&d, &[0, 1]);
    assert_eq!(columns, 2);
    let summary: Vec<(u64, Vec<u32>, &str)> = tiles
        .iter()
        .map(|t| (t.frame, t.channels.clone(), t.label.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            (0, vec![0], "t0 ch0"),
            (0, vec![1], "t0 ch1"),
            (2, vec![0], "t2 ch0"),
            (2, vec![1], "t2 ch1"),
        ]
    );
}

#[test]
fn z_facet_defaults_to_every_level() {
    let mut d = def(GRID);
    d.source.zstacks = 3;
    d.rows = None;
    d.columns = Some(Facet::Z);
    let (columns, tiles) = tiles(&d, &[0]);
    assert_eq!(columns, 3);
    assert_eq!(tiles[2].zstack, ZSelection::Index(2));
    assert_eq!(tiles[2].frame, 0);
}

#[test]
fn montage_tiles_show_their_own_frame_and_channel() {
    let frame = compose_panel(&def(GRID), stack()).unwrap();
    assert_eq!((frame.width, frame.height), (32, 32));
    // Row 0 is frame 0 (black), row 1 is frame 2 (full intensity). Scale bars sit near the
    // top edge of each tile.
    assert_eq!(frame.pixel(2, 10), [0, 0, 0, 255]);
    assert_eq!(frame.pixel(2, 26), [255, 0, 0, 255]);
    assert_eq!(frame.pixel(18, 26), [0, 255, 0, 255]);
}

#[test]
fn render_panel_refuses_existing_output() {
    let dir = std::env::temp_dir().join("stackreel_panel_out");
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("panel.png");
    let _ = std::fs::remove_file(&out);
    render_panel(&def(GRID), stack(), &out, false).unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    if std::fs::metadata(&out).unwrap().len() >= crate::session::movie::MIN_VALID_OUTPUT_BYTES {
        assert!(render_panel(&def(GRID), stack(), &out, false).is_err());
    }
    render_panel(&def(GRID), stack(), &out, true).unwrap();
}
