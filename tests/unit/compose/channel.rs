use super::*;
use crate::source::memory::MemorySource;

fn ones(w: u32, h: u32) -> Plane {
    Plane::filled(w, h, SampleType::F32, 1.0)
}

fn styles(entries: &[(u32, [f32; 3], f32)]) -> BTreeMap<u32, ChannelStyle> {
    entries
        .iter()
        .map(|&(c, color, intensity)| {
            (
                c,
                ChannelStyle {
                    name: format!("c{c}"),
                    color,
                    rescale: Rescale::None,
                    intensity,
                },
            )
        })
        .collect()
}

fn quadrant(corner: (u32, u32)) -> Plane {
    let mut p = Plane::filled(4, 4, SampleType::F32, 0.0);
    for y in 0..2 {
        for x in 0..2 {
            let i = ((corner.1 + y) * 4 + corner.0 + x) as usize;
            p.data[i] = 1.0;
        }
    }
    p
}

#[test]
fn disjoint_quadrants_keep_their_colors() {
    let red = quadrant((0, 0));
    let green = quadrant((2, 0));
    let blue = quadrant((0, 2));
    let st = styles(&[
        (0, [1.0, 0.0, 0.0], 1.0),
        (1, [0.0, 1.0, 0.0], 1.0),
        (2, [0.0, 0.0, 1.0], 1.0),
    ]);
    let inputs = [
        ChannelInput { channel: 0, plane: Some(&red) },
        ChannelInput { channel: 1, plane: Some(&green) },
        ChannelInput { channel: 2, plane: Some(&blue) },
    ];
    let out = compose(&inputs, &st, 0).unwrap().raster;
    assert_eq!(out.pixel(0, 0), [1.0, 0.0, 0.0]);
    assert_eq!(out.pixel(3, 1), [0.0, 1.0, 0.0]);
    assert_eq!(out.pixel(1, 3), [0.0, 0.0, 1.0]);
    assert_eq!(out.pixel(3, 3), [0.0, 0.0, 0.0]);
}

#[test]
fn weights_add_without_clipping() {
    let a = ones(2, 2);
    let b = ones(2, 2);
    let st = styles(&[(0, [1.0, 0.0, 0.0], 1.0), (1, [1.0, 0.5, 0.0], 2.0)]);
    let inputs = [
        ChannelInput { channel: 0, plane: Some(&a) },
        ChannelInput { channel: 1, plane: Some(&b) },
    ];
    let out = compose(&inputs, &st, 0).unwrap().raster;
    assert_eq!(out.pixel(1, 1), [3.0, 1.0, 0.0]);
}

#[test]
fn unavailable_channel_is_skipped() {
    let a = ones(2, 2);
    let st = styles(&[(0, [1.0, 0.0, 0.0], 1.0), (1, [0.0, 1.0, 0.0], 0.5)]);
    let inputs = [
        ChannelInput { channel: 0, plane: None },
        ChannelInput { channel: 1, plane: Some(&a) },
    ];
    let out = compose(&inputs, &st, 3).unwrap();
    assert_eq!(out.layers, vec![None, Some(1)]);
    assert_eq!(out.raster.pixel(0, 0), [0.0, 0.5, 0.0]);
}

#[test]
fn no_available_channel_is_frame_unavailable() {
    let st = styles(&[(0, [1.0, 0.0, 0.0], 1.0)]);
    let inputs = [ChannelInput { channel: 0, plane: None }];
    assert!(matches!(
        compose(&inputs, &st, 7),
        Err(ReelError::FrameUnavailable { channel: 0, frame: 7 })
    ));
}

#[test]
fn shape_mismatch_is_rejected() {
    let a = ones(2, 2);
    let b = ones(3, 2);
    let st = styles(&[(0, [1.0, 0.0, 0.0], 1.0), (1, [0.0, 1.0, 0.0], 1.0)]);
    let inputs = [
        ChannelInput { channel: 0, plane: Some(&a) },
        ChannelInput { channel: 1, plane: Some(&b) },
    ];
    assert!(matches!(
        compose(&inputs, &st, 0),
        Err(ReelError::DimensionMismatch(_))
    ));
}

#[test]
fn integer_output_truncates_instead_of_clipping() {
    let p = Plane::new(2, 1, SampleType::U8, vec![200.0, 7.0]).unwrap();
    let st = styles(&[(0, [1.0, 0.5, 0.0], 1.5)]);
    let inputs = [ChannelInput { channel: 0, plane: Some(&p) }];
    let out = compose(&inputs, &st, 0).unwrap().raster;
    assert_eq!(out.sample, SampleType::U8);
    assert_eq!(out.pixel(0, 0), [300.0, 150.0, 0.0]);
    assert_eq!(out.pixel(1, 0), [10.0, 5.0, 0.0]);
}

#[test]
fn output_type_follows_first_available_channel_after_rescale() {
    let p8 = Plane::new(2, 1, SampleType::U8, vec![0.0, 255.0]).unwrap();
    let mut st = styles(&[(0, [1.0, 1.0, 1.0], 1.0)]);
    st.get_mut(&0).unwrap().rescale = Rescale::Range { min: 0.0, max: 255.0 };
    let inputs = [ChannelInput { channel: 0, plane: Some(&p8) }];
    let out = compose(&inputs, &st, 0).unwrap().raster;
    assert_eq!(out.sample, SampleType::F32);
    assert_eq!(out.pixel(1, 0), [1.0, 1.0, 1.0]);
}

#[test]
fn percentile_rescale_clips_to_unit_range() {
    let p = Plane::new(5, 1, SampleType::U16, vec![0.0, 10.0, 20.0, 30.0, 40.0]).unwrap();
    let (v, sample) = rescale(&p, Rescale::Percentile { lo: 25.0, hi: 75.0 });
    assert_eq!(sample, SampleType::F32);
    assert_eq!(v, vec![0.0, 0.0, 0.5, 1.0, 1.0]);
}

#[test]
fn degenerate_rescale_maps_to_zero() {
    let p = Plane::filled(2, 2, SampleType::U16, 9.0);
    let (v, _) = rescale(&p, Rescale::Percentile { lo: 0.1, hi: 99.9 });
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn compositor_fetches_projected_planes() {
    let src = MemorySource::new(1, 1, 1, 2, 1)
        .with_plane(0, 0, 0, Plane::filled(1, 1, SampleType::F32, 0.25))
        .unwrap()
        .with_plane(0, 1, 0, Plane::filled(1, 1, SampleType::F32, 0.75))
        .unwrap();
    let st = styles(&[(0, [1.0, 1.0, 1.0], 1.0)]);
    let comp = ChannelCompositor::Channels {
        channels: vec![0],
        zstack: ZSelection::default(),
    };
    let img = comp.render(&src, &st, 0).unwrap();
    assert_eq!(img.raster.unwrap().pixel(0, 0), [0.75, 0.75, 0.75]);
    assert_eq!(img.planes.len(), 1);

    let blank = ChannelCompositor::Null.render(&src, &st, 0).unwrap();
    assert!(blank.raster.is_none());
}

#[test]
fn red_and_half_green_make_orange_on_every_frame() {
    let mut src = MemorySource::new(2, 2, 2, 1, 3);
    for t in 0..3 {
        src.insert(0, 0, t, ones(2, 2)).unwrap();
        src.insert(1, 0, t, ones(2, 2)).unwrap();
    }
    let st = styles(&[(0, [1.0, 0.0, 0.0], 1.0), (1, [0.0, 1.0, 0.0], 0.5)]);
    let comp = ChannelCompositor::Channels {
        channels: vec![0, 1],
        zstack: ZSelection::Index(0),
    };
    for t in 0..3 {
        let raster = comp.render(&src, &st, t).unwrap().raster.unwrap();
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(raster.pixel(x, y), [1.0, 0.5, 0.0], "frame {t} at ({x}, {y})");
            }
        }
    }
}

#[test]
fn composite_is_the_sum_of_single_channel_composites() {
    let red = quadrant((0, 0));
    let green = quadrant((1, 1));
    let both = styles(&[(0, [1.0, 0.0, 0.0], 1.0), (1, [0.0, 1.0, 0.0], 0.5)]);
    let only_red = styles(&[(0, [1.0, 0.0, 0.0], 1.0)]);
    let only_green = styles(&[(1, [0.0, 1.0, 0.0], 0.5)]);

    let r = ChannelInput { channel: 0, plane: Some(&red) };
    let g = ChannelInput { channel: 1, plane: Some(&green) };
    let sum = compose(&[r, g], &both, 0).unwrap().raster;
    let r_only = compose(&[r], &only_red, 0).unwrap().raster;
    let g_only = compose(&[g], &only_green, 0).unwrap().raster;
    for y in 0..4 {
        for x in 0..4 {
            let (a, b) = (r_only.pixel(x, y), g_only.pixel(x, y));
            let expected = [a[0] + b[0], a[1] + b[1], a[2] + b[2]];
            assert_eq!(sum.pixel(x, y), expected, "({x}, {y})");
        }
    }
    // Overlap of the two blocks carries both colors.
    assert_eq!(sum.pixel(1, 1), [1.0, 0.5, 0.0]);
}
