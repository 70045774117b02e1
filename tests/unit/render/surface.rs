use super::*;
use crate::foundation::core::SampleType;

fn uniform(w: u32, h: u32, rgb: [f32; 3], sample: SampleType) -> RgbRaster {
    RgbRaster {
        width: w,
        height: h,
        sample,
        data: rgb.repeat((w * h) as usize),
    }
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 1)
}

#[test]
fn rgba8_conversion_clamps_at_export() {
    let r = uniform(1, 1, [1.5, 0.5, -0.2], SampleType::F32);
    assert_eq!(raster_to_rgba8(&r, Origin::Upper), vec![255, 128, 0, 255]);
    let r = uniform(1, 1, [300.0, 51.0, 0.0], SampleType::U8);
    assert_eq!(raster_to_rgba8(&r, Origin::Upper), vec![255, 51, 0, 255]);
}

#[test]
fn lower_origin_flips_rows() {
    let r = RgbRaster {
        width: 1,
        height: 2,
        sample: SampleType::F32,
        data: vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
    };
    assert_eq!(
        raster_to_rgba8(&r, Origin::Lower),
        vec![0, 0, 0, 255, 255, 255, 255, 255]
    );
}

#[test]
fn painted_raster_fills_destination() {
    let mut s = Surface::new(16, 16, None).unwrap();
    s.begin(Color::BLACK);
    let r = uniform(2, 2, [1.0, 0.5, 0.0], SampleType::F32);
    s.draw_raster(&r, Rect::new(0.0, 0.0, 16.0, 16.0), Origin::Lower)
        .unwrap();
    let frame = s.finish();
    assert!(close(frame.pixel(8, 8), [255, 128, 0, 255]));
}

#[test]
fn background_and_rect_fill() {
    let mut s = Surface::new(8, 8, None).unwrap();
    s.begin(Color::rgb(10, 20, 30));
    s.fill_rect(Rect::new(0.0, 0.0, 4.0, 8.0), Color::WHITE);
    let f = s.finish();
    assert_eq!(f.pixel(1, 1), [255, 255, 255, 255]);
    assert_eq!(f.pixel(6, 6), [10, 20, 30, 255]);
}

#[test]
fn polyline_strokes_cover_the_line() {
    let mut s = Surface::new(16, 16, None).unwrap();
    s.begin(Color::BLACK);
    s.stroke_polyline(
        &[Point::new(2.0, 8.0), Point::new(14.0, 8.0)],
        4.0,
        Color::WHITE,
    );
    let f = s.finish();
    assert_eq!(f.pixel(8, 8), [255, 255, 255, 255]);
    assert_eq!(f.pixel(8, 1), [0, 0, 0, 255]);
}

#[test]
fn text_without_font_is_skipped() {
    let mut s = Surface::new(8, 8, None).unwrap();
    s.begin(Color::BLACK);
    assert!(!s.has_font());
    s.draw_text("x", Point::new(1.0, 1.0), 6.0, Color::WHITE, (HAlign::Start, VAlign::Top))
        .unwrap();
    assert_eq!(s.finish(), Frame::black(8, 8));
}

#[test]
fn surface_rejects_oversized_dimensions() {
    assert!(Surface::new(70_000, 4, None).is_err());
    assert!(Surface::new(0, 4, None).is_err());
}
