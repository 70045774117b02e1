use super::*;

fn region(origin: Origin) -> Region {
    Region::new(Rect::new(100.0, 0.0, 200.0, 50.0), (20.0, 10.0), origin)
}

#[test]
fn lower_origin_grows_upwards() {
    let r = region(Origin::Lower);
    assert_eq!(r.to_px(0.0, 0.0), Point::new(100.0, 50.0));
    assert_eq!(r.to_px(20.0, 10.0), Point::new(200.0, 0.0));
    assert_eq!(r.to_px(10.0, 2.0), Point::new(150.0, 40.0));
}

#[test]
fn upper_origin_grows_downwards() {
    let r = region(Origin::Upper);
    assert_eq!(r.to_px(0.0, 0.0), Point::new(100.0, 0.0));
    assert_eq!(r.to_px(10.0, 2.0), Point::new(150.0, 10.0));
}

#[test]
fn ratios_and_insets() {
    let r = region(Origin::Lower);
    assert_eq!(r.ratio_to_units(0.8, 0.05), [16.0, 0.5]);
    assert_eq!(
        r.inset([0.5, 0.5, 0.5, 0.5]),
        Rect::new(150.0, 0.0, 200.0, 25.0)
    );
    assert_eq!(r.px_per_unit(), 5.0);
}

#[test]
fn font_size_is_relative_to_a_256_px_panel() {
    let full = Region::new(Rect::new(0.0, 0.0, 256.0, 256.0), (1.0, 1.0), Origin::Upper);
    assert_eq!(full.font_px(12.0), 12.0);
    let double = Region::new(Rect::new(0.0, 0.0, 512.0, 512.0), (1.0, 1.0), Origin::Upper);
    assert_eq!(double.font_px(12.0), 24.0);
    // 100 px wide, see `region`.
    assert_eq!(region(Origin::Lower).font_px(0.5), 1.0);
}
