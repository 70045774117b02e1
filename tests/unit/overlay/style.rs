use super::*;

#[test]
fn call_time_beats_own_beats_context() {
    let call = OverlayStyle {
        font_size: Some(20.0),
        ..Default::default()
    };
    let own = OverlayStyle {
        font_size: Some(9.0),
        line_width: Some(3.0),
        ..Default::default()
    };
    let context = OverlayStyle {
        font_size: Some(5.0),
        line_width: Some(7.0),
        color: Some(Color::YELLOW),
        ..Default::default()
    };
    let r = OverlayStyle::layered(&call, &own, &context, ResolvedStyle::default());
    assert_eq!(r.font_size, 20.0);
    assert_eq!(r.line_width, 3.0);
    assert_eq!(r.color, Color::YELLOW);
    assert_eq!(r.bins, 10);
}

#[test]
fn fallback_fills_unset_fields() {
    let fallback = ResolvedStyle {
        color: Color::MAGENTA,
        ..Default::default()
    };
    let none = OverlayStyle::default();
    let r = OverlayStyle::layered(&none, &none, &none, fallback);
    assert_eq!(r.color, Color::MAGENTA);
    assert_eq!(r.inset, [0.5, 0.5, 0.47, 0.47]);
}

#[test]
fn validate_rejects_zero_bins_and_bad_sizes() {
    let s = OverlayStyle {
        bins: Some(0),
        ..Default::default()
    };
    assert!(s.validate().is_err());
    let s = OverlayStyle {
        font_size: Some(-1.0),
        ..Default::default()
    };
    assert!(s.validate().is_err());
    assert!(OverlayStyle::default().validate().is_ok());
}

#[test]
fn time_format_uses_clock_notation_in_json() {
    let s: OverlayStyle = serde_json::from_str(r#"{"time_format":"mm:ss"}"#).unwrap();
    assert_eq!(s.time_format, Some(TimeFormat::MinutesSeconds));
    assert!(serde_json::from_str::<OverlayStyle>(r#"{"colour":"red"}"#).is_err());
}
