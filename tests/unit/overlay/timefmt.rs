use super::*;

#[test]
fn clock_formats() {
    assert_eq!(format_elapsed(3725.9, TimeFormat::HoursMinutesSeconds), "01:02:05");
    assert_eq!(format_elapsed(3725.9, TimeFormat::HoursMinutes), "01:02");
    assert_eq!(format_elapsed(125.0, TimeFormat::MinutesSeconds), "02:05");
    assert_eq!(format_elapsed(3725.0, TimeFormat::MinutesSeconds), "01:02:05");
}

#[test]
fn negative_or_nan_elapsed_is_zero() {
    assert_eq!(format_elapsed(-4.0, TimeFormat::HoursMinutesSeconds), "00:00:00");
    assert_eq!(format_elapsed(f64::NAN, TimeFormat::HoursMinutes), "00:00");
}

#[test]
fn elapsed_uses_table_then_last_then_interval() {
    let table = [0.0, 30.0, 61.0];
    assert_eq!(elapsed_secs(1, &table, 10.0, None), 30.0);
    assert_eq!(elapsed_secs(9, &table, 10.0, None), 61.0);
    assert_eq!(elapsed_secs(4, &[], 10.0, None), 40.0);
    assert_eq!(elapsed_secs(2, &table, 10.0, Some(5.0)), 10.0);
}
