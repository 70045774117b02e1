use super::*;
use serde_json::json;

#[test]
fn numbers_compare_by_value() {
    assert!(deep_eq(&json!(10), &json!(10.0)));
    assert_eq!(fingerprint(&json!(10)), fingerprint(&json!(10.0)));
    assert!(!deep_eq(&json!(10), &json!(11)));
}

#[test]
fn arrays_are_order_independent() {
    let a = json!({"rois": [{"left": 1}, {"left": 2}]});
    let b = json!({"rois": [{"left": 2}, {"left": 1}]});
    assert!(deep_eq(&a, &b));
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn arrays_need_equal_length() {
    assert!(!deep_eq(&json!([1, 2]), &json!([1, 2, 2])));
    assert_ne!(fingerprint(&json!([1, 2])), fingerprint(&json!([1, 2, 2])));
}

#[test]
fn mutual_membership_with_repeats() {
    let a = json!([1, 1, 2]);
    let b = json!([1, 2, 2]);
    assert!(deep_eq(&a, &b));
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn objects_need_matching_keys() {
    assert!(!deep_eq(&json!({"a": 1}), &json!({"b": 1})));
    assert!(!deep_eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    assert!(deep_eq(
        &json!({"a": {"b": [true, null]}}),
        &json!({"a": {"b": [null, true]}})
    ));
}

#[test]
fn mixed_types_differ() {
    assert!(!deep_eq(&json!("1"), &json!(1)));
    assert!(!deep_eq(&json!(null), &json!(false)));
}
