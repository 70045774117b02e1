use super::*;

fn scale_bar(um: f64) -> OverlayConfig {
    OverlayConfig::new(OverlayKind::ScaleBar { um: Some(um) })
}

#[test]
fn parses_flat_json() {
    let ov: OverlayConfig = serde_json::from_str(
        r#"{"kind":"roi_box","rois":[{"left":1,"top":2,"right":5,"bottom":8}],"style":{"color":"yellow"},"z":3}"#,
    )
    .unwrap();
    assert!(matches!(ov.overlay, OverlayKind::RoiBox { ref rois } if rois.len() == 1));
    assert_eq!(ov.style.color, Some(Color::YELLOW));
    assert_eq!(ov.z, Some(3));

    let ts: OverlayConfig = serde_json::from_str(r#"{"kind":"timestamp"}"#).unwrap();
    assert!(matches!(ts.overlay, OverlayKind::Timestamp));
}

#[test]
fn equality_is_structural() {
    assert_eq!(scale_bar(10.0), scale_bar(10.0));
    assert_ne!(scale_bar(10.0), scale_bar(5.0));
    assert_ne!(scale_bar(10.0), scale_bar(10.0).in_region(1));

    let a = OverlayConfig::new(OverlayKind::RoiBox {
        rois: vec![
            Roi { left: 0.0, top: 0.0, right: 1.0, bottom: 1.0 },
            Roi { left: 2.0, top: 2.0, right: 3.0, bottom: 3.0 },
        ],
    });
    let mut b = a.clone();
    if let OverlayKind::RoiBox { rois } = &mut b.overlay {
        rois.reverse();
    }
    assert_eq!(a, b);
}

#[test]
fn missing_is_set_difference() {
    let text = OverlayConfig::new(OverlayKind::Text { text: "hi".into() });
    let expected = vec![scale_bar(10.0), text.clone(), OverlayConfig::new(OverlayKind::Timestamp)];
    let present = vec![scale_bar(10.0), OverlayConfig::new(OverlayKind::Timestamp)];
    let missing = missing_overlays(&expected, &present).unwrap();
    assert_eq!(missing, vec![text]);
}

#[test]
fn reconciliation_is_idempotent() {
    let expected = vec![scale_bar(10.0), scale_bar(10.0), scale_bar(3.0)];
    let mut present = vec![];
    let first = missing_overlays(&expected, &present).unwrap();
    assert_eq!(first.len(), 2);
    present.extend(first);
    assert!(missing_overlays(&expected, &present).unwrap().is_empty());
}

#[test]
fn validate_rejects_non_positive_bar() {
    assert!(scale_bar(0.0).validate().is_err());
    assert!(scale_bar(2.5).validate().is_ok());
}
