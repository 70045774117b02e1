use super::*;

fn valid() -> RenderConfig {
    let mut cfg = RenderConfig {
        frames: vec![0, 1, 2],
        ..Default::default()
    };
    cfg.channels
        .insert(0, ChannelStyle::colored("dna", [0.0, 0.0, 1.0]));
    cfg
}

#[test]
fn layout_names_parse() {
    assert_eq!(LayoutKind::parse("single").unwrap(), LayoutKind::Single);
    assert_eq!(LayoutKind::parse("twoch-comp").unwrap(), LayoutKind::Composite);
    for n in ["twoch", "two-ch", "two-col"] {
        assert_eq!(
            LayoutKind::parse(n).unwrap(),
            LayoutKind::ChannelColumns { columns: 2 }
        );
    }
    assert_eq!(
        LayoutKind::parse("z-4-col").unwrap(),
        LayoutKind::ZStackColumns { columns: 4 }
    );
    assert_eq!(
        LayoutKind::parse("ch-3-col").unwrap(),
        LayoutKind::ChannelColumns { columns: 3 }
    );
}

#[test]
fn unsupported_layouts_are_configuration_errors() {
    for n in ["z-0-col", "z-9-col", "three-ch", ""] {
        assert!(matches!(
            LayoutKind::parse(n),
            Err(ReelError::Configuration(_))
        ));
    }
}

#[test]
fn zstack_accepts_index_and_projection_names() {
    let z: ZSelection = serde_json::from_str("3").unwrap();
    assert_eq!(z, ZSelection::Index(3));
    let z: ZSelection = serde_json::from_str("\"all-max\"").unwrap();
    assert_eq!(z, ZSelection::Projection(Projection::Max));
    let z: ZSelection = serde_json::from_str("\"median\"").unwrap();
    assert_eq!(z, ZSelection::Projection(Projection::Median));
    assert!(serde_json::from_str::<ZSelection>("\"loudest\"").is_err());
}

#[test]
fn json_defaults_apply() {
    let cfg: RenderConfig =
        serde_json::from_str(r#"{"channels":{"1":{"color":[1,0,0]}},"layout":"twoch"}"#).unwrap();
    assert_eq!(cfg.fps, 10);
    assert_eq!(cfg.bitrate, "4000k");
    assert_eq!(cfg.zstack, ZSelection::Projection(Projection::Max));
    assert_eq!(cfg.layout, LayoutKind::ChannelColumns { columns: 2 });
    let style = &cfg.channels[&1];
    assert_eq!(style.rescale, Rescale::Percentile { lo: 0.1, hi: 99.9 });
    assert_eq!(style.intensity, 1.0);
}

#[test]
fn resolved_fills_frames_from_source() {
    let cfg = RenderConfig::default().resolved(4);
    assert_eq!(cfg.frames, vec![0, 1, 2, 3]);
    let cfg = valid().resolved(100);
    assert_eq!(cfg.frames, vec![0, 1, 2]);
}

#[test]
fn validate_accepts_a_minimal_config() {
    valid().validate().unwrap();
    assert!((valid().duration_secs() - 0.3).abs() < 1e-12);
}

#[test]
fn validate_rejects_bad_values() {
    let mut c = valid();
    c.frames = vec![2, 1];
    assert!(c.validate().is_err());

    let mut c = valid();
    c.frames = vec![1, 1];
    assert!(c.validate().is_err());

    let mut c = valid();
    c.channels.clear();
    assert!(c.validate().is_err());

    let mut c = valid();
    c.fps = 0;
    assert!(c.validate().is_err());

    let mut c = valid();
    c.bitrate = " ".into();
    assert!(c.validate().is_err());

    let mut c = valid();
    c.channels.get_mut(&0).unwrap().intensity = 0.0;
    assert!(c.validate().is_err());

    let mut c = valid();
    c.channels.get_mut(&0).unwrap().rescale = Rescale::Percentile { lo: 50.0, hi: 10.0 };
    assert!(c.validate().is_err());

    let mut c = valid();
    c.channels.get_mut(&0).unwrap().rescale = Rescale::Range { min: 5.0, max: 5.0 };
    assert!(c.validate().is_err());

    let mut c = valid();
    c.channels.get_mut(&0).unwrap().color = [1.5, 0.0, 0.0];
    assert!(c.validate().is_err());
}
