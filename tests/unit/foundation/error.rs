use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(ReelError::render("x").to_string().contains("render error:"));
    assert!(ReelError::encode("x").to_string().contains("encode error:"));
    assert!(
        ReelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert_eq!(
        ReelError::frame_unavailable(2, 7).to_string(),
        "frame 7 unavailable for channel 2"
    );
}

#[test]
fn already_exists_names_the_path() {
    let err = ReelError::already_exists("out/movie.mp4");
    assert!(err.to_string().contains("out/movie.mp4"));
    assert!(err.is_fatal());
}

#[test]
fn per_frame_errors_are_not_fatal() {
    assert!(!ReelError::dimension_mismatch("2x2 vs 3x3").is_fatal());
    assert!(!ReelError::frame_unavailable(0, 0).is_fatal());
    assert!(ReelError::configuration("bad").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
