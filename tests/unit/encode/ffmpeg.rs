use super::*;
use crate::encode::sink::VideoMetadata;
use std::path::PathBuf;

fn job() -> EncodeJob {
    EncodeJob {
        out_path: PathBuf::from("out/movie.mp4"),
        fps: 12,
        bitrate: "10M".into(),
        frame_count: 3,
        width: 64,
        height: 32,
        metadata: VideoMetadata {
            title: Some("Mitosis".into()),
            author: Some("lab".into()),
            copyright: None,
        },
        overwrite: false,
    }
}

#[test]
fn args_carry_rate_bitrate_padding_and_metadata() {
    let args = ffmpeg_args(&job());
    let joined = args.join(" ");
    assert_eq!(args[0], "-n");
    assert!(joined.contains("-s 64x32 -r 12 -i pipe:0"));
    assert!(joined.contains("-vf pad=ceil(iw/2)*2:ceil(ih/2)*2"));
    assert!(joined.contains("-c:v libx264 -b:v 10M -pix_fmt yuv420p"));
    assert!(joined.contains("-metadata title=Mitosis"));
    assert!(joined.contains("-metadata artist=lab"));
    assert!(!joined.contains("copyright="));
    assert_eq!(args.last().map(String::as_str), Some("out/movie.mp4"));
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &[0, 0, 0, 0], [10, 20, 30, 255]);
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_opaque_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]);
    assert_eq!(dst, src);
}
