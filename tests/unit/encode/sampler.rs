use super::*;
use crate::cache::run_id;

fn solid(v: u8) -> Frame {
    Frame {
        width: 2,
        height: 2,
        data: [v, v, v, 255].repeat(4),
    }
}

fn cache_with(tag: &str, frames: &[(u64, u8)]) -> FrameCache {
    let root = std::env::temp_dir().join(format!("stackreel_sampler_{tag}"));
    let cache = FrameCache::for_run(&root, &run_id(&root)).unwrap();
    for &(idx, v) in frames {
        cache.write(idx, &solid(v)).unwrap();
    }
    cache
}

#[test]
fn index_uses_offset_rounding_and_clamp() {
    let cache = cache_with("index", &[]);
    let s = FrameSampler::new(&cache, 10, 4, 9, 2, 2);
    assert_eq!(s.index_at(0.0), 4);
    assert_eq!(s.index_at(0.25), 6);
    assert_eq!(s.index_at(0.37), 8);
    assert_eq!(s.index_at(100.0), 9);
    cache.remove().unwrap();
}

#[test]
fn missing_frames_repeat_the_last_good_one() {
    // Frames 0, 1 and 3 rendered; 2 failed.
    let cache = cache_with("fallback", &[(0, 10), (1, 20), (3, 40)]);
    let mut s = FrameSampler::new(&cache, 1, 0, 3, 2, 2);
    assert_eq!(s.sample(0.0).unwrap(), &solid(10));
    assert_eq!(s.sample(1.0).unwrap(), &solid(20));
    assert_eq!(s.sample(2.0).unwrap(), &solid(20));
    assert_eq!(s.sample(3.0).unwrap(), &solid(40));
    cache.remove().unwrap();
}

#[test]
fn nothing_read_yet_gives_black() {
    let cache = cache_with("black", &[(1, 99)]);
    let mut s = FrameSampler::new(&cache, 1, 0, 1, 2, 2);
    assert_eq!(s.sample(0.0).unwrap(), &Frame::black(2, 2));
    assert_eq!(s.sample(1.0).unwrap(), &solid(99));
    cache.remove().unwrap();
}

#[test]
fn a_missing_index_is_looked_up_once_while_it_is_shown() {
    let cache = cache_with("gap_once", &[(0, 10), (1, 20), (3, 40)]);
    let mut s = FrameSampler::new(&cache, 4, 0, 3, 2, 2);
    assert_eq!(s.sample(0.25).unwrap(), &solid(20));
    assert_eq!(s.sample(0.5).unwrap(), &solid(20));
    // A late write is not picked up for the index already on screen.
    cache.write(2, &solid(30)).unwrap();
    assert_eq!(s.sample(0.5).unwrap(), &solid(20));
    assert_eq!(s.sample(0.75).unwrap(), &solid(40));
    cache.remove().unwrap();
}
