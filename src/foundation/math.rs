/// Linear-interpolated percentile (`q` in `[0, 100]`) of the finite values in `values`.
///
/// Matches numpy's default (`linear`) method. Returns `None` when no finite value exists.
pub(crate) fn percentile(values: &[f32], q: f64) -> Option<f64> {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f32::total_cmp);
    Some(percentile_sorted(&sorted, q))
}

/// Percentile of already sorted, finite values.
pub(crate) fn percentile_sorted(sorted: &[f32], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return f64::from(sorted[0]);
    }
    let pos = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    let a = f64::from(sorted[lo]);
    let b = f64::from(sorted[hi.min(n - 1)]);
    a + (b - a) * frac
}

/// Equal-width histogram over `[min, max]` of the finite values; the last bin is closed.
///
/// Returns `(counts, edges)` with `edges.len() == bins + 1`.
pub(crate) fn histogram(values: &[f32], bins: usize) -> (Vec<u64>, Vec<f64>) {
    let bins = bins.max(1);
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        lo = lo.min(f64::from(v));
        hi = hi.max(f64::from(v));
    }
    if !lo.is_finite() {
        lo = 0.0;
        hi = 1.0;
    }
    if hi <= lo {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0u64; bins];
    for &v in values.iter().filter(|v| v.is_finite()) {
        let i = (((f64::from(v) - lo) / width) as usize).min(bins - 1);
        counts[i] += 1;
    }
    (counts, edges)
}

/// Round half to even, the rounding used when mapping time to frame numbers.
pub(crate) fn round_half_even(v: f64) -> f64 {
    v.round_ties_even()
}

/// `x * y / 255`, rounded.
pub(crate) fn mul_div255(x: u16, y: u16) -> u16 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
