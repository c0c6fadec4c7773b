/// Linear interpolation of `t` between `(t0, v0)` and `(t1, v1)`.
/// Values of `t` outside `t0..t1` extrapolate along the same line.
pub fn lerp(t: f64, t0: f64, t1: f64, v0: f64, v1: f64) -> f64 {
    let fraction = (t - t0) / (t1 - t0);
    v0 + fraction * (v1 - v0)
}

/// `value` with `decimals` digits after the point, e.g. `"1234.50"`.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}
