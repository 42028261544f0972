//! Index-aligned series helpers.
//!
//! All functions return vectors of the same length as their input, with
//! `f64::NAN` wherever a value is not defined (warm-up, shifted-in rows).

use statrs::statistics::Statistics;

/// Shift values by `periods` rows.
///
/// Positive periods lag the series (row `t` receives row `t - periods`),
/// negative periods lead it (row `t` receives row `t + |periods|`).
pub fn shift(values: &[f64], periods: isize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    let k = periods.unsigned_abs();
    if k >= n {
        return out;
    }

    if periods >= 0 {
        out[k..].copy_from_slice(&values[..n - k]);
    } else {
        out[..n - k].copy_from_slice(&values[k..]);
    }
    out
}

/// Simple percentage change over `periods` rows.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if periods == 0 {
        return out;
    }
    for i in periods..values.len() {
        let prev = values[i - periods];
        if prev != 0.0 && prev.is_finite() && values[i].is_finite() {
            out[i] = (values[i] - prev) / prev;
        }
    }
    out
}

/// Rolling sample standard deviation. Windows containing NaN yield NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window < 2 || values.len() < window {
        return out;
    }
    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if slice.iter().all(|v| v.is_finite()) {
            out[end - 1] = slice.std_dev();
        }
    }
    out
}

/// Pearson correlation over the rows where both inputs are finite.
///
/// Returns `None` with fewer than `min_samples` usable pairs or when either
/// side has zero variance.
pub fn pearson(x: &[f64], y: &[f64], min_samples: usize) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();

    if xs.len() < min_samples.max(2) {
        return None;
    }

    let sx = xs.as_slice().std_dev();
    let sy = ys.as_slice().std_dev();
    if !(sx > 0.0 && sy > 0.0) {
        return None;
    }

    let r = xs.as_slice().covariance(ys.as_slice()) / (sx * sy);
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Rolling Pearson correlation; entry `t` covers rows `t + 1 - window ..= t`.
///
/// A window is defined only when every pair in it is finite, matching the
/// usual `min_periods == window` convention.
pub fn rolling_correlation(x: &[f64], y: &[f64], window: usize) -> Vec<f64> {
    let n = x.len().min(y.len());
    let mut out = vec![f64::NAN; n];
    if window < 2 || n < window {
        return out;
    }
    for end in window..=n {
        let xs = &x[end - window..end];
        let ys = &y[end - window..end];
        if xs.iter().chain(ys.iter()).all(|v| v.is_finite()) {
            if let Some(r) = pearson(xs, ys, window) {
                out[end - 1] = r;
            }
        }
    }
    out
}
