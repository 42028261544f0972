//! Index-aligned technical indicators.
//!
//! Every function returns one value per input row. Rows before the warm-up
//! completes are `NaN`, so outputs can be placed straight into a frame and
//! lagged with `analysis_core::series::shift`.

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    for i in period - 1..data.len() {
        let window = &data[i + 1 - period..=i];
        if window.iter().all(|v| v.is_finite()) {
            result[i] = window.iter().sum::<f64>() / period as f64;
        }
    }
    result
}

/// Exponential Moving Average, seeded with the SMA of the first complete window.
///
/// Leading `NaN`s are skipped, so this can be chained on another indicator.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if period == 0 {
        return result;
    }

    let Some(start) = data.iter().position(|v| v.is_finite()) else {
        return result;
    };
    let seed_end = start + period;
    if seed_end > data.len() || !data[start..seed_end].iter().all(|v| v.is_finite()) {
        return result;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut prev = data[start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = prev;

    for i in seed_end..data.len() {
        if data[i].is_finite() {
            prev = (data[i] - prev) * multiplier + prev;
            result[i] = prev;
        }
    }

    result
}

/// Relative Strength Index (Wilder smoothing)
///
/// Leading `NaN`s are skipped like in [`ema`]. A non-finite change later on
/// leaves that row `NaN` without touching the running averages.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if period == 0 {
        return result;
    }

    let Some(start) = data.iter().position(|v| v.is_finite()) else {
        return result;
    };
    // First value needs `period` changes after `start`
    let first = start + period;
    if first >= data.len() || !data[start..=first].iter().all(|v| v.is_finite()) {
        return result;
    }

    let gain_loss = |i: usize| {
        let change = data[i] - data[i - 1];
        (change.max(0.0), (-change).max(0.0))
    };

    let (mut avg_gain, mut avg_loss) = (start + 1..=first)
        .map(gain_loss)
        .fold((0.0, 0.0), |(g, l), (dg, dl)| (g + dg, l + dl));
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[first] = rsi_value(avg_gain, avg_loss);

    for i in first + 1..data.len() {
        if !(data[i].is_finite() && data[i - 1].is_finite()) {
            continue;
        }
        let (gain, loss) = gain_loss(i);
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        result[i] = rsi_value(avg_gain, avg_loss);
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    let n = data.len();
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || slow_period < fast_period {
        return MacdResult {
            macd_line: vec![f64::NAN; n],
            signal_line: vec![f64::NAN; n],
            histogram: vec![f64::NAN; n],
        };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal_period);
    let histogram = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Bollinger Bands
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerBands {
    /// (upper - lower) / middle
    pub fn width(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(self.lower.iter())
            .zip(self.middle.iter())
            .map(|((u, l), m)| if *m != 0.0 { (u - l) / m } else { f64::NAN })
            .collect()
    }

    /// Where `data` sits inside the band: 0 at the lower band, 1 at the upper.
    pub fn position(&self, data: &[f64]) -> Vec<f64> {
        data.iter()
            .zip(self.upper.iter().zip(self.lower.iter()))
            .map(|(x, (u, l))| {
                let range = u - l;
                if range > 0.0 {
                    (x - l) / range
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    let middle = sma(data, period);
    let mut upper = vec![f64::NAN; data.len()];
    let mut lower = vec![f64::NAN; data.len()];

    for i in 0..data.len() {
        let mean = middle[i];
        if !mean.is_finite() {
            continue;
        }
        let slice = &data[i + 1 - period..=i];
        let variance: f64 = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();

        upper[i] = mean + std_dev * std;
        lower[i] = mean - std_dev * std;
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}
