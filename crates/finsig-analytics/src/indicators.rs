//! Single-series technical indicators: SMA, EMA, RSI, MACD, Bollinger Bands
//! and the stochastic oscillator, plus the composite [`IndicatorSnapshot`].
//!
//! All vector outputs are aligned to the tail of the input: `out[i]`
//! corresponds to `input[i + (input.len() - out.len())]`, and the last
//! element is always the most recent observation. Every operation declares a
//! minimum-length requirement and fails with
//! [`AnalyticsError::InsufficientHistory`] instead of truncating.

use serde::{Deserialize, Serialize};

use finsig_core::PriceSeries;

use crate::error::{require_history, AnalyticsError};
use crate::signal::{BandPosition, MomentumSignal, MovingAverageTrend, TrendSignal};
use crate::stats::sample_std;

pub const DEFAULT_RSI_WINDOW: usize = 14;
pub const DEFAULT_MACD_FAST: usize = 12;
pub const DEFAULT_MACD_SLOW: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;
pub const DEFAULT_BOLLINGER_WINDOW: usize = 20;
pub const DEFAULT_BOLLINGER_NBDEV: f64 = 2.0;
pub const DEFAULT_STOCHASTIC_WINDOW: usize = 14;
pub const DEFAULT_STOCHASTIC_SMOOTH: usize = 3;

/// Windows and thresholds for the indicator library. Every magic number is a
/// named, overridable field with a documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_window: usize,
    pub bollinger_nbdev: f64,
    pub stochastic_window: usize,
    pub stochastic_smooth: usize,
    pub fast_ma_window: usize,
    pub medium_ma_window: usize,
    pub slow_ma_window: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub stochastic_overbought: f64,
    pub stochastic_oversold: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_window: DEFAULT_RSI_WINDOW,
            macd_fast: DEFAULT_MACD_FAST,
            macd_slow: DEFAULT_MACD_SLOW,
            macd_signal: DEFAULT_MACD_SIGNAL,
            bollinger_window: DEFAULT_BOLLINGER_WINDOW,
            bollinger_nbdev: DEFAULT_BOLLINGER_NBDEV,
            stochastic_window: DEFAULT_STOCHASTIC_WINDOW,
            stochastic_smooth: DEFAULT_STOCHASTIC_SMOOTH,
            fast_ma_window: 20,
            medium_ma_window: 50,
            slow_ma_window: 200,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            stochastic_overbought: 80.0,
            stochastic_oversold: 20.0,
        }
    }
}

/// Simple moving average; output length is `values.len() - window + 1`.
pub fn sma(values: &[f64], window: usize) -> Result<Vec<f64>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::invalid_input("window must be positive"));
    }
    require_history(window, values.len())?;

    let mut out = Vec::with_capacity(values.len() - window + 1);
    let mut sum: f64 = values[..window].iter().sum();
    out.push(sum / window as f64);
    for index in window..values.len() {
        sum += values[index] - values[index - window];
        out.push(sum / window as f64);
    }
    Ok(out)
}

/// Exponential moving average with smoothing factor 2/(window+1), seeded by
/// the simple average of the first `window` values.
pub fn ema(values: &[f64], window: usize) -> Result<Vec<f64>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::invalid_input("window must be positive"));
    }
    require_history(window, values.len())?;

    let alpha = 2.0 / (window as f64 + 1.0);
    let seed: f64 = values[..window].iter().sum::<f64>() / window as f64;

    let mut out = Vec::with_capacity(values.len() - window + 1);
    out.push(seed);
    let mut current = seed;
    for value in &values[window..] {
        current = alpha * value + (1.0 - alpha) * current;
        out.push(current);
    }
    Ok(out)
}

/// Recursive EMA seeded from the first value, with no warm-up requirement.
///
/// Used for the MACD signal line, where the input is itself a derived series
/// that may be shorter than the signal window.
fn ema_from_first(values: &[f64], window: usize) -> Vec<f64> {
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut current = match values.first() {
        Some(first) => *first,
        None => return out,
    };
    out.push(current);
    for value in &values[1..] {
        current = alpha * value + (1.0 - alpha) * current;
        out.push(current);
    }
    out
}

/// Wilder-smoothed RSI; first output corresponds to bar index `window`.
///
/// Documented identities: avg loss 0 with gains present yields 100, a flat
/// window yields 50, avg gain 0 with losses present yields 0.
pub fn rsi(values: &[f64], window: usize) -> Result<Vec<f64>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::invalid_input("window must be positive"));
    }
    require_history(window + 1, values.len())?;

    let deltas: Vec<f64> = values.windows(2).map(|pair| pair[1] - pair[0]).collect();

    let mut avg_gain = deltas[..window]
        .iter()
        .map(|delta| delta.max(0.0))
        .sum::<f64>()
        / window as f64;
    let mut avg_loss = deltas[..window]
        .iter()
        .map(|delta| (-delta).max(0.0))
        .sum::<f64>()
        / window as f64;

    let mut out = Vec::with_capacity(deltas.len() - window + 1);
    out.push(rsi_value(avg_gain, avg_loss));

    for delta in &deltas[window..] {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (window as f64 - 1.0) + gain) / window as f64;
        avg_loss = (avg_loss * (window as f64 - 1.0) + loss) / window as f64;
        out.push(rsi_value(avg_gain, avg_loss));
    }
    Ok(out)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        return 50.0;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// MACD line, signal line and histogram, tail-aligned to each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD = EMA(fast) - EMA(slow); signal = EMA(MACD, signal_window) seeded
/// from the first MACD point; histogram = MACD - signal.
///
/// Minimum history is the slow window.
pub fn macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal_window: usize,
) -> Result<MacdSeries, AnalyticsError> {
    if fast == 0 || slow == 0 || signal_window == 0 {
        return Err(AnalyticsError::invalid_input("windows must be positive"));
    }
    if fast >= slow {
        return Err(AnalyticsError::invalid_input(
            "fast window must be shorter than slow window",
        ));
    }
    require_history(slow, values.len())?;

    let fast_ema = ema(values, fast)?;
    let slow_ema = ema(values, slow)?;

    let offset = fast_ema.len() - slow_ema.len();
    let macd_line: Vec<f64> = slow_ema
        .iter()
        .enumerate()
        .map(|(index, slow_value)| fast_ema[index + offset] - slow_value)
        .collect();

    let signal_line = ema_from_first(&macd_line, signal_window);
    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(macd_value, signal_value)| macd_value - signal_value)
        .collect();

    Ok(MacdSeries {
        macd: macd_line,
        signal: signal_line,
        histogram,
    })
}

/// Bollinger band triple, tail-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Middle = SMA(window); bands = middle +/- nbdev * rolling sample stddev.
pub fn bollinger(
    values: &[f64],
    window: usize,
    nbdev: f64,
) -> Result<BollingerSeries, AnalyticsError> {
    if window < 2 {
        return Err(AnalyticsError::invalid_input(
            "bollinger window must cover at least two bars",
        ));
    }
    require_history(window, values.len())?;

    let middle = sma(values, window)?;
    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());
    for (index, mid) in middle.iter().enumerate() {
        let std = sample_std(&values[index..index + window]);
        upper.push(mid + nbdev * std);
        lower.push(mid - nbdev * std);
    }

    Ok(BollingerSeries {
        upper,
        middle,
        lower,
    })
}

/// %K/%D stochastic pair; `d` is the SMA(smooth) of `k` and is tail-aligned
/// against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Raw %K over the high/low range of the window; a zero-range window reads
/// 50. %D = SMA(%K, smooth).
pub fn stochastic(
    series: &PriceSeries,
    window: usize,
    smooth: usize,
) -> Result<StochasticSeries, AnalyticsError> {
    if window == 0 || smooth == 0 {
        return Err(AnalyticsError::invalid_input("windows must be positive"));
    }
    require_history(window + smooth - 1, series.len())?;

    let bars = series.bars();
    let mut k = Vec::with_capacity(bars.len() - window + 1);
    for end in window..=bars.len() {
        let slice = &bars[end - window..end];
        let highest = slice.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
        let lowest = slice.iter().map(|bar| bar.low).fold(f64::MAX, f64::min);
        let close = slice[slice.len() - 1].close;
        if highest == lowest {
            k.push(50.0);
        } else {
            k.push(100.0 * (close - lowest) / (highest - lowest));
        }
    }

    let d = sma(&k, smooth)?;
    Ok(StochasticSeries { k, d })
}

/// Current RSI reading with its classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiSummary {
    pub value: f64,
    pub signal: MomentumSignal,
}

/// Current MACD readings with the crossover direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdSummary {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub trend: TrendSignal,
}

/// Current Bollinger readings plus derived %B and bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerSummary {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub position: BandPosition,
    pub percent_b: f64,
    pub width_pct: f64,
}

/// Moving-average levels; the longer windows are omitted (None) when the
/// series is too short, and the trend requires both SMA50 and SMA200.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageSummary {
    pub sma_fast: f64,
    pub ema_fast: f64,
    pub sma_medium: Option<f64>,
    pub sma_slow: Option<f64>,
    pub trend: Option<MovingAverageTrend>,
}

/// Current stochastic readings with classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticSummary {
    pub k: f64,
    pub d: f64,
    pub signal: MomentumSignal,
}

/// Composite single-symbol indicator snapshot.
///
/// Sub-components that cannot be computed from the available history are
/// listed in `skipped`; the hard minimum is the MACD slow window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: RsiSummary,
    pub macd: MacdSummary,
    pub bollinger: BollingerSummary,
    pub moving_averages: MovingAverageSummary,
    pub stochastic: StochasticSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<&'static str>,
}

pub fn snapshot(
    series: &PriceSeries,
    config: &IndicatorConfig,
) -> Result<IndicatorSnapshot, AnalyticsError> {
    let closes = series.closes();
    let minimum = config
        .macd_slow
        .max(config.rsi_window + 1)
        .max(config.bollinger_window)
        .max(config.stochastic_window + config.stochastic_smooth - 1)
        .max(config.fast_ma_window);
    require_history(minimum, closes.len())?;

    let close = closes[closes.len() - 1];
    let mut skipped = Vec::new();

    let rsi_series = rsi(&closes, config.rsi_window)?;
    let rsi_now = rsi_series[rsi_series.len() - 1];
    let rsi_summary = RsiSummary {
        value: rsi_now,
        signal: classify_oscillator(rsi_now, config.rsi_overbought, config.rsi_oversold),
    };

    let macd_series = macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal)?;
    let macd_now = macd_series.macd[macd_series.macd.len() - 1];
    let signal_now = macd_series.signal[macd_series.signal.len() - 1];
    let macd_summary = MacdSummary {
        macd: macd_now,
        signal: signal_now,
        histogram: macd_series.histogram[macd_series.histogram.len() - 1],
        trend: if macd_now > signal_now {
            TrendSignal::Bullish
        } else if macd_now < signal_now {
            TrendSignal::Bearish
        } else {
            TrendSignal::Neutral
        },
    };

    let bands = bollinger(&closes, config.bollinger_window, config.bollinger_nbdev)?;
    let upper = bands.upper[bands.upper.len() - 1];
    let middle = bands.middle[bands.middle.len() - 1];
    let lower = bands.lower[bands.lower.len() - 1];
    let bollinger_summary = BollingerSummary {
        upper,
        middle,
        lower,
        position: if close > upper {
            BandPosition::AboveUpper
        } else if close < lower {
            BandPosition::BelowLower
        } else {
            BandPosition::Within
        },
        percent_b: percent_b(close, upper, lower),
        width_pct: if middle == 0.0 {
            0.0
        } else {
            (upper - lower) / middle * 100.0
        },
    };

    let sma_fast_series = sma(&closes, config.fast_ma_window)?;
    let ema_fast_series = ema(&closes, config.fast_ma_window)?;
    let sma_medium = match sma(&closes, config.medium_ma_window) {
        Ok(values) => Some(values[values.len() - 1]),
        Err(AnalyticsError::InsufficientHistory { .. }) => {
            skipped.push("sma_medium");
            None
        }
        Err(error) => return Err(error),
    };
    let sma_slow = match sma(&closes, config.slow_ma_window) {
        Ok(values) => Some(values[values.len() - 1]),
        Err(AnalyticsError::InsufficientHistory { .. }) => {
            skipped.push("sma_slow");
            None
        }
        Err(error) => return Err(error),
    };
    let trend = match (sma_medium, sma_slow) {
        (Some(medium), Some(slow)) => Some(classify_ma_trend(close, medium, slow)),
        _ => {
            skipped.push("ma_trend");
            None
        }
    };
    let moving_averages = MovingAverageSummary {
        sma_fast: sma_fast_series[sma_fast_series.len() - 1],
        ema_fast: ema_fast_series[ema_fast_series.len() - 1],
        sma_medium,
        sma_slow,
        trend,
    };

    let stochastic_series = stochastic(series, config.stochastic_window, config.stochastic_smooth)?;
    let k_now = stochastic_series.k[stochastic_series.k.len() - 1];
    let stochastic_summary = StochasticSummary {
        k: k_now,
        d: stochastic_series.d[stochastic_series.d.len() - 1],
        signal: classify_oscillator(
            k_now,
            config.stochastic_overbought,
            config.stochastic_oversold,
        ),
    };

    Ok(IndicatorSnapshot {
        close,
        rsi: rsi_summary,
        macd: macd_summary,
        bollinger: bollinger_summary,
        moving_averages,
        stochastic: stochastic_summary,
        skipped,
    })
}

/// %B with the collapsed-band identity: equal bands read 0.5.
pub fn percent_b(close: f64, upper: f64, lower: f64) -> f64 {
    if upper == lower {
        0.5
    } else {
        (close - lower) / (upper - lower)
    }
}

fn classify_oscillator(value: f64, overbought: f64, oversold: f64) -> MomentumSignal {
    if value > overbought {
        MomentumSignal::Overbought
    } else if value < oversold {
        MomentumSignal::Oversold
    } else {
        MomentumSignal::Neutral
    }
}

fn classify_ma_trend(close: f64, medium: f64, slow: f64) -> MovingAverageTrend {
    if close > medium && close > slow {
        MovingAverageTrend::Bullish
    } else if close < medium && close < slow {
        MovingAverageTrend::Bearish
    } else {
        MovingAverageTrend::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_matches_hand_computation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&values, 3).expect("enough history");
        assert_eq!(out, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn sma_rejects_short_history() {
        let err = sma(&[1.0, 2.0], 3).expect_err("must fail");
        assert!(matches!(
            err,
            AnalyticsError::InsufficientHistory {
                required: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn ema_is_seeded_with_simple_average() {
        let values = [2.0, 4.0, 6.0, 8.0];
        let out = ema(&values, 3).expect("enough history");
        assert!((out[0] - 4.0).abs() < 1e-12);
        // alpha = 0.5: 0.5*8 + 0.5*4 = 6
        assert!((out[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn rsi_is_100_on_pure_gains() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&values, 14).expect("enough history");
        assert!((out[out.len() - 1] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn rsi_is_50_on_flat_series() {
        let values = vec![42.0; 30];
        let out = rsi(&values, 14).expect("enough history");
        assert!((out[out.len() - 1] - 50.0).abs() < 1e-12);
    }

    #[test]
    fn rsi_is_0_on_pure_losses() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&values, 14).expect("enough history");
        assert!(out[out.len() - 1].abs() < 1e-12);
    }

    #[test]
    fn macd_requires_slow_window() {
        let values = vec![10.0; 25];
        let err = macd(&values, 12, 26, 9).expect_err("must fail");
        assert!(matches!(err, AnalyticsError::InsufficientHistory { .. }));
    }

    #[test]
    fn macd_is_bullish_on_rising_series() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = macd(&values, 12, 26, 9).expect("enough history");
        let last = out.macd.len() - 1;
        assert!(out.macd[last] > out.signal[last]);
    }

    #[test]
    fn bollinger_bands_collapse_on_flat_series() {
        let values = vec![50.0; 25];
        let bands = bollinger(&values, 20, 2.0).expect("enough history");
        let last = bands.upper.len() - 1;
        assert_eq!(bands.upper[last], bands.lower[last]);
        assert_eq!(bands.middle[last], 50.0);
    }

    #[test]
    fn percent_b_reads_half_when_bands_collapse() {
        assert_eq!(percent_b(50.0, 50.0, 50.0), 0.5);
    }
}
