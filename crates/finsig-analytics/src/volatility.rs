//! Volatility analytics: true range and ATR, annualized historical
//! volatility, percentile-based regime classification, beta, Keltner
//! channels, ATR stop ladders and volatility-adjusted position sizing.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use finsig_core::PriceSeries;

use crate::error::{require_history, AnalyticsError};
use crate::indicators::ema;
use crate::signal::VolatilityRegime;
use crate::stats::{log_returns, sample_covariance, sample_std};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Windows and multipliers for the volatility components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityConfig {
    pub atr_window: usize,
    /// Additional ATR window reported by the snapshot.
    pub atr_window_secondary: usize,
    pub hv_window: usize,
    /// Historical-volatility windows reported by the snapshot.
    pub hv_windows: Vec<usize>,
    /// Trailing sample size for the volatility percentile.
    pub percentile_lookback: usize,
    pub keltner_window: usize,
    pub keltner_multiplier: f64,
    /// ATR multiples quoted in the stop-distance ladder.
    pub stop_multiples: Vec<f64>,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            atr_window: 14,
            atr_window_secondary: 20,
            hv_window: 20,
            hv_windows: vec![10, 20, 30, 60],
            percentile_lookback: 252,
            keltner_window: 20,
            keltner_multiplier: 2.0,
            stop_multiples: vec![2.0, 2.5, 3.0],
        }
    }
}

/// True range per bar: max(H-L, |H-prev C|, |L-prev C|).
///
/// Output covers bars `1..len`, the first bar has no prior close.
pub fn true_range(series: &PriceSeries) -> Result<Vec<f64>, AnalyticsError> {
    require_history(2, series.len())?;
    let bars = series.bars();

    let mut out = Vec::with_capacity(bars.len() - 1);
    for index in 1..bars.len() {
        let bar = &bars[index];
        let prev_close = bars[index - 1].close;
        let range = (bar.high - bar.low)
            .max((bar.high - prev_close).abs())
            .max((bar.low - prev_close).abs());
        out.push(range);
    }
    Ok(out)
}

/// Average True Range, Wilder smoothing seeded by the SMA of the first
/// `window` true ranges. Requires `window + 1` bars; first output
/// corresponds to bar index `window`.
pub fn atr(series: &PriceSeries, window: usize) -> Result<Vec<f64>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::invalid_input("window must be positive"));
    }
    require_history(window + 1, series.len())?;

    let ranges = true_range(series)?;
    let mut out = Vec::with_capacity(ranges.len() - window + 1);
    let seed: f64 = ranges[..window].iter().sum::<f64>() / window as f64;
    out.push(seed);
    for &range in &ranges[window..] {
        let prior = out[out.len() - 1];
        out.push((prior * (window - 1) as f64 + range) / window as f64);
    }
    Ok(out)
}

/// Annualized historical volatility in percent: sample standard deviation
/// of log returns over the trailing `window`, scaled by sqrt(252) x 100.
///
/// A flat series reads exactly zero.
pub fn historical_volatility(
    series: &PriceSeries,
    window: usize,
) -> Result<f64, AnalyticsError> {
    if window < 2 {
        return Err(AnalyticsError::invalid_input("window must be at least 2"));
    }
    require_history(window + 1, series.len())?;

    let closes = series.closes();
    let returns = log_returns(&closes[closes.len() - window - 1..]);
    Ok(sample_std(&returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Rolling historical-volatility series over the whole input, one value per
/// complete window, tail-aligned.
fn rolling_hv(closes: &[f64], window: usize) -> Vec<f64> {
    let mut out = Vec::new();
    if closes.len() < window + 1 {
        return out;
    }
    for end in window + 1..=closes.len() {
        let returns = log_returns(&closes[end - window - 1..end]);
        out.push(sample_std(&returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0);
    }
    out
}

/// Share of trailing rolling-HV observations strictly below the current
/// one, in percent. The current observation is part of the sample.
pub fn volatility_percentile(
    series: &PriceSeries,
    config: &VolatilityConfig,
) -> Result<f64, AnalyticsError> {
    require_history(config.hv_window + 2, series.len())?;

    let closes = series.closes();
    let rolling = rolling_hv(&closes, config.hv_window);
    let sample_start = rolling.len().saturating_sub(config.percentile_lookback);
    let sample = &rolling[sample_start..];
    let current = sample[sample.len() - 1];

    let below = sample.iter().filter(|&&value| value < current).count();
    Ok(below as f64 / sample.len() as f64 * 100.0)
}

pub fn classify_regime(percentile: f64) -> VolatilityRegime {
    if percentile >= 80.0 {
        VolatilityRegime::ExtremeHigh
    } else if percentile >= 60.0 {
        VolatilityRegime::High
    } else if percentile >= 40.0 {
        VolatilityRegime::Normal
    } else if percentile >= 20.0 {
        VolatilityRegime::Low
    } else {
        VolatilityRegime::ExtremeLow
    }
}

/// Beta of the symbol against a benchmark: sample covariance of simple
/// returns over sample benchmark variance.
///
/// Closes are paired by bar timestamp before returns are computed, so a
/// calendar gap in one series drops that date from both sides instead of
/// shifting every later pair. At least three overlapping returns are
/// required, and a flat benchmark is rejected as invalid input.
pub fn beta(series: &PriceSeries, benchmark: &PriceSeries) -> Result<f64, AnalyticsError> {
    let (symbol_closes, benchmark_closes) = aligned_closes(series, benchmark);
    if symbol_closes.len() < 4 {
        return Err(AnalyticsError::MismatchedSeries {
            left: series.len(),
            right: benchmark.len(),
        });
    }

    let symbol_returns = crate::stats::simple_returns(&symbol_closes);
    let benchmark_returns = crate::stats::simple_returns(&benchmark_closes);

    let variance = {
        let std = sample_std(&benchmark_returns);
        std * std
    };
    if variance == 0.0 {
        return Err(AnalyticsError::invalid_input(
            "benchmark variance is zero",
        ));
    }
    Ok(sample_covariance(&symbol_returns, &benchmark_returns) / variance)
}

/// Closes on the timestamps present in both series, in chronological order.
fn aligned_closes(series: &PriceSeries, benchmark: &PriceSeries) -> (Vec<f64>, Vec<f64>) {
    let left = series.bars();
    let right = benchmark.bars();
    let mut symbol_closes = Vec::new();
    let mut benchmark_closes = Vec::new();

    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].ts.cmp(&right[j].ts) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                symbol_closes.push(left[i].close);
                benchmark_closes.push(right[j].close);
                i += 1;
                j += 1;
            }
        }
    }
    (symbol_closes, benchmark_closes)
}

/// Keltner channel snapshot: EMA midline with ATR envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeltnerChannel {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

pub fn keltner(
    series: &PriceSeries,
    config: &VolatilityConfig,
) -> Result<KeltnerChannel, AnalyticsError> {
    let window = config.keltner_window;
    require_history(window + 1, series.len())?;

    let closes = series.closes();
    let ema_series = ema(&closes, window)?;
    let atr_series = atr(series, window)?;

    let middle = ema_series[ema_series.len() - 1];
    let band = config.keltner_multiplier * atr_series[atr_series.len() - 1];
    Ok(KeltnerChannel {
        middle,
        upper: middle + band,
        lower: middle - band,
    })
}

/// One rung of the ATR stop ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLevel {
    pub multiple: f64,
    pub distance: f64,
    pub long_stop: f64,
    pub short_stop: f64,
}

/// ATR-multiple stop distances below (long) and above (short) the latest
/// close.
pub fn stop_recommendations(
    series: &PriceSeries,
    config: &VolatilityConfig,
) -> Result<Vec<StopLevel>, AnalyticsError> {
    require_history(config.atr_window + 1, series.len())?;

    let close = series
        .last()
        .map(|bar| bar.close)
        .ok_or_else(|| AnalyticsError::invalid_input("series is empty"))?;
    let atr_series = atr(series, config.atr_window)?;
    let current_atr = atr_series[atr_series.len() - 1];

    Ok(config
        .stop_multiples
        .iter()
        .map(|&multiple| {
            let distance = multiple * current_atr;
            StopLevel {
                multiple,
                distance,
                long_stop: close - distance,
                short_stop: close + distance,
            }
        })
        .collect())
}

/// Whole shares such that `shares x stop_distance <= risk_budget`.
pub fn position_size(risk_budget: f64, stop_distance: f64) -> Result<u64, AnalyticsError> {
    if !(risk_budget.is_finite() && risk_budget > 0.0) {
        return Err(AnalyticsError::invalid_input(
            "risk budget must be positive and finite",
        ));
    }
    if !(stop_distance.is_finite() && stop_distance > 0.0) {
        return Err(AnalyticsError::invalid_input(
            "stop distance must be positive and finite",
        ));
    }
    Ok((risk_budget / stop_distance).floor() as u64)
}

/// Composite volatility report for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySnapshot {
    pub close: f64,
    pub atr: f64,
    pub atr_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_secondary: Option<f64>,
    /// Annualized HV keyed by window size; short windows are absent and
    /// listed in `skipped`.
    pub historical_volatility: BTreeMap<usize, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility_percentile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regime: Option<VolatilityRegime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    pub keltner: KeltnerChannel,
    pub stops: Vec<StopLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

/// Runs the full volatility stack; optional components short on history are
/// skipped and named rather than failing the snapshot. Beta is reported
/// only when a benchmark is supplied and overlaps enough.
pub fn snapshot(
    series: &PriceSeries,
    benchmark: Option<&PriceSeries>,
    config: &VolatilityConfig,
) -> Result<VolatilitySnapshot, AnalyticsError> {
    let minimum = config.atr_window.max(config.keltner_window) + 1;
    require_history(minimum, series.len())?;

    let close = series
        .last()
        .map(|bar| bar.close)
        .ok_or_else(|| AnalyticsError::invalid_input("series is empty"))?;

    let atr_series = atr(series, config.atr_window)?;
    let current_atr = atr_series[atr_series.len() - 1];

    let mut skipped = Vec::new();
    let atr_secondary = match atr(series, config.atr_window_secondary) {
        Ok(values) => Some(values[values.len() - 1]),
        Err(AnalyticsError::InsufficientHistory { .. }) => {
            skipped.push(format!("atr_{}", config.atr_window_secondary));
            None
        }
        Err(other) => return Err(other),
    };

    let mut hv_map = BTreeMap::new();
    for &window in &config.hv_windows {
        match historical_volatility(series, window) {
            Ok(value) => {
                hv_map.insert(window, value);
            }
            Err(AnalyticsError::InsufficientHistory { .. }) => {
                skipped.push(format!("hv_{window}"));
            }
            Err(other) => return Err(other),
        }
    }

    let percentile = match volatility_percentile(series, config) {
        Ok(value) => Some(value),
        Err(AnalyticsError::InsufficientHistory { .. }) => {
            skipped.push(String::from("volatility_percentile"));
            None
        }
        Err(other) => return Err(other),
    };

    let beta_value = match benchmark {
        Some(bench) => match beta(series, bench) {
            Ok(value) => Some(value),
            Err(AnalyticsError::MismatchedSeries { .. }) => {
                skipped.push(String::from("beta"));
                None
            }
            Err(other) => return Err(other),
        },
        None => None,
    };

    Ok(VolatilitySnapshot {
        close,
        atr: current_atr,
        atr_pct: if close != 0.0 {
            current_atr / close * 100.0
        } else {
            0.0
        },
        atr_secondary,
        historical_volatility: hv_map,
        volatility_percentile: percentile,
        regime: percentile.map(classify_regime),
        beta: beta_value,
        keltner: keltner(series, config)?,
        stops: stop_recommendations(series, config)?,
        skipped,
    })
}
