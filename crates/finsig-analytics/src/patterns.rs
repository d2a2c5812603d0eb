//! Pattern detection: moving-average crosses, regression trends and
//! consolidation ranges.

use serde::{Deserialize, Serialize};

use finsig_core::PriceSeries;

use crate::error::{require_history, AnalyticsError};
use crate::indicators::sma;
use crate::signal::TrendSignal;
use crate::stats::{linear_regression, mean, sample_std};

/// Detection thresholds; slope gates are percent of mean price per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub fast_ma: usize,
    pub slow_ma: usize,
    /// Bars scanned backward for a cross.
    pub cross_lookback: usize,
    pub trend_window: usize,
    pub min_trend_slope_pct: f64,
    pub min_trend_r_squared: f64,
    /// Normalized stddev ceiling for a consolidation range.
    pub max_consolidation_bandwidth_pct: f64,
    /// Slope ceiling (absolute) for a consolidation range.
    pub max_consolidation_slope_pct: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            fast_ma: 50,
            slow_ma: 200,
            cross_lookback: 20,
            trend_window: 20,
            min_trend_slope_pct: 0.2,
            min_trend_r_squared: 0.70,
            max_consolidation_bandwidth_pct: 2.0,
            max_consolidation_slope_pct: 0.05,
        }
    }
}

/// Closed vocabulary of detected patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    GoldenCross,
    DeathCross,
    StrongUptrend,
    StrongDowntrend,
    Consolidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternHit {
    pub kind: PatternKind,
    pub signal: TrendSignal,
    /// Bars back from the latest bar where the pattern completed; zero for
    /// window-wide patterns.
    pub bars_ago: usize,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub hits: Vec<PatternHit>,
    /// Detectors that could not run on the available history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<&'static str>,
}

/// Most recent fast/slow SMA crossover within the lookback, if any.
fn find_cross(closes: &[f64], config: &PatternConfig) -> Result<Option<PatternHit>, AnalyticsError> {
    let fast = sma(closes, config.fast_ma)?;
    let slow = sma(closes, config.slow_ma)?;

    // Tail-align the two series.
    let overlap = fast.len().min(slow.len());
    let fast = &fast[fast.len() - overlap..];
    let slow = &slow[slow.len() - overlap..];

    let scan = config.cross_lookback.min(overlap - 1);
    for back in 0..scan {
        let now = overlap - 1 - back;
        let was_above = fast[now - 1] > slow[now - 1];
        let is_above = fast[now] > slow[now];
        if was_above != is_above {
            let kind = if is_above {
                PatternKind::GoldenCross
            } else {
                PatternKind::DeathCross
            };
            let signal = if is_above {
                TrendSignal::Bullish
            } else {
                TrendSignal::Bearish
            };
            return Ok(Some(PatternHit {
                kind,
                signal,
                bars_ago: back,
                detail: format!(
                    "sma{} crossed {} sma{}",
                    config.fast_ma,
                    if is_above { "above" } else { "below" },
                    config.slow_ma
                ),
            }));
        }
    }
    Ok(None)
}

/// Regression read over the trend window: strong trend when the normalized
/// slope clears the gate with high enough fit, consolidation when both the
/// slope and the normalized stddev are small.
fn classify_window(closes: &[f64], config: &PatternConfig) -> Option<PatternHit> {
    let window = &closes[closes.len() - config.trend_window..];
    let (slope, r_squared) = linear_regression(window);
    let price_mean = mean(window);
    if price_mean == 0.0 {
        return None;
    }
    let slope_pct = slope / price_mean * 100.0;
    let bandwidth_pct = sample_std(window) / price_mean * 100.0;

    if slope_pct >= config.min_trend_slope_pct && r_squared >= config.min_trend_r_squared {
        return Some(PatternHit {
            kind: PatternKind::StrongUptrend,
            signal: TrendSignal::Bullish,
            bars_ago: 0,
            detail: format!("slope {slope_pct:.2}%/bar, r2 {r_squared:.2}"),
        });
    }
    if slope_pct <= -config.min_trend_slope_pct && r_squared >= config.min_trend_r_squared {
        return Some(PatternHit {
            kind: PatternKind::StrongDowntrend,
            signal: TrendSignal::Bearish,
            bars_ago: 0,
            detail: format!("slope {slope_pct:.2}%/bar, r2 {r_squared:.2}"),
        });
    }
    if bandwidth_pct <= config.max_consolidation_bandwidth_pct
        && slope_pct.abs() <= config.max_consolidation_slope_pct
    {
        return Some(PatternHit {
            kind: PatternKind::Consolidation,
            signal: TrendSignal::Neutral,
            bars_ago: 0,
            detail: format!("bandwidth {bandwidth_pct:.2}%, slope {slope_pct:.3}%/bar"),
        });
    }
    None
}

/// Runs every detector that fits the available history.
///
/// The SMA-cross detector needs `slow_ma + 1` bars and is skipped (not an
/// error) below that; the regression detectors need the trend window.
pub fn detect(series: &PriceSeries, config: &PatternConfig) -> Result<PatternReport, AnalyticsError> {
    require_history(config.trend_window, series.len())?;
    let closes = series.closes();

    let mut hits = Vec::new();
    let mut skipped = Vec::new();

    if closes.len() >= config.slow_ma + 1 {
        if let Some(hit) = find_cross(&closes, config)? {
            hits.push(hit);
        }
    } else {
        skipped.push("ma_cross");
    }

    if let Some(hit) = classify_window(&closes, config) {
        hits.push(hit);
    }

    Ok(PatternReport { hits, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsig_core::{Interval, PriceBar, Symbol, UtcDateTime};

    fn daily(closes: &[f64]) -> PriceSeries {
        let symbol = Symbol::parse("TEST").expect("symbol");
        let bars = closes
            .iter()
            .enumerate()
            .map(|(index, &close)| {
                let ts = UtcDateTime::from_unix(1_500_000_000 + index as i64 * 86_400)
                    .expect("timestamp");
                PriceBar::new(ts, close, close + 0.5, close - 0.5, close, 1_000).expect("bar")
            })
            .collect();
        PriceSeries::new(symbol, Interval::OneDay, bars).expect("series")
    }

    #[test]
    fn short_history_skips_the_cross_detector() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let report = detect(&daily(&closes), &PatternConfig::default()).expect("report");
        assert!(report.skipped.contains(&"ma_cross"));
    }

    #[test]
    fn steady_climb_is_a_strong_uptrend() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 * 1.005_f64.powi(i)).collect();
        let report = detect(&daily(&closes), &PatternConfig::default()).expect("report");
        assert!(report
            .hits
            .iter()
            .any(|hit| hit.kind == PatternKind::StrongUptrend));
    }

    #[test]
    fn tight_flat_range_is_consolidation() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 100.0 + 0.2 * ((i % 4) as f64 - 1.5))
            .collect();
        let report = detect(&daily(&closes), &PatternConfig::default()).expect("report");
        assert!(report
            .hits
            .iter()
            .any(|hit| hit.kind == PatternKind::Consolidation));
    }

    #[test]
    fn recovery_after_long_decline_prints_a_golden_cross() {
        // 250 bars: long slide then a sharp rally so SMA50 crosses above SMA200.
        let mut closes = Vec::with_capacity(260);
        for i in 0..200 {
            closes.push(200.0 - i as f64 * 0.4);
        }
        for i in 0..60 {
            closes.push(120.0 + i as f64 * 2.0);
        }
        let report = detect(&daily(&closes), &PatternConfig::default()).expect("report");
        assert!(report
            .hits
            .iter()
            .any(|hit| hit.kind == PatternKind::GoldenCross
                && hit.signal == TrendSignal::Bullish));
    }
}
