//! Composite trend-strength score: RSI, MACD, moving-average alignment and
//! Bollinger position each contribute a capped number of points; checks
//! short on history shrink the denominator instead of failing.

use serde::{Deserialize, Serialize};

use finsig_core::PriceSeries;

use crate::error::{require_history, AnalyticsError};
use crate::indicators::{self, IndicatorConfig};
use crate::stats::mean;

/// Maximum points per component.
pub const RSI_MAX_POINTS: f64 = 25.0;
pub const MACD_MAX_POINTS: f64 = 25.0;
pub const MA_CHECK_POINTS: f64 = 10.0;
pub const BOLLINGER_MAX_POINTS: f64 = 20.0;

/// RSI point map.
const RSI_SWEET_SPOT: f64 = 25.0;
const RSI_OVERBOUGHT_POINTS: f64 = 20.0;
const RSI_MIDRANGE_POINTS: f64 = 12.0;
const RSI_OVERSOLD_POINTS: f64 = 10.0;
const RSI_WEAK_POINTS: f64 = 5.0;

/// Bollinger %B point map.
const BAND_UPPER_HALF_POINTS: f64 = 20.0;
const BAND_EXTENDED_POINTS: f64 = 15.0;
const BAND_LOWER_HALF_POINTS: f64 = 10.0;
const BAND_FLOOR_POINTS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendAssessment {
    StrongBullish,
    ModerateBullish,
    WeakConsolidating,
    BearishWeak,
}

/// One scored component with its earned and possible points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendComponent {
    pub name: &'static str,
    pub points: f64,
    pub max_points: f64,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendScore {
    /// Earned points normalized to 0-100 over the available checks.
    pub score: f64,
    pub assessment: TrendAssessment,
    pub components: Vec<TrendComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<&'static str>,
}

fn rsi_points(rsi: f64) -> (f64, String) {
    if rsi >= 80.0 {
        (RSI_OVERBOUGHT_POINTS, format!("rsi {rsi:.1} overbought"))
    } else if rsi >= 55.0 {
        (RSI_SWEET_SPOT, format!("rsi {rsi:.1} bullish momentum"))
    } else if rsi >= 45.0 {
        (RSI_MIDRANGE_POINTS, format!("rsi {rsi:.1} mid-range"))
    } else if rsi < 30.0 {
        (RSI_OVERSOLD_POINTS, format!("rsi {rsi:.1} oversold"))
    } else {
        (RSI_WEAK_POINTS, format!("rsi {rsi:.1} weak"))
    }
}

fn bollinger_points(percent_b: f64) -> (f64, String) {
    if percent_b > 1.0 {
        (BAND_EXTENDED_POINTS, format!("%b {percent_b:.2} extended above band"))
    } else if percent_b >= 0.5 {
        (BAND_UPPER_HALF_POINTS, format!("%b {percent_b:.2} upper half"))
    } else if percent_b > 0.0 {
        (BAND_LOWER_HALF_POINTS, format!("%b {percent_b:.2} lower half"))
    } else {
        (BAND_FLOOR_POINTS, format!("%b {percent_b:.2} at band floor"))
    }
}

pub fn classify_assessment(score: f64) -> TrendAssessment {
    if score >= 70.0 {
        TrendAssessment::StrongBullish
    } else if score >= 50.0 {
        TrendAssessment::ModerateBullish
    } else if score >= 30.0 {
        TrendAssessment::WeakConsolidating
    } else {
        TrendAssessment::BearishWeak
    }
}

/// Scores the series; hard minimum history is the MACD slow window.
pub fn score(series: &PriceSeries, config: &IndicatorConfig) -> Result<TrendScore, AnalyticsError> {
    let minimum = config
        .macd_slow
        .max(config.rsi_window + 1)
        .max(config.bollinger_window)
        .max(config.fast_ma_window);
    require_history(minimum, series.len())?;

    let closes = series.closes();
    let close = closes[closes.len() - 1];

    let mut components = Vec::new();
    let mut skipped = Vec::new();
    let mut earned = 0.0;
    let mut possible = 0.0;

    let rsi_series = indicators::rsi(&closes, config.rsi_window)?;
    let rsi_now = rsi_series[rsi_series.len() - 1];
    let (points, detail) = rsi_points(rsi_now);
    earned += points;
    possible += RSI_MAX_POINTS;
    components.push(TrendComponent {
        name: "rsi_momentum",
        points,
        max_points: RSI_MAX_POINTS,
        detail,
    });

    let macd = indicators::macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal)?;
    let macd_now = macd.macd[macd.macd.len() - 1];
    let signal_now = macd.signal[macd.signal.len() - 1];
    let points = if macd_now > signal_now { MACD_MAX_POINTS } else { 0.0 };
    earned += points;
    possible += MACD_MAX_POINTS;
    components.push(TrendComponent {
        name: "macd_direction",
        points,
        max_points: MACD_MAX_POINTS,
        detail: format!("macd {macd_now:.4} vs signal {signal_now:.4}"),
    });

    // Moving-average alignment, each check independently skippable.
    let fast_avg = if closes.len() >= config.fast_ma_window {
        Some(mean(&closes[closes.len() - config.fast_ma_window..]))
    } else {
        None
    };
    let medium_avg = if closes.len() >= config.medium_ma_window {
        Some(mean(&closes[closes.len() - config.medium_ma_window..]))
    } else {
        None
    };
    let slow_avg = if closes.len() >= config.slow_ma_window {
        Some(mean(&closes[closes.len() - config.slow_ma_window..]))
    } else {
        None
    };

    let checks = [
        ("close_above_fast_ma", fast_avg.map(|avg| close > avg)),
        ("close_above_medium_ma", medium_avg.map(|avg| close > avg)),
        (
            "medium_ma_above_slow_ma",
            match (medium_avg, slow_avg) {
                (Some(medium), Some(slow)) => Some(medium > slow),
                _ => None,
            },
        ),
    ];
    for (name, result) in checks {
        match result {
            Some(passed) => {
                let points = if passed { MA_CHECK_POINTS } else { 0.0 };
                earned += points;
                possible += MA_CHECK_POINTS;
                components.push(TrendComponent {
                    name,
                    points,
                    max_points: MA_CHECK_POINTS,
                    detail: String::from(if passed { "aligned" } else { "not aligned" }),
                });
            }
            None => skipped.push(name),
        }
    }

    let bands = indicators::bollinger(&closes, config.bollinger_window, config.bollinger_nbdev)?;
    let last = bands.middle.len() - 1;
    let percent_b = indicators::percent_b(close, bands.upper[last], bands.lower[last]);
    let (points, detail) = bollinger_points(percent_b);
    earned += points;
    possible += BOLLINGER_MAX_POINTS;
    components.push(TrendComponent {
        name: "bollinger_position",
        points,
        max_points: BOLLINGER_MAX_POINTS,
        detail,
    });

    let score = if possible > 0.0 {
        earned / possible * 100.0
    } else {
        0.0
    };

    Ok(TrendScore {
        score,
        assessment: classify_assessment(score),
        components,
        skipped,
    })
}
