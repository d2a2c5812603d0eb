//! Relative strength against a benchmark: weighted multi-window
//! outperformance mapped to an IBD-style 20..99 score with tiering and a
//! trend read.

use serde::{Deserialize, Serialize};

use finsig_core::PriceSeries;

use crate::error::AnalyticsError;
use crate::signal::StrengthTrend;

/// Lookback windows (bars) with their score weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthConfig {
    pub windows: Vec<StrengthWindow>,
    /// Bars dropped from both series when measuring the score trend.
    pub trend_lookback: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthWindow {
    pub bars: usize,
    pub weight: f64,
}

impl Default for StrengthConfig {
    fn default() -> Self {
        Self {
            windows: vec![
                StrengthWindow { bars: 63, weight: 0.4 },
                StrengthWindow { bars: 126, weight: 0.2 },
                StrengthWindow { bars: 189, weight: 0.2 },
                StrengthWindow { bars: 252, weight: 0.2 },
            ],
            trend_lookback: 20,
        }
    }
}

/// Score tier labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthTier {
    ExceptionalLeader,
    StrongLeader,
    Leader,
    MarketPerformer,
    Laggard,
    WeakLaggard,
}

/// Per-window outperformance detail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowOutperformance {
    pub bars: usize,
    pub weight: f64,
    pub ticker_return_pct: f64,
    pub benchmark_return_pct: f64,
    pub outperformance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthReport {
    pub score: u8,
    pub tier: StrengthTier,
    pub trend: StrengthTrend,
    pub weighted_outperformance_pct: f64,
    pub windows: Vec<WindowOutperformance>,
    /// Window sizes dropped for lack of history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_windows: Vec<usize>,
}

/// Maps weighted outperformance (percentage points) onto the step score.
pub fn score_from_outperformance(outperformance: f64) -> u8 {
    if outperformance > 20.0 {
        99
    } else if outperformance > 15.0 {
        95
    } else if outperformance > 10.0 {
        90
    } else if outperformance > 7.0 {
        85
    } else if outperformance > 5.0 {
        80
    } else if outperformance > 3.0 {
        75
    } else if outperformance > 1.0 {
        70
    } else if outperformance > 0.0 {
        60
    } else if outperformance > -2.0 {
        50
    } else if outperformance > -5.0 {
        40
    } else if outperformance > -10.0 {
        30
    } else {
        20
    }
}

pub fn classify_tier(score: u8) -> StrengthTier {
    if score >= 90 {
        StrengthTier::ExceptionalLeader
    } else if score >= 80 {
        StrengthTier::StrongLeader
    } else if score >= 70 {
        StrengthTier::Leader
    } else if score >= 60 {
        StrengthTier::MarketPerformer
    } else if score >= 40 {
        StrengthTier::Laggard
    } else {
        StrengthTier::WeakLaggard
    }
}

fn total_return_pct(closes: &[f64], bars: usize) -> Option<f64> {
    if closes.len() < bars + 1 {
        return None;
    }
    let start = closes[closes.len() - 1 - bars];
    let end = closes[closes.len() - 1];
    if start == 0.0 {
        return None;
    }
    Some((end - start) / start * 100.0)
}

fn weighted_outperformance(
    ticker: &[f64],
    benchmark: &[f64],
    config: &StrengthConfig,
) -> Result<(f64, Vec<WindowOutperformance>, Vec<usize>), AnalyticsError> {
    let mut windows = Vec::new();
    let mut skipped = Vec::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for window in &config.windows {
        let ticker_return = total_return_pct(ticker, window.bars);
        let benchmark_return = total_return_pct(benchmark, window.bars);
        match (ticker_return, benchmark_return) {
            (Some(t), Some(b)) => {
                let outperformance = t - b;
                weighted_sum += outperformance * window.weight;
                weight_total += window.weight;
                windows.push(WindowOutperformance {
                    bars: window.bars,
                    weight: window.weight,
                    ticker_return_pct: t,
                    benchmark_return_pct: b,
                    outperformance_pct: outperformance,
                });
            }
            _ => skipped.push(window.bars),
        }
    }

    if weight_total == 0.0 {
        let shortest = config
            .windows
            .iter()
            .map(|window| window.bars + 1)
            .min()
            .unwrap_or(1);
        return Err(AnalyticsError::InsufficientHistory {
            required: shortest,
            available: ticker.len().min(benchmark.len()),
        });
    }

    Ok((weighted_sum / weight_total, windows, skipped))
}

/// Scores the ticker's weighted outperformance of the benchmark.
///
/// Windows that do not fit the shorter series are skipped and the remaining
/// weights renormalized; the trend compares against the score computed with
/// the last `trend_lookback` bars removed from both series.
pub fn relative_strength(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    config: &StrengthConfig,
) -> Result<StrengthReport, AnalyticsError> {
    if config.windows.is_empty() {
        return Err(AnalyticsError::invalid_input("no strength windows configured"));
    }
    let ticker = series.closes();
    let bench = benchmark.closes();

    let (weighted, windows, skipped_windows) =
        weighted_outperformance(&ticker, &bench, config)?;
    let score = score_from_outperformance(weighted);

    let trend = {
        let cut = config.trend_lookback;
        if ticker.len() > cut && bench.len() > cut {
            let prior_ticker = &ticker[..ticker.len() - cut];
            let prior_bench = &bench[..bench.len() - cut];
            match weighted_outperformance(prior_ticker, prior_bench, config) {
                Ok((prior_weighted, _, _)) => {
                    let prior_score = score_from_outperformance(prior_weighted);
                    if score > prior_score {
                        StrengthTrend::Improving
                    } else if score < prior_score {
                        StrengthTrend::Deteriorating
                    } else {
                        StrengthTrend::Flat
                    }
                }
                Err(AnalyticsError::InsufficientHistory { .. }) => StrengthTrend::Flat,
                Err(other) => return Err(other),
            }
        } else {
            StrengthTrend::Flat
        }
    };

    Ok(StrengthReport {
        score,
        tier: classify_tier(score),
        trend,
        weighted_outperformance_pct: weighted,
        windows,
        skipped_windows,
    })
}
