//! Support/resistance detection from clustered swing extrema.

use serde::{Deserialize, Serialize};

use finsig_core::PriceSeries;

use crate::error::{require_history, AnalyticsError};

/// Swing detection and clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Bars on each side a swing extreme must dominate.
    pub swing_window: usize,
    /// Extrema within this percent of the cluster mean join the cluster.
    pub cluster_tolerance_pct: f64,
    /// Levels reported per side.
    pub max_levels: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            swing_window: 5,
            cluster_tolerance_pct: 1.0,
            max_levels: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSide {
    Support,
    Resistance,
}

/// One clustered price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub side: LevelSide,
    pub price: f64,
    pub touches: usize,
    /// Touch count plus a 0-1 recency fraction of the last touch.
    pub strength: f64,
    pub distance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub close: f64,
    pub support: Vec<PriceLevel>,
    pub resistance: Vec<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_support: Option<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_resistance: Option<PriceLevel>,
}

#[derive(Debug, Clone, Copy)]
struct SwingPoint {
    index: usize,
    price: f64,
}

/// Bar `i` is a swing high when its high strictly exceeds every high in the
/// symmetric window; swing lows mirror with strict minima.
fn swing_points(series: &PriceSeries, k: usize) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
    let bars = series.bars();
    let mut highs = Vec::new();
    let mut lows = Vec::new();

    for index in k..bars.len() - k {
        let window = &bars[index - k..=index + k];
        let candidate = &bars[index];

        let is_high = window
            .iter()
            .enumerate()
            .all(|(offset, bar)| offset == k || bar.high < candidate.high);
        if is_high {
            highs.push(SwingPoint {
                index,
                price: candidate.high,
            });
        }

        let is_low = window
            .iter()
            .enumerate()
            .all(|(offset, bar)| offset == k || bar.low > candidate.low);
        if is_low {
            lows.push(SwingPoint {
                index,
                price: candidate.low,
            });
        }
    }
    (highs, lows)
}

struct Cluster {
    prices: Vec<f64>,
    last_index: usize,
}

impl Cluster {
    fn mean(&self) -> f64 {
        self.prices.iter().sum::<f64>() / self.prices.len() as f64
    }
}

/// Greedy single-pass clustering: each extreme joins the first cluster
/// whose mean is within tolerance, else starts a new one.
fn cluster(points: &[SwingPoint], tolerance_pct: f64) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for point in points {
        let joined = clusters.iter_mut().find(|cluster| {
            let mean = cluster.mean();
            mean != 0.0 && ((point.price - mean) / mean).abs() * 100.0 <= tolerance_pct
        });
        match joined {
            Some(cluster) => {
                cluster.prices.push(point.price);
                cluster.last_index = cluster.last_index.max(point.index);
            }
            None => clusters.push(Cluster {
                prices: vec![point.price],
                last_index: point.index,
            }),
        }
    }
    clusters
}

fn levels_from_clusters(
    clusters: Vec<Cluster>,
    side: LevelSide,
    close: f64,
    series_len: usize,
) -> Vec<PriceLevel> {
    clusters
        .into_iter()
        .map(|cluster| {
            let price = cluster.mean();
            let recency = cluster.last_index as f64 / (series_len - 1).max(1) as f64;
            PriceLevel {
                side,
                price,
                touches: cluster.prices.len(),
                strength: cluster.prices.len() as f64 + recency,
                distance_pct: if close != 0.0 {
                    (price - close) / close * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// Detects clustered swing levels and splits them around the last close.
///
/// Resistance levels lie above the close, support below; each side reports
/// up to `max_levels` ordered by strength, plus the nearest of each.
pub fn detect(series: &PriceSeries, config: &LevelConfig) -> Result<LevelReport, AnalyticsError> {
    let k = config.swing_window;
    if k == 0 {
        return Err(AnalyticsError::invalid_input("swing window must be positive"));
    }
    require_history(2 * k + 1, series.len())?;

    let close = series
        .last()
        .map(|bar| bar.close)
        .ok_or_else(|| AnalyticsError::invalid_input("series is empty"))?;

    let (swing_highs, swing_lows) = swing_points(series, k);
    let mut candidates = levels_from_clusters(
        cluster(&swing_highs, config.cluster_tolerance_pct),
        LevelSide::Resistance,
        close,
        series.len(),
    );
    candidates.extend(levels_from_clusters(
        cluster(&swing_lows, config.cluster_tolerance_pct),
        LevelSide::Support,
        close,
        series.len(),
    ));

    let mut resistance: Vec<PriceLevel> = candidates
        .iter()
        .filter(|level| level.price > close)
        .map(|level| PriceLevel {
            side: LevelSide::Resistance,
            ..*level
        })
        .collect();
    let mut support: Vec<PriceLevel> = candidates
        .iter()
        .filter(|level| level.price < close)
        .map(|level| PriceLevel {
            side: LevelSide::Support,
            ..*level
        })
        .collect();

    resistance.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    support.sort_by(|a, b| b.strength.total_cmp(&a.strength));

    let nearest_resistance = resistance
        .iter()
        .copied()
        .min_by(|a, b| a.distance_pct.abs().total_cmp(&b.distance_pct.abs()));
    let nearest_support = support
        .iter()
        .copied()
        .min_by(|a, b| a.distance_pct.abs().total_cmp(&b.distance_pct.abs()));

    resistance.truncate(config.max_levels);
    support.truncate(config.max_levels);

    Ok(LevelReport {
        close,
        support,
        resistance,
        nearest_support,
        nearest_resistance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsig_core::{Interval, PriceBar, Symbol, UtcDateTime};

    fn series_with_highs_lows(points: &[(f64, f64, f64)]) -> PriceSeries {
        let symbol = Symbol::parse("TEST").expect("symbol");
        let bars = points
            .iter()
            .enumerate()
            .map(|(index, &(high, low, close))| {
                let ts = UtcDateTime::from_unix(1_700_000_000 + index as i64 * 86_400)
                    .expect("timestamp");
                PriceBar::new(ts, close, high, low, close, 1_000).expect("bar")
            })
            .collect();
        PriceSeries::new(symbol, Interval::OneDay, bars).expect("series")
    }

    fn oscillating(len: usize) -> PriceSeries {
        // Highs peak at 110 every 10 bars, lows trough at 90.
        let points: Vec<(f64, f64, f64)> = (0..len)
            .map(|i| {
                let phase = (i as f64) * std::f64::consts::PI / 5.0;
                let mid = 100.0 + 8.0 * phase.sin();
                (mid + 2.0, mid - 2.0, mid)
            })
            .collect();
        series_with_highs_lows(&points)
    }

    #[test]
    fn requires_full_symmetric_window() {
        let series = oscillating(10);
        let result = detect(&series, &LevelConfig::default());
        assert!(matches!(
            result,
            Err(AnalyticsError::InsufficientHistory {
                required: 11,
                available: 10
            })
        ));
    }

    #[test]
    fn repeated_peaks_cluster_into_one_level() {
        let series = oscillating(60);
        let report = detect(&series, &LevelConfig::default()).expect("report");
        let strongest = report
            .resistance
            .first()
            .or(report.support.first())
            .expect("at least one level");
        assert!(strongest.touches >= 2);
    }

    #[test]
    fn levels_split_around_the_close() {
        let series = oscillating(60);
        let report = detect(&series, &LevelConfig::default()).expect("report");
        for level in &report.resistance {
            assert!(level.price > report.close);
        }
        for level in &report.support {
            assert!(level.price < report.close);
        }
    }

    #[test]
    fn flat_series_has_no_strict_extrema() {
        let points = vec![(101.0, 99.0, 100.0); 30];
        let series = series_with_highs_lows(&points);
        let report = detect(&series, &LevelConfig::default()).expect("report");
        assert!(report.support.is_empty());
        assert!(report.resistance.is_empty());
    }
}
