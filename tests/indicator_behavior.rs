//! Behavior tests for the indicator library: bounds, documented identities
//! and the composite snapshot's graceful degradation.

use finsig_analytics::indicators::{self, IndicatorConfig};
use finsig_analytics::signal::{MomentumSignal, TrendSignal};
use finsig_analytics::AnalyticsError;
use finsig_tests::{flat_series, rising_series};

// =============================================================================
// Window contracts
// =============================================================================

#[test]
fn when_series_is_shorter_than_window_indicator_reports_insufficient_history() {
    let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();

    let err = indicators::sma(&closes, 20).expect_err("10 bars cannot fill a 20 window");
    assert!(matches!(
        err,
        AnalyticsError::InsufficientHistory {
            required: 20,
            available: 10
        }
    ));

    let err = indicators::rsi(&closes, 14).expect_err("rsi needs window + 1 bars");
    assert!(matches!(err, AnalyticsError::InsufficientHistory { .. }));
}

#[test]
fn indicator_outputs_are_tail_aligned() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let out = indicators::sma(&closes, 20).expect("sma");

    assert_eq!(out.len(), 11);
    // Last output covers the last 20 closes.
    let expected: f64 = closes[10..].iter().sum::<f64>() / 20.0;
    assert!((out[10] - expected).abs() < 1e-9);
}

// =============================================================================
// RSI identities
// =============================================================================

#[test]
fn rsi_is_bounded_and_reads_100_on_pure_gains() {
    let series = rising_series("UP", 30);
    let out = indicators::rsi(&series.closes(), 14).expect("rsi");

    for value in &out {
        assert!((0.0..=100.0).contains(value), "rsi {value} out of bounds");
    }
    assert_eq!(out[out.len() - 1], 100.0);
}

#[test]
fn rsi_reads_50_on_a_perfectly_flat_series() {
    let series = flat_series("FLAT", 30);
    let out = indicators::rsi(&series.closes(), 14).expect("rsi");
    assert_eq!(out[out.len() - 1], 50.0);
}

#[test]
fn rsi_reads_0_on_pure_losses() {
    let closes: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
    let out = indicators::rsi(&closes, 14).expect("rsi");
    assert_eq!(out[out.len() - 1], 0.0);
}

// =============================================================================
// Scenario: 30 rising bars
// =============================================================================

#[test]
fn thirty_rising_bars_produce_max_rsi_and_bullish_macd() {
    // Given: closes rising monotonically 100 -> 129 with constant volume
    let series = rising_series("BULL", 30);
    let config = IndicatorConfig::default();

    // When: the composite snapshot runs
    let snapshot = indicators::snapshot(&series, &config).expect("snapshot");

    // Then: RSI pins at 100 and the MACD line sits above its signal
    assert_eq!(snapshot.rsi.value, 100.0);
    assert_eq!(snapshot.rsi.signal, MomentumSignal::Overbought);
    assert_eq!(snapshot.macd.trend, TrendSignal::Bullish);
    assert!(snapshot.macd.histogram > 0.0);
}

#[test]
fn short_history_skips_long_averages_but_still_succeeds() {
    let series = rising_series("SHORT", 30);
    let snapshot =
        indicators::snapshot(&series, &IndicatorConfig::default()).expect("snapshot");

    assert!(snapshot.moving_averages.sma_medium.is_none());
    assert!(snapshot.moving_averages.sma_slow.is_none());
    assert!(snapshot.skipped.contains(&"sma_medium"));
    assert!(snapshot.skipped.contains(&"sma_slow"));
    assert!(snapshot.skipped.contains(&"ma_trend"));
}

#[test]
fn long_history_fills_every_average_and_reports_nothing_skipped() {
    let series = rising_series("LONG", 260);
    let snapshot =
        indicators::snapshot(&series, &IndicatorConfig::default()).expect("snapshot");

    assert!(snapshot.moving_averages.sma_medium.is_some());
    assert!(snapshot.moving_averages.sma_slow.is_some());
    assert!(snapshot.moving_averages.trend.is_some());
    assert!(snapshot.skipped.is_empty());
}

// =============================================================================
// Bollinger and stochastic identities
// =============================================================================

#[test]
fn collapsed_bands_read_percent_b_as_midpoint() {
    assert_eq!(indicators::percent_b(100.0, 100.0, 100.0), 0.5);
}

#[test]
fn stochastic_reads_50_when_high_equals_low() {
    let series = flat_series("FLAT", 30);
    let out = indicators::stochastic(&series, 14, 3).expect("stochastic");
    // Fixture highs/lows straddle the close symmetrically, so %K sits at 50.
    assert!((out.k[out.k.len() - 1] - 50.0).abs() < 1e-9);
}

#[test]
fn snapshot_serializes_with_snake_case_signals() {
    let series = rising_series("SER", 30);
    let snapshot =
        indicators::snapshot(&series, &IndicatorConfig::default()).expect("snapshot");
    let json = serde_json::to_value(&snapshot).expect("serialize");

    assert_eq!(json["rsi"]["signal"], "overbought");
    assert_eq!(json["macd"]["trend"], "bullish");
}
