//! Behavior tests for the volatility analytics: ATR seeding, flat-series
//! identities, regime classification, beta and the composite snapshot.

use finsig_analytics::signal::VolatilityRegime;
use finsig_analytics::volatility::{self, VolatilityConfig};
use finsig_analytics::AnalyticsError;
use finsig_core::{Interval, PriceBar, PriceSeries, Symbol, UtcDateTime};
use finsig_tests::{daily_series, flat_series, rising_series};

// =============================================================================
// ATR
// =============================================================================

#[test]
fn atr_is_never_negative_and_seeds_from_the_first_true_ranges() {
    let closes: Vec<f64> = (0..40)
        .map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0)
        .collect();
    let series = daily_series("ATR", &closes);

    let ranges = volatility::true_range(&series).expect("true range");
    let atr = volatility::atr(&series, 14).expect("atr");

    let seed: f64 = ranges[..14].iter().sum::<f64>() / 14.0;
    assert!((atr[0] - seed).abs() < 1e-12, "seed must be the TR average");
    assert!(atr.iter().all(|&value| value >= 0.0));
}

// =============================================================================
// Scenario: 60 flat bars
// =============================================================================

#[test]
fn sixty_flat_bars_read_zero_volatility_and_extreme_low_regime() {
    // Given: a constant-close series (fixture highs/lows straddle by 1)
    let series = flat_series("FLAT", 60);
    let config = VolatilityConfig::default();

    // When: the volatility stack runs
    let hv = volatility::historical_volatility(&series, 20).expect("hv");
    let percentile = volatility::volatility_percentile(&series, &config).expect("percentile");

    // Then: HV is exactly zero and the percentile buckets as extreme_low
    assert_eq!(hv, 0.0);
    assert_eq!(percentile, 0.0);
    assert_eq!(
        volatility::classify_regime(percentile),
        VolatilityRegime::ExtremeLow
    );
}

#[test]
fn truly_flat_bars_have_zero_atr() {
    // Bars whose high, low and close coincide carry no range at all.
    let symbol = Symbol::parse("PIN").expect("symbol");
    let bars: Vec<PriceBar> = (0..30)
        .map(|index| {
            let ts = UtcDateTime::from_unix(1_672_531_200 + index as i64 * 86_400)
                .expect("timestamp");
            PriceBar::new(ts, 100.0, 100.0, 100.0, 100.0, 1_000).expect("bar")
        })
        .collect();
    let series = PriceSeries::new(symbol, Interval::OneDay, bars).expect("series");

    let atr = volatility::atr(&series, 14).expect("atr");
    assert!(atr.iter().all(|&value| value == 0.0));
}

// =============================================================================
// Regime thresholds
// =============================================================================

#[test]
fn regime_thresholds_are_boundary_inclusive() {
    assert_eq!(volatility::classify_regime(80.0), VolatilityRegime::ExtremeHigh);
    assert_eq!(volatility::classify_regime(79.9), VolatilityRegime::High);
    assert_eq!(volatility::classify_regime(60.0), VolatilityRegime::High);
    assert_eq!(volatility::classify_regime(40.0), VolatilityRegime::Normal);
    assert_eq!(volatility::classify_regime(20.0), VolatilityRegime::Low);
    assert_eq!(volatility::classify_regime(19.9), VolatilityRegime::ExtremeLow);
}

// =============================================================================
// Beta
// =============================================================================

#[test]
fn beta_against_itself_is_one_and_flat_benchmark_is_rejected() {
    let closes: Vec<f64> = (0..60)
        .map(|i| 100.0 + (i as f64 * 0.5).sin() * 4.0)
        .collect();
    let series = daily_series("BETA", &closes);

    let self_beta = volatility::beta(&series, &series).expect("beta");
    assert!((self_beta - 1.0).abs() < 1e-9);

    let flat = flat_series("SPX", 60);
    assert!(matches!(
        volatility::beta(&series, &flat),
        Err(AnalyticsError::InvalidInput { .. })
    ));
}

#[test]
fn beta_aligns_series_of_different_lengths_on_their_shared_dates() {
    let long: Vec<f64> = (0..120)
        .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0)
        .collect();
    let series = daily_series("LONG", &long);
    let benchmark = series.slice(60, 120);

    // Identical closes on the shared dates make the returns identical.
    let value = volatility::beta(&series, &benchmark).expect("beta");
    assert!((value - 1.0).abs() < 1e-9);
}

#[test]
fn beta_pairs_returns_by_timestamp_across_calendar_gaps() {
    let closes: Vec<f64> = (0..80)
        .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0)
        .collect();
    let series = daily_series("FULL", &closes);

    // Same closes with one session missing mid-series.
    let symbol = Symbol::parse("GAP").expect("symbol");
    let bars: Vec<PriceBar> = closes
        .iter()
        .enumerate()
        .filter(|&(index, _)| index != 40)
        .map(|(index, &close)| {
            let ts = UtcDateTime::from_unix(1_672_531_200 + index as i64 * 86_400)
                .expect("timestamp");
            PriceBar::new(ts, close, close + 1.0, close - 1.0, close, 1_000_000).expect("bar")
        })
        .collect();
    let gapped = PriceSeries::new(symbol, Interval::OneDay, bars).expect("series");

    // The missing session drops out of both sides instead of shifting
    // every later pair, so the paired returns stay identical.
    let value = volatility::beta(&series, &gapped).expect("beta");
    assert!((value - 1.0).abs() < 1e-9);
}

// =============================================================================
// Stops, sizing, snapshot
// =============================================================================

#[test]
fn stop_ladder_and_position_size_follow_the_atr() {
    let series = rising_series("STOP", 40);
    let config = VolatilityConfig::default();

    let stops = volatility::stop_recommendations(&series, &config).expect("stops");
    assert_eq!(stops.len(), config.stop_multiples.len());
    for (level, multiple) in stops.iter().zip(&config.stop_multiples) {
        assert_eq!(level.multiple, *multiple);
        assert!(level.long_stop < level.short_stop);
    }

    let size = volatility::position_size(1_000.0, stops[0].distance).expect("size");
    assert!(size as f64 * stops[0].distance <= 1_000.0);
}

#[test]
fn snapshot_reports_beta_only_with_a_benchmark() {
    let closes: Vec<f64> = (0..300)
        .map(|i| 100.0 + (i as f64 * 0.2).sin() * 6.0)
        .collect();
    let series = daily_series("SNAP", &closes);
    let benchmark = daily_series("MKT", &closes);
    let config = VolatilityConfig::default();

    let without = volatility::snapshot(&series, None, &config).expect("snapshot");
    assert!(without.beta.is_none());
    assert!(without.skipped.is_empty());

    let with = volatility::snapshot(&series, Some(&benchmark), &config).expect("snapshot");
    assert!(with.beta.is_some());
    assert_eq!(with.historical_volatility.len(), config.hv_windows.len());
    assert!(with.regime.is_some());
}
