//! Behavior tests for the concurrent screener: per-symbol isolation,
//! input-order reporting, timeouts and the rate gate.

use std::time::Duration;

use finsig_analytics::ScreenCriteria;
use finsig_core::{PriceSeries, Symbol};
use finsig_screener::{
    BackoffPolicy, CompareEntry, RateGate, RateQuota, ScreenEntry, Screener, ScreenerConfig,
    SeriesProvider, StaticSeriesProvider,
};
use finsig_tests::{daily_series, flat_series, rising_series};

fn symbol(name: &str) -> Symbol {
    Symbol::parse(name).expect("symbol must parse")
}

fn universe() -> Vec<PriceSeries> {
    let falling: Vec<f64> = (0..40).map(|i| 140.0 - i as f64).collect();
    let choppy: Vec<f64> = (0..40)
        .map(|i| 100.0 + (i as f64 * 0.9).sin() * 3.0)
        .collect();
    vec![
        rising_series("WIN", 40),
        flat_series("FLAT", 40),
        daily_series("DIP", &falling),
        daily_series("CHOP", &choppy),
    ]
}

// =============================================================================
// Batch screening
// =============================================================================

#[tokio::test]
async fn screen_reports_every_symbol_in_input_order() {
    // Given: a universe of four symbols and a request naming five
    let screener = Screener::new(
        StaticSeriesProvider::new(universe()),
        ScreenerConfig::default(),
    );
    let symbols = vec![
        symbol("WIN"),
        symbol("GHOST"),
        symbol("FLAT"),
        symbol("DIP"),
        symbol("CHOP"),
    ];
    let criteria = ScreenCriteria {
        rsi_below: Some(30.0),
        ..ScreenCriteria::default()
    };

    // When: the screen runs
    let report = screener.screen(symbols.clone(), criteria).await;

    // Then: one entry per input, in order, the unknown one failed
    assert_eq!(report.total, 5);
    assert_eq!(report.scored, 4);
    assert_eq!(report.failed, 1);
    let ordered: Vec<&Symbol> = report.entries.iter().map(ScreenEntry::symbol).collect();
    assert_eq!(ordered, symbols.iter().collect::<Vec<_>>());

    match &report.entries[1] {
        ScreenEntry::Failed { failure, .. } => {
            assert_eq!(failure.code, "provider.not_found");
            assert!(!failure.retryable);
        }
        ScreenEntry::Scored { .. } => panic!("unknown symbol must not score"),
    }
}

#[tokio::test]
async fn rsi_ceiling_splits_matches_from_scored() {
    let screener = Screener::new(
        StaticSeriesProvider::new(universe()),
        ScreenerConfig::default(),
    );
    let criteria = ScreenCriteria {
        rsi_below: Some(60.0),
        ..ScreenCriteria::default()
    };

    let report = screener
        .screen(vec![symbol("WIN"), symbol("FLAT"), symbol("DIP")], criteria)
        .await;

    // Steady gains pin RSI at 100, the flat tape sits at 50 and the
    // decline at 0; only the latter two clear the ceiling.
    assert_eq!(report.scored, 3);
    assert_eq!(report.matched, 2);
    match &report.entries[0] {
        ScreenEntry::Scored { screen, .. } => assert!(!screen.passed),
        ScreenEntry::Failed { .. } => panic!("WIN must score"),
    }
}

#[tokio::test]
async fn short_history_fails_the_symbol_not_the_batch() {
    let provider = StaticSeriesProvider::new([rising_series("WIN", 40), rising_series("STUB", 10)]);
    let screener = Screener::new(provider, ScreenerConfig::default());

    let report = screener
        .screen(vec![symbol("STUB"), symbol("WIN")], ScreenCriteria::default())
        .await;

    assert_eq!(report.scored, 1);
    assert_eq!(report.failed, 1);
    match &report.entries[0] {
        ScreenEntry::Failed { failure, .. } => {
            assert_eq!(failure.code, "analytics.insufficient_history");
            assert!(!failure.retryable);
        }
        ScreenEntry::Scored { .. } => panic!("ten bars cannot score"),
    }
}

// =============================================================================
// Timeouts
// =============================================================================

struct StalledProvider;

impl SeriesProvider for StalledProvider {
    fn series<'a>(&'a self, _symbol: &'a Symbol) -> finsig_screener::SeriesFuture<'a> {
        Box::pin(async {
            // The screener's per-symbol timeout must fire first.
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(finsig_screener::ProviderError::unavailable("stalled"))
        })
    }
}

#[tokio::test]
async fn stalled_fetch_becomes_a_retryable_timeout_entry() {
    let config = ScreenerConfig {
        per_symbol_timeout: Duration::from_millis(50),
        ..ScreenerConfig::default()
    };
    let screener = Screener::new(StalledProvider, config);

    let report = screener
        .screen(vec![symbol("SLOW")], ScreenCriteria::default())
        .await;

    assert_eq!(report.total, 1);
    match &report.entries[0] {
        ScreenEntry::Failed { failure, .. } => {
            assert_eq!(failure.code, "screener.timeout");
            assert!(failure.retryable);
        }
        ScreenEntry::Scored { .. } => panic!("stalled provider must not score"),
    }
}

// =============================================================================
// Comparison
// =============================================================================

#[tokio::test]
async fn compare_mixes_snapshots_and_failures() {
    let screener = Screener::new(
        StaticSeriesProvider::new(universe()),
        ScreenerConfig::default(),
    );

    let report = screener
        .compare(vec![symbol("WIN"), symbol("GHOST"), symbol("DIP")])
        .await;

    assert_eq!(report.total, 3);
    assert_eq!(report.scored, 2);
    assert_eq!(report.failed, 1);
    match &report.entries[0] {
        CompareEntry::Scored { snapshot, .. } => {
            assert!(snapshot.rsi.value > 50.0, "steady gains read overbought");
        }
        CompareEntry::Failed { .. } => panic!("WIN must score"),
    }
    assert!(matches!(report.entries[1], CompareEntry::Failed { .. }));
}

// =============================================================================
// Rate gate
// =============================================================================

#[test]
fn retry_schedule_is_exponential_and_finite() {
    let gate = RateGate::new(
        RateQuota::default(),
        BackoffPolicy {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            multiplier: 2.0,
            max_retries: 2,
        },
    );

    assert_eq!(gate.retry_delay(0), Some(Duration::from_millis(100)));
    assert_eq!(gate.retry_delay(1), Some(Duration::from_millis(200)));
    assert_eq!(gate.retry_delay(2), Some(Duration::from_millis(300)));
    assert_eq!(gate.retry_delay(3), None);
}

#[tokio::test]
async fn gate_admits_requests_within_quota() {
    let gate = RateGate::new(
        RateQuota {
            window: Duration::from_secs(60),
            limit: 5,
        },
        BackoffPolicy::default(),
    );
    for _ in 0..5 {
        assert!(gate.acquire().await.is_ok());
    }
}
