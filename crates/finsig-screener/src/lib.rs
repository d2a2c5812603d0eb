//! Concurrent multi-symbol screening and comparison over any
//! [`SeriesProvider`]: bounded fan-out, rate gating with exponential
//! backoff, per-symbol timeouts and order-preserving partial-failure
//! reports.

pub mod provider;
pub mod screener;
pub mod throttle;

pub use provider::{
    ProviderError, ProviderErrorKind, SeriesFuture, SeriesProvider, StaticSeriesProvider,
};
pub use screener::{
    CompareEntry, CompareReport, EntryFailure, ScreenEntry, ScreenReport, Screener,
    ScreenerConfig,
};
pub use throttle::{BackoffPolicy, RateGate, RateQuota};
