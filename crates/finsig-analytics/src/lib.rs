//! Quantitative signal engine over validated price series and financial
//! statements: momentum and trend indicators, volume and volatility
//! analytics, relative strength, fundamental scores, support/resistance
//! levels, pattern detection and pure screening evaluation.
//!
//! Every operation returns `Result`; vector outputs are aligned to the
//! series tail, so `out[i]` corresponds to `input[i + (input_len - out_len)]`.
//! Composites degrade gracefully: a sub-component short on history is
//! skipped and annotated instead of failing the whole report.

pub mod error;
pub mod fundamentals;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod relative_strength;
pub mod screen;
pub mod signal;
pub(crate) mod stats;
pub mod trend;
pub mod volatility;
pub mod volume;

pub use error::AnalyticsError;
pub use indicators::{IndicatorConfig, IndicatorSnapshot};
pub use screen::{ScreenCriteria, SymbolScreen};
pub use signal::{
    BandPosition, FlowTrend, MomentumSignal, MovingAverageTrend, StrengthTrend, TrendSignal,
    VolatilityRegime, VolumeLevel,
};
