//! Canonical domain models shared by every finsig crate.

mod interval;
mod series;
mod statements;
mod symbol;
mod timestamp;

pub use interval::Interval;
pub use series::{PriceBar, PriceSeries};
pub use statements::{StatementField, StatementPeriod};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
