//! Core contracts for finsig.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Financial-statement snapshot types
//! - Response envelope and structured errors

pub mod domain;
pub mod envelope;
pub mod error;

pub use domain::{
    Interval, PriceBar, PriceSeries, StatementField, StatementPeriod, Symbol, UtcDateTime,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{CoreError, ValidationError};
