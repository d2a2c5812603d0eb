use serde::{Deserialize, Serialize};

use crate::{Interval, Symbol, UtcDateTime, ValidationError};

/// Single OHLCV observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceBar")]
pub struct PriceBar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Deserialize)]
struct RawPriceBar {
    ts: UtcDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl TryFrom<RawPriceBar> for PriceBar {
    type Error = ValidationError;

    fn try_from(raw: RawPriceBar) -> Result<Self, Self::Error> {
        Self::new(raw.ts, raw.open, raw.high, raw.low, raw.close, raw.volume)
    }
}

impl PriceBar {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// (High + Low + Close) / 3, the price used for volume-weighted analytics.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Ordered OHLCV series for one symbol.
///
/// Timestamps are strictly increasing; gaps are tolerated. All analytics
/// operate on an immutable borrowed view of the bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceSeries")]
pub struct PriceSeries {
    symbol: Symbol,
    interval: Interval,
    bars: Vec<PriceBar>,
}

#[derive(Debug, Deserialize)]
struct RawPriceSeries {
    symbol: Symbol,
    interval: Interval,
    bars: Vec<PriceBar>,
}

impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = ValidationError;

    fn try_from(raw: RawPriceSeries) -> Result<Self, Self::Error> {
        Self::new(raw.symbol, raw.interval, raw.bars)
    }
}

impl PriceSeries {
    pub fn new(
        symbol: Symbol,
        interval: Interval,
        bars: Vec<PriceBar>,
    ) -> Result<Self, ValidationError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].ts <= pair[0].ts {
                return Err(ValidationError::NonMonotonicTimestamps { index: index + 1 });
            }
        }

        Ok(Self {
            symbol,
            interval,
            bars,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn typical_prices(&self) -> Vec<f64> {
        self.bars.iter().map(PriceBar::typical_price).collect()
    }

    /// Sub-series over a bar range, revalidation-free since order is preserved.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            interval: self.interval,
            bars: self.bars[start..end].to_vec(),
        }
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: &str, close: f64) -> PriceBar {
        let ts = UtcDateTime::parse(ts).expect("timestamp");
        PriceBar::new(ts, close, close + 1.0, close - 1.0, close, 1_000).expect("bar")
    }

    #[test]
    fn rejects_invalid_bar_bounds() {
        let ts = UtcDateTime::parse("2024-01-01T00:00:00Z").expect("timestamp");
        let err = PriceBar::new(ts, 10.0, 12.0, 9.0, 12.5, 10).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarBounds));
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let bars = vec![bar("2024-01-02T00:00:00Z", 10.0), bar("2024-01-02T00:00:00Z", 11.0)];
        let err = PriceSeries::new(symbol, Interval::OneDay, bars).expect_err("must fail");
        assert!(matches!(err, ValidationError::NonMonotonicTimestamps { index: 1 }));
    }

    #[test]
    fn computes_typical_price() {
        let series_bar = bar("2024-01-02T00:00:00Z", 10.0);
        assert!((series_bar.typical_price() - 10.0).abs() < 1e-12);
    }
}
