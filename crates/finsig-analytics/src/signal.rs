//! Closed signal vocabularies shared across the analytics components.
//!
//! Every categorical output draws from one of these enums so callers can
//! match exhaustively instead of parsing prose.

use serde::{Deserialize, Serialize};

/// Oscillator reading relative to its overbought/oversold cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumSignal {
    Overbought,
    Oversold,
    Neutral,
}

/// Directional bias of a crossover-style indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignal {
    Bullish,
    Bearish,
    Neutral,
}

/// Price location relative to an upper/lower band pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    AboveUpper,
    Within,
    BelowLower,
}

/// Price posture against the key moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingAverageTrend {
    Bullish,
    Bearish,
    Mixed,
}

/// Direction of a cumulative money-flow line over the lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowTrend {
    Accumulation,
    Distribution,
}

/// Relative-volume bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeLevel {
    High,
    Normal,
    Low,
}

/// Direction of a relative-strength score over the trend lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthTrend {
    Improving,
    Deteriorating,
    Flat,
}

/// Discretized volatility regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityRegime {
    ExtremeLow,
    Low,
    Normal,
    High,
    ExtremeHigh,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&BandPosition::AboveUpper).expect("serialize");
        assert_eq!(json, "\"above_upper\"");
        let json = serde_json::to_string(&VolatilityRegime::ExtremeHigh).expect("serialize");
        assert_eq!(json, "\"extreme_high\"");
    }
}
