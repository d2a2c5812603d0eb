//! Pure screening evaluation: criteria checked against one price series,
//! AND-combined. Fan-out over many symbols lives in the screener crate.

use serde::{Deserialize, Serialize};

use finsig_core::PriceSeries;

use crate::error::{require_history, AnalyticsError};
use crate::indicators::{self, IndicatorConfig};
use crate::signal::{MomentumSignal, TrendSignal};
use crate::stats::mean;

/// Screening criteria; unset fields do not constrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_below: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_above: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub above_sma50: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_bullish: Option<bool>,
}

impl ScreenCriteria {
    pub fn is_empty(&self) -> bool {
        self.rsi_below.is_none()
            && self.rsi_above.is_none()
            && self.above_sma50.is_none()
            && self.macd_bullish.is_none()
    }
}

/// Screening verdict for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolScreen {
    pub close: f64,
    pub rsi: f64,
    pub rsi_signal: MomentumSignal,
    pub macd_trend: TrendSignal,
    pub above_sma50: Option<bool>,
    /// Names of criteria that held, in declaration order.
    pub matched: Vec<&'static str>,
    pub passed: bool,
}

/// Evaluates every set criterion against the series; all must hold.
///
/// A constraint on SMA50 with fewer than 50 bars fails that criterion
/// rather than erroring, matching the skip-and-annotate composite policy.
pub fn evaluate(
    series: &PriceSeries,
    criteria: &ScreenCriteria,
    config: &IndicatorConfig,
) -> Result<SymbolScreen, AnalyticsError> {
    let minimum = config.macd_slow.max(config.rsi_window + 1);
    require_history(minimum, series.len())?;

    let closes = series.closes();
    let close = closes[closes.len() - 1];

    let rsi_series = indicators::rsi(&closes, config.rsi_window)?;
    let rsi = rsi_series[rsi_series.len() - 1];
    let rsi_signal = if rsi > config.rsi_overbought {
        MomentumSignal::Overbought
    } else if rsi < config.rsi_oversold {
        MomentumSignal::Oversold
    } else {
        MomentumSignal::Neutral
    };

    let macd = indicators::macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal)?;
    let macd_now = macd.macd[macd.macd.len() - 1];
    let signal_now = macd.signal[macd.signal.len() - 1];
    let macd_trend = if macd_now > signal_now {
        TrendSignal::Bullish
    } else if macd_now < signal_now {
        TrendSignal::Bearish
    } else {
        TrendSignal::Neutral
    };

    let above_sma50 = if closes.len() >= config.medium_ma_window {
        Some(close > mean(&closes[closes.len() - config.medium_ma_window..]))
    } else {
        None
    };

    let mut matched = Vec::new();
    let mut passed = true;

    if let Some(ceiling) = criteria.rsi_below {
        if rsi < ceiling {
            matched.push("rsi_below");
        } else {
            passed = false;
        }
    }
    if let Some(floor) = criteria.rsi_above {
        if rsi > floor {
            matched.push("rsi_above");
        } else {
            passed = false;
        }
    }
    if let Some(wanted) = criteria.above_sma50 {
        match above_sma50 {
            Some(actual) if actual == wanted => matched.push("above_sma50"),
            _ => passed = false,
        }
    }
    if let Some(wanted) = criteria.macd_bullish {
        let bullish = macd_trend == TrendSignal::Bullish;
        if bullish == wanted {
            matched.push("macd_bullish");
        } else {
            passed = false;
        }
    }

    Ok(SymbolScreen {
        close,
        rsi,
        rsi_signal,
        macd_trend,
        above_sma50,
        matched,
        passed,
    })
}
