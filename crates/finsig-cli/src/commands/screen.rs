use std::time::Duration;

use finsig_analytics::screen::ScreenCriteria;
use finsig_core::{EnvelopeError, Symbol};
use finsig_screener::{ScreenEntry, Screener, ScreenerConfig, StaticSeriesProvider};

use crate::cli::ScreenArgs;
use crate::error::CliError;

use super::{load_series_list, CommandResult};

pub async fn run(args: &ScreenArgs) -> Result<CommandResult, CliError> {
    let universe = load_series_list(&args.series)?;
    if universe.is_empty() {
        return Err(CliError::Command(String::from(
            "series file contains no price series",
        )));
    }

    let symbols: Vec<Symbol> = if args.symbols.is_empty() {
        universe.iter().map(|series| series.symbol().clone()).collect()
    } else {
        args.symbols
            .iter()
            .map(|raw| Symbol::parse(raw))
            .collect::<Result<_, _>>()?
    };

    let criteria = ScreenCriteria {
        rsi_below: args.rsi_below,
        rsi_above: args.rsi_above,
        above_sma50: args.above_sma50,
        macd_bullish: args.macd_bullish,
    };

    let config = ScreenerConfig {
        max_concurrency: args.max_concurrency,
        per_symbol_timeout: Duration::from_secs(args.timeout_secs),
        ..ScreenerConfig::default()
    };
    let screener = Screener::new(StaticSeriesProvider::new(universe), config);
    let report = screener.screen(symbols, criteria).await;

    let errors: Vec<EnvelopeError> = report
        .entries
        .iter()
        .filter_map(|entry| match entry {
            ScreenEntry::Failed { symbol, failure } => Some(
                EnvelopeError::new(failure.code.clone(), failure.message.clone())
                    .retryable(failure.retryable)
                    .for_symbol(symbol.as_str()),
            ),
            ScreenEntry::Scored { .. } => None,
        })
        .collect();

    let data = serde_json::to_value(&report)?;
    Ok(CommandResult::ok(data).with_errors(errors))
}
