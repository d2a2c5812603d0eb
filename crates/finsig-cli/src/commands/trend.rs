use finsig_analytics::indicators::IndicatorConfig;
use finsig_analytics::trend;
use finsig_core::EnvelopeError;
use serde_json::Value;

use crate::cli::SeriesArgs;
use crate::error::CliError;

use super::{load_series, skip_warnings, CommandResult};

pub fn run(args: &SeriesArgs) -> Result<CommandResult, CliError> {
    let series = load_series(&args.series)?;

    match trend::score(&series, &IndicatorConfig::default()) {
        Ok(score) => {
            let warnings = skip_warnings(score.skipped.iter().copied());
            let data = serde_json::to_value(&score)?;
            Ok(CommandResult::ok(data).with_warnings(warnings))
        }
        Err(error) => Ok(CommandResult::ok(Value::Null).with_errors(vec![
            EnvelopeError::new(error.code(), error.to_string())
                .for_symbol(series.symbol().as_str()),
        ])),
    }
}
