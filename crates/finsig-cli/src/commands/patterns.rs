use finsig_analytics::patterns::{self, PatternConfig};
use finsig_core::EnvelopeError;
use serde_json::Value;

use crate::cli::SeriesArgs;
use crate::error::CliError;

use super::{load_series, skip_warnings, CommandResult};

pub fn run(args: &SeriesArgs) -> Result<CommandResult, CliError> {
    let series = load_series(&args.series)?;

    match patterns::detect(&series, &PatternConfig::default()) {
        Ok(report) => {
            let warnings = skip_warnings(report.skipped.iter().copied());
            let data = serde_json::to_value(&report)?;
            Ok(CommandResult::ok(data).with_warnings(warnings))
        }
        Err(error) => Ok(CommandResult::ok(Value::Null).with_errors(vec![
            EnvelopeError::new(error.code(), error.to_string())
                .for_symbol(series.symbol().as_str()),
        ])),
    }
}
