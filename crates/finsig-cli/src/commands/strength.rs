use finsig_analytics::relative_strength::{self, StrengthConfig};
use finsig_core::EnvelopeError;
use serde_json::Value;

use crate::cli::StrengthArgs;
use crate::error::CliError;

use super::{load_series, CommandResult};

pub fn run(args: &StrengthArgs) -> Result<CommandResult, CliError> {
    let series = load_series(&args.series)?;
    let benchmark = load_series(&args.benchmark)?;
    let config = StrengthConfig::default();

    match relative_strength::relative_strength(&series, &benchmark, &config) {
        Ok(report) => {
            let warnings: Vec<String> = report
                .skipped_windows
                .iter()
                .map(|bars| format!("insufficient history for {bars}-bar window"))
                .collect();
            let data = serde_json::to_value(&report)?;
            Ok(CommandResult::ok(data).with_warnings(warnings))
        }
        Err(error) => Ok(CommandResult::ok(Value::Null).with_errors(vec![
            EnvelopeError::new(error.code(), error.to_string())
                .for_symbol(series.symbol().as_str()),
        ])),
    }
}
