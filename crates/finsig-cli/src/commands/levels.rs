use finsig_analytics::levels::{self, LevelConfig};
use finsig_core::EnvelopeError;
use serde_json::Value;

use crate::cli::SeriesArgs;
use crate::error::CliError;

use super::{load_series, CommandResult};

pub fn run(args: &SeriesArgs) -> Result<CommandResult, CliError> {
    let series = load_series(&args.series)?;

    match levels::detect(&series, &LevelConfig::default()) {
        Ok(report) => {
            let data = serde_json::to_value(&report)?;
            Ok(CommandResult::ok(data))
        }
        Err(error) => Ok(CommandResult::ok(Value::Null).with_errors(vec![
            EnvelopeError::new(error.code(), error.to_string())
                .for_symbol(series.symbol().as_str()),
        ])),
    }
}
