use finsig_analytics::volatility::{self, VolatilityConfig};
use finsig_core::EnvelopeError;
use serde_json::Value;

use crate::cli::VolatilityArgs;
use crate::error::CliError;

use super::{load_series, skip_warnings, CommandResult};

pub fn run(args: &VolatilityArgs) -> Result<CommandResult, CliError> {
    let series = load_series(&args.series)?;
    let benchmark = args
        .benchmark
        .as_deref()
        .map(load_series)
        .transpose()?;
    let config = VolatilityConfig::default();

    match volatility::snapshot(&series, benchmark.as_ref(), &config) {
        Ok(snapshot) => {
            let warnings = skip_warnings(snapshot.skipped.iter().cloned());
            let data = serde_json::to_value(&snapshot)?;
            Ok(CommandResult::ok(data).with_warnings(warnings))
        }
        Err(error) => Ok(CommandResult::ok(Value::Null).with_errors(vec![
            EnvelopeError::new(error.code(), error.to_string())
                .for_symbol(series.symbol().as_str()),
        ])),
    }
}
