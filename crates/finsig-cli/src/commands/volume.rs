use finsig_analytics::volume::{self, VolumeConfig, VwapMode};
use finsig_core::EnvelopeError;
use serde_json::Value;

use crate::cli::{VolumeArgs, VwapModeArg};
use crate::error::CliError;

use super::{load_series, CommandResult};

pub fn run(args: &VolumeArgs) -> Result<CommandResult, CliError> {
    let series = load_series(&args.series)?;
    let config = VolumeConfig::default();
    let mode = match args.vwap {
        VwapModeArg::Session => VwapMode::Session,
        VwapModeArg::Rolling => VwapMode::Rolling,
        VwapModeArg::Anchored => VwapMode::Anchored,
    };

    match volume::analyze(&series, mode, &config) {
        Ok(report) => {
            let warnings: Vec<String> = report
                .divergences
                .iter()
                .map(|divergence| {
                    format!(
                        "{} divergence on {:?}",
                        divergence.indicator, divergence.kind
                    )
                })
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
