use finsig_analytics::fundamentals::{self, TestOutcome};
use finsig_core::EnvelopeError;
use serde_json::json;

use crate::cli::FundamentalsArgs;
use crate::error::CliError;

use super::{load_statements, CommandResult};

pub fn run(args: &FundamentalsArgs) -> Result<CommandResult, CliError> {
    let statements = load_statements(&args.statements)?;
    let [current, prior, ..] = statements.as_slice() else {
        return Err(CliError::Command(String::from(
            "statements file must contain at least two periods, most recent first",
        )));
    };

    let piotroski = fundamentals::piotroski(current, prior);
    let warnings: Vec<String> = piotroski
        .tests
        .iter()
        .filter(|test| test.outcome == TestOutcome::Indeterminate)
        .map(|test| format!("piotroski test '{}' is indeterminate", test.name))
        .collect();

    let mut errors = Vec::new();
    let altman = match fundamentals::altman_z(current) {
        Ok(score) => Some(score),
        Err(error) => {
            errors.push(
                EnvelopeError::new(error.code(), error.to_string())
                    .for_symbol(current.symbol.as_str()),
            );
            None
        }
    };

    let data = json!({
        "symbol": current.symbol.as_str(),
        "period_end": current.period_end,
        "piotroski": piotroski,
        "altman": altman,
    });

    Ok(CommandResult::ok(data)
        .with_warnings(warnings)
        .with_errors(errors))
}
