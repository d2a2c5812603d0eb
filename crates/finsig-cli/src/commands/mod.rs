mod analyze;
mod fundamentals;
mod levels;
mod patterns;
mod screen;
mod strength;
mod trend;
mod volatility;
mod volume;

use std::path::Path;
use std::time::Instant;

use finsig_core::{Envelope, EnvelopeError, EnvelopeMeta, PriceSeries, StatementPeriod};
use serde_json::Value;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub const SCHEMA_VERSION: &str = "v1.0.0";

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Analyze(args) => analyze::run(args)?,
        Command::Volume(args) => volume::run(args)?,
        Command::Volatility(args) => volatility::run(args)?,
        Command::Strength(args) => strength::run(args)?,
        Command::Fundamentals(args) => fundamentals::run(args)?,
        Command::Levels(args) => levels::run(args)?,
        Command::Patterns(args) => patterns::run(args)?,
        Command::Trend(args) => trend::run(args)?,
        Command::Screen(args) => screen::run(args).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(Uuid::new_v4().to_string(), SCHEMA_VERSION, latency_ms)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    if errors.is_empty() {
        Ok(Envelope::success(meta, data))
    } else {
        Envelope::with_errors(meta, data, errors).map_err(CliError::from)
    }
}

/// Loads one validated price series from a JSON file.
pub(crate) fn load_series(path: &Path) -> Result<PriceSeries, CliError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|error| {
        CliError::Command(format!("invalid series file '{}': {error}", path.display()))
    })
}

/// Loads a JSON array of price series.
pub(crate) fn load_series_list(path: &Path) -> Result<Vec<PriceSeries>, CliError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|error| {
        CliError::Command(format!("invalid series file '{}': {error}", path.display()))
    })
}

/// Loads a JSON array of statement periods, most recent first.
pub(crate) fn load_statements(path: &Path) -> Result<Vec<StatementPeriod>, CliError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|error| {
        CliError::Command(format!(
            "invalid statements file '{}': {error}",
            path.display()
        ))
    })
}

/// Turns a sub-component skip list into envelope warnings.
pub(crate) fn skip_warnings(skipped: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    skipped
        .into_iter()
        .map(|name| format!("insufficient history for {}", name.into()))
        .collect()
}
