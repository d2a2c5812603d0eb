//! CLI argument definitions.
//!
//! Every command reads JSON input files (price series or statement
//! periods), runs the corresponding part of the signal engine and prints a
//! response envelope to stdout.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `analyze` | Momentum/trend indicator snapshot |
//! | `volume` | VWAP, profile, OBV/A-D, MFI, surges |
//! | `volatility` | ATR, HV, regime, Keltner, stops |
//! | `strength` | Relative strength vs. a benchmark |
//! | `fundamentals` | Piotroski F-Score and Altman Z |
//! | `levels` | Support/resistance levels |
//! | `patterns` | MA crosses, trends, consolidation |
//! | `trend` | Composite 0-100 trend strength |
//! | `screen` | Concurrent multi-symbol screen |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Quantitative market-signal engine over local JSON data.
#[derive(Debug, Parser)]
#[command(
    name = "finsig",
    author,
    version,
    about = "Quantitative market-signal engine",
    long_about = "finsig computes technical indicators, volume and volatility analytics, \
relative strength, fundamental scores, chart levels and screening reports from local JSON \
price-series and statement files, and prints machine-readable envelopes."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Indicator snapshot: RSI, MACD, Bollinger, moving averages, stochastic.
    Analyze(SeriesArgs),
    /// Volume analytics: VWAP, profile, OBV, A/D, MFI, surges, divergences.
    Volume(VolumeArgs),
    /// Volatility analytics: ATR, historical volatility, regime, Keltner, stops.
    Volatility(VolatilityArgs),
    /// Relative strength score against a benchmark series.
    Strength(StrengthArgs),
    /// Piotroski F-Score and Altman Z over statement periods.
    Fundamentals(FundamentalsArgs),
    /// Clustered support and resistance levels.
    Levels(SeriesArgs),
    /// Moving-average crosses, regression trends, consolidation.
    Patterns(SeriesArgs),
    /// Composite 0-100 trend-strength score.
    Trend(SeriesArgs),
    /// Screen many symbols concurrently against criteria.
    Screen(ScreenArgs),
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Path to a JSON price-series file.
    pub series: PathBuf,
}

#[derive(Debug, Args)]
pub struct VolumeArgs {
    /// Path to a JSON price-series file.
    pub series: PathBuf,

    /// VWAP accumulation policy.
    #[arg(long, value_enum, default_value_t = VwapModeArg::Session)]
    pub vwap: VwapModeArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VwapModeArg {
    Session,
    Rolling,
    Anchored,
}

#[derive(Debug, Args)]
pub struct VolatilityArgs {
    /// Path to a JSON price-series file.
    pub series: PathBuf,

    /// Optional benchmark series for beta.
    #[arg(long)]
    pub benchmark: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct StrengthArgs {
    /// Path to a JSON price-series file.
    pub series: PathBuf,

    /// Benchmark series the score is measured against.
    #[arg(long)]
    pub benchmark: PathBuf,
}

#[derive(Debug, Args)]
pub struct FundamentalsArgs {
    /// Path to a JSON array of statement periods, most recent first.
    pub statements: PathBuf,
}

#[derive(Debug, Args)]
pub struct ScreenArgs {
    /// Path to a JSON array of price series, one per symbol.
    pub series: PathBuf,

    /// Only screen these symbols (defaults to every series in the file).
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Pass only symbols with RSI strictly below this value.
    #[arg(long)]
    pub rsi_below: Option<f64>,

    /// Pass only symbols with RSI strictly above this value.
    #[arg(long)]
    pub rsi_above: Option<f64>,

    /// Require the close above (true) or below (false) the 50-bar SMA.
    #[arg(long)]
    pub above_sma50: Option<bool>,

    /// Require the MACD line above (true) or not above (false) its signal.
    #[arg(long)]
    pub macd_bullish: Option<bool>,

    /// Maximum concurrent symbol evaluations.
    #[arg(long, default_value_t = 4)]
    pub max_concurrency: usize,

    /// Per-symbol timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_screen_with_criteria() {
        let cli = Cli::try_parse_from([
            "finsig",
            "screen",
            "universe.json",
            "--symbols",
            "AAPL,MSFT",
            "--rsi-below",
            "30",
            "--macd-bullish",
            "true",
            "--strict",
        ])
        .expect("must parse");

        assert!(cli.strict);
        match cli.command {
            Command::Screen(args) => {
                assert_eq!(args.symbols, vec!["AAPL", "MSFT"]);
                assert_eq!(args.rsi_below, Some(30.0));
                assert_eq!(args.macd_bullish, Some(true));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
