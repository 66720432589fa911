#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter driving zone dataset augmentation and prediction checks.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

use crate::{
    commands::{AugmentArgs, ClampArgs, EvaluateArgs, PairsArgs, ValidateArgs},
    config::ForecastConfig,
};

/// Safe-zone dataset tooling.
#[derive(Debug, Parser)]
#[command(name = "zone-forecast", version)]
struct Cli {
    /// Optional TOML file overriding the schedule and generation defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extend a measured dataset with synthetic matches.
    Augment(AugmentArgs),
    /// Report matches whose zones escape their enclosing circle.
    Validate(ValidateArgs),
    /// Clamp a single predicted centre into the current zone.
    Clamp(ClampArgs),
    /// Export training pairs from a dataset.
    Pairs(PairsArgs),
    /// Score predictor output against a dataset.
    Evaluate(EvaluateArgs),
}

/// Entry point for the zone forecasting command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ForecastConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Augment(args) => commands::augment(&config, args),
        Command::Validate(args) => commands::validate(args),
        Command::Clamp(args) => commands::clamp_point(&config, args),
        Command::Pairs(args) => commands::pairs(args),
        Command::Evaluate(args) => commands::evaluate(&config, args),
    }
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
    fn parses_clamp_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "zone-forecast",
            "clamp",
            "--phase",
            "1",
            "--current-x",
            "-10",
            "--current-y",
            "0",
            "--pred-x",
            "200",
            "--pred-y",
            "-5.5",
        ])
        .expect("arguments parse");
        match cli.command {
            Command::Clamp(args) => {
                assert_eq!(args.current_x, -10.0);
                assert_eq!(args.pred_y, -5.5);
                assert_eq!(args.current_r, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_augment_overrides() {
        let cli = Cli::try_parse_from([
            "zone-forecast",
            "augment",
            "--count",
            "50",
            "--streams",
            "per-match",
            "--config",
            "zone.toml",
        ])
        .expect("arguments parse");
        assert_eq!(cli.config, Some(PathBuf::from("zone.toml")));
        match cli.command {
            Command::Augment(args) => {
                assert_eq!(args.count, Some(50));
                assert_eq!(args.streams, Some(commands::StreamArg::PerMatch));
                assert_eq!(args.input, PathBuf::from("zone_data.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
