use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use tracing::{info, warn};
use zone_forecast_core::{next_free_match_number, MatchId, MatchSequence, Phase, Point};
use zone_forecast_dataset::{
    group_sequences, match_ids, read_predictions, read_rows, rows_from_sequences, write_records,
    write_rows,
};
use zone_forecast_system_analytics::{
    align_predictions,
    metrics::{cross_validate, diagnose, MeanStd, PredictionDiagnostics},
    training_pairs, AugmentationSummary, TrainingPairRecord,
};
use zone_forecast_system_clamp::clamp;
use zone_forecast_system_generation::{self as generation, StreamMode};
use zone_forecast_system_validation::SequenceValidator;

use crate::config::ForecastConfig;

/// Random stream assignment selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum StreamArg {
    /// One generator shared by every match.
    Sequential,
    /// One derived generator per match, generated in parallel.
    PerMatch,
}

impl From<StreamArg> for StreamMode {
    fn from(value: StreamArg) -> Self {
        match value {
            StreamArg::Sequential => Self::Sequential,
            StreamArg::PerMatch => Self::PerMatch,
        }
    }
}

/// Arguments of the `augment` subcommand.
#[derive(Debug, Args)]
pub(crate) struct AugmentArgs {
    /// Measured dataset to extend.
    #[arg(long, default_value = "zone_data.csv")]
    pub(crate) input: PathBuf,
    /// Destination of the combined dataset.
    #[arg(long, default_value = "data_augmented.csv")]
    pub(crate) output: PathBuf,
    /// Number of synthetic match numbers to attempt.
    #[arg(long)]
    pub(crate) count: Option<u32>,
    /// Seed of the random streams.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Random stream assignment.
    #[arg(long, value_enum)]
    pub(crate) streams: Option<StreamArg>,
}

/// Arguments of the `validate` subcommand.
#[derive(Debug, Args)]
pub(crate) struct ValidateArgs {
    /// Dataset to check.
    #[arg(long, default_value = "data_augmented.csv")]
    pub(crate) input: PathBuf,
}

/// Arguments of the `clamp` subcommand.
#[derive(Debug, Args)]
pub(crate) struct ClampArgs {
    /// Current phase.
    #[arg(long)]
    pub(crate) phase: u32,
    /// Current centre, horizontal.
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) current_x: f64,
    /// Current centre, vertical.
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) current_y: f64,
    /// Current radius; defaults to the schedule radius of `phase`.
    #[arg(long)]
    pub(crate) current_r: Option<u32>,
    /// Predicted next centre, horizontal.
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) pred_x: f64,
    /// Predicted next centre, vertical.
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) pred_y: f64,
}

/// Arguments of the `pairs` subcommand.
#[derive(Debug, Args)]
pub(crate) struct PairsArgs {
    /// Dataset to convert.
    #[arg(long, default_value = "data_augmented.csv")]
    pub(crate) input: PathBuf,
    /// Destination of the training pairs.
    #[arg(long, default_value = "training_pairs.csv")]
    pub(crate) output: PathBuf,
}

/// Arguments of the `evaluate` subcommand.
#[derive(Debug, Args)]
pub(crate) struct EvaluateArgs {
    /// Dataset the predictions were made on.
    #[arg(long, default_value = "data_augmented.csv")]
    pub(crate) input: PathBuf,
    /// Predictor output with `Match_ID,Phase,Pred_X,Pred_Y` columns.
    #[arg(long)]
    pub(crate) predictions: PathBuf,
    /// Folds of the grouped split used for per-fold scores.
    #[arg(long, default_value_t = 5)]
    pub(crate) folds: usize,
}

/// Extends a measured dataset with validated synthetic matches.
pub(crate) fn augment(config: &ForecastConfig, args: &AugmentArgs) -> Result<()> {
    let schedule = config.schedule()?;
    let mut settings = config.generation.clone();
    if let Some(count) = args.count {
        settings.count = count;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(streams) = args.streams {
        settings.streams = streams.into();
    }

    let real_rows = read_rows(&args.input).context("failed to load measured dataset")?;
    let real_ids = match_ids(&real_rows);
    info!(
        rows = real_rows.len(),
        matches = real_ids.len(),
        "loaded measured dataset"
    );

    let first_number = next_free_match_number(&real_ids, settings.fallback_start);
    let outcome = generation::run(&schedule, &settings, first_number)
        .context("synthetic generation failed")?;
    let report = outcome.report();
    if report.rejected > 0 {
        warn!(
            rejected = report.rejected,
            "synthetic matches skipped for escaping their enclosing zone"
        );
    }
    log_summary(outcome.sequences());

    let synthetic_rows = rows_from_sequences(outcome.sequences());
    let synthetic_count = synthetic_rows.len();
    let mut combined = real_rows;
    combined.extend(synthetic_rows);
    write_rows(&args.output, &combined).context("failed to store augmented dataset")?;

    println!(
        "synthetic: {synthetic_count} rows ({} matches, {} rejected)",
        report.accepted, report.rejected
    );
    println!(
        "total: {} rows ({} matches) -> {}",
        combined.len(),
        real_ids.len() + report.accepted as usize,
        args.output.display()
    );
    Ok(())
}

fn log_summary(sequences: &[MatchSequence]) {
    let summary = AugmentationSummary::from_sequences(sequences);
    for (phase, radii) in &summary.radii_per_phase {
        info!(phase = phase.get(), radii = ?radii, "synthetic radii");
    }
    if let (Some(x), Some(y)) = (summary.first_phase_x, summary.first_phase_y) {
        info!(
            x_min = x.min,
            x_max = x.max,
            y_min = y.min,
            y_max = y.max,
            "synthetic phase-one centre range"
        );
    }
}

/// Reports every match whose circles break containment.
pub(crate) fn validate(args: &ValidateArgs) -> Result<()> {
    let rows = read_rows(&args.input).context("failed to load dataset")?;
    let sequences = group_sequences(&rows).context("dataset rows are malformed")?;
    let validator = SequenceValidator::new();

    let mut violations = 0usize;
    for sequence in &sequences {
        if let Some(violation) = validator.first_violation(sequence) {
            violations += 1;
            warn!(
                match_id = %sequence.match_id(),
                phase = violation.phase.get(),
                next_phase = violation.next_phase.get(),
                offset = violation.offset,
                allowed = violation.allowed,
                "zone escapes its enclosing circle"
            );
        }
    }

    println!(
        "{} matches checked, {violations} violate containment",
        sequences.len()
    );
    Ok(())
}

/// Clamps one predicted centre and prints `x,y,was_clamped`.
pub(crate) fn clamp_point(config: &ForecastConfig, args: &ClampArgs) -> Result<()> {
    let schedule = config.schedule()?;
    let phase = Phase::new(args.phase);
    let current_radius = match args.current_r {
        Some(radius) => radius,
        None => schedule.radius(phase)?,
    };
    let next_radius = schedule.next_radius_or_last(phase)?;

    let clamped = clamp(
        Point::new(args.pred_x, args.pred_y),
        Point::new(args.current_x, args.current_y),
        current_radius,
        next_radius,
    )?;
    println!("{},{},{}", clamped.x, clamped.y, clamped.was_clamped);
    Ok(())
}

/// Exports `(phase, x, y, r) -> (x, y)` training pairs.
pub(crate) fn pairs(args: &PairsArgs) -> Result<()> {
    let rows = read_rows(&args.input).context("failed to load dataset")?;
    let sequences = group_sequences(&rows).context("dataset rows are malformed")?;
    let pairs = training_pairs(&sequences);
    let records: Vec<TrainingPairRecord> = pairs.iter().map(TrainingPairRecord::from).collect();
    write_records(&args.output, &records).context("failed to store training pairs")?;

    println!(
        "{} training pairs ({} matches) -> {}",
        records.len(),
        sequences.len(),
        args.output.display()
    );
    Ok(())
}

/// Scores predictor output, overall and per grouped fold.
pub(crate) fn evaluate(config: &ForecastConfig, args: &EvaluateArgs) -> Result<()> {
    let schedule = config.schedule()?;
    let rows = read_rows(&args.input).context("failed to load dataset")?;
    let sequences = group_sequences(&rows).context("dataset rows are malformed")?;
    let pairs = training_pairs(&sequences);
    if pairs.is_empty() {
        bail!("{} holds no phase transitions to score", args.input.display());
    }

    let predictions = read_predictions(&args.predictions).context("failed to load predictions")?;
    let aligned = align_predictions(
        &pairs,
        predictions
            .iter()
            .map(|row| (MatchId::new(row.match_id.as_str()), Phase::new(row.phase), row.point())),
    )?;

    let overall = diagnose(&schedule, &pairs, &aligned)?;
    print_diagnostics("overall", &overall);

    if sequences.len() < args.folds {
        warn!(
            matches = sequences.len(),
            folds = args.folds,
            "too few matches for grouped cross-validation"
        );
        return Ok(());
    }

    let report = cross_validate(&schedule, &pairs, &aligned, args.folds)?;
    for (index, fold) in report.folds.iter().enumerate() {
        print_diagnostics(&format!("fold {}/{}", index + 1, args.folds), fold);
    }
    print_spread("MAE_X", report.mae_x);
    print_spread("MAE_Y", report.mae_y);
    print_spread("deviation", report.distance);
    print_spread("clamped deviation", report.clamped_distance);
    Ok(())
}

fn print_diagnostics(label: &str, diagnostics: &PredictionDiagnostics) {
    println!(
        "{label}: MAE_X={:.1}px MAE_Y={:.1}px deviation={:.1}px clamped={:.1}px \
         [{} samples, {} clamped]",
        diagnostics.mae_x,
        diagnostics.mae_y,
        diagnostics.mean_distance,
        diagnostics.clamped_mean_distance,
        diagnostics.samples,
        diagnostics.clamped_count
    );
}

fn print_spread(label: &str, spread: MeanStd) {
    println!("{label}: {:.1} ± {:.1} px", spread.mean, spread.std);
}
