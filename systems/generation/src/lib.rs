#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic synthetic match generation.
//!
//! A synthetic match starts from a uniformly drawn phase-one centre and
//! random-walks through the schedule: each transition picks a uniform heading
//! and a Beta-distributed fraction of the containment allowance. Most drifts
//! are small while a long tail reaches the full allowance. Generated centres
//! are rounded to two decimals before validation, and any match that fails
//! validation is discarded without retrying its number.

use std::f64::consts::TAU;
use std::ops::Range;

use rand::Rng;
use rand_distr::{Beta, Distribution};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zone_forecast_core::{
    Circle, ConfigurationError, MatchId, MatchSequence, Phase, Point, ZoneError, ZoneSchedule,
};
use zone_forecast_system_validation::SequenceValidator;

mod streams;

/// Shape parameters of the Beta distribution governing centre drift.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftTuning {
    /// First shape parameter; values below one concentrate mass near zero drift.
    pub alpha: f64,
    /// Second shape parameter; larger values shorten the tail toward full drift.
    pub beta: f64,
}

impl Default for ShiftTuning {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 2.0,
        }
    }
}

/// How random streams are assigned to matches within a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamMode {
    /// One generator threaded through every match in number order.
    #[default]
    Sequential,
    /// One independently seeded generator per match number, generated in parallel.
    PerMatch,
}

/// Parameters of a synthetic generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of match numbers to attempt.
    pub count: u32,
    /// Seed of the run's random streams.
    pub seed: u64,
    /// First match number used when no existing identifier carries a number.
    pub fallback_start: u32,
    /// Stream assignment strategy.
    pub streams: StreamMode,
    /// Drift distribution parameters.
    pub shift: ShiftTuning,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            count: 2_000,
            seed: 42,
            fallback_start: 7,
            streams: StreamMode::Sequential,
            shift: ShiftTuning::default(),
        }
    }
}

/// Draws synthetic match sequences over a zone schedule.
#[derive(Debug)]
pub struct SyntheticMatchGenerator<'a> {
    schedule: &'a ZoneSchedule,
    shift: Beta<f64>,
}

impl<'a> SyntheticMatchGenerator<'a> {
    /// Creates a generator, rejecting shift parameters the Beta distribution cannot use.
    pub fn new(schedule: &'a ZoneSchedule, tuning: ShiftTuning) -> Result<Self, ZoneError> {
        let shift = Beta::new(tuning.alpha, tuning.beta).map_err(|_| {
            ConfigurationError::InvalidShiftDistribution {
                alpha: tuning.alpha.to_string(),
                beta: tuning.beta.to_string(),
            }
        })?;
        Ok(Self { schedule, shift })
    }

    /// Generates one match, advancing `rng` by every draw it makes.
    ///
    /// Draw order is fixed: phase-one x, phase-one y, then heading and drift
    /// fraction for each transition.
    pub fn generate<R: Rng>(
        &self,
        match_id: MatchId,
        rng: &mut R,
    ) -> Result<MatchSequence, ZoneError> {
        let bounds = self.schedule.valid_center_bounds(Phase::FIRST)?;
        let mut center = Point::new(
            sample_span(rng, bounds.x_min, bounds.x_max),
            sample_span(rng, bounds.y_min, bounds.y_max),
        );

        let last_phase = self.schedule.last_phase();
        let mut circles = Vec::with_capacity(self.schedule.phase_count() as usize);
        for phase in self.schedule.phases() {
            let radius = self.schedule.radius(phase)?;
            circles.push(Circle::new(
                match_id.clone(),
                phase,
                center.rounded_to_cents(),
                radius,
            ));

            if phase < last_phase {
                let max_offset = self.schedule.max_offset(phase)?;
                let angle = rng.gen_range(0.0..TAU);
                let fraction = self.shift.sample(rng);
                center = shift_center(center, max_offset, fraction, angle);
            }
        }

        MatchSequence::new(circles)
    }
}

/// Moves `center` by `fraction` of `max_offset` along `angle` radians.
///
/// The walk continues from the unrounded centre; only emitted circles are rounded.
#[must_use]
pub fn shift_center(center: Point, max_offset: f64, fraction: f64, angle: f64) -> Point {
    center.offset_polar(fraction * max_offset, angle)
}

fn sample_span<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Counters describing the outcome of a generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Match numbers attempted.
    pub requested: u32,
    /// Matches that satisfied containment.
    pub accepted: u32,
    /// Matches discarded for violating containment.
    pub rejected: u32,
}

/// Accepted sequences of a run together with its counters.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRun {
    sequences: Vec<MatchSequence>,
    report: GenerationReport,
}

impl GenerationRun {
    /// Accepted sequences in match-number order.
    #[must_use]
    pub fn sequences(&self) -> &[MatchSequence] {
        &self.sequences
    }

    /// Counters of the run.
    #[must_use]
    pub const fn report(&self) -> GenerationReport {
        self.report
    }

    /// Consumes the run, yielding the accepted sequences.
    #[must_use]
    pub fn into_sequences(self) -> Vec<MatchSequence> {
        self.sequences
    }
}

/// Generates `config.count` matches numbered from `first_number`, keeping only valid ones.
pub fn run(
    schedule: &ZoneSchedule,
    config: &GenerationConfig,
    first_number: u32,
) -> Result<GenerationRun, ZoneError> {
    let numbers = match_numbers(first_number, config.count)?;
    let generator = SyntheticMatchGenerator::new(schedule, config.shift)?;

    let candidates = match config.streams {
        StreamMode::Sequential => {
            let mut rng = streams::sequential_stream(config.seed);
            numbers
                .map(|number| generator.generate(MatchId::synthetic(number), &mut rng))
                .collect::<Result<Vec<_>, _>>()?
        }
        StreamMode::PerMatch => numbers
            .into_par_iter()
            .map(|number| {
                let mut rng = streams::match_stream(config.seed, number);
                generator.generate(MatchId::synthetic(number), &mut rng)
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    let validator = SequenceValidator::new();
    let mut sequences = Vec::with_capacity(candidates.len());
    let mut rejected = 0u32;
    for candidate in candidates {
        match validator.first_violation(&candidate) {
            None => sequences.push(candidate),
            Some(violation) => {
                rejected += 1;
                debug!(
                    match_id = %candidate.match_id(),
                    phase = violation.phase.get(),
                    excess = violation.excess(),
                    "discarding synthetic match that escapes its enclosing zone"
                );
            }
        }
    }

    let report = GenerationReport {
        requested: config.count,
        accepted: sequences.len() as u32,
        rejected,
    };
    info!(
        first_number,
        requested = report.requested,
        accepted = report.accepted,
        rejected = report.rejected,
        "synthetic generation finished"
    );

    Ok(GenerationRun { sequences, report })
}

fn match_numbers(first_number: u32, count: u32) -> Result<Range<u32>, ZoneError> {
    let end = first_number
        .checked_add(count)
        .ok_or(ConfigurationError::MatchNumberOverflow {
            first: first_number,
            count,
        })?;
    Ok(first_number..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use zone_forecast_core::geometry::distance;

    #[test]
    fn full_drift_at_zero_heading_reaches_allowance() {
        let center = shift_center(Point::new(600.0, 550.0), 136.0, 1.0, 0.0);
        assert_eq!(center, Point::new(736.0, 550.0));
        assert!(distance(Point::new(600.0, 550.0), center) <= 136.0 + 1e-6);
    }

    #[test]
    fn zero_drift_keeps_center() {
        let start = Point::new(421.37, 377.5);
        assert_eq!(shift_center(start, 63.0, 0.0, 2.1), start);
    }

    #[test]
    fn rejects_invalid_shift_parameters() {
        let schedule = ZoneSchedule::default();
        let error = SyntheticMatchGenerator::new(
            &schedule,
            ShiftTuning {
                alpha: 0.0,
                beta: 2.0,
            },
        )
        .expect_err("zero alpha is not a valid beta shape");
        assert!(matches!(
            error,
            ZoneError::Configuration(ConfigurationError::InvalidShiftDistribution { .. })
        ));
    }

    #[test]
    fn generated_match_follows_schedule() {
        let schedule = ZoneSchedule::default();
        let generator =
            SyntheticMatchGenerator::new(&schedule, ShiftTuning::default()).expect("generator");
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let sequence = generator
            .generate(MatchId::synthetic(31), &mut rng)
            .expect("sequence");

        assert_eq!(sequence.match_id().as_str(), "mac0031");
        let radii: Vec<u32> = sequence.circles().iter().map(Circle::radius).collect();
        assert_eq!(radii, vec![298, 162, 99, 48]);

        let bounds = schedule.valid_center_bounds(Phase::FIRST).expect("bounds");
        assert!(bounds.contains(sequence.circles()[0].center()));
        for circle in sequence.circles() {
            let center = circle.center();
            assert_eq!(center.x(), (center.x() * 100.0).round() / 100.0);
            assert_eq!(center.y(), (center.y() * 100.0).round() / 100.0);
        }
    }

    #[test]
    fn overflowing_numbering_is_rejected() {
        let config = GenerationConfig {
            count: 10,
            ..GenerationConfig::default()
        };
        let error = run(&ZoneSchedule::default(), &config, u32::MAX - 3)
            .expect_err("numbering overflows");
        assert_eq!(
            error,
            ZoneError::Configuration(ConfigurationError::MatchNumberOverflow {
                first: u32::MAX - 3,
                count: 10,
            })
        );
    }

    #[test]
    fn single_point_bounds_do_not_sample() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(sample_span(&mut rng, 50.0, 50.0), 50.0);
    }
}
