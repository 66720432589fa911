#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Training-set analytics built on top of zone sequences.
//!
//! Turns match sequences into `(phase, x, y, r) -> (x, y)` training pairs,
//! splits them into match-grouped folds, and scores opaque predictor output
//! both raw and after the boundary clamp.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zone_forecast_core::{MatchId, MatchSequence, Phase, Point, ZoneError};

mod folds;
pub mod metrics;

pub use folds::{group_k_fold, Fold};

/// Errors raised by analytics passes.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AnalyticsError {
    /// Fewer than two folds were requested.
    #[error("grouped cross-validation needs at least 2 folds, got {0}")]
    TooFewFolds(usize),
    /// There are fewer distinct matches than folds.
    #[error("cannot split {groups} matches into {folds} folds")]
    TooFewGroups {
        /// Distinct matches available.
        groups: usize,
        /// Folds requested.
        folds: usize,
    },
    /// A training pair had no matching prediction.
    #[error("no prediction for match {match_id} phase {phase}")]
    MissingPrediction {
        /// Match of the unmatched pair.
        match_id: MatchId,
        /// Current phase of the unmatched pair.
        phase: Phase,
    },
    /// Geometry or schedule lookups failed.
    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// Model input describing the current circle: `(phase, x, y, r)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Current phase.
    pub phase: Phase,
    /// Current centre.
    pub center: Point,
    /// Current radius.
    pub radius: u32,
}

/// One supervised example: the current circle and the next centre.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingPair {
    /// Match the example comes from, used as its cross-validation group.
    pub group: MatchId,
    /// Model input.
    pub features: FeatureRow,
    /// Centre of the following phase.
    pub target: Point,
}

/// Flat CSV record of a training pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingPairRecord {
    /// Match identifier.
    #[serde(rename = "Match_ID")]
    pub match_id: String,
    /// Current phase.
    #[serde(rename = "Phase")]
    pub phase: u32,
    /// Current horizontal centre.
    #[serde(rename = "Current_X")]
    pub current_x: f64,
    /// Current vertical centre.
    #[serde(rename = "Current_Y")]
    pub current_y: f64,
    /// Current radius.
    #[serde(rename = "Current_R")]
    pub current_r: u32,
    /// Next horizontal centre.
    #[serde(rename = "Next_X")]
    pub next_x: f64,
    /// Next vertical centre.
    #[serde(rename = "Next_Y")]
    pub next_y: f64,
}

impl From<&TrainingPair> for TrainingPairRecord {
    fn from(pair: &TrainingPair) -> Self {
        Self {
            match_id: pair.group.to_string(),
            phase: pair.features.phase.get(),
            current_x: pair.features.center.x(),
            current_y: pair.features.center.y(),
            current_r: pair.features.radius,
            next_x: pair.target.x(),
            next_y: pair.target.y(),
        }
    }
}

/// Extracts one training pair per consecutive phase transition.
#[must_use]
pub fn training_pairs(sequences: &[MatchSequence]) -> Vec<TrainingPair> {
    sequences
        .iter()
        .flat_map(|sequence| {
            sequence.transitions().map(|(current, next)| TrainingPair {
                group: current.match_id().clone(),
                features: FeatureRow {
                    phase: current.phase(),
                    center: current.center(),
                    radius: current.radius(),
                },
                target: next.center(),
            })
        })
        .collect()
}

/// Orders `predictions` to line up with `pairs`, keyed by match and current phase.
pub fn align_predictions(
    pairs: &[TrainingPair],
    predictions: impl IntoIterator<Item = (MatchId, Phase, Point)>,
) -> Result<Vec<Point>, AnalyticsError> {
    let lookup: HashMap<(MatchId, Phase), Point> = predictions
        .into_iter()
        .map(|(match_id, phase, point)| ((match_id, phase), point))
        .collect();

    pairs
        .iter()
        .map(|pair| {
            lookup
                .get(&(pair.group.clone(), pair.features.phase))
                .copied()
                .ok_or_else(|| AnalyticsError::MissingPrediction {
                    match_id: pair.group.clone(),
                    phase: pair.features.phase,
                })
        })
        .collect()
}

/// Closed coordinate interval observed across a set of circles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    /// Smallest observed value.
    pub min: f64,
    /// Largest observed value.
    pub max: f64,
}

impl Span {
    fn include(span: Option<Self>, value: f64) -> Option<Self> {
        Some(match span {
            None => Self {
                min: value,
                max: value,
            },
            Some(span) => Self {
                min: span.min.min(value),
                max: span.max.max(value),
            },
        })
    }
}

/// Sanity summary of a synthetic dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AugmentationSummary {
    /// Distinct radii observed per phase.
    pub radii_per_phase: BTreeMap<Phase, BTreeSet<u32>>,
    /// Horizontal range of phase-one centres.
    pub first_phase_x: Option<Span>,
    /// Vertical range of phase-one centres.
    pub first_phase_y: Option<Span>,
}

impl AugmentationSummary {
    /// Summarises radii and phase-one placement across `sequences`.
    #[must_use]
    pub fn from_sequences(sequences: &[MatchSequence]) -> Self {
        let mut summary = Self::default();
        for circle in sequences.iter().flat_map(MatchSequence::circles) {
            let _ = summary
                .radii_per_phase
                .entry(circle.phase())
                .or_default()
                .insert(circle.radius());

            if circle.phase() == Phase::FIRST {
                summary.first_phase_x = Span::include(summary.first_phase_x, circle.center().x());
                summary.first_phase_y = Span::include(summary.first_phase_y, circle.center().y());
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_forecast_core::Circle;

    fn sequence(id: &str, centers: &[(f64, f64)]) -> MatchSequence {
        let radii = [298, 162, 99, 48];
        let circles = centers
            .iter()
            .enumerate()
            .map(|(index, &(x, y))| {
                Circle::new(
                    MatchId::new(id),
                    Phase::new(index as u32 + 1),
                    Point::new(x, y),
                    radii[index],
                )
            })
            .collect();
        MatchSequence::new(circles).expect("sequence")
    }

    #[test]
    fn pairs_follow_each_transition() {
        let sequences = vec![
            sequence("mac0001", &[(600.0, 550.0), (620.0, 560.0), (630.0, 565.0)]),
            sequence("mac0002", &[(400.0, 400.0), (410.0, 390.0)]),
        ];
        let pairs = training_pairs(&sequences);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[1].group, MatchId::new("mac0001"));
        assert_eq!(pairs[1].features.phase, Phase::new(2));
        assert_eq!(pairs[1].features.radius, 162);
        assert_eq!(pairs[1].target, Point::new(630.0, 565.0));

        let record = TrainingPairRecord::from(&pairs[2]);
        assert_eq!(record.match_id, "mac0002");
        assert_eq!((record.next_x, record.next_y), (410.0, 390.0));
    }

    #[test]
    fn predictions_align_by_match_and_phase() {
        let sequences = vec![sequence(
            "mac0001",
            &[(600.0, 550.0), (620.0, 560.0), (630.0, 565.0)],
        )];
        let pairs = training_pairs(&sequences);
        let predictions = vec![
            (MatchId::new("mac0001"), Phase::new(2), Point::new(2.0, 2.0)),
            (MatchId::new("mac0001"), Phase::new(1), Point::new(1.0, 1.0)),
        ];
        let aligned = align_predictions(&pairs, predictions).expect("aligned");
        assert_eq!(aligned, vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]);

        let missing = align_predictions(&pairs, Vec::<(MatchId, Phase, Point)>::new())
            .expect_err("missing");
        assert_eq!(
            missing,
            AnalyticsError::MissingPrediction {
                match_id: MatchId::new("mac0001"),
                phase: Phase::new(1),
            }
        );
    }

    #[test]
    fn summary_collects_radii_and_first_phase_span() {
        let sequences = vec![
            sequence("mac0001", &[(600.0, 550.0), (620.0, 560.0)]),
            sequence("mac0002", &[(400.0, 700.0), (410.0, 690.0)]),
        ];
        let summary = AugmentationSummary::from_sequences(&sequences);
        assert_eq!(
            summary.radii_per_phase.get(&Phase::new(2)),
            Some(&BTreeSet::from([162]))
        );
        assert_eq!(
            summary.first_phase_x,
            Some(Span {
                min: 400.0,
                max: 600.0
            })
        );
        assert_eq!(
            summary.first_phase_y,
            Some(Span {
                min: 550.0,
                max: 700.0
            })
        );
    }
}
