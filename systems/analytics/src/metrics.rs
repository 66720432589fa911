//! Error metrics for next-centre predictions.

use zone_forecast_core::{geometry::batch_distance, Point, ZoneSchedule};
use zone_forecast_system_clamp::clamp;

use crate::{group_k_fold, AnalyticsError, TrainingPair};

/// Error of a batch of predictions against the true next centres.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PredictionDiagnostics {
    /// Number of scored predictions.
    pub samples: usize,
    /// Mean absolute horizontal error in pixels.
    pub mae_x: f64,
    /// Mean absolute vertical error in pixels.
    pub mae_y: f64,
    /// Mean Euclidean deviation of the raw predictions.
    pub mean_distance: f64,
    /// Mean Euclidean deviation after clamping into the current zone.
    pub clamped_mean_distance: f64,
    /// Predictions the clamp had to move.
    pub clamped_count: usize,
}

/// Scores `predictions` against the targets of `pairs`, raw and clamped.
///
/// The clamp shrinks toward the radius of the following phase, reusing the
/// last radius for pairs that start in the final phase. Empty input yields
/// all-zero diagnostics.
pub fn diagnose(
    schedule: &ZoneSchedule,
    pairs: &[TrainingPair],
    predictions: &[Point],
) -> Result<PredictionDiagnostics, AnalyticsError> {
    let targets: Vec<Point> = pairs.iter().map(|pair| pair.target).collect();
    let distances = batch_distance(&targets, predictions)?;

    let mut clamped_points = Vec::with_capacity(pairs.len());
    let mut clamped_count = 0;
    for (pair, predicted) in pairs.iter().zip(predictions) {
        let next_radius = schedule.next_radius_or_last(pair.features.phase)?;
        let clamped = clamp(
            *predicted,
            pair.features.center,
            pair.features.radius,
            next_radius,
        )?;
        if clamped.was_clamped {
            clamped_count += 1;
        }
        clamped_points.push(clamped.point());
    }
    let clamped_distances = batch_distance(&targets, &clamped_points)?;

    let mae_x = mean(
        targets
            .iter()
            .zip(predictions)
            .map(|(target, predicted)| (target.x() - predicted.x()).abs()),
    );
    let mae_y = mean(
        targets
            .iter()
            .zip(predictions)
            .map(|(target, predicted)| (target.y() - predicted.y()).abs()),
    );

    Ok(PredictionDiagnostics {
        samples: pairs.len(),
        mae_x,
        mae_y,
        mean_distance: mean(distances.into_iter()),
        clamped_mean_distance: mean(clamped_distances.into_iter()),
        clamped_count,
    })
}

/// Mean and population standard deviation of a per-fold metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeanStd {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl MeanStd {
    fn from_values(values: &[f64]) -> Self {
        let mean = mean(values.iter().copied());
        let variance = self::mean(values.iter().map(|value| (value - mean).powi(2)));
        Self {
            mean,
            std: variance.sqrt(),
        }
    }
}

/// Per-fold diagnostics of a grouped cross-validation and their aggregate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CrossValidationReport {
    /// Diagnostics of each held-out fold, in fold order.
    pub folds: Vec<PredictionDiagnostics>,
    /// Horizontal error across folds.
    pub mae_x: MeanStd,
    /// Vertical error across folds.
    pub mae_y: MeanStd,
    /// Raw deviation across folds.
    pub distance: MeanStd,
    /// Clamped deviation across folds.
    pub clamped_distance: MeanStd,
}

/// Scores out-of-fold `predictions` fold by fold using a grouped split of `pairs`.
pub fn cross_validate(
    schedule: &ZoneSchedule,
    pairs: &[TrainingPair],
    predictions: &[Point],
    folds: usize,
) -> Result<CrossValidationReport, AnalyticsError> {
    if pairs.len() != predictions.len() {
        return Err(zone_forecast_core::ZoneError::Shape {
            left: pairs.len(),
            right: predictions.len(),
        }
        .into());
    }

    let groups: Vec<_> = pairs.iter().map(|pair| pair.group.clone()).collect();
    let splits = group_k_fold(&groups, folds)?;

    let mut per_fold = Vec::with_capacity(splits.len());
    for split in &splits {
        let fold_pairs: Vec<TrainingPair> =
            split.test.iter().map(|&index| pairs[index].clone()).collect();
        let fold_predictions: Vec<Point> =
            split.test.iter().map(|&index| predictions[index]).collect();
        per_fold.push(diagnose(schedule, &fold_pairs, &fold_predictions)?);
    }

    let column = |metric: fn(&PredictionDiagnostics) -> f64| -> MeanStd {
        let values: Vec<f64> = per_fold.iter().map(metric).collect();
        MeanStd::from_values(&values)
    };

    Ok(CrossValidationReport {
        mae_x: column(|diagnostics| diagnostics.mae_x),
        mae_y: column(|diagnostics| diagnostics.mae_y),
        distance: column(|diagnostics| diagnostics.mean_distance),
        clamped_distance: column(|diagnostics| diagnostics.clamped_mean_distance),
        folds: per_fold,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureRow;
    use zone_forecast_core::{MatchId, Phase};

    fn pair(
        id: &str,
        phase: u32,
        center: (f64, f64),
        radius: u32,
        target: (f64, f64),
    ) -> TrainingPair {
        TrainingPair {
            group: MatchId::new(id),
            features: FeatureRow {
                phase: Phase::new(phase),
                center: Point::new(center.0, center.1),
                radius,
            },
            target: Point::new(target.0, target.1),
        }
    }

    #[test]
    fn perfect_predictions_score_zero() {
        let pairs = vec![
            pair("mac0001", 1, (0.0, 0.0), 298, (100.0, 0.0)),
            pair("mac0001", 2, (100.0, 0.0), 162, (100.0, 50.0)),
        ];
        let predictions = vec![Point::new(100.0, 0.0), Point::new(100.0, 50.0)];
        let diagnostics =
            diagnose(&ZoneSchedule::default(), &pairs, &predictions).expect("diagnostics");
        assert_eq!(diagnostics.samples, 2);
        assert_eq!(diagnostics.mae_x, 0.0);
        assert_eq!(diagnostics.mean_distance, 0.0);
        assert_eq!(diagnostics.clamped_count, 0);
    }

    #[test]
    fn clamping_reduces_deviation_of_escaping_predictions() {
        let pairs = vec![pair("mac0001", 1, (0.0, 0.0), 298, (130.0, 0.0))];
        let predictions = vec![Point::new(272.0, 0.0)];
        let diagnostics =
            diagnose(&ZoneSchedule::default(), &pairs, &predictions).expect("diagnostics");
        assert_eq!(diagnostics.mae_x, 142.0);
        assert_eq!(diagnostics.mae_y, 0.0);
        assert_eq!(diagnostics.mean_distance, 142.0);
        assert_eq!(diagnostics.clamped_mean_distance, 6.0);
        assert_eq!(diagnostics.clamped_count, 1);
    }

    #[test]
    fn final_phase_pairs_clamp_with_last_radius() {
        let pairs = vec![pair("mac0001", 4, (0.0, 0.0), 48, (0.0, 0.0))];
        let predictions = vec![Point::new(30.0, 40.0)];
        let diagnostics =
            diagnose(&ZoneSchedule::default(), &pairs, &predictions).expect("diagnostics");
        assert_eq!(diagnostics.clamped_mean_distance, 0.0);
        assert_eq!(diagnostics.clamped_count, 0);
    }

    #[test]
    fn mismatched_predictions_are_shape_errors() {
        let pairs = vec![pair("mac0001", 1, (0.0, 0.0), 298, (1.0, 1.0))];
        let error = diagnose(&ZoneSchedule::default(), &pairs, &[]).expect_err("shape");
        assert!(matches!(
            error,
            AnalyticsError::Zone(zone_forecast_core::ZoneError::Shape { .. })
        ));
    }

    #[test]
    fn cross_validation_aggregates_folds() {
        let pairs = vec![
            pair("a", 1, (0.0, 0.0), 298, (10.0, 0.0)),
            pair("a", 2, (10.0, 0.0), 162, (10.0, 0.0)),
            pair("b", 1, (0.0, 0.0), 298, (20.0, 0.0)),
            pair("b", 2, (20.0, 0.0), 162, (20.0, 0.0)),
        ];
        let predictions = vec![
            Point::new(12.0, 0.0),
            Point::new(12.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 0.0),
        ];
        let report = cross_validate(&ZoneSchedule::default(), &pairs, &predictions, 2)
            .expect("report");
        assert_eq!(report.folds.len(), 2);
        assert_eq!(report.folds[0].mean_distance, 2.0);
        assert_eq!(report.folds[1].mean_distance, 0.0);
        assert_eq!(report.distance, MeanStd { mean: 1.0, std: 1.0 });
    }
}
