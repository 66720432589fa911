use std::collections::HashMap;

use zone_forecast_core::MatchId;

use crate::AnalyticsError;

/// Train/test sample indices of one cross-validation fold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fold {
    /// Samples used for fitting.
    pub train: Vec<usize>,
    /// Held-out samples.
    pub test: Vec<usize>,
}

/// Splits samples into `folds` folds so no match contributes to both sides of a fold.
///
/// Matches are placed largest first, each into the fold currently holding the
/// fewest samples (lowest index on ties), which keeps fold sizes balanced.
/// Ties between equally sized matches are broken by first appearance, so the
/// split is fully deterministic.
pub fn group_k_fold(groups: &[MatchId], folds: usize) -> Result<Vec<Fold>, AnalyticsError> {
    if folds < 2 {
        return Err(AnalyticsError::TooFewFolds(folds));
    }

    let mut order: Vec<&MatchId> = Vec::new();
    let mut sizes: HashMap<&MatchId, usize> = HashMap::new();
    for group in groups {
        let size = sizes.entry(group).or_insert(0);
        if *size == 0 {
            order.push(group);
        }
        *size += 1;
    }

    if order.len() < folds {
        return Err(AnalyticsError::TooFewGroups {
            groups: order.len(),
            folds,
        });
    }

    let mut ranked: Vec<(usize, &MatchId)> = order
        .iter()
        .map(|group| (sizes[group], *group))
        .collect();
    // Stable sort keeps first-appearance order among equal sizes.
    ranked.sort_by(|left, right| right.0.cmp(&left.0));

    let mut load = vec![0usize; folds];
    let mut assignment: HashMap<&MatchId, usize> = HashMap::with_capacity(ranked.len());
    for (size, group) in ranked {
        let lightest = load
            .iter()
            .enumerate()
            .min_by_key(|(index, weight)| (**weight, *index))
            .map_or(0, |(index, _)| index);
        load[lightest] += size;
        let _ = assignment.insert(group, lightest);
    }

    let mut result = vec![Fold::default(); folds];
    for (sample, group) in groups.iter().enumerate() {
        let held_out = assignment[group];
        for (index, fold) in result.iter_mut().enumerate() {
            if index == held_out {
                fold.test.push(sample);
            } else {
                fold.train.push(sample);
            }
        }
    }
    Ok(result)
}
