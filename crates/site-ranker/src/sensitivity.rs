//! Weight sensitivity of one alternative's TOPSIS score
//!
//! Each criterion in turn is given a fixed weight from the sweep while the
//! remainder is split evenly across the other criteria. The spread of the
//! target's score over the sweep is that criterion's impact.

use crate::topsis::topsis;
use crate::{
    AlternativeId, CriterionType, McdaError, PerformanceTable, Result, WeightVector,
    SENSITIVITY_WEIGHTS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Sensitivity sweep configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Weights assigned to the perturbed criterion
    pub weight_magnitudes: Vec<f64>,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            weight_magnitudes: SENSITIVITY_WEIGHTS.to_vec(),
        }
    }
}

/// Target score at one sweep weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightScore {
    pub weight: f64,
    pub score: f64,
}

/// Sweep result for one criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSensitivity {
    pub criterion: String,
    pub min: f64,
    pub baseline: f64,
    pub max: f64,
    /// `max - min`
    pub impact: f64,
    pub scores: Vec<WeightScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub target: AlternativeId,
    pub baseline_score: f64,
    /// Sorted by descending impact
    pub criteria: Vec<CriterionSensitivity>,
}

impl SensitivityReport {
    pub fn most_influential(&self) -> Option<&CriterionSensitivity> {
        self.criteria.first()
    }
}

/// Weights with criterion `index` pinned to `magnitude`
pub fn perturbed_weights(n: usize, index: usize, magnitude: f64) -> Result<WeightVector> {
    if n < 2 {
        return Err(McdaError::InsufficientCriteria {
            needed: 2,
            actual: n,
        });
    }
    if !(0.0..=1.0).contains(&magnitude) {
        return Err(McdaError::InvalidWeights(format!(
            "sweep weight {magnitude} outside [0, 1]"
        )));
    }
    let rest = (1.0 - magnitude) / (n - 1) as f64;
    let raw = (0..n)
        .map(|j| if j == index { magnitude } else { rest })
        .collect();
    WeightVector::normalized(raw)
}

/// Sweep every criterion's weight and record the target's score
pub fn sensitivity_analysis(
    table: &PerformanceTable,
    types: &[CriterionType],
    target: AlternativeId,
    config: &SensitivityConfig,
) -> Result<SensitivityReport> {
    let position = table
        .position(target)
        .ok_or(McdaError::UnknownAlternative(target))?;
    let n = table.criteria_count();
    if n < 2 {
        return Err(McdaError::InsufficientCriteria {
            needed: 2,
            actual: n,
        });
    }
    if config.weight_magnitudes.is_empty() {
        return Err(McdaError::EmptyInput("sensitivity weights"));
    }

    let matrix = table.to_matrix();
    let baseline_score = topsis(&matrix, &WeightVector::equal(n), types)?[position];

    let mut criteria = Vec::with_capacity(n);
    for (index, name) in table.criteria().iter().enumerate() {
        let mut scores = Vec::with_capacity(config.weight_magnitudes.len());
        for &weight in &config.weight_magnitudes {
            let weights = perturbed_weights(n, index, weight)?;
            let score = topsis(&matrix, &weights, types)?[position];
            scores.push(WeightScore { weight, score });
        }

        let min = scores.iter().map(|s| s.score).fold(f64::INFINITY, f64::min);
        let max = scores.iter().map(|s| s.score).fold(f64::NEG_INFINITY, f64::max);
        debug!(
            "Sensitivity of {} to {}: [{:.4}, {:.4}]",
            target, name, min, max
        );

        criteria.push(CriterionSensitivity {
            criterion: name.clone(),
            min,
            baseline: baseline_score,
            max,
            impact: max - min,
            scores,
        });
    }

    criteria.sort_by(|a, b| b.impact.total_cmp(&a.impact));

    if let Some(top) = criteria.first() {
        info!(
            "Sensitivity for {}: baseline {:.4}, most influential {} (impact {:.4})",
            target, baseline_score, top.criterion, top.impact
        );
    }

    Ok(SensitivityReport {
        target,
        baseline_score,
        criteria,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CriterionType::{Max, Min};

    fn sample_table() -> PerformanceTable {
        PerformanceTable::from_rows(
            &["capacity", "cost", "biodiversity"],
            vec![
                vec![7.0, 3.0, 4.0],
                vec![5.0, 5.0, 9.0],
                vec![2.0, 8.0, 6.0],
                vec![6.0, 4.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_perturbed_weights_split_remainder() {
        let w = perturbed_weights(4, 1, 0.25).unwrap();
        assert!((w[1] - 0.25).abs() < 1e-12);
        assert!((w[0] - 0.25).abs() < 1e-12);
        assert!((w.sum() - 1.0).abs() < 1e-12);

        let w = perturbed_weights(3, 0, 0.10).unwrap();
        assert!((w[0] - 0.10).abs() < 1e-12);
        assert!((w[2] - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_report_shape_and_order() {
        let report = sensitivity_analysis(
            &sample_table(),
            &[Max, Min, Max],
            AlternativeId(1),
            &SensitivityConfig::default(),
        )
        .unwrap();

        assert_eq!(report.target, AlternativeId(1));
        assert_eq!(report.criteria.len(), 3);
        for row in &report.criteria {
            assert_eq!(row.scores.len(), SENSITIVITY_WEIGHTS.len());
            assert!(row.impact >= 0.0);
            assert!(row.min <= row.max);
            assert_eq!(row.baseline, report.baseline_score);
        }
        for pair in report.criteria.windows(2) {
            assert!(pair[0].impact >= pair[1].impact);
        }
        assert_eq!(
            report.most_influential().map(|c| c.criterion.as_str()),
            Some(report.criteria[0].criterion.as_str())
        );
    }

    #[test]
    fn test_baseline_matches_equal_weight_topsis() {
        let table = sample_table();
        let types = [Max, Min, Max];
        let expected = topsis(&table.to_matrix(), &WeightVector::equal(3), &types).unwrap()[2];
        let report = sensitivity_analysis(&table, &types, AlternativeId(2), &SensitivityConfig::default())
            .unwrap();
        assert!((report.baseline_score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_target_fails_first() {
        // single criterion would also fail, the target check wins
        let table = PerformanceTable::from_rows(&["a"], vec![vec![1.0], vec![2.0]]).unwrap();
        let err = sensitivity_analysis(&table, &[Max], AlternativeId(9), &SensitivityConfig::default())
            .unwrap_err();
        assert!(matches!(err, McdaError::UnknownAlternative(AlternativeId(9))));
    }

    #[test]
    fn test_requires_two_criteria() {
        let table = PerformanceTable::from_rows(&["a"], vec![vec![1.0], vec![2.0]]).unwrap();
        let err = sensitivity_analysis(&table, &[Max], AlternativeId(0), &SensitivityConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            McdaError::InsufficientCriteria { needed: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_equal_impacts_keep_criteria_order() {
        // identical alternatives score 0.5 under every weighting
        let table = PerformanceTable::from_rows(
            &["a", "b", "c"],
            vec![vec![1.0, 1.0, 1.0], vec![1.0, 1.0, 1.0]],
        )
        .unwrap();
        let report = sensitivity_analysis(&table, &[Max, Max, Min], AlternativeId(0), &SensitivityConfig::default())
            .unwrap();
        let order: Vec<&str> = report.criteria.iter().map(|c| c.criterion.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(report.criteria.iter().all(|c| c.impact == 0.0));
    }
}
