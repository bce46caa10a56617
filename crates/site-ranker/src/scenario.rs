//! Scenario comparison: how far selected sites sit from the average site

use crate::{AlternativeId, McdaError, PerformanceTable, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Percentage deviation of one alternative from each criterion mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub id: AlternativeId,
    pub label: String,
    pub deviations_pct: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub criteria: Vec<String>,
    pub rows: Vec<ScenarioRow>,
}

impl ScenarioComparison {
    pub fn row(&self, id: AlternativeId) -> Option<&ScenarioRow> {
        self.rows.iter().find(|r| r.id == id)
    }
}

/// `(x - mean) / mean · 100` per criterion, means over the whole table
pub fn compare_alternatives(
    table: &PerformanceTable,
    selected: &[AlternativeId],
) -> Result<ScenarioComparison> {
    if selected.is_empty() {
        return Err(McdaError::EmptyInput("alternatives to compare"));
    }

    let means: Vec<f64> = (0..table.criteria_count())
        .map(|j| table.column_mean(j))
        .collect();
    if let Some(j) = means.iter().position(|m| !m.is_finite() || *m == 0.0) {
        return Err(McdaError::DegenerateCriterion(table.criteria()[j].clone()));
    }

    let rows = selected
        .iter()
        .map(|&id| {
            let alt = table.get(id).ok_or(McdaError::UnknownAlternative(id))?;
            let deviations_pct = alt
                .values
                .iter()
                .zip(&means)
                .map(|(x, mean)| (x - mean) / mean * 100.0)
                .collect();
            Ok(ScenarioRow {
                id,
                label: alt.label.clone(),
                deviations_pct,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Compared {} alternatives against table means", rows.len());

    Ok(ScenarioComparison {
        criteria: table.criteria().to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deviation_from_mean() {
        let table = PerformanceTable::from_rows(
            &["income", "cost"],
            vec![vec![10.0, 4.0], vec![30.0, 4.0], vec![20.0, 4.0]],
        )
        .unwrap();
        let comparison = compare_alternatives(&table, &[AlternativeId(0), AlternativeId(1)]).unwrap();

        let first = comparison.row(AlternativeId(0)).unwrap();
        assert!((first.deviations_pct[0] + 50.0).abs() < 1e-9);
        assert!(first.deviations_pct[1].abs() < 1e-9);
        let second = comparison.row(AlternativeId(1)).unwrap();
        assert!((second.deviations_pct[0] - 50.0).abs() < 1e-9);
        assert_eq!(second.label, "alternative-2");
    }

    #[test]
    fn test_unknown_alternative() {
        let table = PerformanceTable::from_rows(&["a"], vec![vec![1.0]]).unwrap();
        let err = compare_alternatives(&table, &[AlternativeId(4)]).unwrap_err();
        assert!(matches!(err, McdaError::UnknownAlternative(AlternativeId(4))));
    }

    #[test]
    fn test_zero_mean_is_degenerate() {
        let table = PerformanceTable::from_rows(&["a"], vec![vec![1.0], vec![-1.0]]).unwrap();
        assert!(matches!(
            compare_alternatives(&table, &[AlternativeId(0)]),
            Err(McdaError::DegenerateCriterion(_))
        ));
        let table = PerformanceTable::from_rows(&["a"], vec![vec![f64::MAX], vec![f64::MAX]]).unwrap();
        assert!(matches!(
            compare_alternatives(&table, &[AlternativeId(0)]),
            Err(McdaError::DegenerateCriterion(_))
        ));
    }
}
