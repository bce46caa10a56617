//! TOPSIS ranking
//!
//! Closeness to the ideal solution:
//! `C_i = d⁻_i / (d⁺_i + d⁻_i)`, where `d⁺` / `d⁻` are distances to the
//! positive / negative ideal. Crisp TOPSIS uses vector normalization and
//! Euclidean distance; fuzzy TOPSIS follows Chen with linear normalization
//! and summed vertex distances.

use crate::fuzzy::{self, AggregationMode, FuzzyMatrix, Tfn};
use crate::matrix::DecisionMatrix;
use crate::{AlternativeId, CriterionType, McdaError, Result, WeightVector};
use nalgebra::DMatrix;
use tracing::debug;

/// Score given when an alternative is equidistant from both ideals at zero
const TIE_SCORE: f64 = 0.5;

fn closeness(d_pos: f64, d_neg: f64) -> f64 {
    let total = d_pos + d_neg;
    if total > 0.0 {
        d_neg / total
    } else {
        TIE_SCORE
    }
}

fn check_shape(cols: usize, weights: usize, types: usize) -> Result<()> {
    if weights != cols {
        return Err(McdaError::ShapeMismatch {
            what: "weights",
            expected: cols,
            actual: weights,
        });
    }
    if types != cols {
        return Err(McdaError::ShapeMismatch {
            what: "criterion types",
            expected: cols,
            actual: types,
        });
    }
    Ok(())
}

/// Crisp TOPSIS closeness scores, one per row of `matrix`
pub fn topsis(
    matrix: &DMatrix<f64>,
    weights: &WeightVector,
    types: &[CriterionType],
) -> Result<Vec<f64>> {
    let (rows, cols) = matrix.shape();
    if rows == 0 {
        return Err(McdaError::EmptyInput("alternatives"));
    }
    if cols == 0 {
        return Err(McdaError::EmptyInput("criteria"));
    }
    check_shape(cols, weights.len(), types.len())?;
    if let Some(index) = matrix.iter().position(|v| !v.is_finite()) {
        // column-major storage
        return Err(McdaError::NonFiniteValue {
            criterion: format!("column {}", index / rows),
            alternative: AlternativeId(index % rows),
        });
    }

    let mut weighted = matrix.clone();
    for (j, mut column) in weighted.column_iter_mut().enumerate() {
        let norm = column.norm();
        if norm > 0.0 {
            column *= weights[j] / norm;
        }
    }

    let mut d_pos = vec![0.0; rows];
    let mut d_neg = vec![0.0; rows];
    for (j, column) in weighted.column_iter().enumerate() {
        let (best, worst) = if types[j].is_benefit() {
            (column.max(), column.min())
        } else {
            (column.min(), column.max())
        };
        for (i, v) in column.iter().enumerate() {
            d_pos[i] += (v - best).powi(2);
            d_neg[i] += (v - worst).powi(2);
        }
    }

    Ok(d_pos
        .into_iter()
        .zip(d_neg)
        .map(|(p, n)| closeness(p.sqrt(), n.sqrt()))
        .collect())
}

fn column_envelope(matrix: &FuzzyMatrix, j: usize) -> (Tfn, Tfn) {
    let column = matrix.column(j);
    let fold = |pick: fn(f64, f64) -> f64, init: f64| Tfn {
        l: column.iter().map(|t| t.l).fold(init, pick),
        m: column.iter().map(|t| t.m).fold(init, pick),
        u: column.iter().map(|t| t.u).fold(init, pick),
    };
    (fold(f64::max, f64::NEG_INFINITY), fold(f64::min, f64::INFINITY))
}

/// Chen fuzzy TOPSIS on an aggregated fuzzy decision matrix
pub fn rank_fuzzy_matrix(
    matrix: &FuzzyMatrix,
    weights: &[Tfn],
    types: &[CriterionType],
) -> Result<Vec<f64>> {
    let (rows, cols) = matrix.shape();
    if rows == 0 {
        return Err(McdaError::EmptyInput("alternatives"));
    }
    if cols == 0 {
        return Err(McdaError::EmptyInput("criteria"));
    }
    check_shape(cols, weights.len(), types.len())?;
    if let Some(bad) = matrix
        .iter()
        .find(|t| !(t.is_finite() && t.l > 0.0 && t.is_ordered()))
    {
        return Err(McdaError::InvalidJudgment(format!(
            "fuzzy evaluation {:?} must be positive and ordered",
            bad
        )));
    }

    let mut normalized = matrix.clone();
    for j in 0..cols {
        let (max, min) = column_envelope(matrix, j);
        for i in 0..rows {
            let cell = matrix[(i, j)];
            let r = match types[j] {
                CriterionType::Max => cell.scale(1.0 / max.u),
                CriterionType::Min => Tfn::new(min.l / cell.u, min.l / cell.m, min.l / cell.l),
            };
            normalized[(i, j)] = r.mul(&weights[j]);
        }
    }

    let mut d_pos = vec![0.0; rows];
    let mut d_neg = vec![0.0; rows];
    for j in 0..cols {
        let (fpis, fnis) = column_envelope(&normalized, j);
        for i in 0..rows {
            d_pos[i] += normalized[(i, j)].distance(&fpis);
            d_neg[i] += normalized[(i, j)].distance(&fnis);
        }
    }

    Ok(d_pos
        .into_iter()
        .zip(d_neg)
        .map(|(p, n)| closeness(p, n))
        .collect())
}

/// Fuzzy TOPSIS over all stakeholders' weights and evaluations
pub fn fuzzy_topsis(
    fuzzy_weight_list: &[Vec<Tfn>],
    dms: &[DecisionMatrix],
    types: &[CriterionType],
    mode: AggregationMode,
) -> Result<Vec<f64>> {
    let weights = fuzzy::aggregate_vectors(fuzzy_weight_list, mode)?;
    if dms.is_empty() {
        return Err(McdaError::EmptyInput("decision matrices"));
    }
    let fuzzy_dms: Vec<FuzzyMatrix> = dms.iter().map(DecisionMatrix::fuzzify).collect();
    let aggregate = fuzzy::aggregate_matrices(&fuzzy_dms, mode)?;

    debug!(
        "Fuzzy TOPSIS: {} weight vectors, {} decision matrices, {}x{} aggregate",
        fuzzy_weight_list.len(),
        dms.len(),
        aggregate.nrows(),
        aggregate.ncols()
    );

    rank_fuzzy_matrix(&aggregate, &weights, types)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn table_strategy() -> impl Strategy<Value = (DMatrix<f64>, Vec<CriterionType>, Vec<f64>)> {
        (2usize..8, 1usize..6).prop_flat_map(|(rows, cols)| {
            (
                prop::collection::vec(0.1f64..100.0, rows * cols)
                    .prop_map(move |v| DMatrix::from_vec(rows, cols, v)),
                prop::collection::vec(any::<bool>(), cols).prop_map(|flags| {
                    flags
                        .into_iter()
                        .map(|b| if b { CriterionType::Max } else { CriterionType::Min })
                        .collect()
                }),
                prop::collection::vec(0.01f64..1.0, cols),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        // Closeness is always a fraction
        #[test]
        fn fuzz_scores_bounded((m, types, raw) in table_strategy()) {
            let weights = WeightVector::normalized(raw).unwrap();
            let scores = topsis(&m, &weights, &types).unwrap();
            prop_assert_eq!(scores.len(), m.nrows());
            for s in scores {
                prop_assert!((0.0..=1.0).contains(&s), "score {}", s);
            }
        }

        // Improving one value in the criterion's direction never lowers that alternative
        #[test]
        fn fuzz_monotone_in_own_value(
            (m, types, raw) in table_strategy(),
            row_seed in any::<prop::sample::Index>(),
            col_seed in any::<prop::sample::Index>(),
            step in 0.1f64..50.0,
        ) {
            let weights = WeightVector::normalized(raw).unwrap();
            let (i, j) = (row_seed.index(m.nrows()), col_seed.index(m.ncols()));
            let before = topsis(&m, &weights, &types).unwrap()[i];

            let mut improved = m.clone();
            improved[(i, j)] = if types[j].is_benefit() {
                m[(i, j)] + step
            } else {
                m[(i, j)] * 0.5
            };
            let after = topsis(&improved, &weights, &types).unwrap()[i];
            prop_assert!(after >= before - 1e-12, "before {} after {}", before, after);
        }
    }
}
