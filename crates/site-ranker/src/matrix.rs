//! Judgment and evaluation matrices
//!
//! - [`PairwiseMatrix`]: one stakeholder's reciprocal criteria comparisons
//! - [`DecisionMatrix`]: one stakeholder's alternative × criterion Likert scores

use crate::fuzzy::{likert_cell, FuzzyMatrix, Tfn};
use crate::{McdaError, Result, LIKERT_MAX, LIKERT_MIN};
use nalgebra::DMatrix;

/// Relative tolerance for the reciprocal check
const RECIPROCAL_TOLERANCE: f64 = 1e-9;

/// Square reciprocal matrix: `a[i][i] = 1`, `a[i][j] · a[j][i] = 1`
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseMatrix(DMatrix<f64>);

impl PairwiseMatrix {
    pub fn new(matrix: DMatrix<f64>) -> Result<Self> {
        let n = matrix.nrows();
        if n == 0 {
            return Err(McdaError::EmptyInput("pairwise comparison matrix"));
        }
        if matrix.ncols() != n {
            return Err(McdaError::ShapeMismatch {
                what: "pairwise comparison columns",
                expected: n,
                actual: matrix.ncols(),
            });
        }

        for i in 0..n {
            if (matrix[(i, i)] - 1.0).abs() > RECIPROCAL_TOLERANCE {
                return Err(McdaError::InvalidJudgment(format!(
                    "diagonal entry ({i}, {i}) is {}",
                    matrix[(i, i)]
                )));
            }
            for j in (i + 1)..n {
                let (a, b) = (matrix[(i, j)], matrix[(j, i)]);
                if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
                    return Err(McdaError::InvalidJudgment(format!(
                        "entries ({i}, {j}) = {a} and ({j}, {i}) = {b} must be positive"
                    )));
                }
                if (a * b - 1.0).abs() > RECIPROCAL_TOLERANCE {
                    return Err(McdaError::InvalidJudgment(format!(
                        "entries ({i}, {j}) = {a} and ({j}, {i}) = {b} are not reciprocal"
                    )));
                }
            }
        }

        Ok(Self(matrix))
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n) {
            return Err(McdaError::ShapeMismatch {
                what: "pairwise comparison row",
                expected: n,
                actual: bad.len(),
            });
        }
        Self::new(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
    }

    /// Perfectly consistent matrix `a[i][j] = w[i] / w[j]`
    pub fn from_weights(weights: &[f64]) -> Result<Self> {
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(McdaError::InvalidWeights(
                "ratio weights must be positive".to_string(),
            ));
        }
        let n = weights.len();
        Self::new(DMatrix::from_fn(n, n, |i, j| weights[i] / weights[j]))
    }

    /// Generator output is reciprocal by construction
    pub(crate) fn from_generated(matrix: DMatrix<f64>) -> Self {
        Self(matrix)
    }

    pub fn size(&self) -> usize {
        self.0.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0[(i, j)]
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.0
    }

    /// Fuzzify the upper triangle and mirror reciprocals into the lower one
    pub fn fuzzify(&self) -> FuzzyMatrix {
        let n = self.size();
        let mut fuzzy = DMatrix::from_element(n, n, Tfn::ONE);
        for i in 0..n {
            for j in (i + 1)..n {
                let cell = Tfn::from_saaty(self.0[(i, j)]);
                fuzzy[(i, j)] = cell;
                fuzzy[(j, i)] = cell.reciprocal();
            }
        }
        fuzzy
    }
}

/// Alternatives × criteria Likert evaluations on the 1–9 scale
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionMatrix(DMatrix<u8>);

impl DecisionMatrix {
    pub fn new(matrix: DMatrix<u8>) -> Result<Self> {
        if matrix.is_empty() {
            return Err(McdaError::EmptyInput("decision matrix"));
        }
        if let Some(bad) = matrix
            .iter()
            .find(|s| !(LIKERT_MIN..=LIKERT_MAX).contains(*s))
        {
            return Err(McdaError::InvalidJudgment(format!(
                "Likert score {bad} outside {LIKERT_MIN}-{LIKERT_MAX}"
            )));
        }
        Ok(Self(matrix))
    }

    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(McdaError::ShapeMismatch {
                what: "decision matrix row",
                expected: cols,
                actual: bad.len(),
            });
        }
        Self::new(DMatrix::from_fn(rows.len(), cols, |i, j| rows[i][j]))
    }

    /// Scores are already clipped to the scale
    pub(crate) fn from_generated(matrix: DMatrix<u8>) -> Self {
        Self(matrix)
    }

    pub fn nrows(&self) -> usize {
        self.0.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.0.ncols()
    }

    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.0[(i, j)]
    }

    pub fn as_matrix(&self) -> &DMatrix<u8> {
        &self.0
    }

    pub fn fuzzify(&self) -> FuzzyMatrix {
        self.0.map(likert_cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairwise_rejects_non_reciprocal() {
        let err = PairwiseMatrix::from_rows(&[vec![1.0, 3.0], vec![0.5, 1.0]]).unwrap_err();
        assert!(matches!(err, McdaError::InvalidJudgment(_)));
    }

    #[test]
    fn test_pairwise_rejects_bad_diagonal() {
        let err = PairwiseMatrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 1.0]]).unwrap_err();
        assert!(matches!(err, McdaError::InvalidJudgment(_)));
    }

    #[test]
    fn test_pairwise_rejects_non_square() {
        let err = PairwiseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![0.5, 1.0, 1.0]])
            .unwrap_err();
        assert!(matches!(err, McdaError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_from_weights_is_reciprocal() {
        let pcm = PairwiseMatrix::from_weights(&[0.6, 0.3, 0.1]).unwrap();
        assert!((pcm.get(0, 1) - 2.0).abs() < 1e-12);
        assert!((pcm.get(0, 2) - 6.0).abs() < 1e-12);
        assert!((pcm.get(2, 0) * pcm.get(0, 2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fuzzify_pairwise() {
        let pcm = PairwiseMatrix::from_rows(&[
            vec![1.0, 3.0, 1.0],
            vec![1.0 / 3.0, 1.0, 0.5],
            vec![1.0, 2.0, 1.0],
        ])
        .unwrap();
        let fuzzy = pcm.fuzzify();

        assert_eq!(fuzzy[(0, 0)], Tfn::ONE);
        assert_eq!(fuzzy[(0, 1)], Tfn::new(2.0, 3.0, 4.0));
        assert_eq!(fuzzy[(1, 0)], Tfn::new(0.25, 1.0 / 3.0, 0.5));
        assert_eq!(fuzzy[(0, 2)], Tfn::new(0.5, 1.0, 2.0));
        assert_eq!(fuzzy[(2, 0)], Tfn::new(0.5, 1.0, 2.0));
        // upper cell (1, 2) = 1/2 drives the lower mirror
        assert_eq!(fuzzy[(2, 1)], Tfn::from_saaty(0.5).reciprocal());
        assert!(fuzzy.iter().all(Tfn::is_ordered));
    }

    #[test]
    fn test_decision_matrix_rejects_out_of_scale() {
        assert!(DecisionMatrix::from_rows(&[vec![1, 10]]).is_err());
        assert!(DecisionMatrix::from_rows(&[vec![0, 5]]).is_err());
        assert!(DecisionMatrix::from_rows(&[vec![1, 9], vec![5, 5]]).is_ok());
    }

    #[test]
    fn test_decision_matrix_fuzzify() {
        let dm = DecisionMatrix::from_rows(&[vec![1, 9], vec![4, 8]]).unwrap();
        let fuzzy = dm.fuzzify();
        assert_eq!(fuzzy[(0, 0)], Tfn::new(1.0, 1.0, 2.0));
        assert_eq!(fuzzy[(0, 1)], Tfn::new(9.0, 9.0, 9.0));
        assert_eq!(fuzzy[(1, 0)], Tfn::new(4.0, 4.0, 5.0));
        assert_eq!(fuzzy[(1, 1)], Tfn::new(8.0, 8.0, 9.0));
    }
}
