//! Triangular fuzzy numbers
//!
//! Conversion rules between the crisp 1–9 ratio scale, the Likert evaluation
//! scale and triangular fuzzy numbers `(l, m, u)`, plus the consensus
//! aggregation shared by fuzzy AHP and fuzzy TOPSIS:
//!
//! ```text
//! aggregate({(lₖ, mₖ, uₖ)}) = (min lₖ, geomean mₖ, max uₖ)
//! ```

use crate::{McdaError, Result, LIKERT_MAX, LIKERT_MIN};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Upper end of the Saaty ratio scale
pub const SAATY_MAX: f64 = 9.0;

const SCALE_EPSILON: f64 = 1e-9;

/// Matrix of triangular fuzzy numbers
pub type FuzzyMatrix = DMatrix<Tfn>;

/// Triangular fuzzy number with `l ≤ m ≤ u`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tfn {
    pub l: f64,
    pub m: f64,
    pub u: f64,
}

impl Tfn {
    pub const ONE: Tfn = Tfn {
        l: 1.0,
        m: 1.0,
        u: 1.0,
    };

    pub fn new(l: f64, m: f64, u: f64) -> Self {
        debug_assert!(l <= m && m <= u, "unordered fuzzy number ({l}, {m}, {u})");
        Self { l, m, u }
    }

    pub fn crisp(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Fuzzify a crisp ratio-scale judgment
    pub fn from_saaty(m: f64) -> Self {
        if (m - 1.0).abs() < SCALE_EPSILON {
            Self::new(m / 2.0, m, m + 1.0)
        } else if m < 1.0 {
            let x = 1.0 / m;
            let l = if (x - SAATY_MAX).abs() < SCALE_EPSILON {
                1.0 / x
            } else {
                1.0 / (x + 1.0)
            };
            Self::new(l, m, 1.0 / (x - 1.0))
        } else {
            let u = if (m - SAATY_MAX).abs() < SCALE_EPSILON {
                m
            } else {
                m + 1.0
            };
            Self::new(m - 1.0, m, u)
        }
    }

    /// Fuzzify a Likert score: `k → (k, k, k+1)`, `9 → (9, 9, 9)`
    pub fn from_likert(score: u8) -> Result<Self> {
        if !(LIKERT_MIN..=LIKERT_MAX).contains(&score) {
            return Err(McdaError::InvalidJudgment(format!(
                "Likert score {score} outside {LIKERT_MIN}-{LIKERT_MAX}"
            )));
        }
        Ok(likert_cell(score))
    }

    pub fn reciprocal(&self) -> Self {
        Self::new(1.0 / self.u, 1.0 / self.m, 1.0 / self.l)
    }

    /// Graded mean `(l + 4m + u) / 6`
    pub fn graded_mean(&self) -> f64 {
        (self.l + 4.0 * self.m + self.u) / 6.0
    }

    /// Centroid `(l + m + u) / 3`
    pub fn centroid(&self) -> f64 {
        (self.l + self.m + self.u) / 3.0
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.l * factor, self.m * factor, self.u * factor)
    }

    /// Componentwise product
    pub fn mul(&self, other: &Tfn) -> Self {
        Self::new(self.l * other.l, self.m * other.m, self.u * other.u)
    }

    /// Vertex distance
    pub fn distance(&self, other: &Tfn) -> f64 {
        (((self.l - other.l).powi(2) + (self.m - other.m).powi(2) + (self.u - other.u).powi(2))
            / 3.0)
            .sqrt()
    }

    pub fn is_ordered(&self) -> bool {
        self.l <= self.m && self.m <= self.u
    }

    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.m.is_finite() && self.u.is_finite()
    }
}

/// Infallible Likert mapping for scores already known to be on the scale
pub(crate) fn likert_cell(score: u8) -> Tfn {
    let k = f64::from(score);
    if score >= LIKERT_MAX {
        Tfn::crisp(k)
    } else {
        Tfn::new(k, k, k + 1.0)
    }
}

/// How the modes of a set of fuzzy numbers are averaged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    #[default]
    Geometric,
    Arithmetic,
}

/// Consensus of a set of opinions: widest support, averaged mode
pub fn aggregate(values: &[Tfn], mode: AggregationMode) -> Result<Tfn> {
    if values.is_empty() {
        return Err(McdaError::EmptyInput("fuzzy numbers to aggregate"));
    }
    let count = values.len() as f64;

    let l = values.iter().map(|v| v.l).fold(f64::INFINITY, f64::min);
    let u = values.iter().map(|v| v.u).fold(f64::NEG_INFINITY, f64::max);
    let m = match mode {
        AggregationMode::Geometric => values.iter().map(|v| v.m).product::<f64>().powf(1.0 / count),
        AggregationMode::Arithmetic => values.iter().map(|v| v.m).sum::<f64>() / count,
    };

    // rounding in the mean must not push the mode outside the support
    Ok(Tfn {
        l,
        m: m.max(l).min(u),
        u,
    })
}

/// Cellwise consensus of equally shaped fuzzy matrices
pub fn aggregate_matrices(matrices: &[FuzzyMatrix], mode: AggregationMode) -> Result<FuzzyMatrix> {
    let first = matrices
        .first()
        .ok_or(McdaError::EmptyInput("fuzzy matrices to aggregate"))?;
    let (rows, cols) = first.shape();
    for matrix in matrices {
        if matrix.nrows() != rows {
            return Err(McdaError::ShapeMismatch {
                what: "fuzzy matrix rows",
                expected: rows,
                actual: matrix.nrows(),
            });
        }
        if matrix.ncols() != cols {
            return Err(McdaError::ShapeMismatch {
                what: "fuzzy matrix columns",
                expected: cols,
                actual: matrix.ncols(),
            });
        }
    }

    let mut cells = Vec::with_capacity(rows * cols);
    let mut opinions = Vec::with_capacity(matrices.len());
    // column-major to match DMatrix::from_vec
    for j in 0..cols {
        for i in 0..rows {
            opinions.clear();
            opinions.extend(matrices.iter().map(|m| m[(i, j)]));
            cells.push(aggregate(&opinions, mode)?);
        }
    }
    Ok(DMatrix::from_vec(rows, cols, cells))
}

/// Elementwise consensus of equally sized fuzzy vectors
pub fn aggregate_vectors(vectors: &[Vec<Tfn>], mode: AggregationMode) -> Result<Vec<Tfn>> {
    let first = vectors
        .first()
        .ok_or(McdaError::EmptyInput("fuzzy vectors to aggregate"))?;
    let len = first.len();
    if let Some(bad) = vectors.iter().find(|v| v.len() != len) {
        return Err(McdaError::ShapeMismatch {
            what: "fuzzy vector length",
            expected: len,
            actual: bad.len(),
        });
    }

    (0..len)
        .map(|i| {
            let opinions: Vec<Tfn> = vectors.iter().map(|v| v[i]).collect();
            aggregate(&opinions, mode)
        })
        .collect()
}
