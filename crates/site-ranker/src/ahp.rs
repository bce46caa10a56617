//! Analytic Hierarchy Process
//!
//! Crisp weights come from the principal eigenvector of each judgment matrix;
//! fuzzy weights from Buckley's geometric-mean method. Either way a matrix is
//! only used when its consistency ratio is below the threshold:
//!
//! ```text
//! λmax = mean_i((A·w)_i / w_i)
//! CI   = (λmax − n) / (n − 1)
//! CR   = CI / RI(n)
//! ```

use crate::fuzzy::{self, AggregationMode, FuzzyMatrix, Tfn};
use crate::matrix::PairwiseMatrix;
use crate::{McdaError, Result, WeightVector, CONSISTENCY_THRESHOLD};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Saaty random consistency index by matrix size (index = n)
pub const RANDOM_INDEX: [f64; 16] = [
    0.0, 0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49, 1.51, 1.48, 1.56, 1.57, 1.59,
];

const POWER_ITERATIONS: usize = 1000;
const POWER_TOLERANCE: f64 = 1e-12;

/// AHP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AhpConfig {
    /// Matrices with CR at or above this are discarded
    pub consistency_threshold: f64,
    /// Consensus rule for fuzzy judgment matrices
    pub aggregation: AggregationMode,
}

impl Default for AhpConfig {
    fn default() -> Self {
        Self {
            consistency_threshold: CONSISTENCY_THRESHOLD,
            aggregation: AggregationMode::Geometric,
        }
    }
}

/// Weights and diagnostics of one crisp judgment matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AhpResult {
    pub weights: Vec<f64>,
    pub lambda_max: f64,
    pub consistency_ratio: f64,
}

impl AhpResult {
    pub fn is_consistent(&self, threshold: f64) -> bool {
        self.consistency_ratio < threshold
    }
}

/// Weights and diagnostics of one fuzzy judgment matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyAhpResult {
    pub fuzzy_weights: Vec<Tfn>,
    pub defuzzified: Vec<f64>,
    pub normalized: Vec<f64>,
    pub consistency_ratio: f64,
}

impl FuzzyAhpResult {
    pub fn is_consistent(&self, threshold: f64) -> bool {
        self.consistency_ratio < threshold
    }
}

/// Result of crisp AHP across stakeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AhpOutcome {
    /// Mean eigenvector of the consistent matrices, normalized
    pub weights: WeightVector,
    /// Number of matrices that passed the consistency check
    pub consistent: usize,
    pub total: usize,
}

/// Result of fuzzy AHP across stakeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyAhpOutcome {
    /// Normalized crisp weights of the consensus matrix
    pub weights: WeightVector,
    /// Fuzzy weights of each consistent stakeholder matrix
    pub fuzzy_weights_list: Vec<Vec<Tfn>>,
    /// Full derivation on the consensus matrix
    pub consensus: FuzzyAhpResult,
}

pub fn random_index(n: usize) -> f64 {
    RANDOM_INDEX[n.min(RANDOM_INDEX.len() - 1)]
}

/// Perron eigenvector of a positive matrix, normalized to sum 1
pub fn principal_eigenvector(matrix: &DMatrix<f64>) -> DVector<f64> {
    let n = matrix.nrows();
    let mut vector = DVector::from_element(n, 1.0 / n as f64);

    for _ in 0..POWER_ITERATIONS {
        let mut next = matrix * &vector;
        let sum = next.sum();
        next /= sum;
        let delta = (&next - &vector).amax();
        vector = next;
        if delta < POWER_TOLERANCE {
            break;
        }
    }

    vector
}

/// `(λmax, CR)` of a crisp matrix for a given weight estimate
fn consistency(matrix: &DMatrix<f64>, weights: &DVector<f64>) -> (f64, f64) {
    let n = matrix.nrows();
    let weighted = matrix * weights;
    let lambda_max = weighted
        .iter()
        .zip(weights.iter())
        .map(|(aw, w)| aw / w)
        .sum::<f64>()
        / n as f64;

    // every reciprocal 1×1 or 2×2 matrix is consistent
    if n <= 2 {
        return (lambda_max, 0.0);
    }

    let ci = (lambda_max - n as f64) / (n as f64 - 1.0);
    (lambda_max, ci / random_index(n))
}

/// Eigenvector weights and consistency of one judgment matrix
pub fn derive_weights(pcm: &PairwiseMatrix) -> AhpResult {
    let matrix = pcm.as_matrix();
    let weights = principal_eigenvector(matrix);
    let (lambda_max, consistency_ratio) = consistency(matrix, &weights);

    AhpResult {
        weights: weights.iter().copied().collect(),
        lambda_max,
        consistency_ratio,
    }
}

/// Buckley fuzzy weights and consistency of one fuzzy judgment matrix
pub fn derive_fuzzy_weights(matrix: &FuzzyMatrix) -> FuzzyAhpResult {
    let n = matrix.nrows();
    let exponent = 1.0 / n as f64;

    let row_means: Vec<Tfn> = (0..n)
        .map(|i| {
            let (mut l, mut m, mut u) = (1.0, 1.0, 1.0);
            for j in 0..n {
                let cell = matrix[(i, j)];
                l *= cell.l;
                m *= cell.m;
                u *= cell.u;
            }
            Tfn::new(l.powf(exponent), m.powf(exponent), u.powf(exponent))
        })
        .collect();

    let sum_l: f64 = row_means.iter().map(|r| r.l).sum();
    let sum_m: f64 = row_means.iter().map(|r| r.m).sum();
    let sum_u: f64 = row_means.iter().map(|r| r.u).sum();

    let fuzzy_weights: Vec<Tfn> = row_means
        .iter()
        .map(|r| Tfn::new(r.l / sum_u, r.m / sum_m, r.u / sum_l))
        .collect();
    let defuzzified: Vec<f64> = fuzzy_weights.iter().map(Tfn::centroid).collect();
    let total: f64 = defuzzified.iter().sum();
    let normalized: Vec<f64> = defuzzified.iter().map(|d| d / total).collect();

    let crisp = DMatrix::from_fn(n, n, |i, j| matrix[(i, j)].graded_mean());
    let (_, consistency_ratio) = consistency(&crisp, &DVector::from_column_slice(&normalized));

    FuzzyAhpResult {
        fuzzy_weights,
        defuzzified,
        normalized,
        consistency_ratio,
    }
}

fn ensure_same_size(pcms: &[PairwiseMatrix]) -> Result<usize> {
    let first = pcms
        .first()
        .ok_or(McdaError::EmptyInput("judgment matrices"))?;
    let n = first.size();
    if let Some(bad) = pcms.iter().find(|p| p.size() != n) {
        return Err(McdaError::ShapeMismatch {
            what: "judgment matrix size",
            expected: n,
            actual: bad.size(),
        });
    }
    Ok(n)
}

/// Average the eigenvector weights of all consistent judgment matrices
pub fn ahp(pcms: &[PairwiseMatrix], config: &AhpConfig) -> Result<AhpOutcome> {
    let n = ensure_same_size(pcms)?;

    let mut sum = vec![0.0; n];
    let mut kept = 0usize;
    for (index, pcm) in pcms.iter().enumerate() {
        let result = derive_weights(pcm);
        if result.is_consistent(config.consistency_threshold) {
            for (acc, w) in sum.iter_mut().zip(&result.weights) {
                *acc += w;
            }
            kept += 1;
        } else {
            debug!(
                "Discarding judgment matrix {}: CR={:.3}",
                index, result.consistency_ratio
            );
        }
    }

    info!(
        "AHP: {} of {} judgment matrices consistent (CR < {:.2})",
        kept,
        pcms.len(),
        config.consistency_threshold
    );

    if kept == 0 {
        return Err(McdaError::NoConsistentJudgments { total: pcms.len() });
    }

    Ok(AhpOutcome {
        weights: WeightVector::normalized(sum.into_iter().map(|w| w / kept as f64).collect())?,
        consistent: kept,
        total: pcms.len(),
    })
}

/// Fuzzy AHP over consistent stakeholders, re-derived on their consensus matrix
pub fn fuzzy_ahp(pcms: &[PairwiseMatrix], config: &AhpConfig) -> Result<FuzzyAhpOutcome> {
    ensure_same_size(pcms)?;

    let mut fuzzy_weights_list = Vec::new();
    let mut consistent = Vec::new();
    for (index, pcm) in pcms.iter().enumerate() {
        let fuzzy_pcm = pcm.fuzzify();
        let result = derive_fuzzy_weights(&fuzzy_pcm);
        if result.is_consistent(config.consistency_threshold) {
            fuzzy_weights_list.push(result.fuzzy_weights);
            consistent.push(fuzzy_pcm);
        } else {
            debug!(
                "Discarding fuzzy judgment matrix {}: CR={:.3}",
                index, result.consistency_ratio
            );
        }
    }

    info!(
        "Fuzzy AHP: {} of {} judgment matrices consistent (CR < {:.2})",
        consistent.len(),
        pcms.len(),
        config.consistency_threshold
    );

    if consistent.is_empty() {
        return Err(McdaError::NoConsistentJudgments { total: pcms.len() });
    }

    let aggregate = fuzzy::aggregate_matrices(&consistent, config.aggregation)?;
    let consensus = derive_fuzzy_weights(&aggregate);
    debug!("Consensus fuzzy matrix CR={:.3}", consensus.consistency_ratio);

    Ok(FuzzyAhpOutcome {
        weights: WeightVector::normalized(consensus.normalized.clone())?,
        fuzzy_weights_list,
        consensus,
    })
}
