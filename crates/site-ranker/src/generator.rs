//! Synthetic stakeholder judgments
//!
//! A simulated stakeholder clearly favours the criteria of their group and is
//! close to indifferent within and outside it:
//!
//! | Pair                        | Score   | Direction              |
//! |-----------------------------|---------|------------------------|
//! | preferred vs preferred      | 1–2     | random                 |
//! | non-preferred vs non-pref.  | 1–2     | random                 |
//! | preferred vs non-preferred  | 3–5     | towards the preferred  |
//!
//! Evaluations of preferred criteria jitter the baseline Likert score by
//! -2..=+1; everything else is the neutral 5.

use crate::matrix::{DecisionMatrix, PairwiseMatrix};
use crate::{LIKERT_MAX, LIKERT_MIN, LIKERT_NEUTRAL};
use nalgebra::DMatrix;
use rand::Rng;
use std::collections::BTreeSet;

const MILD_MIN: u8 = 1;
const MILD_MAX: u8 = 2;
const STRONG_MIN: u8 = 3;
const STRONG_MAX: u8 = 5;

const OFFSET_MIN: i16 = -2;
const OFFSET_MAX: i16 = 1;

/// Generate one stakeholder's pairwise comparison matrix
pub fn generate_pcm<R: Rng + ?Sized>(
    criteria_count: usize,
    preferred: &BTreeSet<usize>,
    rng: &mut R,
) -> PairwiseMatrix {
    let mut matrix = DMatrix::from_element(criteria_count, criteria_count, 1.0);

    for i in 0..criteria_count {
        for j in (i + 1)..criteria_count {
            let value = match (preferred.contains(&i), preferred.contains(&j)) {
                (true, false) => f64::from(rng.gen_range(STRONG_MIN..=STRONG_MAX)),
                (false, true) => 1.0 / f64::from(rng.gen_range(STRONG_MIN..=STRONG_MAX)),
                _ => {
                    let score = f64::from(rng.gen_range(MILD_MIN..=MILD_MAX));
                    if rng.gen_bool(0.5) {
                        score
                    } else {
                        1.0 / score
                    }
                }
            };
            matrix[(i, j)] = value;
            matrix[(j, i)] = 1.0 / value;
        }
    }

    PairwiseMatrix::from_generated(matrix)
}

/// Generate one stakeholder's decision matrix from the baseline evaluation
pub fn generate_dm<R: Rng + ?Sized>(
    baseline: &DecisionMatrix,
    preferred: &BTreeSet<usize>,
    rng: &mut R,
) -> DecisionMatrix {
    let (rows, cols) = (baseline.nrows(), baseline.ncols());
    let mut matrix = DMatrix::from_element(rows, cols, LIKERT_NEUTRAL);

    for i in 0..rows {
        for j in 0..cols {
            if preferred.contains(&j) {
                let offset = rng.gen_range(OFFSET_MIN..=OFFSET_MAX);
                let score = (i16::from(baseline.get(i, j)) + offset)
                    .clamp(i16::from(LIKERT_MIN), i16::from(LIKERT_MAX));
                matrix[(i, j)] = score as u8;
            }
        }
    }

    DecisionMatrix::from_generated(matrix)
}
