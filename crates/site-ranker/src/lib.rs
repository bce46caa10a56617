//! Site Ranker
//!
//! Multi-criteria decision analysis for ranking candidate sites against
//! conflicting criteria when stakeholder preferences are uncertain.
//!
//! # Pipeline
//!
//! ```text
//! table ─▶ selection ─▶ weights (equal | AHP | fuzzy AHP) ─▶ TOPSIS | fuzzy TOPSIS ─▶ ranking
//!                              ▲                                                        │
//!                   simulated PCMs / DMs                                       sensitivity sweep
//! ```
//!
//! | Stage       | Module        | Notes                                            |
//! |-------------|---------------|--------------------------------------------------|
//! | Fuzzy math  | [`fuzzy`]     | Triangular fuzzy numbers, consensus aggregation  |
//! | Matrices    | [`matrix`]    | Reciprocal judgment and Likert evaluation types  |
//! | Generation  | [`generator`] | Stakeholder-biased PCM / DM synthesis            |
//! | Weighting   | [`ahp`]       | Eigenvector AHP and Buckley fuzzy AHP, CR < 0.10 |
//! | Ranking     | [`topsis`]    | Crisp and Chen fuzzy TOPSIS                      |
//! | Simulation  | [`simulation`]| Likert evaluation, 5 stakeholders per group      |
//! | Sensitivity | [`sensitivity`]| Weight sweep 0.10–0.30 per criterion            |
//! | Selection   | [`selection`] | Criteria projection and range constraints        |
//! | Scenarios   | [`scenario`]  | Percentage deviation from the average site       |
//! | Input       | [`loader`]    | JSON records and analysis requests               |
//!
//! Every derived table is keyed by [`AlternativeId`], never by position.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod ahp;
pub mod fuzzy;
pub mod generator;
pub mod loader;
pub mod matrix;
pub mod scenario;
pub mod selection;
pub mod sensitivity;
pub mod simulation;
pub mod topsis;

pub use ahp::AhpConfig;
pub use fuzzy::{AggregationMode, Tfn};
pub use matrix::{DecisionMatrix, PairwiseMatrix};
pub use sensitivity::{SensitivityConfig, SensitivityReport};
pub use simulation::{SimulationConfig, StakeholderGroups};

/// Judgment matrices with a consistency ratio at or above this are discarded
pub const CONSISTENCY_THRESHOLD: f64 = 0.10;

/// Synthetic stakeholders generated per stakeholder group
pub const STAKEHOLDERS_PER_GROUP: usize = 5;

/// Weight magnitudes swept per criterion during sensitivity analysis
pub const SENSITIVITY_WEIGHTS: [f64; 5] = [0.10, 0.15, 0.20, 0.25, 0.30];

/// Likert evaluation scale
pub const LIKERT_MIN: u8 = 1;
pub const LIKERT_MAX: u8 = 9;
pub const LIKERT_NEUTRAL: u8 = 5;

#[derive(Error, Debug)]
pub enum McdaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Unknown criterion type {0:?} (expected \"max\" or \"min\")")]
    UnknownCriterionType(String),
    #[error("Unknown criterion: {0}")]
    UnknownCriterion(String),
    #[error("Duplicate alternative {0}")]
    DuplicateAlternative(AlternativeId),
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),
    #[error("Invalid judgment: {0}")]
    InvalidJudgment(String),
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
    #[error("Non-finite value for criterion {criterion} of alternative {alternative}")]
    NonFiniteValue {
        criterion: String,
        alternative: AlternativeId,
    },
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),
    #[error("No consistent judgment matrices ({total} evaluated)")]
    NoConsistentJudgments { total: usize },
    #[error("Criterion {0} has a zero mean")]
    DegenerateCriterion(String),
    #[error("Alternative {0} not found")]
    UnknownAlternative(AlternativeId),
    #[error("Insufficient criteria: need {needed}, have {actual}")]
    InsufficientCriteria { needed: usize, actual: usize },
    #[error("Constraints leave no alternatives")]
    NoAlternativesRemain,
}

pub type Result<T> = std::result::Result<T, McdaError>;

/// Direction of a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionType {
    /// Benefit criterion, higher is better
    Max,
    /// Cost criterion, lower is better
    Min,
}

impl CriterionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    pub fn is_benefit(&self) -> bool {
        matches!(self, Self::Max)
    }
}

impl FromStr for CriterionType {
    type Err = McdaError;

    /// Tags are case-sensitive: only `max` and `min` are accepted
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            other => Err(McdaError::UnknownCriterionType(other.to_string())),
        }
    }
}

impl fmt::Display for CriterionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named criterion with its direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CriterionType,
}

impl Criterion {
    pub fn new(name: impl Into<String>, kind: CriterionType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Build from a raw `max` / `min` tag
    pub fn parse(name: impl Into<String>, tag: &str) -> Result<Self> {
        Ok(Self::new(name, tag.parse()?))
    }
}

/// Parse a parallel list of criteria names and direction tags
pub fn parse_criteria(names: &[&str], tags: &[&str]) -> Result<Vec<Criterion>> {
    if names.len() != tags.len() {
        return Err(McdaError::ShapeMismatch {
            what: "criterion types",
            expected: names.len(),
            actual: tags.len(),
        });
    }
    names
        .iter()
        .zip(tags)
        .map(|(name, tag)| Criterion::parse(*name, tag))
        .collect()
}

/// Stable identifier of an alternative (its row in the loaded dataset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlternativeId(pub usize);

impl fmt::Display for AlternativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A candidate site with one value per active criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub id: AlternativeId,
    pub label: String,
    pub values: Vec<f64>,
}

impl Alternative {
    pub fn new(id: AlternativeId, label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            id,
            label: label.into(),
            values,
        }
    }
}

/// Numeric performance data: ordered criteria and one row per alternative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTable {
    criteria: Vec<String>,
    alternatives: Vec<Alternative>,
}

impl PerformanceTable {
    pub fn new(criteria: Vec<String>, alternatives: Vec<Alternative>) -> Result<Self> {
        if criteria.is_empty() {
            return Err(McdaError::EmptyInput("criteria"));
        }
        if alternatives.is_empty() {
            return Err(McdaError::EmptyInput("alternatives"));
        }

        let mut seen = HashSet::with_capacity(alternatives.len());
        for alt in &alternatives {
            if alt.values.len() != criteria.len() {
                return Err(McdaError::ShapeMismatch {
                    what: "alternative values",
                    expected: criteria.len(),
                    actual: alt.values.len(),
                });
            }
            if !seen.insert(alt.id) {
                return Err(McdaError::DuplicateAlternative(alt.id));
            }
            if let Some(col) = alt.values.iter().position(|v| !v.is_finite()) {
                return Err(McdaError::NonFiniteValue {
                    criterion: criteria[col].clone(),
                    alternative: alt.id,
                });
            }
        }

        Ok(Self {
            criteria,
            alternatives,
        })
    }

    /// Build from bare rows; ids are row positions and labels are generated
    pub fn from_rows(criteria: &[&str], rows: Vec<Vec<f64>>) -> Result<Self> {
        let alternatives = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| {
                Alternative::new(AlternativeId(i), format!("alternative-{}", i + 1), values)
            })
            .collect();
        Self::new(criteria.iter().map(|c| c.to_string()).collect(), alternatives)
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn criteria_count(&self) -> usize {
        self.criteria.len()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn ids(&self) -> Vec<AlternativeId> {
        self.alternatives.iter().map(|a| a.id).collect()
    }

    pub fn criterion_index(&self, name: &str) -> Option<usize> {
        self.criteria.iter().position(|c| c == name)
    }

    pub fn get(&self, id: AlternativeId) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.id == id)
    }

    /// Row position of an alternative in this table
    pub fn position(&self, id: AlternativeId) -> Option<usize> {
        self.alternatives.iter().position(|a| a.id == id)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.alternatives.iter().map(move |a| a.values[index])
    }

    pub fn column_mean(&self, index: usize) -> f64 {
        self.column(index).sum::<f64>() / self.len() as f64
    }

    /// Alternatives × criteria matrix in row order
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.len(), self.criteria_count(), |i, j| {
            self.alternatives[i].values[j]
        })
    }
}

/// Non-negative criterion weights summing to 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
    /// Equal weights, exactly `1/n` each
    pub fn equal(n: usize) -> Self {
        Self(vec![1.0 / n as f64; n])
    }

    /// Scale raw non-negative weights to sum to 1
    pub fn normalized(raw: Vec<f64>) -> Result<Self> {
        if raw.is_empty() {
            return Err(McdaError::EmptyInput("weights"));
        }
        if let Some(bad) = raw.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(McdaError::InvalidWeights(format!(
                "weight {bad} is negative or not finite"
            )));
        }
        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            return Err(McdaError::InvalidWeights("weights sum to zero".to_string()));
        }
        Ok(Self(raw.into_iter().map(|w| w / sum).collect()))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl std::ops::Index<usize> for WeightVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Closeness score of one alternative
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedAlternative {
    pub id: AlternativeId,
    pub score: f64,
}

/// Closeness scores keyed by alternative id, kept in table order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    entries: Vec<RankedAlternative>,
}

impl Ranking {
    pub fn new(ids: Vec<AlternativeId>, scores: Vec<f64>) -> Result<Self> {
        if ids.len() != scores.len() {
            return Err(McdaError::ShapeMismatch {
                what: "ranking scores",
                expected: ids.len(),
                actual: scores.len(),
            });
        }
        let entries = ids
            .into_iter()
            .zip(scores)
            .map(|(id, score)| RankedAlternative { id, score })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RankedAlternative] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn score(&self, id: AlternativeId) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.score)
    }

    /// Entries by descending score; ties keep table order
    pub fn sorted(&self) -> Vec<RankedAlternative> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
        sorted
    }

    pub fn best(&self) -> Option<RankedAlternative> {
        self.sorted().into_iter().next()
    }

    /// Alternative at a 1-based rank
    pub fn id_at_rank(&self, rank: usize) -> Option<AlternativeId> {
        rank.checked_sub(1)
            .and_then(|i| self.sorted().get(i).copied())
            .map(|e| e.id)
    }

    /// Sorted ranking with labels joined back from the table by id
    pub fn labelled(&self, table: &PerformanceTable) -> Vec<RankedSite> {
        self.sorted()
            .into_iter()
            .enumerate()
            .map(|(i, entry)| RankedSite {
                rank: i + 1,
                id: entry.id,
                label: table
                    .get(entry.id)
                    .map(|a| a.label.clone())
                    .unwrap_or_default(),
                score: entry.score,
            })
            .collect()
    }
}

/// One row of the exported ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSite {
    pub rank: usize,
    pub id: AlternativeId,
    pub label: String,
    pub score: f64,
}

/// Full result of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ranking: Vec<RankedSite>,
    pub criteria: Vec<Criterion>,
    pub weights: WeightVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<scenario::ScenarioComparison>,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub weighting: String,
    pub method: String,
    pub total_alternatives: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_judgments: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub generated_at: String,
}
