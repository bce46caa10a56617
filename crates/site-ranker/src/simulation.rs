//! Stakeholder simulation
//!
//! Turns a performance table into Likert evaluations, then generates one
//! judgment matrix and one decision matrix per synthetic stakeholder, biased
//! towards the criteria their group cares about.

use crate::generator::{generate_dm, generate_pcm};
use crate::matrix::{DecisionMatrix, PairwiseMatrix};
use crate::{McdaError, PerformanceTable, Result, LIKERT_MAX, LIKERT_MIN, STAKEHOLDERS_PER_GROUP};
use nalgebra::DMatrix;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Default stakeholder groups and the criteria they favour
const DEFAULT_GROUPS: [(&str, &[&str]); 4] = [
    (
        "socio-economic",
        &[
            "average_income",
            "fishing_dependency",
            "unemployment_rate",
            "tourism_revenue",
        ],
    ),
    (
        "fisheries",
        &["fish_stock_health", "potential_habitat_restoration"],
    ),
    (
        "environmental",
        &["marine_biodiversity", "carbon_sequestration_potential"],
    ),
    (
        "technical",
        &[
            "current_offshore_wind_farms",
            "distance_from_offshore_wind_farm",
            "potential_wind_farm_capacity",
        ],
    ),
];

/// Stakeholder groups mapped to the indices of their preferred criteria
///
/// Only built through [`StakeholderGroups::new`] or
/// [`StakeholderGroups::with_defaults`], so every index names an active criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StakeholderGroups {
    groups: BTreeMap<String, BTreeSet<usize>>,
}

impl StakeholderGroups {
    /// Resolve criterion names against the active criteria
    pub fn new(groups: &BTreeMap<String, Vec<String>>, criteria: &[String]) -> Result<Self> {
        let mut resolved = BTreeMap::new();
        for (group, names) in groups {
            let indices = names
                .iter()
                .map(|name| {
                    criteria
                        .iter()
                        .position(|c| c == name)
                        .ok_or_else(|| McdaError::UnknownCriterion(name.clone()))
                })
                .collect::<Result<BTreeSet<usize>>>()?;
            resolved.insert(group.clone(), indices);
        }
        Ok(Self { groups: resolved })
    }

    /// Built-in groups restricted to the criteria that are present
    pub fn with_defaults(criteria: &[String]) -> Self {
        let groups = DEFAULT_GROUPS
            .iter()
            .filter_map(|(group, names)| {
                let indices: BTreeSet<usize> = names
                    .iter()
                    .filter_map(|name| criteria.iter().position(|c| c == name))
                    .collect();
                (!indices.is_empty()).then(|| (group.to_string(), indices))
            })
            .collect();
        Self { groups }
    }

    /// Groups in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<usize>)> {
        self.groups.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn preferred(&self, group: &str) -> Option<&BTreeSet<usize>> {
        self.groups.get(group)
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Synthetic stakeholders per group
    pub stakeholders_per_group: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stakeholders_per_group: STAKEHOLDERS_PER_GROUP,
        }
    }
}

/// Judgments of every synthetic stakeholder, in generation order
#[derive(Debug, Clone)]
pub struct SimulatedJudgments {
    pub pcms: Vec<PairwiseMatrix>,
    pub dms: Vec<DecisionMatrix>,
}

impl SimulatedJudgments {
    pub fn len(&self) -> usize {
        self.pcms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcms.is_empty()
    }
}

/// Map each value to a Likert score by its relative deviation from the column mean
///
/// ```text
/// dev   = (x − mean) / mean
/// score = clip(round(((dev + 1) / 2) · 8 + 1), 1, 9)
/// ```
pub fn evaluate_dataset(table: &PerformanceTable) -> Result<DecisionMatrix> {
    let means: Vec<f64> = (0..table.criteria_count())
        .map(|j| table.column_mean(j))
        .collect();
    // a zero or overflowing mean leaves the deviation undefined
    if let Some(j) = means.iter().position(|m| !m.is_finite() || *m == 0.0) {
        return Err(McdaError::DegenerateCriterion(table.criteria()[j].clone()));
    }

    let matrix = DMatrix::from_fn(table.len(), table.criteria_count(), |i, j| {
        let value = table.alternatives()[i].values[j];
        let deviation = (value - means[j]) / means[j];
        let score = (((deviation + 1.0) / 2.0) * 8.0 + 1.0).round_ties_even();
        score.clamp(f64::from(LIKERT_MIN), f64::from(LIKERT_MAX)) as u8
    });

    Ok(DecisionMatrix::from_generated(matrix))
}

/// Generate judgments for `stakeholders_per_group` stakeholders of every group
pub fn simulate_decision_making<R: Rng + ?Sized>(
    table: &PerformanceTable,
    groups: &StakeholderGroups,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<SimulatedJudgments> {
    let baseline = evaluate_dataset(table)?;
    let criteria_count = table.criteria_count();

    let capacity = groups.len() * config.stakeholders_per_group;
    let mut pcms = Vec::with_capacity(capacity);
    let mut dms = Vec::with_capacity(capacity);

    for (group, preferred) in groups.iter() {
        debug!(
            "Simulating {} stakeholders for group {} ({} preferred criteria)",
            config.stakeholders_per_group,
            group,
            preferred.len()
        );
        for _ in 0..config.stakeholders_per_group {
            pcms.push(generate_pcm(criteria_count, preferred, rng));
            dms.push(generate_dm(&baseline, preferred, rng));
        }
    }

    info!(
        "Simulated {} stakeholders across {} groups",
        pcms.len(),
        groups.len()
    );

    Ok(SimulatedJudgments { pcms, dms })
}
