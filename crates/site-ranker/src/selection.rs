//! Criteria selection and range constraints
//!
//! Projects a table onto the criteria under analysis, then filters
//! alternatives by optional lower/upper bounds per criterion. Constraints
//! apply cumulatively in the given order.

use crate::{Alternative, Criterion, CriterionType, McdaError, PerformanceTable, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Keep alternatives whose value lies in `[lower, upper]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub criterion: String,
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
    /// Drop the criterion from the analysis once filtering is done
    #[serde(default)]
    pub remove_criterion: bool,
}

impl Constraint {
    pub fn new(criterion: impl Into<String>, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self {
            criterion: criterion.into(),
            lower,
            upper,
            remove_criterion: false,
        }
    }

    pub fn removing(mut self) -> Self {
        self.remove_criterion = true;
        self
    }

    fn validate(&self) -> Result<()> {
        if let Some(bad) = [self.lower, self.upper]
            .into_iter()
            .flatten()
            .find(|b| !b.is_finite())
        {
            return Err(McdaError::InvalidConstraint(format!(
                "{}: bound {bad} is not finite",
                self.criterion
            )));
        }
        if let (Some(lower), Some(upper)) = (self.lower, self.upper) {
            if upper < lower {
                return Err(McdaError::InvalidConstraint(format!(
                    "{}: upper bound {upper} below lower bound {lower}",
                    self.criterion
                )));
            }
        }
        Ok(())
    }

    fn admits(&self, value: f64) -> bool {
        self.lower.map_or(true, |l| value >= l) && self.upper.map_or(true, |u| value <= u)
    }
}

/// A table restricted to the active criteria, with their directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub table: PerformanceTable,
    pub criteria: Vec<Criterion>,
}

impl Selection {
    pub fn types(&self) -> Vec<CriterionType> {
        self.criteria.iter().map(|c| c.kind).collect()
    }
}

/// Project `table` onto `criteria`, in the order given
pub fn select_criteria(table: &PerformanceTable, criteria: &[Criterion]) -> Result<Selection> {
    if criteria.is_empty() {
        return Err(McdaError::EmptyInput("criteria"));
    }
    let indices = criteria
        .iter()
        .map(|c| {
            table
                .criterion_index(&c.name)
                .ok_or_else(|| McdaError::UnknownCriterion(c.name.clone()))
        })
        .collect::<Result<Vec<usize>>>()?;

    let alternatives = table
        .alternatives()
        .iter()
        .map(|alt| {
            Alternative::new(
                alt.id,
                alt.label.clone(),
                indices.iter().map(|&j| alt.values[j]).collect(),
            )
        })
        .collect();
    let names = criteria.iter().map(|c| c.name.clone()).collect();

    Ok(Selection {
        table: PerformanceTable::new(names, alternatives)?,
        criteria: criteria.to_vec(),
    })
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Filter alternatives by every constraint and drop exhausted criteria
pub fn apply_constraints(selection: &Selection, constraints: &[Constraint]) -> Result<Selection> {
    for constraint in constraints {
        constraint.validate()?;
    }
    let indices = constraints
        .iter()
        .map(|c| {
            selection
                .table
                .criterion_index(&c.criterion)
                .ok_or_else(|| McdaError::UnknownCriterion(c.criterion.clone()))
        })
        .collect::<Result<Vec<usize>>>()?;

    let before = selection.table.len();
    let kept: Vec<&Alternative> = selection
        .table
        .alternatives()
        .iter()
        .filter(|alt| {
            constraints
                .iter()
                .zip(&indices)
                .all(|(c, &j)| c.admits(alt.values[j]))
        })
        .collect();
    if kept.is_empty() {
        return Err(McdaError::NoAlternativesRemain);
    }

    let mut dropped = vec![false; selection.criteria.len()];
    for (constraint, &j) in constraints.iter().zip(&indices) {
        let column: Vec<f64> = kept.iter().map(|alt| alt.values[j]).collect();
        if constraint.remove_criterion || is_constant(&column) {
            debug!(
                "Dropping criterion {} after constraint (removed={})",
                constraint.criterion, constraint.remove_criterion
            );
            dropped[j] = true;
        }
    }

    let criteria: Vec<Criterion> = selection
        .criteria
        .iter()
        .zip(&dropped)
        .filter(|(_, gone)| !**gone)
        .map(|(c, _)| c.clone())
        .collect();
    let alternatives = kept
        .iter()
        .map(|alt| {
            let values = alt
                .values
                .iter()
                .zip(&dropped)
                .filter(|(_, gone)| !**gone)
                .map(|(v, _)| *v)
                .collect();
            Alternative::new(alt.id, alt.label.clone(), values)
        })
        .collect();
    let names = criteria.iter().map(|c| c.name.clone()).collect();

    info!(
        "Constraints kept {} of {} alternatives, {} criteria remain",
        kept.len(),
        before,
        criteria.len()
    );

    Ok(Selection {
        table: PerformanceTable::new(names, alternatives)?,
        criteria,
    })
}
