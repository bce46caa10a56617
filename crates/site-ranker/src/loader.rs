//! Data loading from JSON files

use crate::selection::Constraint;
use crate::{Alternative, AlternativeId, Criterion, McdaError, PerformanceTable, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Sanitize a site label (printable subset, bounded length)
fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric() || " -_.,()&'".contains(*c))
        .take(256)
        .collect()
}

/// Numeric view of a JSON cell; booleans count as 0 / 1
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Numeric columns of a record other than the label, in key order
fn numeric_columns(record: &Map<String, Value>, label_field: &str) -> Vec<String> {
    record
        .iter()
        .filter(|(key, value)| key.as_str() != label_field && numeric(value).is_some())
        .map(|(key, _)| key.clone())
        .collect()
}

/// Load a performance table from a JSON array of records
///
/// Columns are the numeric or boolean fields of the first object record.
/// Records missing any of them are skipped; ids are record positions in the
/// file so they stay stable across filtering.
pub fn load_table(path: impl AsRef<Path>, label_field: &str) -> Result<PerformanceTable> {
    let path = path.as_ref();
    info!("Loading performance data from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let records: Vec<Value> = serde_json::from_reader(reader)?;

    let columns = records
        .iter()
        .find_map(Value::as_object)
        .map(|record| numeric_columns(record, label_field))
        .unwrap_or_default();
    if columns.is_empty() {
        return Err(McdaError::EmptyInput("numeric columns"));
    }

    let mut alternatives = Vec::new();
    let mut skipped = 0;

    for (i, record) in records.iter().enumerate() {
        let Some(object) = record.as_object() else {
            skipped += 1;
            continue;
        };
        let values: Option<Vec<f64>> = columns
            .iter()
            .map(|column| object.get(column).and_then(numeric))
            .collect();
        let Some(values) = values else {
            debug!("Skipping record {}: missing or non-numeric criterion value", i);
            skipped += 1;
            continue;
        };

        let label = object
            .get(label_field)
            .and_then(Value::as_str)
            .map(sanitize_label)
            .unwrap_or_else(|| format!("site-{}", i));

        alternatives.push(Alternative::new(AlternativeId(i), label, values));
    }

    info!(
        "Loaded {} alternatives with {} criteria ({} skipped)",
        alternatives.len(),
        columns.len(),
        skipped
    );

    PerformanceTable::new(columns, alternatives)
}

/// Raw criterion entry; the type tag is validated after parsing
#[derive(Debug, Deserialize)]
struct RawCriterion {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    criteria: Vec<RawCriterion>,
    #[serde(default)]
    constraints: Vec<Constraint>,
    #[serde(default)]
    stakeholder_groups: Option<BTreeMap<String, Vec<String>>>,
}

/// Criteria, constraints and stakeholder groups for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub criteria: Vec<Criterion>,
    pub constraints: Vec<Constraint>,
    /// Falls back to the built-in groups when absent
    pub stakeholder_groups: Option<BTreeMap<String, Vec<String>>>,
}

/// Load an analysis request from JSON
pub fn load_analysis(path: impl AsRef<Path>) -> Result<AnalysisRequest> {
    let path = path.as_ref();
    info!("Loading analysis request from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: RawAnalysis = serde_json::from_reader(reader)?;

    let criteria = raw
        .criteria
        .into_iter()
        .map(|c| Criterion::parse(c.name, &c.kind))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Analysis: {} criteria, {} constraints",
        criteria.len(),
        raw.constraints.len()
    );

    Ok(AnalysisRequest {
        criteria,
        constraints: raw.constraints,
        stakeholder_groups: raw.stakeholder_groups,
    })
}
