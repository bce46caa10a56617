//! Site Ranking CLI
//!
//! Ranks candidate sites from a JSON performance table with equal, AHP or
//! fuzzy AHP weights and TOPSIS or fuzzy TOPSIS scoring.
//!
//! Usage:
//!   rank-sites --data data/sites.json \
//!              --analysis data/analysis.json \
//!              --weighting fuzzy-ahp --method fuzzy-topsis --seed 42 \
//!              --sensitivity-rank 1 --output data/ranking.json

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use site_ranker::ahp;
use site_ranker::scenario::compare_alternatives;
use site_ranker::selection::{apply_constraints, select_criteria};
use site_ranker::sensitivity::sensitivity_analysis;
use site_ranker::simulation::simulate_decision_making;
use site_ranker::topsis::{fuzzy_topsis, topsis};
use site_ranker::{
    loader, AggregationMode, AhpConfig, AlternativeId, AnalysisReport, McdaError, Ranking,
    ReportMetadata, SensitivityConfig, SimulationConfig, StakeholderGroups, WeightVector,
    CONSISTENCY_THRESHOLD, STAKEHOLDERS_PER_GROUP,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Weighting {
    Equal,
    Ahp,
    FuzzyAhp,
}

impl Weighting {
    fn label(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Ahp => "ahp",
            Self::FuzzyAhp => "fuzzy-ahp",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    Topsis,
    FuzzyTopsis,
}

impl Method {
    fn label(self) -> &'static str {
        match self {
            Self::Topsis => "topsis",
            Self::FuzzyTopsis => "fuzzy-topsis",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Aggregation {
    Geometric,
    Arithmetic,
}

impl From<Aggregation> for AggregationMode {
    fn from(value: Aggregation) -> Self {
        match value {
            Aggregation::Geometric => AggregationMode::Geometric,
            Aggregation::Arithmetic => AggregationMode::Arithmetic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "rank-sites",
    about = "Rank candidate sites with AHP/TOPSIS and simulated stakeholder judgments"
)]
struct Args {
    /// Path to the performance data (JSON array of records)
    #[arg(short, long, default_value = "data/sites.json")]
    data: PathBuf,

    /// Path to the analysis request (criteria, constraints, stakeholder groups)
    #[arg(short, long, default_value = "data/analysis.json")]
    analysis: PathBuf,

    /// Output JSON file
    #[arg(short, long, default_value = "data/ranking.json")]
    output: PathBuf,

    /// Record field holding the site label
    #[arg(long, default_value = "community_name")]
    label_field: String,

    /// Where criterion weights come from
    #[arg(long, value_enum, default_value_t = Weighting::Equal)]
    weighting: Weighting,

    /// Ranking method
    #[arg(long, value_enum, default_value_t = Method::Topsis)]
    method: Method,

    /// Seed for stakeholder simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Synthetic stakeholders per group
    #[arg(long, default_value_t = STAKEHOLDERS_PER_GROUP)]
    stakeholders_per_group: usize,

    /// Judgment matrices at or above this consistency ratio are discarded
    #[arg(long, default_value_t = CONSISTENCY_THRESHOLD)]
    consistency_threshold: f64,

    /// Consensus rule for fuzzy judgments
    #[arg(long, value_enum, default_value_t = Aggregation::Geometric)]
    aggregation: Aggregation,

    /// Run sensitivity analysis for the site at this rank (1 = best)
    #[arg(long)]
    sensitivity_rank: Option<usize>,

    /// Compare these site ids against the average site
    #[arg(long, value_delimiter = ',')]
    compare: Vec<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.method == Method::FuzzyTopsis && args.weighting != Weighting::FuzzyAhp {
        bail!("--method fuzzy-topsis requires --weighting fuzzy-ahp");
    }

    info!("{}", "=".repeat(60));
    info!("Site Ranker");
    info!("{}", "=".repeat(60));

    // Load inputs
    let table = loader::load_table(&args.data, &args.label_field)?;
    let request = loader::load_analysis(&args.analysis)?;

    // Select criteria and apply constraints; scenario means use the unfiltered projection
    let projection = select_criteria(&table, &request.criteria)?;
    let selection = if request.constraints.is_empty() {
        projection.clone()
    } else {
        apply_constraints(&projection, &request.constraints)?
    };
    let types = selection.types();
    let criteria = selection.table.criteria().to_vec();
    let matrix = selection.table.to_matrix();

    let groups = match &request.stakeholder_groups {
        Some(raw) => {
            // criteria removed by constraints no longer bias anyone
            let active: BTreeMap<String, Vec<String>> = raw
                .iter()
                .map(|(group, names)| {
                    let kept = names
                        .iter()
                        .filter(|name| {
                            criteria.contains(*name)
                                || !request.criteria.iter().any(|c| &c.name == *name)
                        })
                        .cloned()
                        .collect();
                    (group.clone(), kept)
                })
                .collect();
            StakeholderGroups::new(&active, &criteria)?
        }
        None => StakeholderGroups::with_defaults(&criteria),
    };

    let ahp_config = AhpConfig {
        consistency_threshold: args.consistency_threshold,
        aggregation: args.aggregation.into(),
    };
    let sim_config = SimulationConfig {
        stakeholders_per_group: args.stakeholders_per_group,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut weighting = args.weighting;
    if weighting != Weighting::Equal && groups.is_empty() {
        warn!("No stakeholder group matches the selected criteria, using equal weights");
        weighting = Weighting::Equal;
    }

    // Weight and score
    let mut method = Method::Topsis;
    let mut consistent_judgments = None;
    let (weights, scores) = match weighting {
        Weighting::Equal => {
            let weights = WeightVector::equal(criteria.len());
            let scores = topsis(&matrix, &weights, &types)?;
            (weights, scores)
        }
        Weighting::Ahp => {
            let sim = simulate_decision_making(&selection.table, &groups, &sim_config, &mut rng)?;
            let weights = match ahp::ahp(&sim.pcms, &ahp_config) {
                Ok(outcome) => {
                    consistent_judgments = Some(outcome.consistent);
                    outcome.weights
                }
                Err(McdaError::NoConsistentJudgments { total }) => {
                    warn!(
                        "All {} judgment matrices inconsistent, using equal weights",
                        total
                    );
                    consistent_judgments = Some(0);
                    WeightVector::equal(criteria.len())
                }
                Err(e) => return Err(e.into()),
            };
            let scores = topsis(&matrix, &weights, &types)?;
            (weights, scores)
        }
        Weighting::FuzzyAhp => {
            let sim = simulate_decision_making(&selection.table, &groups, &sim_config, &mut rng)?;
            match ahp::fuzzy_ahp(&sim.pcms, &ahp_config) {
                Ok(outcome) => {
                    consistent_judgments = Some(outcome.fuzzy_weights_list.len());
                    let scores = if args.method == Method::FuzzyTopsis {
                        method = Method::FuzzyTopsis;
                        fuzzy_topsis(
                            &outcome.fuzzy_weights_list,
                            &sim.dms,
                            &types,
                            ahp_config.aggregation,
                        )?
                    } else {
                        topsis(&matrix, &outcome.weights, &types)?
                    };
                    (outcome.weights, scores)
                }
                Err(McdaError::NoConsistentJudgments { total }) => {
                    warn!(
                        "All {} fuzzy judgment matrices inconsistent, using equal weights with TOPSIS",
                        total
                    );
                    consistent_judgments = Some(0);
                    let weights = WeightVector::equal(criteria.len());
                    let scores = topsis(&matrix, &weights, &types)?;
                    (weights, scores)
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    for (criterion, w) in criteria.iter().zip(weights.as_slice()) {
        debug!("  weight {:.4} | {}", w, criterion);
    }

    let ranking = Ranking::new(selection.table.ids(), scores)?;
    let ranked = ranking.labelled(&selection.table);

    // Show top 10 by score
    info!("\nTop 10 sites by score:");
    for site in ranked.iter().take(10) {
        info!(
            "  {:>3} | {:.4} | {:40} | {}",
            site.rank,
            site.score,
            site.label.chars().take(40).collect::<String>(),
            site.id
        );
    }

    // Optional sensitivity analysis
    let sensitivity = match args.sensitivity_rank {
        Some(rank) => {
            let target = ranking
                .id_at_rank(rank)
                .with_context(|| format!("no site at rank {} of {}", rank, ranking.len()))?;
            Some(sensitivity_analysis(
                &selection.table,
                &types,
                target,
                &SensitivityConfig::default(),
            )?)
        }
        None => None,
    };

    // Optional scenario comparison
    let scenario = if args.compare.is_empty() {
        None
    } else {
        let ids: Vec<AlternativeId> = args.compare.iter().copied().map(AlternativeId).collect();
        Some(compare_alternatives(&projection.table, &ids)?)
    };

    let report = AnalysisReport {
        ranking: ranked,
        criteria: selection.criteria.clone(),
        weights,
        sensitivity,
        scenario,
        metadata: ReportMetadata {
            weighting: weighting.label().to_string(),
            method: method.label().to_string(),
            total_alternatives: selection.table.len(),
            consistent_judgments,
            seed: args.seed,
            generated_at: chrono::Utc::now().to_rfc3339(),
        },
    };

    // Write output
    info!("\nWriting output to {:?}", args.output);
    let file = File::create(&args.output)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &report)?;

    // Summary
    info!("\n{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Alternatives ranked: {}", report.metadata.total_alternatives);
    info!(
        "Weighting: {} | Method: {}",
        report.metadata.weighting, report.metadata.method
    );
    if let Some(best) = report.ranking.first() {
        info!("Best site: {} ({:.4})", best.label, best.score);
    }
    if let Some(top) = report
        .sensitivity
        .as_ref()
        .and_then(|s| s.most_influential())
    {
        info!(
            "Most influential criterion: {} (impact {:.4})",
            top.criterion, top.impact
        );
    }

    Ok(())
}
