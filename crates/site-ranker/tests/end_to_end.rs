//! Full pipeline runs through the public API

use rand::rngs::StdRng;
use rand::SeedableRng;
use site_ranker::ahp::{ahp, derive_weights, fuzzy_ahp};
use site_ranker::loader::{load_analysis, load_table};
use site_ranker::scenario::compare_alternatives;
use site_ranker::selection::{apply_constraints, select_criteria};
use site_ranker::sensitivity::sensitivity_analysis;
use site_ranker::simulation::simulate_decision_making;
use site_ranker::topsis::{fuzzy_topsis, topsis};
use site_ranker::{
    AhpConfig, AlternativeId, Criterion, CriterionType, McdaError, PairwiseMatrix,
    PerformanceTable, Ranking, SensitivityConfig, SimulationConfig, StakeholderGroups,
    WeightVector, CONSISTENCY_THRESHOLD,
};
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

const SITES: &str = r#"[
    {"community_name": "Kinlochbervie", "average_income": 24000, "fishing_dependency": 0.42, "marine_biodiversity": 7.1, "distance_from_offshore_wind_farm": 35.0, "potential_wind_farm_capacity": 420},
    {"community_name": "Ullapool", "average_income": 29500, "fishing_dependency": 0.18, "marine_biodiversity": 6.4, "distance_from_offshore_wind_farm": 12.5, "potential_wind_farm_capacity": 610},
    {"community_name": "Lochinver", "average_income": 26000, "fishing_dependency": 0.31, "marine_biodiversity": 8.3, "distance_from_offshore_wind_farm": 48.0, "potential_wind_farm_capacity": 300},
    {"community_name": "Scrabster", "average_income": 31000, "fishing_dependency": 0.22, "marine_biodiversity": 5.2, "distance_from_offshore_wind_farm": 8.0, "potential_wind_farm_capacity": 750},
    {"community_name": "Mallaig", "average_income": 27500, "fishing_dependency": 0.37, "marine_biodiversity": 7.8, "distance_from_offshore_wind_farm": 22.0, "potential_wind_farm_capacity": 520}
]"#;

const ANALYSIS: &str = r#"{
    "criteria": [
        {"name": "average_income", "type": "max"},
        {"name": "fishing_dependency", "type": "min"},
        {"name": "marine_biodiversity", "type": "max"},
        {"name": "distance_from_offshore_wind_farm", "type": "min"},
        {"name": "potential_wind_farm_capacity", "type": "max"}
    ],
    "constraints": [{"criterion": "average_income", "lower": 25000}]
}"#;

fn write_json(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_two_criteria_ranking() {
    let table = PerformanceTable::from_rows(
        &["benefit", "cost"],
        vec![vec![7.0, 3.0], vec![5.0, 5.0], vec![2.0, 8.0]],
    )
    .unwrap();
    let types = [CriterionType::Max, CriterionType::Min];
    let scores = topsis(&table.to_matrix(), &WeightVector::equal(2), &types).unwrap();
    let ranking = Ranking::new(table.ids(), scores).unwrap();

    assert_eq!(ranking.id_at_rank(1), Some(AlternativeId(0)));
    assert_eq!(ranking.id_at_rank(3), Some(AlternativeId(2)));
    assert!(ranking.score(AlternativeId(0)).unwrap() > ranking.score(AlternativeId(2)).unwrap());
}

#[test]
fn test_consistent_pcm_weights_recovered() {
    let pcm = PairwiseMatrix::from_weights(&[0.6, 0.3, 0.1]).unwrap();
    let result = derive_weights(&pcm);
    assert!(result.consistency_ratio.abs() < 1e-9);

    let outcome = ahp(&[pcm], &AhpConfig::default()).unwrap();
    assert_eq!((outcome.consistent, outcome.total), (1, 1));
    let weights = outcome.weights;
    for (w, expected) in weights.as_slice().iter().zip([0.6, 0.3, 0.1]) {
        assert!((w - expected).abs() < 0.02, "weight {w} vs {expected}");
    }
    assert!((weights.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn test_loaded_pipeline_with_simulated_weights() {
    let data = write_json(SITES);
    let analysis = write_json(ANALYSIS);

    let table = load_table(data.path(), "community_name").unwrap();
    let request = load_analysis(analysis.path()).unwrap();
    let selection = select_criteria(&table, &request.criteria).unwrap();
    let selection = apply_constraints(&selection, &request.constraints).unwrap();

    // Kinlochbervie falls below the income floor
    assert_eq!(selection.table.len(), 4);
    assert!(selection.table.get(AlternativeId(0)).is_none());

    let types = selection.types();
    let groups = StakeholderGroups::with_defaults(selection.table.criteria());
    // no fisheries criteria in this dataset
    assert_eq!(groups.len(), 3);

    let config = SimulationConfig::default();
    let sim = simulate_decision_making(
        &selection.table,
        &groups,
        &config,
        &mut StdRng::seed_from_u64(42),
    )
    .unwrap();
    assert_eq!(sim.len(), 3 * config.stakeholders_per_group);

    let outcome = ahp(&sim.pcms, &AhpConfig::default()).unwrap();
    assert!(outcome.consistent > 0);
    assert_eq!(outcome.total, sim.len());
    let weights = outcome.weights;
    assert!((weights.sum() - 1.0).abs() < 1e-9);

    let scores = topsis(&selection.table.to_matrix(), &weights, &types).unwrap();
    let ranking = Ranking::new(selection.table.ids(), scores).unwrap();
    let labelled = ranking.labelled(&selection.table);
    assert_eq!(labelled.len(), 4);
    assert!(labelled.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(labelled.iter().all(|s| s.id != AlternativeId(0)));

    let target = ranking.id_at_rank(1).unwrap();
    let report =
        sensitivity_analysis(&selection.table, &types, target, &SensitivityConfig::default())
            .unwrap();
    assert_eq!(report.criteria.len(), types.len());
    assert!(report.criteria.iter().all(|c| c.impact >= 0.0));
}

#[test]
fn test_fuzzy_pipeline_is_seed_reproducible() {
    let data = write_json(SITES);
    let table = load_table(data.path(), "community_name").unwrap();
    let criteria = vec![
        Criterion::new("average_income", CriterionType::Max),
        Criterion::new("marine_biodiversity", CriterionType::Max),
        Criterion::new("distance_from_offshore_wind_farm", CriterionType::Min),
    ];
    let selection = select_criteria(&table, &criteria).unwrap();
    let types = selection.types();
    let groups = StakeholderGroups::with_defaults(selection.table.criteria());
    let config = AhpConfig {
        consistency_threshold: CONSISTENCY_THRESHOLD,
        ..AhpConfig::default()
    };

    let run = |seed: u64| -> Vec<f64> {
        let sim = simulate_decision_making(
            &selection.table,
            &groups,
            &SimulationConfig::default(),
            &mut StdRng::seed_from_u64(seed),
        )
        .unwrap();
        let outcome = fuzzy_ahp(&sim.pcms, &config).unwrap();
        fuzzy_topsis(&outcome.fuzzy_weights_list, &sim.dms, &types, config.aggregation).unwrap()
    };

    let first = run(7);
    assert_eq!(first, run(7));
    assert_eq!(first.len(), selection.table.len());
    assert!(first.iter().all(|s| (0.0..=1.0).contains(s)));
}

#[test]
fn test_fuzzy_pipeline_with_criterion_no_group_prefers() {
    let data = write_json(SITES);
    let table = load_table(data.path(), "community_name").unwrap();
    let criteria = vec![
        Criterion::new("average_income", CriterionType::Max),
        Criterion::new("marine_biodiversity", CriterionType::Max),
        Criterion::new("distance_from_offshore_wind_farm", CriterionType::Min),
    ];
    let selection = select_criteria(&table, &criteria).unwrap();
    let types = selection.types();

    // every stakeholder gives the distance column the neutral score
    let mut raw = BTreeMap::new();
    raw.insert(
        "technical".to_string(),
        vec!["average_income".to_string(), "marine_biodiversity".to_string()],
    );
    let groups = StakeholderGroups::new(&raw, selection.table.criteria()).unwrap();
    let config = AhpConfig::default();

    for seed in 0..5 {
        let sim = simulate_decision_making(
            &selection.table,
            &groups,
            &SimulationConfig::default(),
            &mut StdRng::seed_from_u64(seed),
        )
        .unwrap();
        assert!(sim.dms.iter().all(|dm| (0..dm.nrows()).all(|i| dm.get(i, 2) == 5)));

        let outcome = fuzzy_ahp(&sim.pcms, &config).unwrap();
        let scores =
            fuzzy_topsis(&outcome.fuzzy_weights_list, &sim.dms, &types, config.aggregation)
                .unwrap();
        assert_eq!(scores.len(), selection.table.len());
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)), "seed {seed}: {scores:?}");
    }
}

#[test]
fn test_scenario_means_ignore_constraints() {
    let data = write_json(SITES);
    let analysis = write_json(ANALYSIS);
    let table = load_table(data.path(), "community_name").unwrap();
    let request = load_analysis(analysis.path()).unwrap();

    let projection = select_criteria(&table, &request.criteria).unwrap();
    let constrained = apply_constraints(&projection, &request.constraints).unwrap();
    assert!(matches!(
        compare_alternatives(&constrained.table, &[AlternativeId(0)]),
        Err(McdaError::UnknownAlternative(AlternativeId(0)))
    ));

    // Kinlochbervie is filtered out of the ranking but can still be compared
    let comparison =
        compare_alternatives(&projection.table, &[AlternativeId(0), AlternativeId(1)]).unwrap();
    let income = comparison
        .criteria
        .iter()
        .position(|c| c == "average_income")
        .unwrap();

    // mean income over all five sites is 27600
    let removed = comparison.row(AlternativeId(0)).unwrap();
    assert_eq!(removed.label, "Kinlochbervie");
    let expected = (24000.0 - 27600.0) / 27600.0 * 100.0;
    assert!((removed.deviations_pct[income] - expected).abs() < 1e-9);
    let kept = comparison.row(AlternativeId(1)).unwrap();
    let expected = (29500.0 - 27600.0) / 27600.0 * 100.0;
    assert!((kept.deviations_pct[income] - expected).abs() < 1e-9);
}
