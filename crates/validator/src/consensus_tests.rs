use super::*;
use hive_core::CellId;

fn report(score: u32, all_passed: bool) -> ValidationReport {
    let passed_score = if all_passed { 100 } else { 50 };
    ValidationReport {
        cell_id: CellId::parse("a").unwrap(),
        drone_id: None,
        dimensions: vec![crate::report::DimensionReport {
            dimension: hive_core::Dimension::Technical,
            score: passed_score,
            passed: all_passed,
            issues: vec![],
            details: serde_json::Value::Null,
        }],
        consensus_score: score,
        consensus_reached: false,
        threshold: 90,
    }
}

#[test]
fn s6_three_drones_scores_92_94_91_reach_consensus() {
    let reports = vec![report(92, true), report(94, true), report(91, true)];
    let outcome = evaluate(&reports);
    assert!((outcome.mean - 92.333).abs() < 0.01);
    assert!(outcome.variance < 100.0);
    assert!(outcome.consensus_reached);
}

#[test]
fn s6_one_score_dropped_to_80_breaks_consensus() {
    let reports = vec![report(80, false), report(94, true), report(91, true)];
    let outcome = evaluate(&reports);
    assert!((outcome.mean - 88.333).abs() < 0.01);
    assert!(!outcome.consensus_reached);
}

#[test]
fn mean_above_95_overrides_a_single_dimension_failure() {
    let reports = vec![report(96, false), report(96, true), report(96, true)];
    let outcome = evaluate(&reports);
    assert!(outcome.mean >= 95.0);
    assert!(outcome.consensus_reached);
}

#[test]
fn high_variance_blocks_consensus_even_with_a_good_mean() {
    let reports = vec![report(100, true), report(100, true), report(70, true)];
    let outcome = evaluate(&reports);
    assert!(outcome.mean >= 90.0);
    assert!(outcome.variance >= 100.0);
    assert!(!outcome.consensus_reached);
}

#[test]
fn drone_ids_default_to_sequential_seeds() {
    let pairs = drone_ids_and_seeds(3, None);
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0].1, 1);
    assert_eq!(pairs[2].1, 3);
}

#[test]
fn drone_ids_honor_explicit_seeds() {
    let pairs = drone_ids_and_seeds(2, Some(vec![7, 9]));
    assert_eq!(pairs.iter().map(|(_, s)| *s).collect::<Vec<_>>(), vec![7, 9]);
}
