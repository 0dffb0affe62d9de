use super::*;
use crate::test_support::strategies::arb_id_string;
use proptest::prelude::*;
use std::str::FromStr;

#[test]
fn cell_id_parse_accepts_valid() {
    assert!(CellId::parse("cell-1").is_ok());
}

#[test]
fn cell_id_parse_rejects_invalid() {
    assert!(CellId::parse("").is_err());
    assert!(CellId::parse("_leading").is_err());
}

#[test]
fn worker_id_sequential_format() {
    assert_eq!(WorkerId::sequential(3).as_str(), "worker-3");
}

#[test]
fn priority_ordering_high_first() {
    assert!(Priority::High > Priority::Medium);
    assert!(Priority::Medium > Priority::Low);
}

#[test]
fn priority_default_is_medium() {
    assert_eq!(Priority::default(), Priority::Medium);
}

#[test]
fn platform_from_str_roundtrip() {
    assert_eq!(Platform::from_str("claude").unwrap(), Platform::Claude);
    assert_eq!(Platform::Opencode.to_string(), "opencode");
    assert!(Platform::from_str("bogus").is_err());
}

#[test]
fn dimension_weights_sum_to_one() {
    let total: f64 = Dimension::ALL.iter().map(|d| d.weight()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

proptest! {
    /// Every string matching the shared id grammar parses as a `CellId`
    /// and round-trips through `as_str` unchanged (§6 "Input validation").
    #[test]
    fn arbitrary_grammar_strings_parse_and_roundtrip(raw in arb_id_string()) {
        let parsed = CellId::parse(raw.clone()).expect("grammar-valid string must parse");
        prop_assert_eq!(parsed.as_str(), raw.as_str());
    }

    /// A leading `-`/`_` is never valid regardless of what follows.
    #[test]
    fn leading_punctuation_always_rejected(rest in "[A-Za-z0-9_-]{0,20}") {
        prop_assert!(CellId::parse(format!("-{rest}")).is_err());
        prop_assert!(CellId::parse(format!("_{rest}")).is_err());
    }
}
