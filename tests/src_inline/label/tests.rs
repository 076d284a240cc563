use std::collections::{BTreeMap, HashMap};

use super::metadata::VariableInfo;
use super::*;
use crate::decode::{Term, decode};

fn catalog() -> VariableCatalog {
    let mut variables = HashMap::new();
    variables.insert(
        "region".to_string(),
        VariableInfo {
            label: Some("Region".to_string()),
            format: None,
            value_labels: Some(BTreeMap::from([(1, "North".to_string()), (2, "South".to_string())])),
        },
    );
    variables.insert(
        "year".to_string(),
        VariableInfo {
            label: None,
            format: Some("%ty".to_string()),
            value_labels: None,
        },
    );
    variables.insert(
        "day".to_string(),
        VariableInfo {
            label: Some("Day".to_string()),
            format: Some("%td".to_string()),
            value_labels: None,
        },
    );
    variables.insert(
        "share".to_string(),
        VariableInfo {
            label: Some("  ".to_string()),
            format: Some("%9.2f".to_string()),
            value_labels: None,
        },
    );
    VariableCatalog { variables }
}

#[test]
fn test_base_level_without_metadata() {
    assert_eq!(variable_label(&decode("2b.region"), &NoMetadata), "base region = 2");
}

#[test]
fn test_lag_and_lead_labels() {
    assert_eq!(variable_label(&decode("l2.gdp"), &NoMetadata), "gdp (t - 2)");
    assert_eq!(variable_label(&decode("f.gdp"), &NoMetadata), "gdp (t + 1)");
    assert_eq!(variable_label(&decode("ld.gdp"), &NoMetadata), "gdp (t - 1) (delta)");
}

#[test]
fn test_constant_label() {
    assert_eq!(variable_label(&decode("_cons"), &catalog()), "constant");
}

#[test]
fn test_value_labels_and_formats() {
    let meta = catalog();
    assert_eq!(variable_label(&decode("2.region"), &meta), "Region = South");
    // value-label set exists but has no entry for this level
    assert_eq!(variable_label(&decode("7.region"), &meta), "Region = 7");
    assert_eq!(variable_label(&decode("2019.year"), &meta), "year = 2019");
    assert_eq!(variable_label(&decode("0.day"), &meta), "Day = 01jan1960");
    assert_eq!(variable_label(&decode("3.share"), &meta), "share = 3.00");
}

#[test]
fn test_base_prefix_wraps_everything() {
    let meta = catalog();
    assert_eq!(
        variable_label(&decode("1bo.region"), &meta),
        "base Region = North"
    );
}

#[test]
fn test_power_notation() {
    let square = Term::parse("c.age#c.age");
    assert_eq!(term_label(&square, &NoMetadata), "age²");

    let cube = Term::parse("c.age#c.age#c.age");
    assert_eq!(term_label(&cube, &NoMetadata), "age³");

    let quartic = Term::parse("c.age#c.age#c.age#c.age");
    assert_eq!(term_label(&quartic, &NoMetadata), "age * age * age * age");
}

#[test]
fn test_interaction_keeps_first_occurrence_order() {
    let meta = catalog();
    let t = Term::parse("2.region#c.income#c.income");
    assert_eq!(term_label(&t, &meta), "Region = South * income²");

    let t = Term::parse("c.income#2.region");
    assert_eq!(term_label(&t, &meta), "income * Region = South");
}

#[test]
fn test_term_label_is_stable() {
    let meta = catalog();
    let t = Term::parse("1b.region#l.gdp");
    let first = term_label(&t, &meta);
    let second = term_label(&Term::parse("1b.region#l.gdp"), &meta);
    assert_eq!(first, second);
    assert_eq!(first, "base Region = North * gdp (t - 1)");
}

#[test]
fn test_format_level_variants() {
    assert_eq!(format::format_level("%9.0g", 12), "12");
    assert_eq!(format::format_level("%8.1f", 4), "4.0");
    assert_eq!(format::format_level("%10.2e", 1500), "1.50e+03");
    assert_eq!(format::format_level("%td", 366), "01jan1961");
    assert_eq!(format::format_level("%-12s", 5), "5");
}

#[test]
fn test_civil_from_days() {
    assert_eq!(format::civil_from_days(0), Some((1970, 1, 1)));
    assert_eq!(format::civil_from_days(-3653), Some((1960, 1, 1)));
    assert_eq!(format::civil_from_days(19_723), Some((2024, 1, 1)));
    assert_eq!(format::civil_from_days(i64::MAX), None);
}

#[test]
fn test_daily_format_out_of_range_prints_raw_level() {
    let meta = catalog();
    assert_eq!(
        variable_label(&decode("9223372036854775807.day"), &meta),
        "Day = 9223372036854775807"
    );
    assert_eq!(
        format::format_level("%td", i64::MIN),
        i64::MIN.to_string()
    );
}

#[test]
fn test_catalog_from_json() {
    let json = r#"{
        "variables": {
            "Region": {"label": "Region", "value_labels": {"1": "North"}},
            "wage": {"format": ""}
        }
    }"#;
    let meta: VariableCatalog = serde_json::from_str(json).unwrap();
    assert!(meta.has_value_labels("Region"));
    assert_eq!(meta.value_label("Region", 1), Some("North"));
    assert_eq!(meta.display_format("wage"), None);
    assert_eq!(variable_label(&decode("1.wage"), &meta), "wage = 1");
}
