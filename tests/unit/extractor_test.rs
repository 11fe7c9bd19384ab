//! Tests for progress extraction from build output

use indexmap::IndexMap;
use snowball::core::models::{BuildOperation, UnitStatus};
use snowball::core::services::ProgressExtractor;

use crate::common::{compile_lines, run_lines};

fn known(entries: &[(&str, UnitStatus)]) -> IndexMap<String, UnitStatus> {
    entries.iter().map(|(id, s)| ((*id).to_string(), *s)).collect()
}

// =============================================================================
// RUN OUTPUT
// =============================================================================

#[test]
fn test_run_output_yields_completed_models_in_order() {
    let buffer = run_lines(&["proj.core.orders", "proj.core.revenue"]).concat();
    let found = ProgressExtractor::for_run().extract(&buffer, &IndexMap::new());

    let ids: Vec<_> = found.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["proj.core.orders", "proj.core.revenue"]);
    assert!(found.iter().all(|u| u.is_complete()));
}

#[test]
fn test_started_model_is_pending_until_completed() {
    let extractor = ProgressExtractor::for_run();
    let started = "1 of 2 START sql table model proj.core.orders ...... [RUN]\n";

    let found = extractor.extract(started, &IndexMap::new());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status, UnitStatus::Pending);

    // Pending already known: nothing new until the completion line shows up
    let pending = known(&[("proj.core.orders", UnitStatus::Pending)]);
    assert!(extractor.extract(started, &pending).is_empty());

    let buffer = format!("{started}1 of 2 OK created sql table model proj.core.orders [OK in 1s]\n");
    let found = extractor.extract(&buffer, &pending);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status, UnitStatus::Complete);
}

#[test]
fn test_completed_summary_line_is_recognized() {
    let buffer = "Completed model proj.core.orders with status SUCCESS\n";
    let found = ProgressExtractor::for_run().extract(buffer, &IndexMap::new());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].short_name(), "orders");
}

#[test]
fn test_duplicate_and_out_of_order_lines() {
    let buffer = "\
2 of 2 OK created sql table model proj.b [OK in 0.1s]
1 of 2 OK created sql table model proj.a [OK in 0.1s]
2 of 2 OK created sql table model proj.b [OK in 0.1s]
";
    let found = ProgressExtractor::for_run().extract(buffer, &IndexMap::new());
    let ids: Vec<_> = found.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["proj.b", "proj.a"]);
}

// =============================================================================
// COMPILE OUTPUT
// =============================================================================

#[test]
fn test_compile_output_ignores_numeric_summary() {
    let buffer = compile_lines(&["proj.core.orders", "proj.mart.arr"]).concat();
    let found = ProgressExtractor::for_compile().extract(&buffer, &IndexMap::new());

    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|u| u.id.parse::<u64>().is_err()));
}

#[test]
fn test_known_complete_units_are_not_reported_again() {
    let buffer = compile_lines(&["proj.a", "proj.b"]).concat();
    let found = ProgressExtractor::for_compile().extract(&buffer, &known(&[("proj.a", UnitStatus::Complete)]));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "proj.b");
}

#[test]
fn test_operations_without_units_have_no_rules() {
    for operation in [BuildOperation::Deps, BuildOperation::Seed, BuildOperation::Debug] {
        let extractor = ProgressExtractor::for_operation(&operation);
        assert!(extractor.is_empty());
        assert!(extractor.extract("Compiled model proj.a\n", &IndexMap::new()).is_empty());
    }
}

#[test]
fn test_empty_buffer() {
    assert!(ProgressExtractor::for_run().extract("", &IndexMap::new()).is_empty());
}
