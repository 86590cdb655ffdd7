use tempfile::tempdir;

use super::*;
use crate::model::Step;

fn step(inputs: &[&str], outputs: &[&str]) -> Step {
    Step {
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
        outputs: outputs.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn selection(index: usize, build: Build, match_type: MatchType) -> TargetSelection {
    TargetSelection {
        index,
        build,
        match_type,
        cause: None,
    }
}

#[test]
fn forced_leaf_step_with_missing_input_propagates_to_ancestor() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let tree = ParseTree {
        steps: vec![step(&[], &["raw.csv"]), step(&["raw.csv"], &["clean.csv"])],
        methods: Default::default(),
    };

    let selections = vec![
        selection(0, Build::Normal, MatchType::Output),
        selection(1, Build::Forced, MatchType::Output),
    ];

    let predicted = predict(&tree, &selections, "", &fs).unwrap();
    assert_eq!(predicted.len(), 2);
    assert_eq!(predicted[0].index, 0);
    assert_eq!(predicted[0].cause, Cause::NoInputStep);
    assert_eq!(predicted[1].index, 1);
    assert_eq!(predicted[1].cause, Cause::Forced(MatchType::Output));
}

#[test]
fn missing_input_on_non_triggered_step_is_an_error() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let tree = ParseTree {
        steps: vec![step(&["raw.csv"], &["clean.csv"])],
        methods: Default::default(),
    };
    let selections = vec![selection(0, Build::Normal, MatchType::Output)];

    let err = predict(&tree, &selections, "", &fs).unwrap_err();
    assert!(matches!(err, Error::MissingInput(_)));
}

#[test]
fn up_to_date_step_is_skipped() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("out.csv"), "x").unwrap();
    let fs = Filesystem::local(dir.path());

    let tree = ParseTree {
        steps: vec![step(&[], &["out.csv"])],
        methods: Default::default(),
    };
    let selections = vec![selection(0, Build::Normal, MatchType::Tag)];

    let predicted = predict(&tree, &selections, "", &fs).unwrap();
    assert_eq!(predicted.len(), 1);
    assert_eq!(predicted[0].cause, Cause::ViaMatch(MatchType::Tag));
}
