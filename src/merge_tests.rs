use tempfile::tempdir;

use super::*;
use crate::model::Step;

fn step(outputs: &[&str]) -> Step {
    Step {
        outputs: outputs.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn plan_includes_only_outputs_with_a_branch_version_on_disk() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("out.csv#dev"), "x").unwrap();
    let fs = Filesystem::local(dir.path());

    let tree = ParseTree {
        steps: vec![step(&["out.csv"]), step(&["other.csv"])],
        methods: Default::default(),
    };

    let moves = plan(&tree, &["=...".to_string()], "dev", &fs).unwrap();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].src, "out.csv#dev");
    assert_eq!(moves[0].dst, "out.csv");
}

#[test]
fn apply_moves_branch_file_over_existing_main_file() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("out.csv#dev"), "new").unwrap();
    std::fs::write(dir.path().join("out.csv"), "old").unwrap();
    let fs = Filesystem::local(dir.path());

    let moves = vec![Move {
        src: "out.csv#dev".to_string(),
        dst: "out.csv".to_string(),
    }];

    let done = apply(&moves, &fs).unwrap();
    assert_eq!(done, 1);
    assert_eq!(std::fs::read_to_string(dir.path().join("out.csv")).unwrap(), "new");
    assert!(!dir.path().join("out.csv#dev").exists());
}
