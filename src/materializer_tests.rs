use tempfile::tempdir;

use super::*;
use crate::model::{Method, Step};

fn lit(s: &str) -> Fragment {
    Fragment::Literal(s.to_string())
}

fn var(s: &str) -> Fragment {
    Fragment::VarRef(s.to_string())
}

fn empty_vars() -> IndexMap<String, String> {
    IndexMap::new()
}

#[test]
fn substitutes_input_and_output_vars() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let step = Step {
        inputs: vec!["raw.csv".to_string()],
        outputs: vec!["clean.csv".to_string()],
        cmds: vec![vec![
            lit("cp "),
            var("INPUT"),
            lit(" "),
            var("OUTPUT"),
        ]],
        ..Default::default()
    };
    let tree = ParseTree {
        steps: vec![step],
        methods: Default::default(),
    };

    let materialized =
        materialize(&tree, 0, "", &empty_vars(), &empty_vars(), &fs, true).unwrap();
    assert_eq!(materialized.cmds, vec!["cp raw.csv clean.csv".to_string()]);
}

#[test]
fn undefined_variable_is_an_error() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let step = Step {
        cmds: vec![vec![var("MISSING")]],
        ..Default::default()
    };
    let tree = ParseTree {
        steps: vec![step],
        methods: Default::default(),
    };

    let err =
        materialize(&tree, 0, "", &empty_vars(), &empty_vars(), &fs, true).unwrap_err();
    assert!(matches!(err, Error::UndefinedVariable(_)));
}

#[test]
fn method_use_mode_replaces_step_commands_with_methods() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let mut step = Step {
        cmds: vec![vec![lit("ignored")]],
        ..Default::default()
    };
    step.opts.method = Some("load".to_string());

    let method = Method {
        cmds: vec![vec![lit("from-method")]],
        ..Default::default()
    };

    let tree = ParseTree {
        steps: vec![step],
        methods: IndexMap::from([("load".to_string(), method)]),
    };

    let materialized =
        materialize(&tree, 0, "", &empty_vars(), &empty_vars(), &fs, true).unwrap();
    assert_eq!(materialized.cmds, vec!["from-method".to_string()]);
}

#[test]
fn method_append_mode_runs_method_then_step_commands() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let mut step = Step {
        cmds: vec![vec![lit("step-cmd")]],
        ..Default::default()
    };
    step.opts.method = Some("load".to_string());
    step.opts.method_mode = MethodMode::Append;

    let method = Method {
        cmds: vec![vec![lit("method-cmd")]],
        ..Default::default()
    };

    let tree = ParseTree {
        steps: vec![step],
        methods: IndexMap::from([("load".to_string(), method)]),
    };

    let materialized =
        materialize(&tree, 0, "", &empty_vars(), &empty_vars(), &fs, true).unwrap();
    assert_eq!(
        materialized.cmds,
        vec!["method-cmd".to_string(), "step-cmd".to_string()]
    );
}

#[test]
fn step_vars_win_over_method_vars() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let mut step = Step {
        vars: IndexMap::from([("NAME".to_string(), "step-value".to_string())]),
        cmds: vec![vec![var("NAME")]],
        ..Default::default()
    };
    step.opts.method = Some("m".to_string());

    let method = Method {
        vars: IndexMap::from([("NAME".to_string(), "method-value".to_string())]),
        ..Default::default()
    };

    let tree = ParseTree {
        steps: vec![step],
        methods: IndexMap::from([("m".to_string(), method)]),
    };

    let materialized =
        materialize(&tree, 0, "", &empty_vars(), &empty_vars(), &fs, true).unwrap();
    assert_eq!(materialized.cmds, vec!["step-value".to_string()]);
}

#[test]
fn despace_strips_shared_leading_whitespace() {
    let lines = vec![
        "  first".to_string(),
        "  second".to_string(),
        "third".to_string(),
    ];
    let result = despace(lines);
    assert_eq!(result, vec!["first", "second", "third"]);
}

#[test]
fn empty_commands_fails_only_when_protocol_requires_them() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let step = Step {
        cmds: vec![],
        ..Default::default()
    };
    let tree = ParseTree {
        steps: vec![step],
        methods: Default::default(),
    };

    let err =
        materialize(&tree, 0, "", &empty_vars(), &empty_vars(), &fs, true).unwrap_err();
    assert!(matches!(err, Error::EmptyCommands));

    let ok = materialize(&tree, 0, "", &empty_vars(), &empty_vars(), &fs, false).unwrap();
    assert!(ok.cmds.is_empty());
}

#[test]
fn optional_input_is_rejected() {
    let dir = tempdir().unwrap();
    let fs = Filesystem::local(dir.path());

    let step = Step {
        inputs: vec!["?raw.csv".to_string()],
        ..Default::default()
    };
    let tree = ParseTree {
        steps: vec![step],
        methods: Default::default(),
    };

    let err =
        materialize(&tree, 0, "", &empty_vars(), &empty_vars(), &fs, false).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOptionalInput(_)));
}
