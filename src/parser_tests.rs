use super::*;

#[test]
fn parses_a_simple_step_with_vars_and_command() {
    let source = "clean.csv <- raw.csv\n  NAME=demo\n  python clean.py $[INPUT] $[OUTPUT] $[NAME]\n";
    let tree = parse(source).unwrap();

    assert_eq!(tree.steps.len(), 1);
    let step = &tree.steps[0];
    assert_eq!(step.inputs, vec!["raw.csv".to_string()]);
    assert_eq!(step.outputs, vec!["clean.csv".to_string()]);
    assert_eq!(step.vars.get("NAME").map(String::as_str), Some("demo"));
    assert_eq!(
        step.cmds[0],
        vec![
            Fragment::Literal("python clean.py ".to_string()),
            Fragment::VarRef("INPUT".to_string()),
            Fragment::Literal(" ".to_string()),
            Fragment::VarRef("OUTPUT".to_string()),
            Fragment::Literal(" ".to_string()),
            Fragment::VarRef("NAME".to_string()),
        ]
    );
}

#[test]
fn parses_tags_on_both_sides() {
    let source = "out.csv, %staging <- raw.csv, %source\n  cmd\n";
    let tree = parse(source).unwrap();
    let step = &tree.steps[0];
    assert_eq!(step.output_tags, vec!["staging".to_string()]);
    assert_eq!(step.input_tags, vec!["source".to_string()]);
}

#[test]
fn parses_method_block_and_step_reference() {
    let source = "load()\n  echo loading\n\nout.csv <- raw.csv [load]\n  cmd\n";
    let tree = parse(source).unwrap();

    assert!(tree.methods.contains_key("load"));
    assert_eq!(tree.steps[0].opts.method.as_deref(), Some("load"));
}

#[test]
fn rejects_header_without_arrow() {
    let err = parse("not-a-valid-header\n  cmd\n").unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
}

#[test]
fn optional_input_rejected_at_validate_time() {
    let err = parse("out.csv <- ?raw.csv\n  cmd\n").unwrap_err();
    assert!(matches!(err, Error::UnsupportedOptionalInput(_)));
}
