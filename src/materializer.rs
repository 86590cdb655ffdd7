//! Step Materializer (component G): inlines method bodies, merges
//! variable scopes, substitutes variables, and normalizes whitespace
//! (spec §4.G).

use indexmap::IndexMap;

use crate::branch::adjust;
use crate::error::{Error, Result};
use crate::fs::Filesystem;
use crate::model::{CommandLine, Fragment, MethodMode, ParseTree, Step, StepOpts};

#[derive(Debug, Clone)]
pub struct MaterializedStep {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub input_tags: Vec<String>,
    pub output_tags: Vec<String>,
    pub vars_env: IndexMap<String, String>,
    pub cmds: Vec<String>,
    pub opts: StepOpts,
    /// Stable per-step directory name under `.drake/`, derived from the
    /// step's first output (falling back to its first tag, then its
    /// index) since the reference parser is out of scope here.
    pub dirname: String,
}

fn sanitize_dirname(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn step_dirname(step: &Step, idx: usize) -> String {
    if let Some(first) = step.outputs.first() {
        return sanitize_dirname(first);
    }
    if let Some(tag) = step.output_tags.first() {
        return sanitize_dirname(tag);
    }
    format!("step-{idx}")
}

fn join_cmd(cmd: &CommandLine, vars_env: &IndexMap<String, String>) -> Result<String> {
    let mut out = String::new();
    for fragment in cmd {
        match fragment {
            Fragment::Literal(text) => out.push_str(text),
            Fragment::VarRef(name) => {
                let value = vars_env
                    .get(name)
                    .ok_or_else(|| Error::UndefinedVariable(name.clone()))?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Strips the first line's leading-whitespace prefix from every
/// subsequent line that starts with it (spec §4.G step 6).
fn despace(lines: Vec<String>) -> Vec<String> {
    let Some(first) = lines.first() else {
        return lines;
    };
    let prefix_len = first
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();
    if prefix_len == 0 {
        return lines;
    }
    let prefix: String = first.chars().take(prefix_len).collect();

    lines
        .into_iter()
        .map(|line| {
            if let Some(stripped) = line.strip_prefix(prefix.as_str()) {
                stripped.to_string()
            } else {
                line
            }
        })
        .collect()
}

pub fn materialize(
    tree: &ParseTree,
    idx: usize,
    branch: &str,
    os_vars: &IndexMap<String, String>,
    cli_vars: &IndexMap<String, String>,
    fs: &Filesystem,
    cmds_required: bool,
) -> Result<MaterializedStep> {
    let step = &tree.steps[idx];

    for input in &step.inputs {
        if input.starts_with('?') {
            return Err(Error::UnsupportedOptionalInput(input.clone()));
        }
    }

    // 1. Branch-adjust.
    let adjusted = adjust(step, branch, false, fs);

    // 2. Normalize paths: strip the `file:` scheme, if present.
    let inputs: Vec<String> = adjusted
        .inputs
        .iter()
        .map(|p| fs.display_path(p))
        .collect();
    let outputs: Vec<String> = adjusted
        .outputs
        .iter()
        .map(|p| fs.display_path(p))
        .collect();

    // 4. Resolve method inheritance before computing vars_env, so step
    // vars can see (and override) method vars.
    let (mut vars, mut cmds, mut opts) = (step.vars.clone(), step.cmds.clone(), step.opts.clone());
    if let Some(method_name) = &step.opts.method {
        let method = tree
            .methods
            .get(method_name)
            .expect("validate() guarantees method exists");

        cmds = match step.opts.method_mode {
            MethodMode::Replace => step.cmds.clone(),
            MethodMode::Append => {
                let mut combined = method.cmds.clone();
                combined.extend(step.cmds.clone());
                combined
            }
            MethodMode::Use => method.cmds.clone(),
        };

        let mut merged_vars = method.vars.clone();
        merged_vars.extend(step.vars.clone());
        vars = merged_vars;

        opts = StepOpts {
            method: step.opts.method.clone(),
            method_mode: step.opts.method_mode,
            timecheck: step.opts.timecheck,
            protocol: step.opts.protocol.clone().or_else(|| method.opts.protocol.clone()),
        };
    }

    // 3. vars_env: OS env < CLI --vars < step/method vars < INPUT*/OUTPUT*.
    let mut vars_env = os_vars.clone();
    vars_env.extend(cli_vars.clone());
    vars_env.extend(vars.drain(..));

    if let Some(first) = inputs.first() {
        vars_env.insert("INPUT".to_string(), first.clone());
    }
    for (i, input) in inputs.iter().enumerate() {
        vars_env.insert(format!("INPUT{i}"), input.clone());
    }
    vars_env.insert("INPUTS".to_string(), inputs.join(" "));

    if let Some(first) = outputs.first() {
        vars_env.insert("OUTPUT".to_string(), first.clone());
    }
    for (i, output) in outputs.iter().enumerate() {
        vars_env.insert(format!("OUTPUT{i}"), output.clone());
    }
    vars_env.insert("OUTPUTS".to_string(), outputs.join(" "));

    // 5. Substitute variables.
    let substituted: Result<Vec<String>> =
        cmds.iter().map(|cmd| join_cmd(cmd, &vars_env)).collect();
    let substituted = substituted?;

    // 6. De-space.
    let despaced = despace(substituted);

    // 7. Empty-commands check, only when the protocol needs commands.
    if despaced.is_empty() && cmds_required {
        return Err(Error::EmptyCommands);
    }

    Ok(MaterializedStep {
        inputs,
        outputs,
        input_tags: step.input_tags.clone(),
        output_tags: step.output_tags.clone(),
        vars_env,
        cmds: despaced,
        dirname: step_dirname(step, idx),
        opts,
    })
}

#[cfg(test)]
#[path = "materializer_tests.rs"]
mod tests;
