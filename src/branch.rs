//! Branch Adjuster (component D): rewrites a step's inputs/outputs to
//! read from / write into a namespaced branch, so two invocations with
//! different `--branch` values never collide on the same output file
//! (spec §4.D).

use crate::fs::Filesystem;
use crate::model::Step;

/// Appends `#<branch>` to `path`, unless it is already suffixed.
pub fn branch_suffix(path: &str, branch: &str) -> String {
    format!("{path}#{branch}")
}

/// Branch-adjusts a single step's inputs and outputs in place.
///
/// `add_to_all` controls whether *inputs* always get the branch suffix
/// (used by the Runner once a step is about to run, after its upstream
/// dependency is known to have produced a branch output) or only when
/// the branch-suffixed input already exists on disk (used by the
/// Staleness Oracle, which must not assume an input will appear).
pub fn adjust(step: &Step, branch: &str, add_to_all: bool, fs: &Filesystem) -> Step {
    if branch.is_empty() {
        return step.clone();
    }

    let mut adjusted = step.clone();
    adjusted.outputs = step
        .outputs
        .iter()
        .map(|o| branch_suffix(o, branch))
        .collect();

    adjusted.inputs = step
        .inputs
        .iter()
        .map(|i| {
            if add_to_all || fs.data_in(&branch_suffix(i, branch)) {
                branch_suffix(i, branch)
            } else {
                i.clone()
            }
        })
        .collect();

    adjusted
}

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;
