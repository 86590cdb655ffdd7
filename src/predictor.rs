//! Predictor (component F): folds the Staleness Oracle over an ordered
//! list of target selections, growing a `triggered_deps` closure as it
//! goes (spec §4.F).

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::fs::Filesystem;
use crate::model::{Build, Cause, MatchType, ParseTree, TargetSelection};
use crate::oracle::should_build;

#[derive(Debug, Clone)]
pub struct PredictedStep {
    pub index: usize,
    pub build: Build,
    pub match_type: MatchType,
    pub cause: Cause,
}

pub fn predict(
    tree: &ParseTree,
    selections: &[TargetSelection],
    branch: &str,
    fs: &Filesystem,
) -> Result<Vec<PredictedStep>> {
    let mut triggered_deps: BTreeSet<usize> = BTreeSet::new();
    let mut predicted = Vec::new();

    for selection in selections {
        let step = &tree.steps[selection.index];
        let forced = selection.build == Build::Forced;
        let triggered = triggered_deps.contains(&selection.index);

        let result = should_build(
            step,
            branch,
            fs,
            forced,
            triggered,
            selection.match_type,
            false,
        );

        let cause = match result {
            Ok(Some(cause)) => cause,
            Ok(None) => continue,
            Err(missing) => return Err(Error::MissingInput(missing.0)),
        };

        predicted.push(PredictedStep {
            index: selection.index,
            build: selection.build,
            match_type: selection.match_type,
            cause,
        });
        triggered_deps.extend(tree.all_dependencies(selection.index));
    }

    Ok(predicted)
}

#[cfg(test)]
#[path = "predictor_tests.rs"]
mod tests;
