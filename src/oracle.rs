//! Staleness Oracle (component E): the `should-build?` decision
//! procedure from spec §4.E, run per selected step by the Predictor.

use crate::branch::adjust;
use crate::fs::Filesystem;
use crate::model::{Cause, MatchType, Step};

/// Raised by the oracle itself, distinct from `crate::Error` because the
/// caller (Predictor) needs to decide whether a missing input is fatal
/// or merely means "this step isn't ready yet" (spec §4.E rule 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput(pub Vec<String>);

pub fn should_build(
    step: &Step,
    branch: &str,
    fs: &Filesystem,
    forced: bool,
    triggered: bool,
    match_type: MatchType,
    fail_on_empty: bool,
) -> Result<Option<Cause>, MissingInput> {
    let adjusted = adjust(step, branch, false, fs);

    let empty_inputs: Vec<String> = adjusted
        .inputs
        .iter()
        .filter(|i| !fs.data_in(i))
        .cloned()
        .collect();
    let no_outputs = adjusted.outputs.is_empty();

    // Rule 1.
    if !empty_inputs.is_empty() && (fail_on_empty || !triggered) {
        return Err(MissingInput(empty_inputs));
    }

    // Rule 2.
    if forced {
        return Ok(Some(Cause::Forced(match_type)));
    }

    // Rule 3.
    if match_type != MatchType::Output {
        return Ok(Some(Cause::ViaMatch(match_type)));
    }

    // Rule 4.
    if no_outputs {
        return Ok(None);
    }

    // Rule 5.
    if !triggered && adjusted.outputs.iter().any(|o| !fs.data_in(o)) {
        return Ok(Some(Cause::MissingOutput));
    }

    // Rule 6.
    if !step.opts.timecheck {
        return Ok(None);
    }

    // Rule 7.
    if triggered {
        return Ok(Some(Cause::ProjectedTimestamped));
    }

    // Rule 8.
    if adjusted.inputs.is_empty() {
        return Ok(Some(Cause::NoInputStep));
    }

    // Rule 9.
    let newest_input = adjusted
        .inputs
        .iter()
        .filter_map(|i| fs.newest_in(i))
        .map(|info| info.mod_time_ms)
        .max();
    let oldest_output = adjusted
        .outputs
        .iter()
        .filter(|o| fs.data_in(o))
        .filter_map(|o| fs.oldest_in(o))
        .map(|info| info.mod_time_ms)
        .min();

    match (newest_input, oldest_output) {
        (Some(newest), Some(oldest)) if newest > oldest => Ok(Some(Cause::Timestamped)),
        _ => Ok(None),
    }
}

#[cfg(test)]
#[path = "oracle_tests.rs"]
mod tests;
