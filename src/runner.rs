//! Runner (component H): drives materialized steps through their
//! protocols, handling the print-only and interactive-confirm modes
//! from spec §4.H.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use indexmap::IndexMap;

use crate::branch::adjust;
use crate::error::{Error, Result};
use crate::fs::Filesystem;
use crate::materializer::materialize;
use crate::model::{Cause, ParseTree};
use crate::oracle::should_build;
use crate::options::Options;
use crate::predictor::{predict, PredictedStep};
use crate::protocol;
use crate::selector::select;

/// One line of §6 print-mode output.
pub fn print_record(tree: &ParseTree, predicted: &PredictedStep, branch: &str, fs: &Filesystem) {
    let step = &tree.steps[predicted.index];
    let adjusted = adjust(step, branch, false, fs);

    println!("S");
    for input in &adjusted.inputs {
        println!("I\t{input}");
    }
    for tag in &step.input_tags {
        println!("%I\t{tag}");
    }
    for output in &adjusted.outputs {
        println!("O\t{output}");
    }
    for tag in &step.output_tags {
        println!("%O\t{tag}");
    }
}

fn step_string(tree: &ParseTree, predicted: &PredictedStep, branch: &str, fs: &Filesystem) -> String {
    let step = &tree.steps[predicted.index];
    let add_to_all = matches!(
        predicted.cause,
        Cause::ProjectedTimestamped | Cause::Forced(_)
    );
    let adjusted = adjust(step, branch, add_to_all, fs);

    let mut out_side: Vec<String> = step.output_tags.iter().map(|t| format!("%{t}")).collect();
    out_side.extend(adjusted.outputs.iter().cloned());
    let mut in_side: Vec<String> = step.input_tags.iter().map(|t| format!("%{t}")).collect();
    in_side.extend(adjusted.inputs.iter().cloned());

    format!("{} <- {}", out_side.join(", "), in_side.join(", "))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/n] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

pub fn run(tree: &ParseTree, targets: &[String], options: &Options, fs: &Filesystem) -> Result<usize> {
    let selections = select(tree, targets)?;
    let predicted = predict(tree, &selections, &options.branch, fs)?;

    if predicted.is_empty() {
        info!("Nothing to do.");
        return Ok(0);
    }

    if options.print {
        for p in &predicted {
            print_record(tree, p, &options.branch, fs);
        }
        return Ok(0);
    }

    if !options.auto {
        for (i, p) in predicted.iter().enumerate() {
            println!(
                "{}. {} ({})",
                i + 1,
                step_string(tree, p, &options.branch, fs),
                p.cause
            );
        }
        if !confirm("Run these steps?")? {
            return Ok(0);
        }
    }

    let os_vars = crate::env::os_vars();
    let mut ran = 0;
    for (i, p) in predicted.iter().enumerate() {
        if run_step(tree, i + 1, p, options, &os_vars, fs)? {
            ran += 1;
        }
    }

    info!("Done ({ran} steps run).");
    Ok(ran)
}

fn run_step(
    tree: &ParseTree,
    step_number: usize,
    predicted: &PredictedStep,
    options: &Options,
    os_vars: &IndexMap<String, String>,
    fs: &Filesystem,
) -> Result<bool> {
    let step = &tree.steps[predicted.index];
    for input in &step.inputs {
        if input.starts_with('?') {
            return Err(Error::UnsupportedOptionalInput(input.clone()));
        }
    }

    let protocol = protocol::resolve(step.opts.protocol.as_deref())?;
    let materialized = materialize(
        tree,
        predicted.index,
        &options.branch,
        os_vars,
        &options.vars,
        fs,
        protocol.cmds_required(),
    )?;

    let cause = should_build(
        step,
        &options.branch,
        fs,
        predicted.build == crate::model::Build::Forced,
        false,
        predicted.match_type,
        true,
    )
    .map_err(|missing| Error::MissingInput(missing.0))?;

    let Some(cause) = cause else {
        info!("--- {step_number}. Skipped (up-to-date)");
        return Ok(false);
    };

    info!("--- {step_number}. Running ({cause})");

    persist_vars(options, &materialized)?;
    let start = Instant::now();
    let base_dir = fs.base_dir().unwrap_or_else(|| std::path::Path::new("."));
    protocol.run(&materialized, base_dir)?;
    info!("--- {step_number}. Done ({:.2}s)", start.elapsed().as_secs_f64());

    Ok(true)
}

fn persist_vars(options: &Options, step: &crate::materializer::MaterializedStep) -> Result<()> {
    let start_time = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    let dir = options
        .workflow
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."))
        .join(".drake")
        .join(&step.dirname);
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(format!("vars-{start_time}"));
    let mut contents = String::new();
    for (k, v) in &step.vars_env {
        contents.push_str(&format!("{k}={v}\n"));
    }
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
