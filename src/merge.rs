//! Merge Coordinator (component I): promotes branch-namespaced outputs
//! back into the main namespace, one file at a time, best-effort
//! (spec §4.I).

use crate::error::Result;
use crate::fs::Filesystem;
use crate::model::ParseTree;
use crate::options::Options;
use crate::selector::select;

#[derive(Debug, Clone)]
pub struct Move {
    pub src: String,
    pub dst: String,
}

pub fn plan(tree: &ParseTree, targets: &[String], branch: &str, fs: &Filesystem) -> Result<Vec<Move>> {
    let selections = select(tree, targets)?;
    let mut moves = Vec::new();
    for selection in &selections {
        for output in &tree.steps[selection.index].outputs {
            let src = format!("{output}#{branch}");
            if fs.data_in(&src) {
                moves.push(Move {
                    src,
                    dst: output.clone(),
                });
            }
        }
    }
    Ok(moves)
}

/// Executes the move list in order. Aborts on the first failure;
/// already-completed moves are not rolled back.
pub fn apply(moves: &[Move], fs: &Filesystem) -> Result<usize> {
    let mut done = 0;
    for m in moves {
        let backend = fs.get_fs(&m.src)?;
        backend.rm(crate::fs::path_filename(&m.dst))?;
        backend.mv(crate::fs::path_filename(&m.src), crate::fs::path_filename(&m.dst))?;
        done += 1;
    }
    Ok(done)
}

pub fn run(tree: &ParseTree, targets: &[String], options: &Options, fs: &Filesystem) -> Result<usize> {
    let moves = plan(tree, targets, &options.merge_branch, fs)?;
    if moves.is_empty() {
        info!("Nothing to do.");
        return Ok(0);
    }

    if !options.auto {
        for m in &moves {
            println!("{} -> {}", m.src, m.dst);
        }
        print!("Merge these files? [y/n] ");
        use std::io::{self, BufRead, Write};
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        if !line.trim().eq_ignore_ascii_case("y") {
            return Ok(0);
        }
    }

    apply(&moves, fs)
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
