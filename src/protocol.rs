//! Protocol contract (spec §6): the pluggable boundary between a
//! materialized step and whatever actually executes its commands.
//! `ShellProtocol` is grounded on `jdx-hk`'s `CmdLineRunner` (`cmd.rs`),
//! stripped down to the synchronous, single-child-at-a-time shape this
//! engine's concurrency model requires (spec §5: no in-engine
//! concurrency, no signal relay, no cancellation).

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::materializer::MaterializedStep;

pub trait Protocol {
    fn name(&self) -> &'static str;
    fn cmds_required(&self) -> bool;
    /// `base_dir` is the directory the spawned process's CWD must be
    /// set to (spec §5: "External processes started by protocols must
    /// have their CWD set explicitly").
    fn run(&self, step: &MaterializedStep, base_dir: &Path) -> Result<()>;
}

/// Runs each command line through `sh -c`, streaming stdout/stderr
/// through the `log` facade the way `cmd.rs` forwards child output
/// through its progress reporter.
pub struct ShellProtocol;

impl Protocol for ShellProtocol {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn cmds_required(&self) -> bool {
        true
    }

    fn run(&self, step: &MaterializedStep, base_dir: &Path) -> Result<()> {
        for line in &step.cmds {
            debug!("sh -c {line:?} (cwd={})", base_dir.display());
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(line);
            cmd.current_dir(base_dir);
            cmd.envs(&step.vars_env);

            let output = cmd.output().map_err(Error::Io)?;

            for line in String::from_utf8_lossy(&output.stdout).lines() {
                info!("{line}");
            }
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                warn!("{line}");
            }

            if !output.status.success() {
                return Err(Error::ProtocolFailure {
                    step: step.dirname.clone(),
                    detail: format!("command exited with {}", output.status),
                    exit: output.status.code(),
                });
            }
        }
        Ok(())
    }
}

/// Hands a materialized step's commands to an embedded language
/// evaluator rather than a subprocess. Not part of this crate's Size
/// Budget; kept as a thin stub so the protocol registry is total.
pub struct EvaluatorProtocol;

impl Protocol for EvaluatorProtocol {
    fn name(&self) -> &'static str {
        "evaluator"
    }

    fn cmds_required(&self) -> bool {
        true
    }

    fn run(&self, _step: &MaterializedStep, _base_dir: &Path) -> Result<()> {
        Err(Error::UnknownProtocol(
            "evaluator protocol is not implemented in this build".to_string(),
        ))
    }
}

/// Runs commands inside a container image named by the step's options.
/// Stub for the same reason as `EvaluatorProtocol`.
pub struct ContainerProtocol;

impl Protocol for ContainerProtocol {
    fn name(&self) -> &'static str {
        "container"
    }

    fn cmds_required(&self) -> bool {
        true
    }

    fn run(&self, _step: &MaterializedStep, _base_dir: &Path) -> Result<()> {
        Err(Error::UnknownProtocol(
            "container protocol is not implemented in this build".to_string(),
        ))
    }
}

/// Name-keyed lookup matching a step's `opts.protocol` to an
/// implementation; unset protocol defaults to shell.
pub fn resolve(name: Option<&str>) -> Result<Box<dyn Protocol>> {
    match name.unwrap_or("shell") {
        "shell" => Ok(Box::new(ShellProtocol)),
        "evaluator" => Ok(Box::new(EvaluatorProtocol)),
        "container" => Ok(Box::new(ContainerProtocol)),
        other => Err(Error::UnknownProtocol(other.to_string())),
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
