//! Core data model: steps, methods, the parse tree, and target selections.
//!
//! Passive data only — invariants are enforced once, at construction
//! (mirrors the way `jdx-hk`'s `step::Step` is a plain serde struct with
//! validation pushed into a handful of methods, not scattered across the
//! codebase).

use std::collections::{BTreeSet, VecDeque};

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// A single fragment of a command line: either literal text or a
/// reference to a variable that must be resolved at materialization time.
///
/// Mirrors the parser's "singleton set marks a var-ref" convention
/// (spec Design Note "Command fragment representation") as a proper
/// tagged variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Literal(String),
    VarRef(String),
}

pub type CommandLine = Vec<Fragment>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodMode {
    #[default]
    Use,
    Append,
    Replace,
}

#[derive(Debug, Clone)]
pub struct StepOpts {
    pub method: Option<String>,
    pub method_mode: MethodMode,
    pub timecheck: bool,
    pub protocol: Option<String>,
}

impl Default for StepOpts {
    fn default() -> Self {
        Self {
            method: None,
            method_mode: MethodMode::default(),
            timecheck: true,
            protocol: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Step {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub input_tags: Vec<String>,
    pub output_tags: Vec<String>,
    pub vars: IndexMap<String, String>,
    pub cmds: Vec<CommandLine>,
    pub opts: StepOpts,
}

#[derive(Debug, Clone, Default)]
pub struct Method {
    pub vars: IndexMap<String, String>,
    pub cmds: Vec<CommandLine>,
    pub opts: StepOpts,
}

/// Owns every `Step`/`Method` for a workflow. Steps are identified by
/// their position in `steps` (invariant 1: dense, immutable `[0, N)`
/// indices).
#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    pub steps: Vec<Step>,
    pub methods: IndexMap<String, Method>,
}

impl ParseTree {
    pub fn validate(&self) -> Result<()> {
        for step in &self.steps {
            if let Some(name) = &step.opts.method {
                if !self.methods.contains_key(name) {
                    return Err(Error::Syntax {
                        line_no: 0,
                        text: name.clone(),
                        msg: format!("step references undefined method '{name}'"),
                    });
                }
            }
            for input in &step.inputs {
                if input.starts_with('?') {
                    return Err(Error::UnsupportedOptionalInput(input.clone()));
                }
            }
            crate::protocol::resolve(step.opts.protocol.as_deref())?;
        }
        Ok(())
    }

    /// Every step index whose `outputs` contains `path`.
    pub fn producers_of_output(&self, path: &str) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.outputs.iter().any(|o| o == path))
            .map(|(i, _)| i)
            .collect()
    }

    /// Every step index whose `output_tags` contains `tag`.
    pub fn producers_of_tag(&self, tag: &str) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.output_tags.iter().any(|t| t == tag))
            .map(|(i, _)| i)
            .collect()
    }

    /// Every step index whose `opts.method` equals `name`.
    pub fn steps_using_method(&self, name: &str) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.opts.method.as_deref() == Some(name))
            .map(|(i, _)| i)
            .collect()
    }

    /// Direct dependencies of `idx`: steps that produce one of `idx`'s
    /// inputs or input tags.
    pub fn direct_dependencies(&self, idx: usize) -> BTreeSet<usize> {
        let step = &self.steps[idx];
        let mut deps = BTreeSet::new();
        for input in &step.inputs {
            deps.extend(self.producers_of_output(input));
        }
        for tag in &step.input_tags {
            deps.extend(self.producers_of_tag(tag));
        }
        deps.remove(&idx);
        deps
    }

    /// Every transitive ancestor of `idx` in the dependency DAG.
    pub fn all_dependencies(&self, idx: usize) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<usize> = self.direct_dependencies(idx).into_iter().collect();
        while let Some(d) = queue.pop_front() {
            if seen.insert(d) {
                queue.extend(self.direct_dependencies(d));
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Build {
    Normal,
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchType {
    /// Most specific: matched because an output path equals the target name.
    Output,
    /// Matched via a tag.
    Tag,
    /// Least specific: matched because the step inherits from a named method.
    Method,
}

impl MatchType {
    pub fn via_suffix(&self) -> &'static str {
        match self {
            MatchType::Output => "",
            MatchType::Tag => " (via tag)",
            MatchType::Method => " (via method)",
        }
    }

    pub fn plain_suffix(&self) -> &'static str {
        match self {
            MatchType::Output => "",
            MatchType::Tag => "via tag",
            MatchType::Method => "via method",
        }
    }
}

/// The reason a predicted step is being built, spelled out exactly as
/// spec §3 lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause {
    Forced(MatchType),
    ViaMatch(MatchType),
    MissingOutput,
    Timestamped,
    ProjectedTimestamped,
    NoInputStep,
}

impl std::fmt::Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cause::Forced(mt) => write!(f, "forced{}", mt.via_suffix()),
            Cause::ViaMatch(mt) => write!(f, "{}", mt.plain_suffix()),
            Cause::MissingOutput => write!(f, "missing output"),
            Cause::Timestamped => write!(f, "timestamped"),
            Cause::ProjectedTimestamped => write!(f, "projected timestamped"),
            Cause::NoInputStep => write!(f, "no-input step"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TargetSelection {
    pub index: usize,
    pub build: Build,
    pub match_type: MatchType,
    pub cause: Option<Cause>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
