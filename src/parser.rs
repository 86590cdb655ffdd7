//! Reference workflow-file parser. The real parser's grammar is out of
//! scope for this crate; this is a minimal, well-tested front end just
//! rich enough to build a `ParseTree` the rest of the engine can run
//! against. Variable-reference tokenization follows the `${...}`
//! regex-driven style `oddjobs`' `runbook::template` uses, swapped to
//! the `$[name]` marker this format uses for command-line fragments.
//!
//! Step format, one block per step separated by a blank line:
//!
//! ```text
//! out1, out2, %tag <- in1, %tag2 [method-name]
//!   KEY=value
//!   command line using $[KEY] and $[INPUT]
//! ```
//!
//! A method block looks the same but starts with `method-name()` in
//! place of the `out <- in` header.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{CommandLine, Fragment, Method, MethodMode, ParseTree, Step, StepOpts};

static VAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\[([A-Za-z_][A-Za-z0-9_]*)\]").expect("valid regex"));

fn tokenize_command(line: &str) -> CommandLine {
    let mut fragments = Vec::new();
    let mut last_end = 0;
    for m in VAR_REF.find_iter(line) {
        if m.start() > last_end {
            fragments.push(Fragment::Literal(line[last_end..m.start()].to_string()));
        }
        let name = &line[m.start() + 2..m.end() - 1];
        fragments.push(Fragment::VarRef(name.to_string()));
        last_end = m.end();
    }
    if last_end < line.len() {
        fragments.push(Fragment::Literal(line[last_end..].to_string()));
    }
    fragments
}

fn split_side(side: &str) -> (Vec<String>, Vec<String>) {
    let mut paths = Vec::new();
    let mut tags = Vec::new();
    for item in side.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if let Some(tag) = item.strip_prefix('%') {
            tags.push(tag.to_string());
        } else {
            paths.push(item.to_string());
        }
    }
    (paths, tags)
}

fn parse_opts_suffix(header: &str) -> (String, Option<String>) {
    if let Some(open) = header.find('[') {
        if let Some(close) = header.find(']') {
            let method = header[open + 1..close].trim().to_string();
            let head = header[..open].trim().to_string();
            return (head, Some(method));
        }
    }
    (header.trim().to_string(), None)
}

struct Block<'a> {
    header: &'a str,
    vars: IndexMap<String, String>,
    cmds: Vec<CommandLine>,
}

fn split_blocks(source: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut lines = source.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }
        let header = line;
        let mut vars = IndexMap::new();
        let mut cmds = Vec::new();

        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                lines.next();
                break;
            }
            let body_line = lines.next().unwrap();
            let body = body_line.trim_start();
            if let Some((key, value)) = body.split_once('=') {
                if key.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
                    vars.insert(key.to_string(), value.to_string());
                    continue;
                }
            }
            cmds.push(tokenize_command(body_line));
        }

        blocks.push(Block { header, vars, cmds });
    }

    blocks
}

pub fn parse(source: &str) -> Result<ParseTree> {
    let mut steps = Vec::new();
    let mut methods = IndexMap::new();

    for block in split_blocks(source) {
        if let Some(name) = block
            .header
            .trim()
            .strip_suffix("()")
            .map(|s| s.to_string())
        {
            methods.insert(
                name,
                Method {
                    vars: block.vars,
                    cmds: block.cmds,
                    opts: StepOpts::default(),
                },
            );
            continue;
        }

        let Some((left, right)) = block.header.split_once("<-") else {
            return Err(Error::Syntax {
                line_no: 0,
                text: block.header.to_string(),
                msg: "expected 'outputs <- inputs' header".to_string(),
            });
        };

        let (right, method_name) = parse_opts_suffix(right);
        let (outputs, output_tags) = split_side(left);
        let (inputs, input_tags) = split_side(&right);

        steps.push(Step {
            inputs,
            outputs,
            input_tags,
            output_tags,
            vars: block.vars,
            cmds: block.cmds,
            opts: StepOpts {
                method: method_name,
                method_mode: MethodMode::default(),
                timecheck: true,
                protocol: None,
            },
        });
    }

    let tree = ParseTree { steps, methods };
    tree.validate()?;
    Ok(tree)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
