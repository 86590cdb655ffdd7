//! Target Selector (component C): turns target expressions into an
//! ordered, deduplicated, topologically sorted list of `TargetSelection`
//! (spec §4.C).

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::model::{Build, MatchType, ParseTree, TargetSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ancestors {
    /// Unprefixed or `^`: just the named step (see DESIGN.md Open
    /// Question decision on default ancestor inclusion).
    NamedOnly,
    /// `+`: the named step plus every transitive dependency.
    WithAncestors,
}

struct ParsedExpr {
    forced: bool,
    exclude: bool,
    ancestors: Ancestors,
    name: String,
    select_all: bool,
}

fn parse_expr(expr: &str) -> ParsedExpr {
    let mut rest = expr;
    let mut forced = false;
    if let Some(stripped) = rest.strip_prefix('!') {
        forced = true;
        rest = stripped;
    }

    if rest == "=..." {
        return ParsedExpr {
            forced,
            exclude: false,
            ancestors: Ancestors::NamedOnly,
            name: String::new(),
            select_all: true,
        };
    }

    let mut exclude = false;
    let mut ancestors = Ancestors::NamedOnly;
    if let Some(stripped) = rest.strip_prefix('-') {
        exclude = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        ancestors = Ancestors::WithAncestors;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('^') {
        rest = stripped;
    }

    ParsedExpr {
        forced,
        exclude,
        ancestors,
        name: rest.to_string(),
        select_all: false,
    }
}

/// Resolves a single name to (indices, match_type), trying the most
/// specific match first: output path, then tag, then method name.
fn resolve_name(tree: &ParseTree, name: &str) -> Result<(Vec<usize>, MatchType)> {
    let by_output = tree.producers_of_output(name);
    if !by_output.is_empty() {
        return Ok((by_output, MatchType::Output));
    }
    let by_tag = tree.producers_of_tag(name);
    if !by_tag.is_empty() {
        return Ok((by_tag, MatchType::Tag));
    }
    let by_method = tree.steps_using_method(name);
    if !by_method.is_empty() {
        return Ok((by_method, MatchType::Method));
    }
    Err(Error::InvalidTarget(name.to_string()))
}

pub fn select(tree: &ParseTree, exprs: &[String]) -> Result<Vec<TargetSelection>> {
    let mut included: HashMap<usize, (Build, MatchType)> = HashMap::new();
    let mut excluded: BTreeSet<usize> = BTreeSet::new();

    for expr in exprs {
        let parsed = parse_expr(expr);

        let (indices, match_type) = if parsed.select_all {
            ((0..tree.steps.len()).collect::<Vec<_>>(), MatchType::Output)
        } else {
            resolve_name(tree, &parsed.name)?
        };

        if parsed.exclude {
            excluded.extend(indices);
            continue;
        }

        let build = if parsed.forced {
            Build::Forced
        } else {
            Build::Normal
        };

        for idx in indices {
            let mut targets = BTreeSet::from([idx]);
            if parsed.ancestors == Ancestors::WithAncestors {
                targets.extend(tree.all_dependencies(idx));
            }
            for target in targets {
                let entry = included.entry(target).or_insert((build, match_type));
                if build == Build::Forced {
                    entry.0 = Build::Forced;
                }
                if match_type < entry.1 {
                    entry.1 = match_type;
                }
            }
        }
    }

    for idx in &excluded {
        included.remove(idx);
    }

    Ok(topological_order(tree, included))
}

fn topological_order(
    tree: &ParseTree,
    included: HashMap<usize, (Build, MatchType)>,
) -> Vec<TargetSelection> {
    let mut visited: BTreeSet<usize> = BTreeSet::new();
    let mut ordered = Vec::new();

    fn visit(
        tree: &ParseTree,
        idx: usize,
        included: &HashMap<usize, (Build, MatchType)>,
        visited: &mut BTreeSet<usize>,
        ordered: &mut Vec<usize>,
    ) {
        if !visited.insert(idx) {
            return;
        }
        for dep in tree.direct_dependencies(idx) {
            if included.contains_key(&dep) {
                visit(tree, dep, included, visited, ordered);
            }
        }
        ordered.push(idx);
    }

    let mut keys: Vec<usize> = included.keys().copied().collect();
    keys.sort_unstable();
    for idx in keys {
        visit(tree, idx, &included, &mut visited, &mut ordered);
    }

    ordered
        .into_iter()
        .map(|idx| {
            let (build, match_type) = included[&idx];
            TargetSelection {
                index: idx,
                build,
                match_type,
                cause: None,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
