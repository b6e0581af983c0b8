//! Pattern validation and syntax statistics over puzzles.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace};
use rexword::{NodeKind, Pattern, SizedPattern, constrain_length, reverse};

use crate::error::Error;
use crate::puzzle::Puzzle;

/// A puzzle pattern that failed to parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{pattern}: {error}")]
pub struct SyntaxError {
    pub pattern: String,
    #[source]
    pub error: rexword_syntax::Error,
}

impl Puzzle {
    /// Parses every pattern and returns the ones that fail, in puzzle order.
    pub fn validate_patterns(&self) -> Vec<SyntaxError> {
        self.patterns()
            .filter_map(|pattern| match rexword_syntax::parse(pattern) {
                Ok(_) => None,
                Err(error) => {
                    debug!("puzzle {:?}: {}", self.id, error);
                    Some(SyntaxError {
                        pattern: pattern.to_owned(),
                        error,
                    })
                }
            })
            .collect()
    }

    /// Adds the node kinds of every parsable pattern to `counts`. Patterns
    /// that fail to parse are skipped.
    pub fn tally_node_kinds(&self, counts: &mut IndexMap<NodeKind, usize>) {
        for pattern in self.patterns() {
            match rexword_syntax::parse(pattern) {
                Ok(tree) => count_nodes(&tree, counts),
                Err(error) => trace!("not counting {:?}: {}", pattern, error),
            }
        }
    }
}

/// Parses `pattern` and rewrites its counted repetition, ready for
/// decomposition or reversal.
pub fn prepare(pattern: &str) -> Result<Pattern, SyntaxError> {
    let tree = rexword_syntax::parse(pattern).map_err(|error| SyntaxError {
        pattern: pattern.to_owned(),
        error,
    })?;
    Ok(rexword_syntax::simplify(&tree))
}

/// Decomposes `pattern`, or its reversal when `reversed` is set, over the
/// lengths `[min, max)`.
///
/// Reversal leaves a backreference in front of the capture it names, so a
/// pattern with backreferences is rejected instead of reversed.
pub fn decompose(
    pattern: &str,
    min: usize,
    max: usize,
    reversed: bool,
) -> Result<SizedPattern, Error> {
    let mut tree = prepare(pattern)?;
    let failed = |source: rexword::Error| Error::Decompose {
        pattern: pattern.to_owned(),
        source,
    };
    if reversed {
        if has_backref(&tree) {
            return Err(Error::ReversedBackref {
                pattern: pattern.to_owned(),
            });
        }
        tree = reverse(&tree).map_err(failed)?;
    }
    constrain_length(&tree, min, max).map_err(failed)
}

/// Walks each shared node once.
fn has_backref(pattern: &Pattern) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![pattern];
    while let Some(re) = stack.pop() {
        if !seen.insert(re.as_ptr()) {
            continue;
        }
        if re.kind() == NodeKind::Backref {
            return true;
        }
        stack.extend(re.subs());
    }
    false
}

fn count_nodes(pattern: &Pattern, counts: &mut IndexMap<NodeKind, usize>) {
    *counts.entry(pattern.kind()).or_default() += 1;
    for sub in pattern.subs() {
        count_nodes(sub, counts);
    }
}

/// Groups failing patterns by error description, in order of first
/// occurrence.
pub fn group_by_message(errors: &[SyntaxError]) -> IndexMap<String, Vec<String>> {
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for err in errors {
        groups
            .entry(err.error.kind().to_string())
            .or_default()
            .push(err.pattern.clone());
    }
    groups
}
