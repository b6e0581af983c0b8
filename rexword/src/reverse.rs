use crate::error::Error;
use crate::pattern::{Pattern, PatternNode};
use std::collections::HashMap;

/// Builds a pattern matching the reversal of every string `pattern` matches.
///
/// Nodes whose subtree is unchanged by reversal are returned as-is, and a
/// subtree shared by several parents is reversed once and stays shared.
/// Zero-width assertions keep their direction: `^` stays `^`.
pub fn reverse(pattern: &Pattern) -> Result<Pattern, Error> {
    Reverser::default().reverse(pattern)
}

#[derive(Default)]
struct Reverser {
    done: HashMap<usize, Pattern>,
}

impl Reverser {
    fn reverse(&mut self, re: &Pattern) -> Result<Pattern, Error> {
        if let Some(reversed) = self.done.get(&re.addr()) {
            return Ok(reversed.clone());
        }
        let reversed = match re.node() {
            PatternNode::NoMatch
            | PatternNode::EmptyMatch
            | PatternNode::BeginLine
            | PatternNode::EndLine
            | PatternNode::BeginText
            | PatternNode::EndText
            | PatternNode::WordBoundary
            | PatternNode::NoWordBoundary
            | PatternNode::Class(_)
            | PatternNode::AnyCharNotNl
            | PatternNode::AnyChar
            | PatternNode::Backref(_) => re.clone(),
            PatternNode::Literal(chars) => {
                if chars.iter().eq(chars.iter().rev()) {
                    re.clone()
                } else {
                    Pattern::literal(chars.iter().rev().copied())
                }
            }
            PatternNode::Capture { index, name, inner } => {
                let sub = self.reverse(inner)?;
                if sub.ptr_eq(inner) {
                    re.clone()
                } else {
                    Pattern::new(PatternNode::Capture {
                        index: *index,
                        name: name.clone(),
                        inner: sub,
                    })
                }
            }
            PatternNode::Star(inner) => self.rewrap(re, inner, Pattern::star)?,
            PatternNode::Plus(inner) => self.rewrap(re, inner, Pattern::plus)?,
            PatternNode::Quest(inner) => self.rewrap(re, inner, Pattern::quest)?,
            PatternNode::Concat(subs) => match subs.as_slice() {
                [] => re.clone(),
                [only] => self.reverse(only)?,
                _ => {
                    let mut reversed = Vec::with_capacity(subs.len());
                    for sub in subs.iter().rev() {
                        reversed.push(self.reverse(sub)?);
                    }
                    Pattern::concat(reversed)
                }
            },
            PatternNode::Alternate(subs) => match subs.as_slice() {
                [only] => self.reverse(only)?,
                _ => {
                    // Copy only once a child actually changes.
                    let mut changed: Option<Vec<Pattern>> = None;
                    for (i, sub) in subs.iter().enumerate() {
                        let nsub = self.reverse(sub)?;
                        if let Some(copy) = changed.as_mut() {
                            copy.push(nsub);
                        } else if !nsub.ptr_eq(sub) {
                            let mut copy = Vec::with_capacity(subs.len());
                            copy.extend_from_slice(&subs[..i]);
                            copy.push(nsub);
                            changed = Some(copy);
                        }
                    }
                    match changed {
                        Some(copy) => Pattern::alternate(copy),
                        None => re.clone(),
                    }
                }
            },
            PatternNode::Repeat { .. } => {
                return Err(Error::UnsimplifiedRepeat {
                    operation: "reverse",
                });
            }
        };
        self.done.insert(re.addr(), reversed.clone());
        Ok(reversed)
    }

    fn rewrap(
        &mut self,
        re: &Pattern,
        inner: &Pattern,
        wrap: fn(Pattern) -> Pattern,
    ) -> Result<Pattern, Error> {
        let sub = self.reverse(inner)?;
        if sub.ptr_eq(inner) {
            Ok(re.clone())
        } else {
            Ok(wrap(sub))
        }
    }
}
