//! Rewrites counted repetition into the operators the decomposer understands.

use std::collections::HashMap;

use log::debug;
use rexword::{Pattern, PatternNode};

/// Replaces every `Repeat` node with an equivalent tree built from concat,
/// star, plus and quest. Repeated copies of the operand are the same shared
/// node. Subtrees without a `Repeat` keep their identity.
pub fn simplify(pattern: &Pattern) -> Pattern {
    Simplifier::default().simplify(pattern)
}

#[derive(Default)]
struct Simplifier {
    done: HashMap<*const PatternNode, Pattern>,
}

impl Simplifier {
    fn simplify(&mut self, re: &Pattern) -> Pattern {
        if let Some(done) = self.done.get(&re.as_ptr()) {
            return done.clone();
        }
        let out = self.rewrite(re);
        self.done.insert(re.as_ptr(), out.clone());
        out
    }

    fn rewrite(&mut self, re: &Pattern) -> Pattern {
        match re.node() {
            PatternNode::Capture { index, name, inner } => {
                let sub = self.simplify(inner);
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
            PatternNode::Star(inner) => self.quantified(re, inner, collapse_star, Pattern::star),
            PatternNode::Plus(inner) => self.quantified(re, inner, collapse_plus, Pattern::plus),
            PatternNode::Quest(inner) => self.quantified(re, inner, collapse_quest, Pattern::quest),
            PatternNode::Repeat { inner, min, max } => {
                let sub = self.simplify(inner);
                expand(&sub, *min, *max)
            }
            PatternNode::Concat(subs) => match self.simplify_all(subs) {
                Some(subs) => Pattern::concat(subs),
                None => re.clone(),
            },
            PatternNode::Alternate(subs) => match self.simplify_all(subs) {
                Some(subs) => Pattern::alternate(subs),
                None => re.clone(),
            },
            _ => re.clone(),
        }
    }

    fn quantified(
        &mut self,
        re: &Pattern,
        inner: &Pattern,
        collapse: fn(&Pattern) -> Option<Pattern>,
        wrap: fn(Pattern) -> Pattern,
    ) -> Pattern {
        let sub = self.simplify(inner);
        match collapse(&sub) {
            Some(collapsed) => collapsed,
            None if sub.ptr_eq(inner) => re.clone(),
            None => wrap(sub),
        }
    }

    /// Simplified children, or `None` when every child is unchanged.
    fn simplify_all(&mut self, subs: &[Pattern]) -> Option<Vec<Pattern>> {
        let out: Vec<Pattern> = subs.iter().map(|sub| self.simplify(sub)).collect();
        let changed = out.iter().zip(subs).any(|(new, old)| !new.ptr_eq(old));
        changed.then_some(out)
    }
}

fn collapse_star(sub: &Pattern) -> Option<Pattern> {
    match sub.node() {
        PatternNode::EmptyMatch | PatternNode::Star(_) => Some(sub.clone()),
        PatternNode::Plus(inner) | PatternNode::Quest(inner) => Some(Pattern::star(inner.clone())),
        _ => None,
    }
}

fn collapse_plus(sub: &Pattern) -> Option<Pattern> {
    match sub.node() {
        PatternNode::EmptyMatch | PatternNode::Plus(_) | PatternNode::Star(_) => Some(sub.clone()),
        PatternNode::Quest(inner) => Some(Pattern::star(inner.clone())),
        _ => None,
    }
}

fn collapse_quest(sub: &Pattern) -> Option<Pattern> {
    match sub.node() {
        PatternNode::EmptyMatch | PatternNode::Quest(_) | PatternNode::Star(_) => Some(sub.clone()),
        PatternNode::Plus(inner) => Some(Pattern::star(inner.clone())),
        _ => None,
    }
}

fn star(sub: &Pattern) -> Pattern {
    collapse_star(sub).unwrap_or_else(|| Pattern::star(sub.clone()))
}

fn plus(sub: &Pattern) -> Pattern {
    collapse_plus(sub).unwrap_or_else(|| Pattern::plus(sub.clone()))
}

fn quest(sub: &Pattern) -> Pattern {
    collapse_quest(sub).unwrap_or_else(|| Pattern::quest(sub.clone()))
}

/// `x{min,max}` over an already simplified `x`.
fn expand(sub: &Pattern, min: u32, max: Option<u32>) -> Pattern {
    match max {
        None => match min {
            0 => star(sub),
            1 => plus(sub),
            // x{n,} is n-1 copies of x followed by x+
            _ => {
                let mut seq: Vec<Pattern> = (1..min).map(|_| sub.clone()).collect();
                seq.push(plus(sub));
                Pattern::concat(seq)
            }
        },
        Some(max) if max < min => {
            debug!("repeat {{{},{}}} of {:?} matches nothing", min, max, sub);
            Pattern::no_match()
        }
        Some(0) => Pattern::empty_match(),
        Some(max) => {
            // x{n,m} is n copies of x, then m-n copies of one shared x?.
            // Depth does not grow with the counts.
            let mut seq: Vec<Pattern> = (0..min).map(|_| sub.clone()).collect();
            if max > min {
                let optional = quest(sub);
                seq.extend((min..max).map(|_| optional.clone()));
            }
            match seq.len() {
                1 => seq.swap_remove(0),
                _ => Pattern::concat(seq),
            }
        }
    }
}
