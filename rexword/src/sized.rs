//! Length-bounded decomposition of syntax trees.
//!
//! [`constrain_length`] answers, for a window `[min, max)` of string
//! lengths, which lengths a pattern can produce and which sub-expression
//! produces each one. The result is a [`SizedPattern`]: one optional fragment
//! per length, where every fragment only matches strings of exactly that
//! length.
//!
//! Concatenation is a convolution over lengths, alternation a merge, and
//! `*`/`+` a closure built from repeated convolution. The closure stops once
//! the shortest non-empty repetition can no longer fit below `max`, which
//! bounds the work by the window rather than by the pattern.

use crate::error::Error;
use crate::pattern::{Pattern, PatternNode};
use core::fmt;
use log::{debug, trace};
use std::collections::HashMap;

/// Fragments of a pattern indexed by the length they produce.
#[derive(Clone)]
pub struct SizedPattern {
    sizes: Vec<Option<Pattern>>,
    min: usize,
    max: usize,
}

impl SizedPattern {
    /// The decomposition with no achievable length, over `[0, 0)`.
    pub fn empty() -> Self {
        Self {
            sizes: Vec::new(),
            min: 0,
            max: 0,
        }
    }

    /// A decomposition holding `fragment` at exactly `len`.
    pub fn single(len: usize, fragment: Pattern) -> Self {
        Self {
            sizes: vec![Some(fragment)],
            min: len,
            max: len + 1,
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Reports whether no length in the interval is achievable.
    pub fn is_empty(&self) -> bool {
        self.sizes.iter().all(Option::is_none)
    }

    pub fn in_bounds(&self, len: usize) -> bool {
        self.min <= len && len < self.max
    }

    /// The fragment producing strings of length `len`, if any.
    pub fn get(&self, len: usize) -> Option<&Pattern> {
        if !self.in_bounds(len) {
            return None;
        }
        self.sizes[len - self.min].as_ref()
    }

    /// Achievable lengths with their fragments, shortest first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Pattern)> + '_ {
        self.sizes
            .iter()
            .enumerate()
            .filter_map(|(offset, entry)| entry.as_ref().map(|re| (self.min + offset, re)))
    }

    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|(len, _)| len)
    }

    /// Folds every fragment back into a single pattern.
    pub fn to_pattern(&self) -> Pattern {
        let mut fragments: Vec<Pattern> = self.iter().map(|(_, re)| re.clone()).collect();
        match fragments.len() {
            0 => Pattern::no_match(),
            1 => fragments.remove(0),
            _ => Pattern::alternate(fragments),
        }
    }

    /// Restricts the decomposition to `[min, max)`.
    ///
    /// A window that does not intersect the current interval yields the
    /// empty decomposition. Only `min > max` is rejected.
    pub fn trim(&self, min: usize, max: usize) -> Result<SizedPattern, Error> {
        check_bounds(min, max)?;
        Ok(self.clip(min, max))
    }

    fn clip(&self, min: usize, max: usize) -> SizedPattern {
        let lo = self.min.max(min);
        let hi = self.max.min(max);
        if lo >= hi {
            return SizedPattern::empty();
        }
        if lo == self.min && hi == self.max {
            return self.clone();
        }
        SizedPattern {
            sizes: self.sizes[lo - self.min..hi - self.min].to_vec(),
            min: lo,
            max: hi,
        }
    }
}

/// Equality by interval and fragment identity.
impl PartialEq for SizedPattern {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min
            && self.max == other.max
            && self
                .sizes
                .iter()
                .zip(&other.sizes)
                .all(|pair| match pair {
                    (Some(a), Some(b)) => a.ptr_eq(b),
                    (None, None) => true,
                    _ => false,
                })
    }
}

impl fmt::Debug for SizedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) {{", self.min, self.max)?;
        for (i, (len, re)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {:?}", len, re)?;
        }
        f.write_str("}")
    }
}

fn check_bounds(min: usize, max: usize) -> Result<(), Error> {
    if min > max {
        return Err(Error::InvalidBounds { min, max });
    }
    Ok(())
}

/// Accumulates fragments per length before freezing them into a
/// [`SizedPattern`]. Several fragments on one length become an alternation.
struct SizedBuilder {
    buckets: Vec<Vec<Pattern>>,
    min: usize,
    max: usize,
}

impl SizedBuilder {
    fn new(min: usize, max: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); max - min],
            min,
            max,
        }
    }

    fn in_bounds(&self, len: usize) -> bool {
        self.min <= len && len < self.max
    }

    fn insert(&mut self, len: usize, re: &Pattern) {
        debug_assert!(self.in_bounds(len), "insert outside [{}, {})", self.min, self.max);
        let bucket = &mut self.buckets[len - self.min];
        match re.node() {
            PatternNode::Alternate(subs) => {
                for sub in subs {
                    push_distinct(bucket, sub);
                }
            }
            _ => push_distinct(bucket, re),
        }
    }

    fn finish(self) -> SizedPattern {
        let sizes = self
            .buckets
            .into_iter()
            .map(|mut bucket| match bucket.len() {
                0 => None,
                1 => bucket.pop(),
                _ => Some(Pattern::alternate(bucket)),
            })
            .collect();
        SizedPattern {
            sizes,
            min: self.min,
            max: self.max,
        }
    }
}

fn push_distinct(bucket: &mut Vec<Pattern>, re: &Pattern) {
    if !bucket.iter().any(|existing| existing == re) {
        bucket.push(re.clone());
    }
}

/// Concatenates two same-length-class fragments, or `None` when the pair
/// cannot match anything.
fn concat_fragments(a: &Pattern, b: &Pattern) -> Option<Pattern> {
    match (a.node(), b.node()) {
        (PatternNode::NoMatch, _) | (_, PatternNode::NoMatch) => None,
        (PatternNode::EmptyMatch, _) => Some(b.clone()),
        (_, PatternNode::EmptyMatch) => Some(a.clone()),
        (PatternNode::Literal(x), PatternNode::Literal(y)) => {
            Some(Pattern::literal(x.iter().chain(y).copied()))
        }
        _ => {
            let mut subs = Vec::new();
            push_flat(&mut subs, a);
            push_flat(&mut subs, b);
            if subs.len() == 1 {
                return subs.pop();
            }
            Some(Pattern::concat(subs))
        }
    }
}

fn push_flat(subs: &mut Vec<Pattern>, re: &Pattern) {
    match re.node() {
        PatternNode::Concat(parts) => {
            for part in parts {
                push_fused(subs, part);
            }
        }
        _ => push_fused(subs, re),
    }
}

fn push_fused(subs: &mut Vec<Pattern>, re: &Pattern) {
    if let (Some(last), PatternNode::Literal(tail)) = (subs.last_mut(), re.node()) {
        if let PatternNode::Literal(head) = last.node() {
            *last = Pattern::literal(head.iter().chain(tail).copied());
            return;
        }
    }
    subs.push(re.clone());
}

/// Concatenation of two decompositions, keeping lengths below `max`.
///
/// Every pair of achievable lengths `a + b < max` contributes the
/// concatenation of its two fragments at length `a + b`.
pub fn convolve(a: &SizedPattern, b: &SizedPattern, max: usize) -> SizedPattern {
    if a.is_empty() || b.is_empty() {
        return SizedPattern::empty();
    }
    let lo = a.min + b.min;
    let hi = (a.max + b.max - 1).min(max);
    if lo >= hi {
        return SizedPattern::empty();
    }
    let mut builder = SizedBuilder::new(lo, hi);
    for (a_len, a_re) in a.iter() {
        for (b_len, b_re) in b.iter() {
            let len = a_len + b_len;
            if len >= hi {
                break;
            }
            if let Some(ab) = concat_fragments(a_re, b_re) {
                builder.insert(len, &ab);
            }
        }
    }
    builder.finish()
}

/// Union of two decompositions restricted to `[min, max)`.
pub fn merge(
    a: &SizedPattern,
    b: &SizedPattern,
    min: usize,
    max: usize,
) -> Result<SizedPattern, Error> {
    check_bounds(min, max)?;
    Ok(union(a, b, min, max))
}

fn union(a: &SizedPattern, b: &SizedPattern, min: usize, max: usize) -> SizedPattern {
    let covered = [a, b].into_iter().filter(|s| !s.is_empty());
    let (lo, hi) = covered.fold((usize::MAX, 0), |(lo, hi), s| {
        (lo.min(s.min), hi.max(s.max))
    });
    let lo = lo.max(min);
    let hi = hi.min(max);
    if lo >= hi {
        return SizedPattern::empty();
    }
    let mut builder = SizedBuilder::new(lo, hi);
    for (len, re) in a.iter().chain(b.iter()) {
        if builder.in_bounds(len) {
            builder.insert(len, re);
        }
    }
    builder.finish()
}

/// One or more copies of `sub`, restricted to lengths below `max`.
///
/// Repetition stops at the first count whose shortest non-empty product no
/// longer fits, so the number of convolutions is `ceil(max / unit)` where
/// `unit` is the shortest non-zero length of `sub`.
pub fn closure(sub: &SizedPattern, max: usize) -> SizedPattern {
    let Some(unit) = sub.lengths().find(|&len| len > 0) else {
        return sub.clip(0, max);
    };
    let powers = max.div_ceil(unit);
    trace!("closure over unit length {}: {} powers below {}", unit, powers, max);

    let mut star = sub.clip(0, max);
    let mut acc = sub.clone();
    for _ in 2..powers {
        acc = convolve(&acc, sub, max);
        if acc.is_empty() {
            break;
        }
        star = union(&star, &acc, 0, max);
    }
    star
}

/// Decomposes `pattern` over the string lengths `[min, max)`.
///
/// Fails when the tree still contains a `Repeat` node, when a backreference
/// does not resolve to a capture visited before it, or when `min >= max`.
pub fn constrain_length(pattern: &Pattern, min: usize, max: usize) -> Result<SizedPattern, Error> {
    if min >= max {
        return Err(Error::InvalidBounds { min, max });
    }
    let mut constrainer = Constrainer::new();
    let sized = constrainer.constrain(pattern, min, max)?;
    debug!(
        "constrained {} over [{}, {}) to lengths {:?}",
        pattern,
        min,
        max,
        sized.lengths().collect::<Vec<_>>()
    );
    Ok(sized)
}

struct Memo {
    min: usize,
    max: usize,
    sized: SizedPattern,
}

/// Per-call state: results by node identity and captures in visiting order.
struct Constrainer {
    memo: HashMap<usize, Memo>,
    captures: Vec<Option<SizedPattern>>,
    capture_slots: HashMap<usize, usize>,
    /// The one empty-match fragment used for optional and starred terms.
    empty: Pattern,
}

impl Constrainer {
    fn new() -> Self {
        Self {
            memo: HashMap::new(),
            captures: Vec::new(),
            capture_slots: HashMap::new(),
            empty: Pattern::empty_match(),
        }
    }

    fn empty_match(&self) -> SizedPattern {
        SizedPattern::single(0, self.empty.clone())
    }

    fn constrain(&mut self, re: &Pattern, min: usize, max: usize) -> Result<SizedPattern, Error> {
        let key = re.addr();
        if let Some(memo) = self.memo.get(&key) {
            if memo.min <= min && max <= memo.max {
                trace!("memo hit for {} on [{}, {})", re.kind(), min, max);
                return memo.sized.trim(min, max);
            }
        }

        let sized = match re.node() {
            PatternNode::NoMatch => SizedPattern::empty(),
            PatternNode::EmptyMatch
            | PatternNode::BeginLine
            | PatternNode::EndLine
            | PatternNode::BeginText
            | PatternNode::EndText
            | PatternNode::WordBoundary
            | PatternNode::NoWordBoundary => SizedPattern::single(0, re.clone()).trim(min, max)?,
            PatternNode::Class(_) | PatternNode::AnyCharNotNl | PatternNode::AnyChar => {
                SizedPattern::single(1, re.clone()).trim(min, max)?
            }
            PatternNode::Literal(chars) => {
                SizedPattern::single(chars.len(), re.clone()).trim(min, max)?
            }
            PatternNode::Capture { inner, .. } => {
                let slot = self.capture_slot(key);
                let capture = self.constrain(inner, min, max)?;
                self.captures[slot] = Some(capture.clone());
                capture
            }
            PatternNode::Backref(index) => self.backref(*index)?.trim(min, max)?,
            PatternNode::Quest(inner) => {
                let sub = self.constrain(inner, min, max)?;
                if min == 0 {
                    union(&sub, &self.empty_match(), min, max)
                } else {
                    sub
                }
            }
            PatternNode::Star(inner) => {
                let sub = self.constrain(inner, 0, max)?;
                let mut acc = closure(&sub, max);
                if min == 0 {
                    acc = union(&acc, &self.empty_match(), min, max);
                }
                acc.trim(min, max)?
            }
            PatternNode::Plus(inner) => {
                let sub = self.constrain(inner, 0, max)?;
                closure(&sub, max).trim(min, max)?
            }
            PatternNode::Concat(subs) => self.concat(subs, min, max)?,
            PatternNode::Alternate(subs) => {
                let mut acc = SizedPattern::empty();
                for sub in subs {
                    let next = self.constrain(sub, min, max)?;
                    acc = union(&acc, &next, min, max);
                }
                acc
            }
            PatternNode::Repeat { .. } => {
                return Err(Error::UnsimplifiedRepeat {
                    operation: "constrain_length",
                });
            }
        };

        self.memo.insert(
            key,
            Memo {
                min,
                max,
                sized: sized.clone(),
            },
        );
        Ok(sized)
    }

    fn concat(&mut self, subs: &[Pattern], min: usize, max: usize) -> Result<SizedPattern, Error> {
        let Some((first, rest)) = subs.split_first() else {
            return self.empty_match().trim(min, max);
        };
        let mut acc = self.constrain(first, 0, max)?;
        // Later terms are still visited when `acc` is empty so that their
        // captures exist for backreferences further right.
        for sub in rest {
            let budget = max.saturating_sub(acc.min);
            let next = self.constrain(sub, 0, budget)?;
            acc = convolve(&acc, &next, max);
        }
        acc.trim(min, max)
    }

    /// Reserves the capture's position on first visit so numbering follows
    /// the order in which captures are entered.
    fn capture_slot(&mut self, key: usize) -> usize {
        if let Some(&slot) = self.capture_slots.get(&key) {
            return slot;
        }
        let slot = self.captures.len();
        self.captures.push(None);
        self.capture_slots.insert(key, slot);
        slot
    }

    fn backref(&self, index: u32) -> Result<&SizedPattern, Error> {
        let captures = self.captures.len();
        if index == 0 || index as usize > captures {
            return Err(Error::BackrefOutOfRange { index, captures });
        }
        self.captures[index as usize - 1]
            .as_ref()
            .ok_or(Error::UnresolvedBackref { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> Pattern {
        Pattern::literal(text.chars())
    }

    fn sized(entries: &[(usize, &Pattern)], min: usize, max: usize) -> SizedPattern {
        let mut builder = SizedBuilder::new(min, max);
        for (len, re) in entries {
            builder.insert(*len, re);
        }
        builder.finish()
    }

    #[test]
    fn trim_narrows_and_clamps() {
        let a = lit("a");
        let abc = lit("abc");
        let s = sized(&[(1, &a), (3, &abc)], 1, 5);

        let t = s.trim(2, 10).expect("valid bounds");
        assert_eq!((t.min(), t.max()), (2, 5));
        assert!(t.get(1).is_none());
        assert!(t.get(3).is_some_and(|re| re.ptr_eq(&abc)));

        let disjoint = s.trim(7, 9).expect("valid bounds");
        assert_eq!(disjoint, SizedPattern::empty());
    }

    #[test]
    fn trim_rejects_inverted_bounds() {
        let s = SizedPattern::single(1, lit("a"));
        assert_eq!(s.trim(3, 2), Err(Error::InvalidBounds { min: 3, max: 2 }));
    }

    #[test]
    fn concat_fragments_fuses_literals_across_sequences() {
        let dot = Pattern::any_char_not_nl();
        let left = Pattern::concat(vec![dot.clone(), lit("ab")]);
        let joined = concat_fragments(&left, &lit("c")).expect("fragments combine");
        match joined.node() {
            PatternNode::Concat(subs) => {
                assert_eq!(subs.len(), 2);
                assert!(subs[0].ptr_eq(&dot));
                assert_eq!(subs[1].to_string(), "abc");
            }
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn concat_fragments_drops_empty_and_annihilates_no_match() {
        let a = lit("a");
        let joined = concat_fragments(&Pattern::empty_match(), &a).expect("identity");
        assert!(joined.ptr_eq(&a));
        assert!(concat_fragments(&a, &Pattern::no_match()).is_none());
    }

    #[test]
    fn builder_flattens_alternations() {
        let a = lit("a");
        let b = lit("b");
        let c = lit("c");
        let mut builder = SizedBuilder::new(1, 2);
        builder.insert(1, &a);
        builder.insert(1, &Pattern::alternate(vec![b.clone(), c.clone()]));
        builder.insert(1, &a);
        let s = builder.finish();
        match s.get(1).map(Pattern::node) {
            Some(PatternNode::Alternate(subs)) => {
                assert_eq!(subs.len(), 3);
                assert!(subs[0].ptr_eq(&a) && subs[1].ptr_eq(&b) && subs[2].ptr_eq(&c));
            }
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn convolve_respects_budget() {
        let a = lit("a");
        let bb = lit("bb");
        let left = sized(&[(1, &a)], 1, 2);
        let right = sized(&[(2, &bb)], 2, 3);
        assert!(convolve(&left, &right, 3).is_empty());
        let joined = convolve(&left, &right, 4);
        assert_eq!(joined.lengths().collect::<Vec<_>>(), vec![3]);
        assert_eq!(joined.get(3).map(ToString::to_string).as_deref(), Some("abb"));
    }

    #[test]
    fn closure_of_empty_only_is_itself() {
        let s = SizedPattern::single(0, Pattern::empty_match());
        assert_eq!(closure(&s, 5), s);
    }
}
