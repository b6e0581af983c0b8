//! Immutable regular-expression syntax trees.
//!
//! A pattern is a tree of [`PatternNode`] values behind a reference-counted
//! [`Pattern`] handle. Handles are cheap to clone and subtrees may be shared
//! between several parents, so a tree is really a DAG. Transformations never
//! edit a node in place: they build new nodes and reuse untouched children by
//! reference, which keeps node identity (see [`Pattern::ptr_eq`]) meaningful
//! for memoisation.

use core::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Pattern {
    node: Arc<PatternNode>,
}

#[derive(Clone, PartialEq, Eq)]
pub enum PatternNode {
    /// Matches nothing, not even the empty string.
    NoMatch,
    /// Matches only the empty string.
    EmptyMatch,
    BeginLine,
    EndLine,
    BeginText,
    EndText,
    WordBoundary,
    NoWordBoundary,
    AnyCharNotNl,
    AnyChar,
    Literal(Vec<char>),
    Class(Vec<ClassRange>),
    Capture {
        index: u32,
        name: Option<String>,
        inner: Pattern,
    },
    Backref(u32),
    Star(Pattern),
    Plus(Pattern),
    Quest(Pattern),
    Repeat {
        inner: Pattern,
        min: u32,
        max: Option<u32>,
    },
    Concat(Vec<Pattern>),
    Alternate(Vec<Pattern>),
}

/// An inclusive range of code points inside a character class.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassRange {
    pub start: char,
    pub end: char,
}

/// The variant of a [`PatternNode`] without its payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    NoMatch,
    EmptyMatch,
    BeginLine,
    EndLine,
    BeginText,
    EndText,
    WordBoundary,
    NoWordBoundary,
    AnyCharNotNl,
    AnyChar,
    Literal,
    Class,
    Capture,
    Backref,
    Star,
    Plus,
    Quest,
    Repeat,
    Concat,
    Alternate,
}

impl Pattern {
    pub fn new(node: PatternNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &PatternNode {
        &self.node
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// Reports whether both handles point at the same node allocation.
    pub fn ptr_eq(&self, other: &Pattern) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Address of the shared node, usable as an identity key while the node
    /// is alive.
    pub fn as_ptr(&self) -> *const PatternNode {
        Arc::as_ptr(&self.node)
    }

    pub(crate) fn addr(&self) -> usize {
        self.as_ptr() as usize
    }

    /// Direct children in left-to-right order.
    pub fn subs(&self) -> &[Pattern] {
        match self.node() {
            PatternNode::Capture { inner, .. }
            | PatternNode::Repeat { inner, .. }
            | PatternNode::Star(inner)
            | PatternNode::Plus(inner)
            | PatternNode::Quest(inner) => core::slice::from_ref(inner),
            PatternNode::Concat(subs) | PatternNode::Alternate(subs) => subs,
            _ => &[],
        }
    }

    pub fn no_match() -> Self {
        Self::new(PatternNode::NoMatch)
    }

    pub fn empty_match() -> Self {
        Self::new(PatternNode::EmptyMatch)
    }

    pub fn any_char() -> Self {
        Self::new(PatternNode::AnyChar)
    }

    pub fn any_char_not_nl() -> Self {
        Self::new(PatternNode::AnyCharNotNl)
    }

    pub fn literal<I: IntoIterator<Item = char>>(chars: I) -> Self {
        Self::new(PatternNode::Literal(chars.into_iter().collect()))
    }

    /// Builds a class from arbitrary ranges, sorting and coalescing them.
    /// Reversed ranges are swapped.
    pub fn class<I: IntoIterator<Item = ClassRange>>(ranges: I) -> Self {
        let mut ranges: Vec<ClassRange> = ranges
            .into_iter()
            .map(|range| ClassRange::new(range.start, range.end))
            .collect();
        ranges.sort_unstable();
        let mut merged: Vec<ClassRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if next_char(last.end).is_none_or(|next| range.start <= next) => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }
        Self::new(PatternNode::Class(merged))
    }

    pub fn capture(index: u32, inner: Pattern) -> Self {
        Self::new(PatternNode::Capture {
            index,
            name: None,
            inner,
        })
    }

    pub fn named_capture(index: u32, name: impl Into<String>, inner: Pattern) -> Self {
        Self::new(PatternNode::Capture {
            index,
            name: Some(name.into()),
            inner,
        })
    }

    pub fn backref(index: u32) -> Self {
        Self::new(PatternNode::Backref(index))
    }

    pub fn star(inner: Pattern) -> Self {
        Self::new(PatternNode::Star(inner))
    }

    pub fn plus(inner: Pattern) -> Self {
        Self::new(PatternNode::Plus(inner))
    }

    pub fn quest(inner: Pattern) -> Self {
        Self::new(PatternNode::Quest(inner))
    }

    pub fn repeat(inner: Pattern, min: u32, max: Option<u32>) -> Self {
        Self::new(PatternNode::Repeat { inner, min, max })
    }

    pub fn concat(subs: Vec<Pattern>) -> Self {
        Self::new(PatternNode::Concat(subs))
    }

    pub fn alternate(subs: Vec<Pattern>) -> Self {
        Self::new(PatternNode::Alternate(subs))
    }
}

/// Structural equality. Handles to the same node compare equal without
/// walking the tree.
impl PartialEq for Pattern {
    fn eq(&self, other: &Pattern) -> bool {
        self.ptr_eq(other) || self.node == other.node
    }
}

impl Eq for Pattern {}

impl PatternNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            PatternNode::NoMatch => NodeKind::NoMatch,
            PatternNode::EmptyMatch => NodeKind::EmptyMatch,
            PatternNode::BeginLine => NodeKind::BeginLine,
            PatternNode::EndLine => NodeKind::EndLine,
            PatternNode::BeginText => NodeKind::BeginText,
            PatternNode::EndText => NodeKind::EndText,
            PatternNode::WordBoundary => NodeKind::WordBoundary,
            PatternNode::NoWordBoundary => NodeKind::NoWordBoundary,
            PatternNode::AnyCharNotNl => NodeKind::AnyCharNotNl,
            PatternNode::AnyChar => NodeKind::AnyChar,
            PatternNode::Literal(_) => NodeKind::Literal,
            PatternNode::Class(_) => NodeKind::Class,
            PatternNode::Capture { .. } => NodeKind::Capture,
            PatternNode::Backref(_) => NodeKind::Backref,
            PatternNode::Star(_) => NodeKind::Star,
            PatternNode::Plus(_) => NodeKind::Plus,
            PatternNode::Quest(_) => NodeKind::Quest,
            PatternNode::Repeat { .. } => NodeKind::Repeat,
            PatternNode::Concat(_) => NodeKind::Concat,
            PatternNode::Alternate(_) => NodeKind::Alternate,
        }
    }
}

impl ClassRange {
    pub fn new(start: char, end: char) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn single(ch: char) -> Self {
        Self { start: ch, end: ch }
    }

    pub fn contains(&self, ch: char) -> bool {
        self.start <= ch && ch <= self.end
    }
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::NoMatch => "no_match",
            NodeKind::EmptyMatch => "empty_match",
            NodeKind::BeginLine => "begin_line",
            NodeKind::EndLine => "end_line",
            NodeKind::BeginText => "begin_text",
            NodeKind::EndText => "end_text",
            NodeKind::WordBoundary => "word_boundary",
            NodeKind::NoWordBoundary => "no_word_boundary",
            NodeKind::AnyCharNotNl => "any_char_not_nl",
            NodeKind::AnyChar => "any_char",
            NodeKind::Literal => "literal",
            NodeKind::Class => "char_class",
            NodeKind::Capture => "capture",
            NodeKind::Backref => "backref",
            NodeKind::Star => "star",
            NodeKind::Plus => "plus",
            NodeKind::Quest => "quest",
            NodeKind::Repeat => "repeat",
            NodeKind::Concat => "concat",
            NodeKind::Alternate => "alternate",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn next_char(ch: char) -> Option<char> {
    match ch {
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(ch as u32 + 1),
    }
}

fn prev_char(ch: char) -> Option<char> {
    match ch {
        '\u{E000}' => Some('\u{D7FF}'),
        _ => (ch as u32).checked_sub(1).and_then(char::from_u32),
    }
}

/// Complement of a sorted, coalesced range list over all scalar values.
fn negate(ranges: &[ClassRange]) -> Vec<ClassRange> {
    let mut out = Vec::new();
    let mut next = Some('\0');
    for range in ranges {
        if let Some(start) = next {
            if start < range.start {
                if let Some(end) = prev_char(range.start) {
                    out.push(ClassRange { start, end });
                }
            }
        }
        next = next_char(range.end);
    }
    if let Some(start) = next {
        out.push(ClassRange {
            start,
            end: char::MAX,
        });
    }
    out
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

impl fmt::Debug for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::NoMatch => f.write_str("∅"),
            PatternNode::EmptyMatch => f.write_str("ε"),
            PatternNode::BeginLine => f.write_str("bol"),
            PatternNode::EndLine => f.write_str("eol"),
            PatternNode::BeginText => f.write_str("bot"),
            PatternNode::EndText => f.write_str("eot"),
            PatternNode::WordBoundary => f.write_str("wb"),
            PatternNode::NoWordBoundary => f.write_str("nwb"),
            PatternNode::AnyCharNotNl => f.write_str("dot"),
            PatternNode::AnyChar => f.write_str("any"),
            PatternNode::Literal(chars) => {
                write!(f, "literal({:?})", chars.iter().collect::<String>())
            }
            PatternNode::Class(ranges) => {
                f.write_str("class[")?;
                for (i, range) in ranges.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}", range)?;
                }
                f.write_str("]")
            }
            PatternNode::Capture { index, name, inner } => match name {
                Some(name) => write!(f, "cap{}<{}>({:?})", index, name, inner),
                None => write!(f, "cap{}({:?})", index, inner),
            },
            PatternNode::Backref(index) => write!(f, "backref({})", index),
            PatternNode::Star(inner) => write!(f, "star({:?})", inner),
            PatternNode::Plus(inner) => write!(f, "plus({:?})", inner),
            PatternNode::Quest(inner) => write!(f, "quest({:?})", inner),
            PatternNode::Repeat { inner, min, max } => {
                f.write_str("repeat(")?;
                write!(f, "{:?}", inner)?;
                match max {
                    Some(max) => write!(f, ", {}..={})", min, max),
                    None => write!(f, ", {}..=∞)", min),
                }
            }
            PatternNode::Concat(subs) => {
                f.write_str("seq(")?;
                for (i, sub) in subs.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}", sub)?;
                }
                f.write_str(")")
            }
            PatternNode::Alternate(subs) => {
                f.write_str("alt(")?;
                for (i, sub) in subs.iter().enumerate() {
                    if i != 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{:?}", sub)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for ClassRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{:?}", self.start)
        } else {
            write!(f, "{:?}-{:?}", self.start, self.end)
        }
    }
}

/// Binding strength of a rendered node; a child weaker than its context is
/// wrapped in a non-capturing group.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Alternate,
    Concat,
    Repeat,
    Atom,
}

fn precedence(pattern: &Pattern) -> Prec {
    match pattern.node() {
        PatternNode::Alternate(subs) | PatternNode::Concat(subs) if subs.len() == 1 => {
            precedence(&subs[0])
        }
        PatternNode::Alternate(subs) if subs.len() > 1 => Prec::Alternate,
        PatternNode::Concat(subs) if subs.len() > 1 => Prec::Concat,
        PatternNode::Literal(chars) if chars.len() > 1 => Prec::Concat,
        PatternNode::Star(_)
        | PatternNode::Plus(_)
        | PatternNode::Quest(_)
        | PatternNode::Repeat { .. } => Prec::Repeat,
        _ => Prec::Atom,
    }
}

fn write_char(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    if regex_syntax::is_meta_character(ch) {
        write!(f, "\\{}", ch)
    } else if ch.is_control() || (ch.is_whitespace() && ch != ' ') {
        write!(f, "\\x{{{:X}}}", ch as u32)
    } else {
        write!(f, "{}", ch)
    }
}

fn write_ranges(f: &mut fmt::Formatter<'_>, ranges: &[ClassRange]) -> fmt::Result {
    for range in ranges {
        write_char(f, range.start)?;
        if range.end != range.start {
            f.write_str("-")?;
            write_char(f, range.end)?;
        }
    }
    Ok(())
}

fn write_class(f: &mut fmt::Formatter<'_>, ranges: &[ClassRange]) -> fmt::Result {
    match ranges {
        [] => f.write_str(r"[^\x{0}-\x{10FFFF}]"),
        [all] if all.start == '\0' && all.end == char::MAX => f.write_str("(?s:.)"),
        [first, .., last] if first.start == '\0' && last.end == char::MAX => {
            f.write_str("[^")?;
            write_ranges(f, &negate(ranges))?;
            f.write_str("]")
        }
        _ => {
            f.write_str("[")?;
            write_ranges(f, ranges)?;
            f.write_str("]")
        }
    }
}

fn write_pattern(f: &mut fmt::Formatter<'_>, pattern: &Pattern, context: Prec) -> fmt::Result {
    if precedence(pattern) < context {
        f.write_str("(?:")?;
        write_node(f, pattern)?;
        return f.write_str(")");
    }
    write_node(f, pattern)
}

fn write_quantified(
    f: &mut fmt::Formatter<'_>,
    inner: &Pattern,
    suffix: fmt::Arguments<'_>,
) -> fmt::Result {
    write_pattern(f, inner, Prec::Atom)?;
    f.write_fmt(suffix)
}

fn write_node(f: &mut fmt::Formatter<'_>, pattern: &Pattern) -> fmt::Result {
    match pattern.node() {
        PatternNode::NoMatch => f.write_str(r"[^\x{0}-\x{10FFFF}]"),
        PatternNode::EmptyMatch => f.write_str("(?:)"),
        PatternNode::BeginLine => f.write_str("(?m:^)"),
        PatternNode::EndLine => f.write_str("(?m:$)"),
        PatternNode::BeginText => f.write_str(r"\A"),
        PatternNode::EndText => f.write_str(r"\z"),
        PatternNode::WordBoundary => f.write_str(r"\b"),
        PatternNode::NoWordBoundary => f.write_str(r"\B"),
        PatternNode::AnyCharNotNl => f.write_str("."),
        PatternNode::AnyChar => f.write_str("(?s:.)"),
        PatternNode::Literal(chars) if chars.is_empty() => f.write_str("(?:)"),
        PatternNode::Literal(chars) => chars.iter().try_for_each(|&ch| write_char(f, ch)),
        PatternNode::Class(ranges) => write_class(f, ranges),
        PatternNode::Capture { inner, name, .. } => {
            match name {
                Some(name) => write!(f, "(?P<{}>", name)?,
                None => f.write_str("(")?,
            }
            write_pattern(f, inner, Prec::Alternate)?;
            f.write_str(")")
        }
        PatternNode::Backref(index) => write!(f, "\\{}", index),
        PatternNode::Star(inner) => write_quantified(f, inner, format_args!("*")),
        PatternNode::Plus(inner) => write_quantified(f, inner, format_args!("+")),
        PatternNode::Quest(inner) => write_quantified(f, inner, format_args!("?")),
        PatternNode::Repeat { inner, min, max } => match max {
            Some(max) if max == min => write_quantified(f, inner, format_args!("{{{}}}", min)),
            Some(max) => write_quantified(f, inner, format_args!("{{{},{}}}", min, max)),
            None => write_quantified(f, inner, format_args!("{{{},}}", min)),
        },
        PatternNode::Concat(subs) if subs.is_empty() => f.write_str("(?:)"),
        PatternNode::Concat(subs) => {
            for (i, sub) in subs.iter().enumerate() {
                write_pattern(f, sub, Prec::Concat)?;
                // `\1` followed by a digit would read as a longer backreference.
                if let (PatternNode::Backref(_), Some(next)) = (sub.node(), subs.get(i + 1)) {
                    if starts_with_digit(next) {
                        f.write_str("(?:)")?;
                    }
                }
            }
            Ok(())
        }
        PatternNode::Alternate(subs) if subs.is_empty() => f.write_str(r"[^\x{0}-\x{10FFFF}]"),
        PatternNode::Alternate(subs) => {
            for (i, sub) in subs.iter().enumerate() {
                if i != 0 {
                    f.write_str("|")?;
                }
                write_pattern(f, sub, Prec::Alternate)?;
            }
            Ok(())
        }
    }
}

fn starts_with_digit(pattern: &Pattern) -> bool {
    match pattern.node() {
        PatternNode::Literal(chars) => chars.first().is_some_and(char::is_ascii_digit),
        PatternNode::Concat(subs) => subs.first().is_some_and(starts_with_digit),
        PatternNode::Star(inner)
        | PatternNode::Plus(inner)
        | PatternNode::Quest(inner)
        | PatternNode::Repeat { inner, .. } => starts_with_digit(inner),
        _ => false,
    }
}

/// Renders the tree as Perl-style regular-expression source.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pattern(f, self, Prec::Alternate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_coalesces_adjacent_ranges() {
        let class = Pattern::class([
            ClassRange::new('d', 'f'),
            ClassRange::single('a'),
            ClassRange::new('b', 'c'),
            ClassRange::single('x'),
        ]);
        match class.node() {
            PatternNode::Class(ranges) => {
                assert_eq!(ranges, &[ClassRange::new('a', 'f'), ClassRange::single('x')]);
            }
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn negate_skips_surrogates() {
        let ranges = [ClassRange::new('\0', '\u{D7FF}')];
        assert_eq!(negate(&ranges), vec![ClassRange::new('\u{E000}', char::MAX)]);
    }

    #[test]
    fn equality_is_structural() {
        let a = Pattern::literal("ab".chars());
        let b = Pattern::literal("ab".chars());
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_eq!(Pattern::star(a.clone()), Pattern::star(b));
        assert_ne!(Pattern::capture(1, a.clone()), Pattern::capture(2, a));
        assert_eq!(Pattern::empty_match(), Pattern::empty_match());
    }

    #[test]
    fn display_wraps_weaker_children() {
        let ab = Pattern::literal("ab".chars());
        let alt = Pattern::alternate(vec![ab.clone(), Pattern::literal("c".chars())]);
        let pattern = Pattern::concat(vec![Pattern::star(ab), alt]);
        assert_eq!(pattern.to_string(), "(?:ab)*(?:ab|c)");
    }

    #[test]
    fn display_negates_wide_classes() {
        let class = Pattern::class([
            ClassRange::new('\0', 'W'),
            ClassRange::new('Y', char::MAX),
        ]);
        assert_eq!(class.to_string(), "[^X]");
    }

    #[test]
    fn display_separates_backref_from_digits() {
        let pattern = Pattern::concat(vec![
            Pattern::capture(1, Pattern::any_char_not_nl()),
            Pattern::backref(1),
            Pattern::literal("2".chars()),
        ]);
        assert_eq!(pattern.to_string(), r"(.)\1(?:)2");
    }
}
