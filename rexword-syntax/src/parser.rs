//! Recursive-descent parser for the Perl regular-expression dialect, extended
//! with backreferences.
//!
//! Structure (groups, alternation, quantifiers, anchors, escapes and
//! backreferences) is parsed here. Everything that denotes a set of
//! characters, bracket classes, Perl classes, Unicode properties and
//! case-folded literals, is handed to `regex_syntax` and translated back into
//! code-point ranges.

use log::trace;
use regex_syntax::hir::{self, Hir, HirKind};
use rexword::{ClassRange, Pattern, PatternNode};

use crate::error::{Error, ErrorKind};

/// Largest count accepted in `{n,m}`.
const MAX_REPEAT: u32 = 1000;

#[derive(Copy, Clone, Debug, Default)]
struct Flags {
    case_insensitive: bool,
    multi_line: bool,
    dot_matches_new_line: bool,
}

/// Configures and builds a [`Parser`].
#[derive(Clone, Debug)]
pub struct ParserBuilder {
    flags: Flags,
    permissive_escapes: bool,
    nest_limit: u32,
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self {
            flags: Flags::default(),
            permissive_escapes: false,
            nest_limit: 1000,
        }
    }

    pub fn build(&self) -> Parser {
        Parser {
            flags: self.flags,
            permissive_escapes: self.permissive_escapes,
            nest_limit: self.nest_limit,
        }
    }

    /// Treat an escaped letter or digit with no special meaning as the
    /// character itself instead of rejecting it.
    pub fn permissive_escapes(&mut self, yes: bool) -> &mut Self {
        self.permissive_escapes = yes;
        self
    }

    /// Initial state of the `i` flag.
    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.flags.case_insensitive = yes;
        self
    }

    /// Initial state of the `m` flag.
    pub fn multi_line(&mut self, yes: bool) -> &mut Self {
        self.flags.multi_line = yes;
        self
    }

    /// Initial state of the `s` flag.
    pub fn dot_matches_new_line(&mut self, yes: bool) -> &mut Self {
        self.flags.dot_matches_new_line = yes;
        self
    }

    /// Maximum depth of nested groups.
    pub fn nest_limit(&mut self, limit: u32) -> &mut Self {
        self.nest_limit = limit;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Parser {
    flags: Flags,
    permissive_escapes: bool,
    nest_limit: u32,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        ParserBuilder::new().build()
    }

    pub fn parse(&self, pattern: &str) -> Result<Pattern, Error> {
        let mut state = ParserI {
            config: self,
            pattern,
            chars: pattern.char_indices().collect(),
            pos: 0,
            flags: self.flags,
            captures: 0,
            names: Vec::new(),
            depth: 0,
        };
        let parsed = state.parse_alternation()?;
        if state.pos < state.chars.len() {
            return Err(state.error_at(ErrorKind::UnexpectedParen, 0, state.chars.len()));
        }
        trace!("parsed {:?} as {:?}", pattern, parsed);
        Ok(parsed)
    }
}

/// What the most recent item of a sequence can combine with.
#[derive(Copy, Clone)]
enum Last {
    Nothing,
    Atom,
    /// Already quantified; holds the position of the operator.
    Repeated(usize),
}

#[derive(Copy, Clone)]
enum Repetition {
    Star,
    Plus,
    Quest,
    Counted(u32, Option<u32>),
}

struct ParserI<'p> {
    config: &'p Parser,
    pattern: &'p str,
    chars: Vec<(usize, char)>,
    pos: usize,
    flags: Flags,
    captures: u32,
    names: Vec<String>,
    depth: u32,
}

impl ParserI<'_> {
    fn char_at(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).map(|&(_, ch)| ch)
    }

    fn peek(&self) -> Option<char> {
        self.char_at(self.pos)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn offset(&self, pos: usize) -> usize {
        self.chars
            .get(pos)
            .map_or(self.pattern.len(), |&(offset, _)| offset)
    }

    fn text(&self, from: usize, to: usize) -> String {
        self.chars[from..to].iter().map(|&(_, ch)| ch).collect()
    }

    fn error_at(&self, kind: ErrorKind, from: usize, to: usize) -> Error {
        let fragment = &self.pattern[self.offset(from)..self.offset(to)];
        Error::new(kind, self.pattern, fragment)
    }

    /// An error covering everything from `from` up to the current position.
    fn error(&self, kind: ErrorKind, from: usize) -> Error {
        self.error_at(kind, from, self.pos)
    }

    fn parse_alternation(&mut self) -> Result<Pattern, Error> {
        let mut branches = vec![self.parse_concat()?];
        while self.eat('|') {
            branches.push(self.parse_concat()?);
        }
        Ok(match branches.len() {
            1 => branches.swap_remove(0),
            _ => Pattern::alternate(branches),
        })
    }

    fn parse_concat(&mut self) -> Result<Pattern, Error> {
        let mut items: Vec<Pattern> = Vec::new();
        let mut last = Last::Nothing;
        while let Some(ch) = self.peek() {
            let start = self.pos;
            match ch {
                '|' | ')' => break,
                '*' | '+' | '?' => {
                    self.pos += 1;
                    let op = match ch {
                        '*' => Repetition::Star,
                        '+' => Repetition::Plus,
                        _ => Repetition::Quest,
                    };
                    self.repeat(&mut items, &mut last, start, op)?;
                }
                '{' => match self.parse_counted()? {
                    Some((min, max)) => {
                        let op = Repetition::Counted(min, max);
                        self.repeat(&mut items, &mut last, start, op)?;
                    }
                    None => {
                        self.pos += 1;
                        items.push(self.literal('{', start)?);
                        last = Last::Atom;
                    }
                },
                '\\' if self.char_at(self.pos + 1) == Some('Q') => {
                    self.pos += 2;
                    while let Some(ch) = self.peek() {
                        if ch == '\\' && self.char_at(self.pos + 1) == Some('E') {
                            self.pos += 2;
                            break;
                        }
                        let start = self.pos;
                        self.pos += 1;
                        items.push(self.literal(ch, start)?);
                        last = Last::Atom;
                    }
                }
                _ => match self.parse_atom()? {
                    Some(atom) => {
                        items.push(atom);
                        last = Last::Atom;
                    }
                    // A bare flag group such as `(?i)` leaves nothing to repeat.
                    None => last = Last::Nothing,
                },
            }
        }
        Ok(concat(items))
    }

    fn repeat(
        &mut self,
        items: &mut Vec<Pattern>,
        last: &mut Last,
        start: usize,
        op: Repetition,
    ) -> Result<(), Error> {
        match *last {
            Last::Nothing => return Err(self.error(ErrorKind::MissingRepeatArgument, start)),
            Last::Repeated(previous) => {
                return Err(self.error(ErrorKind::InvalidRepeatOp, previous));
            }
            Last::Atom => {}
        }
        // Laziness does not change which strings match.
        self.eat('?');
        let Some(inner) = items.pop() else {
            return Err(self.error(ErrorKind::MissingRepeatArgument, start));
        };
        items.push(match op {
            Repetition::Star => Pattern::star(inner),
            Repetition::Plus => Pattern::plus(inner),
            Repetition::Quest => Pattern::quest(inner),
            Repetition::Counted(min, max) => Pattern::repeat(inner, min, max),
        });
        *last = Last::Repeated(start);
        Ok(())
    }

    /// Parses `{n}`, `{n,}` or `{n,m}` at the cursor. Anything else that
    /// starts with `{` is not a repetition and yields `None` without
    /// consuming input.
    fn parse_counted(&mut self) -> Result<Option<(u32, Option<u32>)>, Error> {
        let start = self.pos;
        let mut end = start + 1;
        let Some(min) = self.scan_number(&mut end) else {
            return Ok(None);
        };
        let max = if self.char_at(end) == Some(',') {
            end += 1;
            self.scan_number(&mut end)
        } else {
            Some(min)
        };
        if self.char_at(end) != Some('}') {
            return Ok(None);
        }
        self.pos = end + 1;
        if min > MAX_REPEAT || max.is_some_and(|max| max > MAX_REPEAT || max < min) {
            return Err(self.error(ErrorKind::InvalidRepeatSize, start));
        }
        Ok(Some((min, max)))
    }

    fn scan_number(&self, at: &mut usize) -> Option<u32> {
        let from = *at;
        let mut value: u32 = 0;
        while let Some(digit) = self.char_at(*at).and_then(|ch| ch.to_digit(10)) {
            value = value.saturating_mul(10).saturating_add(digit);
            *at += 1;
        }
        (*at > from).then_some(value)
    }

    fn parse_atom(&mut self) -> Result<Option<Pattern>, Error> {
        let start = self.pos;
        let Some(ch) = self.bump() else {
            return Ok(None);
        };
        let atom = match ch {
            '(' => return self.parse_group(start),
            '[' => self.parse_class(start)?,
            '\\' => self.parse_escape(start)?,
            '.' if self.flags.dot_matches_new_line => Pattern::any_char(),
            '.' => Pattern::any_char_not_nl(),
            '^' if self.flags.multi_line => Pattern::new(PatternNode::BeginLine),
            '^' => Pattern::new(PatternNode::BeginText),
            '$' if self.flags.multi_line => Pattern::new(PatternNode::EndLine),
            '$' => Pattern::new(PatternNode::EndText),
            ch => self.literal(ch, start)?,
        };
        Ok(Some(atom))
    }

    fn literal(&self, ch: char, start: usize) -> Result<Pattern, Error> {
        if self.flags.case_insensitive {
            self.translate(&regex_syntax::escape(ch.encode_utf8(&mut [0; 4])), start)
        } else {
            Ok(Pattern::literal([ch]))
        }
    }

    fn parse_group(&mut self, open: usize) -> Result<Option<Pattern>, Error> {
        self.depth += 1;
        if self.depth > self.config.nest_limit {
            return Err(self.error(ErrorKind::NestingDepth, open));
        }
        let group = self.parse_group_body(open);
        self.depth -= 1;
        group
    }

    fn parse_group_body(&mut self, open: usize) -> Result<Option<Pattern>, Error> {
        if !self.eat('?') {
            self.captures += 1;
            let index = self.captures;
            let inner = self.parse_group_inner(open)?;
            return Ok(Some(Pattern::capture(index, inner)));
        }
        match (self.peek(), self.char_at(self.pos + 1)) {
            (Some('P'), Some('<')) => {
                self.pos += 2;
                self.parse_named(open).map(Some)
            }
            (Some('<'), next) if !matches!(next, Some('=' | '!')) => {
                self.pos += 1;
                self.parse_named(open).map(Some)
            }
            (Some(':'), _) => {
                self.pos += 1;
                self.parse_group_inner(open).map(Some)
            }
            _ => self.parse_flags(open),
        }
    }

    /// Parses a group's alternation and its closing parenthesis. Flags set
    /// inside the group do not outlive it.
    fn parse_group_inner(&mut self, open: usize) -> Result<Pattern, Error> {
        let saved = self.flags;
        let inner = self.parse_alternation()?;
        self.flags = saved;
        if !self.eat(')') {
            return Err(self.error_at(ErrorKind::MissingParen, open, self.chars.len()));
        }
        Ok(inner)
    }

    fn parse_named(&mut self, open: usize) -> Result<Pattern, Error> {
        let from = self.pos;
        while !matches!(self.peek(), Some('>') | None) {
            self.pos += 1;
        }
        let name = self.text(from, self.pos);
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !self.eat('>') || !valid {
            return Err(self.error(ErrorKind::InvalidNamedCapture, open));
        }
        if self.names.contains(&name) {
            return Err(self.error(ErrorKind::DuplicateCaptureName, open));
        }
        self.names.push(name.clone());
        self.captures += 1;
        let index = self.captures;
        let inner = self.parse_group_inner(open)?;
        Ok(Pattern::named_capture(index, name, inner))
    }

    /// Parses `(?flags)` or `(?flags:...)` after the `(?`.
    fn parse_flags(&mut self, open: usize) -> Result<Option<Pattern>, Error> {
        let mut flags = self.flags;
        let mut negated = false;
        let mut seen = false;
        loop {
            let Some(ch) = self.bump() else {
                return Err(self.error_at(ErrorKind::MissingParen, open, self.chars.len()));
            };
            match ch {
                'i' => flags.case_insensitive = !negated,
                'm' => flags.multi_line = !negated,
                's' => flags.dot_matches_new_line = !negated,
                // Ungreedy mode only changes preference, never the language.
                'U' => {}
                '-' if !negated => {
                    negated = true;
                    seen = false;
                    continue;
                }
                ')' if seen => {
                    self.flags = flags;
                    return Ok(None);
                }
                ':' if seen => {
                    let saved = self.flags;
                    self.flags = flags;
                    let inner = self.parse_group_inner(open);
                    self.flags = saved;
                    return inner.map(Some);
                }
                _ => return Err(self.error(ErrorKind::InvalidPerlOp, open)),
            }
            seen = true;
        }
    }

    /// Parses an escape outside a bracket class; `start` is the backslash.
    fn parse_escape(&mut self, start: usize) -> Result<Pattern, Error> {
        let Some(ch) = self.bump() else {
            return Err(self.error(ErrorKind::TrailingBackslash, start));
        };
        let ch = match ch {
            '1'..='9' => return self.parse_backref(start, ch),
            '0' => return Err(self.error(ErrorKind::InvalidBackref, start)),
            'A' => return Ok(Pattern::new(PatternNode::BeginText)),
            'z' => return Ok(Pattern::new(PatternNode::EndText)),
            'b' => return Ok(Pattern::new(PatternNode::WordBoundary)),
            'B' => return Ok(Pattern::new(PatternNode::NoWordBoundary)),
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
                return self.translate(&self.text(start, self.pos), start);
            }
            'p' | 'P' => {
                if self.eat('{') {
                    while !matches!(self.bump(), Some('}') | None) {}
                } else if self.bump().is_none() {
                    return Err(self.error(ErrorKind::InvalidCharClass, start));
                }
                return self.translate(&self.text(start, self.pos), start);
            }
            'x' => self.parse_hex(start)?,
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'f' => '\x0C',
            'v' => '\x0B',
            'a' => '\x07',
            'e' => '\x1B',
            ch if !ch.is_ascii_alphanumeric() => ch,
            ch if self.config.permissive_escapes => ch,
            _ => return Err(self.error(ErrorKind::InvalidEscape, start)),
        };
        self.literal(ch, start)
    }

    /// `\N`: digits keep accumulating only while they name a group that has
    /// already been opened.
    fn parse_backref(&mut self, start: usize, first: char) -> Result<Pattern, Error> {
        let mut index = first.to_digit(10).unwrap_or_default();
        while let Some(digit) = self.peek().and_then(|ch| ch.to_digit(10)) {
            let next = index.saturating_mul(10).saturating_add(digit);
            if next > self.captures {
                break;
            }
            index = next;
            self.pos += 1;
        }
        if index > self.captures {
            return Err(self.error(ErrorKind::InvalidBackref, start));
        }
        Ok(Pattern::backref(index))
    }

    /// `\xHH` or `\x{H...}` after the `x`.
    fn parse_hex(&mut self, start: usize) -> Result<char, Error> {
        let digits = if self.eat('{') {
            let from = self.pos;
            while !matches!(self.peek(), Some('}') | None) {
                self.pos += 1;
            }
            let digits = self.text(from, self.pos);
            if !self.eat('}') {
                return Err(self.error(ErrorKind::InvalidEscape, start));
            }
            digits
        } else {
            let to = (self.pos + 2).min(self.chars.len());
            let digits = self.text(self.pos, to);
            self.pos = to;
            digits
        };
        let valid =
            (1..=8).contains(&digits.len()) && digits.chars().all(|ch| ch.is_ascii_hexdigit());
        valid
            .then(|| u32::from_str_radix(&digits, 16).ok())
            .flatten()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(ErrorKind::InvalidEscape, start))
    }

    /// Rewrites a bracket class into `regex_syntax` syntax and translates it.
    /// Characters that `regex_syntax` reads as nested classes or set
    /// operators are escaped so they keep their Perl meaning.
    fn parse_class(&mut self, start: usize) -> Result<Pattern, Error> {
        let mut text = String::from("[");
        if self.eat('^') {
            text.push('^');
        }
        let mut first = true;
        loop {
            let Some(ch) = self.bump() else {
                return Err(self.error_at(ErrorKind::MissingBracket, start, self.chars.len()));
            };
            match ch {
                ']' if !first => break,
                '[' if self.peek() == Some(':') => match self.posix_class_end() {
                    Some(end) => {
                        text.push_str(&self.text(self.pos - 1, end));
                        self.pos = end;
                    }
                    None => text.push_str(r"\["),
                },
                '-' if self.peek() == Some('-') => text.push_str(r"\-"),
                '\\' => self.class_escape(&mut text, start)?,
                '-' => text.push('-'),
                ch => push_class_char(&mut text, ch),
            }
            first = false;
        }
        text.push(']');
        self.translate(&text, start)
    }

    /// End of a POSIX class such as `[:alpha:]` whose `[` was just consumed.
    fn posix_class_end(&self) -> Option<usize> {
        let mut at = self.pos + 1;
        if self.char_at(at) == Some('^') {
            at += 1;
        }
        while self.char_at(at).is_some_and(|ch| ch.is_ascii_alphabetic()) {
            at += 1;
        }
        (self.char_at(at) == Some(':') && self.char_at(at + 1) == Some(']')).then_some(at + 2)
    }

    fn class_escape(&mut self, text: &mut String, start: usize) -> Result<(), Error> {
        let escape = self.pos - 1;
        let Some(ch) = self.bump() else {
            return Err(self.error_at(ErrorKind::MissingBracket, start, self.chars.len()));
        };
        match ch {
            'p' | 'P' | 'x' => {
                let from = self.pos - 2;
                if self.eat('{') {
                    while !matches!(self.bump(), Some('}') | None) {}
                } else {
                    let width = if ch == 'x' { 2 } else { 1 };
                    self.pos = (self.pos + width).min(self.chars.len());
                }
                text.push_str(&self.text(from, self.pos));
            }
            'd' | 'D' | 'w' | 'W' | 's' | 'S' | 'n' | 't' | 'r' | 'f' | 'v' | 'a' => {
                text.push('\\');
                text.push(ch);
            }
            'e' => text.push_str(r"\x1B"),
            ch if ch.is_ascii_alphanumeric() && !self.config.permissive_escapes => {
                return Err(self.error(ErrorKind::InvalidEscape, escape));
            }
            ch => push_class_char(text, ch),
        }
        Ok(())
    }

    /// Resolves a character set through `regex_syntax` under the current
    /// case-folding flag.
    fn translate(&self, text: &str, start: usize) -> Result<Pattern, Error> {
        let mut parser = regex_syntax::ParserBuilder::new()
            .case_insensitive(self.flags.case_insensitive)
            .build();
        let hir = parser.parse(text).map_err(|err| {
            trace!("regex-syntax rejected {:?}: {}", text, err);
            self.error(ErrorKind::InvalidCharClass, start)
        })?;
        from_hir(&hir).ok_or_else(|| self.error(ErrorKind::InvalidCharClass, start))
    }
}

/// Appends a character that must be taken literally.
fn push_class_char(text: &mut String, ch: char) {
    if regex_syntax::is_meta_character(ch) {
        text.push('\\');
    }
    text.push(ch);
}

fn from_hir(hir: &Hir) -> Option<Pattern> {
    match hir.kind() {
        HirKind::Class(hir::Class::Unicode(class)) if class.ranges().is_empty() => {
            Some(Pattern::no_match())
        }
        HirKind::Class(hir::Class::Unicode(class)) => Some(Pattern::class(
            class
                .iter()
                .map(|range| ClassRange::new(range.start(), range.end())),
        )),
        // An empty set comes back as a byte class.
        HirKind::Class(hir::Class::Bytes(class)) if class.ranges().is_empty() => {
            Some(Pattern::no_match())
        }
        HirKind::Class(hir::Class::Bytes(class)) if class.is_ascii() => Some(Pattern::class(
            class
                .iter()
                .map(|range| ClassRange::new(char::from(range.start()), char::from(range.end()))),
        )),
        HirKind::Literal(hir::Literal(bytes)) => {
            core::str::from_utf8(bytes).ok().map(|text| Pattern::literal(text.chars()))
        }
        _ => None,
    }
}

/// Joins parsed items, merging runs of literal characters.
fn concat(items: Vec<Pattern>) -> Pattern {
    let mut out: Vec<Pattern> = Vec::with_capacity(items.len());
    let mut run: Vec<char> = Vec::new();
    for item in items {
        match item.node() {
            PatternNode::Literal(chars) => run.extend_from_slice(chars),
            _ => {
                if !run.is_empty() {
                    out.push(Pattern::literal(run.drain(..)));
                }
                out.push(item);
            }
        }
    }
    if !run.is_empty() {
        out.push(Pattern::literal(run));
    }
    match out.len() {
        0 => Pattern::empty_match(),
        1 => out.swap_remove(0),
        _ => Pattern::concat(out),
    }
}
