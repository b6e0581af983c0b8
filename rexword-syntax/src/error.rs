use core::fmt;

/// A pattern that failed to parse, with the piece of it that was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("error parsing regexp: {kind}: `{fragment}`")]
pub struct Error {
    kind: ErrorKind,
    pattern: String,
    fragment: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    MissingBracket,
    MissingParen,
    UnexpectedParen,
    MissingRepeatArgument,
    InvalidRepeatOp,
    InvalidRepeatSize,
    InvalidEscape,
    TrailingBackslash,
    InvalidBackref,
    InvalidNamedCapture,
    DuplicateCaptureName,
    InvalidCharClass,
    InvalidPerlOp,
    NestingDepth,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, pattern: &str, fragment: &str) -> Self {
        Self {
            kind,
            pattern: pattern.to_owned(),
            fragment: fragment.to_owned(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The complete pattern that was being parsed.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The part of [`Error::pattern`] the error points at.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingBracket => "missing closing ]",
            ErrorKind::MissingParen => "missing closing )",
            ErrorKind::UnexpectedParen => "unexpected )",
            ErrorKind::MissingRepeatArgument => "missing argument to repetition operator",
            ErrorKind::InvalidRepeatOp => "invalid nested repetition operator",
            ErrorKind::InvalidRepeatSize => "invalid repeat count",
            ErrorKind::InvalidEscape => "invalid escape sequence",
            ErrorKind::TrailingBackslash => "trailing backslash at end of expression",
            ErrorKind::InvalidBackref => "invalid backreference",
            ErrorKind::InvalidNamedCapture => "invalid named capture",
            ErrorKind::DuplicateCaptureName => "duplicate capture group name",
            ErrorKind::InvalidCharClass => "invalid character class",
            ErrorKind::InvalidPerlOp => "invalid or unsupported Perl syntax",
            ErrorKind::NestingDepth => "expression nests too deeply",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
