use thiserror::Error;

/// Contract violations raised while analysing a syntax tree.
///
/// None of these are expected for a tree produced by the parser and passed
/// through the simplifier; each one names the precondition that was broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("repeat node reached {operation} without being simplified")]
    UnsimplifiedRepeat { operation: &'static str },
    #[error("backreference \\{index} does not name a visited capture ({captures} visited)")]
    BackrefOutOfRange { index: u32, captures: usize },
    #[error("backreference \\{index} refers to a capture that is still being analysed")]
    UnresolvedBackref { index: u32 },
    #[error("invalid length interval [{min}, {max})")]
    InvalidBounds { min: usize, max: usize },
}
