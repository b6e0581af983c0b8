#![forbid(unsafe_code)]
#![doc = "Parsing and simplification of Perl-style regular expressions into rexword syntax trees."]

mod error;
mod parser;
mod simplify;

pub use error::{Error, ErrorKind};
pub use parser::{Parser, ParserBuilder};
pub use simplify::simplify;

use rexword::Pattern;

/// Parses `pattern` with the dialect used by regex crossword puzzles: Perl
/// syntax with backreferences, where an unknown escaped letter stands for
/// itself.
pub fn parse(pattern: &str) -> Result<Pattern, Error> {
    ParserBuilder::new()
        .permissive_escapes(true)
        .build()
        .parse(pattern)
}
