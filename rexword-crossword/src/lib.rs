#![forbid(unsafe_code)]
#![doc = "Regex crossword puzzles: data model, loading, pattern validation and syntax analytics."]

mod analysis;
mod error;
mod mit;
mod puzzle;

pub use analysis::{SyntaxError, decompose, group_by_message, prepare};
pub use error::Error;
pub use mit::mit_puzzle;
pub use puzzle::{Challenge, Puzzle, UnixTime, load_challenges, load_puzzles};
