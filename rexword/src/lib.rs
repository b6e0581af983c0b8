#![forbid(unsafe_code)]
#![doc = "Rexword: length-bounded decomposition and reversal of regular-expression syntax trees."]

mod error;
mod pattern;
mod reverse;
mod sized;
mod sparse;

pub use error::Error;
pub use pattern::{ClassRange, NodeKind, Pattern, PatternNode};
pub use reverse::reverse;
pub use sized::{SizedPattern, closure, constrain_length, convolve, merge};
pub use sparse::SparseSet;

pub mod prelude {
    pub use crate::error::Error;
    pub use crate::pattern::{ClassRange, NodeKind, Pattern, PatternNode};
    pub use crate::reverse::reverse;
    pub use crate::sized::{SizedPattern, closure, constrain_length, convolve, merge};
    pub use crate::sparse::SparseSet;
}
