use std::io;
use std::path::PathBuf;

use crate::analysis::SyntaxError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("cannot decompose {pattern} reversed: its backreferences would precede their captures")]
    ReversedBackref { pattern: String },
    #[error("failed to decompose {pattern}")]
    Decompose {
        pattern: String,
        #[source]
        source: rexword::Error,
    },
}
