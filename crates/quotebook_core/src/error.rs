//! Cross-module error taxonomy.
//!
//! Every module keeps its own error enum; `ErrorKind` is the coarse class
//! adapters switch on when deciding what to show.

use std::fmt::{Display, Formatter};

/// Coarse error class shared by all core errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or missing required field on direct user input.
    Validation,
    /// Import payload has the wrong shape; nothing was applied.
    Format,
    /// Remote unreachable or answered with a non-success response.
    Network,
    /// Durable write failed; in-memory state moved on without it.
    Write,
    /// Nothing to choose from.
    EmptyCollection,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Format => "format",
            Self::Network => "network",
            Self::Write => "write",
            Self::EmptyCollection => "empty_collection",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
