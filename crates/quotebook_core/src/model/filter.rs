//! Category filter selection.

use crate::model::quote::Quote;
use std::fmt::{Display, Formatter};

const ALL_LABEL: &str = "all";

/// Which quotes the adapter wants to see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum QuoteFilter {
    #[default]
    All,
    Category(String),
}

impl QuoteFilter {
    /// Parses a stored or user-typed filter. Blank input and `all` mean `All`.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == ALL_LABEL {
            Self::All
        } else {
            Self::Category(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_LABEL,
            Self::Category(name) => name.as_str(),
        }
    }

    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            Self::All => true,
            Self::Category(name) => quote.category == *name,
        }
    }
}

impl Display for QuoteFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for QuoteFilter {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
