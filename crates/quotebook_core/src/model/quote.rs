//! Quote domain model.
//!
//! # Responsibility
//! - Define the `Quote` record and its identifier.
//! - Validate user input and loosely-typed JSON records into quotes.
//!
//! # Invariants
//! - `text` and `category` are trimmed and non-empty.
//! - Locally allocated ids (`local-` prefix) and remote ids (`remote-` prefix)
//!   never collide.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LOCAL_ID_PREFIX: &str = "local-";
const REMOTE_ID_PREFIX: &str = "remote-";

/// Opaque quote identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Allocates a fresh id in the local namespace.
    pub fn new_local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Maps an identifier supplied by the remote source into the remote namespace.
    pub fn remote(raw: impl Display) -> Self {
        Self(format!("{REMOTE_ID_PREFIX}{raw}"))
    }

    /// Wraps an id read back from storage without reinterpreting it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Reads an id from a JSON value. Accepts non-blank strings, kept verbatim,
    /// and numbers.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) if !raw.trim().is_empty() => Some(Self(raw.clone())),
            Value::Number(number) => Some(Self(number.to_string())),
            _ => None,
        }
    }

    /// Reads a remote record id into the remote namespace. Ids that already
    /// carry the `remote-` prefix are kept as they are.
    pub fn from_remote_json(value: &Value) -> Option<Self> {
        let id = Self::from_json(value)?;
        if id.is_remote() {
            Some(id)
        } else {
            Some(Self::remote(id.0))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn is_remote(&self) -> bool {
        self.0.starts_with(REMOTE_ID_PREFIX)
    }
}

impl Display for QuoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rejected quote input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteValidationError {
    EmptyText,
    EmptyCategory,
}

impl QuoteValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyText => "text",
            Self::EmptyCategory => "category",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

impl Display for QuoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "quote {} must not be empty", self.field())
    }
}

impl Error for QuoteValidationError {}

/// One user-visible quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub category: String,
}

impl Quote {
    /// Builds a quote with a freshly allocated local id.
    pub fn new(
        text: impl AsRef<str>,
        category: impl AsRef<str>,
    ) -> Result<Self, QuoteValidationError> {
        Self::with_id(QuoteId::new_local(), text, category)
    }

    /// Builds a quote under an id that already exists elsewhere.
    pub fn with_id(
        id: QuoteId,
        text: impl AsRef<str>,
        category: impl AsRef<str>,
    ) -> Result<Self, QuoteValidationError> {
        let (text, category) = normalize_fields(text.as_ref(), category.as_ref())?;
        Ok(Self { id, text, category })
    }

    /// Compares `text` and `category`, ignoring the id.
    pub fn same_content(&self, other: &Quote) -> bool {
        self.text == other.text && self.category == other.category
    }
}

/// Export shape: content without the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteContent {
    pub text: String,
    pub category: String,
}

impl From<&Quote> for QuoteContent {
    fn from(value: &Quote) -> Self {
        Self {
            text: value.text.clone(),
            category: value.category.clone(),
        }
    }
}

/// Extracts `(text, category)` from a loosely-typed JSON record.
///
/// `author` is accepted in place of `category`; older stored data used it.
pub fn parse_candidate(value: &Value) -> Result<(String, String), QuoteValidationError> {
    let text = value.get("text").and_then(Value::as_str).unwrap_or("");
    let category = value
        .get("category")
        .and_then(Value::as_str)
        .or_else(|| value.get("author").and_then(Value::as_str))
        .unwrap_or("");
    normalize_fields(text, category)
}

fn normalize_fields(text: &str, category: &str) -> Result<(String, String), QuoteValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(QuoteValidationError::EmptyText);
    }
    let category = category.trim();
    if category.is_empty() {
        return Err(QuoteValidationError::EmptyCategory);
    }
    Ok((text.to_string(), category.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_candidate, Quote, QuoteId, QuoteValidationError};
    use serde_json::json;

    #[test]
    fn new_trims_and_allocates_local_id() {
        let quote = Quote::new("  Stay hungry ", " Life ").unwrap();
        assert_eq!(quote.text, "Stay hungry");
        assert_eq!(quote.category, "Life");
        assert!(quote.id.is_local());
    }

    #[test]
    fn new_rejects_blank_fields() {
        assert_eq!(
            Quote::new("   ", "Life").unwrap_err(),
            QuoteValidationError::EmptyText
        );
        assert_eq!(
            Quote::new("text", "\t").unwrap_err(),
            QuoteValidationError::EmptyCategory
        );
    }

    #[test]
    fn local_ids_are_unique_and_disjoint_from_remote() {
        let first = QuoteId::new_local();
        let second = QuoteId::new_local();
        assert_ne!(first, second);
        let remote = QuoteId::remote(7);
        assert_eq!(remote.as_str(), "remote-7");
        assert!(remote.is_remote());
        assert!(!remote.is_local());
    }

    #[test]
    fn id_from_json_accepts_numbers_and_strings() {
        assert_eq!(
            QuoteId::from_json(&json!(1700000000000_i64)).unwrap().as_str(),
            "1700000000000"
        );
        assert_eq!(QuoteId::from_json(&json!("abc")).unwrap().as_str(), "abc");
        assert_eq!(QuoteId::from_json(&json!(" a b ")).unwrap().as_str(), " a b ");
        assert!(QuoteId::from_json(&json!("  ")).is_none());
        assert!(QuoteId::from_json(&json!(null)).is_none());
    }

    #[test]
    fn remote_json_ids_are_prefixed_once() {
        assert_eq!(
            QuoteId::from_remote_json(&json!(5)).unwrap().as_str(),
            "remote-5"
        );
        assert_eq!(
            QuoteId::from_remote_json(&json!("abc")).unwrap().as_str(),
            "remote-abc"
        );
        assert_eq!(
            QuoteId::from_remote_json(&json!("remote-5")).unwrap().as_str(),
            "remote-5"
        );
        assert!(QuoteId::from_remote_json(&json!({})).is_none());
    }

    #[test]
    fn parse_candidate_accepts_author_synonym() {
        let parsed = parse_candidate(&json!({"text": "x", "author": "Seneca"})).unwrap();
        assert_eq!(parsed, ("x".to_string(), "Seneca".to_string()));
    }

    #[test]
    fn parse_candidate_rejects_non_string_fields() {
        assert!(parse_candidate(&json!({"text": 5, "category": "c"})).is_err());
        assert!(parse_candidate(&json!("just a string")).is_err());
    }
}
