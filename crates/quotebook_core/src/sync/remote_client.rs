//! HTTP client for the remote quote source.
//!
//! # Responsibility
//! - GET the remote collection and map it into local `Quote` records.
//! - POST the local collection upstream on a best-effort basis.
//!
//! # Invariants
//! - No merge logic lives here; the client only moves data.
//! - A snapshot never holds more than `max_items` quotes.

use crate::error::ErrorKind;
use crate::model::quote::{Quote, QuoteId};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Endpoint used when no configuration overrides it.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
/// Category assigned to remote records that carry none.
pub const DEFAULT_REMOTE_CATEGORY: &str = "Server";
/// Upper bound of records taken from one snapshot.
pub const DEFAULT_MAX_ITEMS: usize = 10;

const TEXT_FIELDS: &[&str] = &["title", "body", "text"];

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote I/O failure. Every variant is a network-class error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Request could not be built, sent, or read.
    Transport(String),
    /// The remote answered with a non-success status.
    Status(u16),
    /// The body was not the expected JSON shape.
    Decode(String),
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Network
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "remote unreachable: {message}"),
            Self::Status(code) => write!(f, "remote answered with status {code}"),
            Self::Decode(message) => write!(f, "unexpected remote payload: {message}"),
        }
    }
}

impl Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

/// Source of remote snapshots and sink for local pushes.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Reads the current remote snapshot.
    async fn fetch_snapshot(&self) -> RemoteResult<Vec<Quote>>;
    /// Uploads the full local collection. Callers treat failure as non-fatal.
    async fn push_snapshot(&self, quotes: &[Quote]) -> RemoteResult<()>;
}

/// Connection settings for [`HttpRemoteClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub endpoint: String,
    pub max_items: usize,
    pub default_category: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_items: DEFAULT_MAX_ITEMS,
            default_category: DEFAULT_REMOTE_CATEGORY.to_string(),
        }
    }
}

/// `reqwest`-backed remote source speaking plain JSON over HTTP.
pub struct HttpRemoteClient {
    client: Client,
    settings: RemoteSettings,
}

impl HttpRemoteClient {
    pub fn new(settings: RemoteSettings) -> RemoteResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("quotebook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteClient {
    async fn fetch_snapshot(&self) -> RemoteResult<Vec<Quote>> {
        let started_at = Instant::now();
        let response = self.client.get(&self.settings.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=remote_fetch module=sync status=error http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let quotes = map_remote_records(
            &body,
            self.settings.max_items,
            &self.settings.default_category,
        )?;
        info!(
            "event=remote_fetch module=sync status=ok count={} duration_ms={}",
            quotes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(quotes)
    }

    async fn push_snapshot(&self, quotes: &[Quote]) -> RemoteResult<()> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .json(quotes)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        debug!(
            "event=remote_push module=sync status=ok count={}",
            quotes.len()
        );
        Ok(())
    }
}

/// Maps a remote JSON body into quotes.
///
/// Only the first `max_items` records are considered. Records without a
/// usable title/body, and repeats of an id already mapped, are dropped
/// without being reported.
pub fn map_remote_records(
    body: &Value,
    max_items: usize,
    default_category: &str,
) -> RemoteResult<Vec<Quote>> {
    let records = body
        .as_array()
        .ok_or_else(|| RemoteError::Decode("expected a JSON array".to_string()))?;

    let mut seen = HashSet::new();
    let quotes: Vec<Quote> = records
        .iter()
        .take(max_items)
        .filter_map(|record| map_remote_record(record, default_category))
        .filter(|quote| seen.insert(quote.id.clone()))
        .collect();

    let dropped = records.len().min(max_items) - quotes.len();
    if dropped > 0 {
        debug!("event=remote_map module=sync status=ok dropped={dropped}");
    }
    Ok(quotes)
}

fn map_remote_record(record: &Value, default_category: &str) -> Option<Quote> {
    let text = TEXT_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .find(|value| !value.trim().is_empty())?;
    let category = record
        .get("category")
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default_category);
    let id = record
        .get("id")
        .and_then(QuoteId::from_remote_json)
        .unwrap_or_else(QuoteId::new_local);

    Quote::with_id(id, text, category).ok()
}

#[cfg(test)]
mod tests {
    use super::{map_remote_records, RemoteError};
    use serde_json::json;

    #[test]
    fn maps_title_and_assigns_default_category() {
        let body = json!([
            {"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit"},
            {"id": 2, "body": "only body", "category": "Poetry"}
        ]);
        let quotes = map_remote_records(&body, 10, "Server").unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].text, "sunt aut facere");
        assert_eq!(quotes[0].category, "Server");
        assert_eq!(quotes[0].id.as_str(), "remote-1");
        assert_eq!(quotes[1].text, "only body");
        assert_eq!(quotes[1].category, "Poetry");
    }

    #[test]
    fn drops_records_without_text_and_caps_count() {
        let body = json!([
            {"id": 1, "title": ""},
            {"id": 2, "title": "b"},
            {"id": 3, "title": "c"},
            {"id": 4, "title": "d"}
        ]);
        let quotes = map_remote_records(&body, 3, "Server").unwrap();
        let texts: Vec<&str> = quotes.iter().map(|quote| quote.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[test]
    fn keeps_first_record_per_id_and_prefixes_once() {
        let body = json!([
            {"id": 1, "title": "p"},
            {"id": 1, "title": "q"},
            {"id": "remote-5", "title": "r"}
        ]);
        let quotes = map_remote_records(&body, 10, "Server").unwrap();
        let ids: Vec<&str> = quotes.iter().map(|quote| quote.id.as_str()).collect();
        assert_eq!(ids, vec!["remote-1", "remote-5"]);
        assert_eq!(quotes[0].text, "p");
    }

    #[test]
    fn rejects_non_array_body() {
        let err = map_remote_records(&json!({"title": "x"}), 10, "Server").unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }
}
