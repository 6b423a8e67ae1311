//! Presentation-facing facade.
//!
//! # Responsibility
//! - Expose the operations a UI adapter needs: visible quotes, categories,
//!   sync status, and the collection mutations.
//! - Translate core errors into status envelopes the adapter can render.
//!
//! # Invariants
//! - Facade calls never panic.
//! - The facade returns data only; rendering stays with the adapter.

use crate::collection::{CollectionError, CollectionResult, LoadReport, QuoteCollection};
use crate::config::QuotebookConfig;
use crate::error::ErrorKind;
use crate::model::filter::QuoteFilter;
use crate::model::quote::Quote;
use crate::store::{KeyValueStore, SessionStore, SqliteKeyValueStore, StoreError, LAST_QUOTE_KEY};
use crate::sync::{
    HttpRemoteClient, Reconciler, ReconcilerHandle, RemoteError, RemoteSource, SyncOutcome,
    SyncState,
};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Failure while wiring a session from configuration.
#[derive(Debug)]
pub enum BootstrapError {
    Store(StoreError),
    Remote(RemoteError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "cannot open quote store: {err}"),
            Self::Remote(err) => write!(f, "cannot build remote client: {err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Remote(err) => Some(err),
        }
    }
}

/// Status envelope returned by mutating facade calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Error class when `ok` is false, or `Write` when the change was kept
    /// in memory but not persisted.
    pub kind: Option<ErrorKind>,
    /// Human-readable message for the adapter to show.
    pub message: String,
    /// Quote produced by the action, if any.
    pub quote: Option<Quote>,
    /// Number of quotes affected.
    pub count: usize,
}

impl ActionResponse {
    fn success(message: impl Into<String>, quote: Option<Quote>, count: usize) -> Self {
        Self {
            ok: true,
            kind: None,
            message: message.into(),
            quote,
            count,
        }
    }

    fn failure(err: &CollectionError, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            kind: Some(err.kind()),
            message: message.into(),
            quote: None,
            count: 0,
        }
    }
}

/// One running session: collection, reconciler, and transient view state.
pub struct QuotebookApi {
    collection: Arc<QuoteCollection>,
    reconciler: Arc<Reconciler>,
    session: SessionStore,
}

impl QuotebookApi {
    pub fn new(collection: Arc<QuoteCollection>, reconciler: Arc<Reconciler>) -> Self {
        Self {
            collection,
            reconciler,
            session: SessionStore::new(),
        }
    }

    /// Opens the durable store, loads the collection, and wires the HTTP remote.
    pub fn open(config: &QuotebookConfig) -> Result<(Self, LoadReport), BootstrapError> {
        let store = SqliteKeyValueStore::open(&config.db_path).map_err(BootstrapError::Store)?;
        let remote =
            HttpRemoteClient::new(config.remote_settings()).map_err(BootstrapError::Remote)?;
        Ok(Self::with_parts(Arc::new(store), Arc::new(remote)))
    }

    /// Loads the collection from `store` and pairs it with `remote`.
    pub fn with_parts(
        store: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteSource>,
    ) -> (Self, LoadReport) {
        let (collection, report) = QuoteCollection::load(store);
        let collection = Arc::new(collection);
        let reconciler = Arc::new(Reconciler::new(Arc::clone(&collection), remote));
        (Self::new(collection, reconciler), report)
    }

    pub fn collection(&self) -> &Arc<QuoteCollection> {
        &self.collection
    }

    pub fn visible_quotes(&self, filter: &QuoteFilter) -> Vec<Quote> {
        self.collection.filter(filter)
    }

    /// Quotes matching the remembered filter.
    pub fn visible_quotes_for_selection(&self) -> Vec<Quote> {
        self.collection.filter(&self.collection.selected_filter())
    }

    pub fn categories(&self) -> Vec<String> {
        self.collection.categories()
    }

    pub fn sync_state(&self) -> SyncState {
        self.reconciler.sync_state()
    }

    pub fn selected_filter(&self) -> QuoteFilter {
        self.collection.selected_filter()
    }

    pub fn add_quote(&self, text: &str, category: &str) -> ActionResponse {
        match self.collection.add(text, category) {
            Ok(quote) => ActionResponse::success("Quote added.", Some(quote), 1),
            Err(CollectionError::Write { source, added }) => {
                let count = added.len();
                kept_in_memory(
                    &source,
                    "Quote added but could not be saved",
                    added.into_iter().next(),
                    count,
                )
            }
            Err(err) => ActionResponse::failure(&err, format!("Quote not added: {err}")),
        }
    }

    /// Parses an import file's contents and appends every valid record.
    pub fn import_json(&self, raw: &str) -> ActionResponse {
        match self.collection.import_json(raw) {
            Ok(count) => ActionResponse::success(format!("Imported {count} quote(s)."), None, count),
            Err(CollectionError::Write { source, added }) => kept_in_memory(
                &source,
                "Quotes imported but could not be saved",
                None,
                added.len(),
            ),
            Err(err) => ActionResponse::failure(&err, format!("Import failed: {err}")),
        }
    }

    pub fn export_json(&self) -> CollectionResult<String> {
        self.collection.export_json()
    }

    pub fn select_filter(&self, value: &str) -> ActionResponse {
        let filter = QuoteFilter::parse(value);
        let visible = self.collection.filter(&filter).len();
        match self.collection.select_filter(filter) {
            Ok(()) => ActionResponse::success(format!("{visible} quote(s) visible."), None, visible),
            Err(CollectionError::Write { source, .. }) => kept_in_memory(
                &source,
                "Filter applied but could not be saved",
                None,
                visible,
            ),
            Err(err) => ActionResponse::failure(&err, format!("Filter not applied: {err}")),
        }
    }

    /// Picks a random quote under the remembered filter and remembers it for
    /// the rest of the session.
    pub fn show_random(&self) -> ActionResponse {
        let filter = self.collection.selected_filter();
        match self.collection.random(&filter) {
            Ok(quote) => {
                self.remember_displayed(&quote);
                ActionResponse::success("Here is a quote.", Some(quote), 1)
            }
            Err(err) => ActionResponse::failure(&err, "No quotes available for this selection."),
        }
    }

    /// Last quote shown this session, if it still exists in the collection.
    pub fn last_displayed(&self) -> Option<Quote> {
        let raw = self.session.load(LAST_QUOTE_KEY).ok().flatten()?;
        let quote: Quote = serde_json::from_str(&raw).ok()?;
        self.collection
            .snapshot()
            .into_iter()
            .find(|candidate| candidate.id == quote.id)
    }

    /// Runs one reconciliation cycle now.
    pub async fn request_sync(&self) -> SyncOutcome {
        self.reconciler.run_cycle().await
    }

    /// Starts scheduled reconciliation.
    pub fn start_sync(&self, period: Duration) -> ReconcilerHandle {
        self.reconciler.start(period)
    }

    /// Revision receiver; changes whenever the collection changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.collection.subscribe()
    }

    fn remember_displayed(&self, quote: &Quote) {
        let saved = serde_json::to_string(quote)
            .map_err(|err| StoreError::Serialization(err.to_string()))
            .and_then(|raw| self.session.save(LAST_QUOTE_KEY, &raw));
        if let Err(err) = saved {
            warn!("event=session_save module=api status=error key={LAST_QUOTE_KEY} error={err}");
        }
    }
}

fn kept_in_memory(
    source: &StoreError,
    message: &str,
    quote: Option<Quote>,
    count: usize,
) -> ActionResponse {
    warn!("event=persist module=api status=error error={source}");
    ActionResponse {
        ok: true,
        kind: Some(source.kind()),
        message: format!("{message}: {source}"),
        quote,
        count,
    }
}
