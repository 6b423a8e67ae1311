//! Quote collection operations.

use super::defaults::default_quotes;
use crate::error::ErrorKind;
use crate::model::filter::QuoteFilter;
use crate::model::quote::{parse_candidate, Quote, QuoteContent, QuoteId, QuoteValidationError};
use crate::store::{KeyValueStore, StoreError, QUOTES_KEY, SELECTED_FILTER_KEY};
use log::{info, warn};
use rand::seq::SliceRandom;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

pub type CollectionResult<T> = Result<T, CollectionError>;

/// Error returned by collection operations.
#[derive(Debug)]
pub enum CollectionError {
    /// Direct user input was rejected; nothing changed.
    Validation(QuoteValidationError),
    /// Import payload had the wrong shape; nothing was applied.
    Format(String),
    /// The in-memory mutation was applied but could not be persisted.
    Write {
        source: StoreError,
        /// Quotes the failed call appended; empty for replacements and
        /// filter changes.
        added: Vec<Quote>,
    },
    /// There was nothing to pick from.
    EmptyCollection,
}

impl CollectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Format(_) => ErrorKind::Format,
            Self::Write { .. } => ErrorKind::Write,
            Self::EmptyCollection => ErrorKind::EmptyCollection,
        }
    }
}

impl Display for CollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Format(message) => write!(f, "invalid import payload: {message}"),
            Self::Write { source, .. } => write!(f, "{source}"),
            Self::EmptyCollection => write!(f, "no quotes to choose from"),
        }
    }
}

impl Error for CollectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<QuoteValidationError> for CollectionError {
    fn from(value: QuoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CollectionError {
    fn from(value: StoreError) -> Self {
        Self::Write {
            source: value,
            added: Vec::new(),
        }
    }
}

/// Where the loaded sequence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Stored data was valid and used as-is.
    Stored,
    /// Nothing (or an empty sequence) was stored; defaults were seeded.
    DefaultAbsent,
    /// Stored data was malformed; defaults were seeded.
    DefaultMalformed,
    /// The store could not be read; defaults were seeded.
    DefaultUnreadable,
}

/// Side information produced by `QuoteCollection::load`.
#[derive(Debug)]
pub struct LoadReport {
    pub origin: LoadOrigin,
    /// Set when seeding defaults could not be persisted.
    pub persist_error: Option<StoreError>,
}

struct CollectionState {
    quotes: Vec<Quote>,
    categories: BTreeSet<String>,
    selected: QuoteFilter,
    revision: u64,
}

impl CollectionState {
    fn reindex(&mut self) {
        self.categories = self
            .quotes
            .iter()
            .map(|quote| quote.category.clone())
            .collect();
    }

    fn contains_id(&self, id: &QuoteId) -> bool {
        self.quotes.iter().any(|quote| quote.id == *id)
    }

    fn allocate_id(&self) -> QuoteId {
        loop {
            let id = QuoteId::new_local();
            if !self.contains_id(&id) {
                return id;
            }
        }
    }
}

/// Session-owned quote collection.
///
/// One instance per running session, built by [`QuoteCollection::load`] and
/// shared by reference (`Arc`) between the reconciler and the adapter.
pub struct QuoteCollection {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<CollectionState>,
    revision_tx: watch::Sender<u64>,
}

impl QuoteCollection {
    /// Loads the collection from `store`, seeding defaults when needed.
    ///
    /// Never fails: unreadable or malformed data falls back to the default
    /// set, which is persisted immediately. A failure to persist that seed is
    /// reported in [`LoadReport::persist_error`].
    pub fn load(store: Arc<dyn KeyValueStore>) -> (Self, LoadReport) {
        let (quotes, origin) = match store.load(QUOTES_KEY) {
            Ok(Some(raw)) => match parse_stored_quotes(&raw) {
                Ok(quotes) if quotes.is_empty() => (default_quotes(), LoadOrigin::DefaultAbsent),
                Ok(quotes) => (quotes, LoadOrigin::Stored),
                Err(reason) => {
                    warn!(
                        "event=collection_load module=collection status=error error_code=malformed reason={reason}"
                    );
                    (default_quotes(), LoadOrigin::DefaultMalformed)
                }
            },
            Ok(None) => (default_quotes(), LoadOrigin::DefaultAbsent),
            Err(err) => {
                warn!(
                    "event=collection_load module=collection status=error error_code=unreadable error={err}"
                );
                (default_quotes(), LoadOrigin::DefaultUnreadable)
            }
        };

        let selected = match store.load(SELECTED_FILTER_KEY) {
            Ok(Some(raw)) => QuoteFilter::parse(&raw),
            Ok(None) => QuoteFilter::All,
            Err(err) => {
                warn!("event=filter_load module=collection status=error error={err}");
                QuoteFilter::All
            }
        };

        let mut state = CollectionState {
            quotes,
            categories: BTreeSet::new(),
            selected,
            revision: 0,
        };
        state.reindex();

        let persist_error = if origin == LoadOrigin::Stored {
            None
        } else {
            persist_quotes(store.as_ref(), &state.quotes).err()
        };

        info!(
            "event=collection_load module=collection status=ok origin={origin:?} count={} persisted={}",
            state.quotes.len(),
            persist_error.is_none()
        );

        let (revision_tx, _) = watch::channel(0);
        let collection = Self {
            store,
            state: RwLock::new(state),
            revision_tx,
        };
        (
            collection,
            LoadReport {
                origin,
                persist_error,
            },
        )
    }

    /// Appends one quote built from user input and persists the collection.
    ///
    /// On `CollectionError::Write` the quote is already part of the in-memory
    /// sequence and is returned in `added`; only the durable copy is stale.
    pub fn add(&self, text: &str, category: &str) -> CollectionResult<Quote> {
        let mut state = self.write_state();
        let quote = Quote::with_id(state.allocate_id(), text, category)?;
        state.quotes.push(quote.clone());
        state.reindex();
        let persisted = persist_quotes(self.store.as_ref(), &state.quotes);
        self.bump_revision(&mut state);
        drop(state);

        persisted.map_err(|source| CollectionError::Write {
            source,
            added: vec![quote.clone()],
        })?;
        info!(
            "event=quote_add module=collection status=ok id={} category_len={}",
            quote.id,
            quote.category.len()
        );
        Ok(quote)
    }

    /// Appends every valid record in `candidates`, returning how many were accepted.
    ///
    /// Records without string `text` and `category` are dropped silently.
    /// Supplied ids are ignored; accepted records get fresh local ids. On
    /// `CollectionError::Write` the accepted quotes are kept and listed in `added`.
    pub fn import_many(&self, candidates: &Value) -> CollectionResult<usize> {
        let Some(records) = candidates.as_array() else {
            return Err(CollectionError::Format(
                "expected a JSON array of quotes".to_string(),
            ));
        };

        let mut state = self.write_state();
        let mut added = Vec::new();
        for record in records {
            let Ok((text, category)) = parse_candidate(record) else {
                continue;
            };
            let quote = Quote {
                id: state.allocate_id(),
                text,
                category,
            };
            state.quotes.push(quote.clone());
            added.push(quote);
        }

        let accepted = added.len();
        if accepted == 0 {
            info!(
                "event=quote_import module=collection status=ok offered={} accepted=0",
                records.len()
            );
            return Ok(0);
        }

        state.reindex();
        let persisted = persist_quotes(self.store.as_ref(), &state.quotes);
        self.bump_revision(&mut state);
        drop(state);

        persisted.map_err(|source| CollectionError::Write { source, added })?;
        info!(
            "event=quote_import module=collection status=ok offered={} accepted={accepted}",
            records.len()
        );
        Ok(accepted)
    }

    /// Parses `raw` as JSON and feeds it through [`Self::import_many`].
    pub fn import_json(&self, raw: &str) -> CollectionResult<usize> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| CollectionError::Format(format!("not valid JSON: {err}")))?;
        self.import_many(&value)
    }

    /// Discards the current sequence and installs `new_quotes`.
    ///
    /// Later duplicates of an id are dropped. On `CollectionError::Write` the
    /// replacement is already in memory.
    pub fn replace_all(&self, new_quotes: Vec<Quote>) -> CollectionResult<()> {
        let mut state = self.write_state();
        self.install(&mut state, new_quotes)
    }

    /// Replaces the sequence only when it differs from `snapshot` by content.
    ///
    /// Later duplicates of an id in `snapshot` are dropped before comparing,
    /// so a repeated snapshot converges after one replacement.
    ///
    /// Returns `Ok(true)` when a replacement happened. Comparison and
    /// replacement run under one writer lock. `CollectionError::Write` implies
    /// the replacement took place in memory.
    pub fn replace_if_diverged(&self, snapshot: &[Quote]) -> CollectionResult<bool> {
        let incoming = unique_by_id(snapshot.to_vec());
        let mut state = self.write_state();
        if same_contents(&state.quotes, &incoming) {
            return Ok(false);
        }
        self.install(&mut state, incoming)?;
        Ok(true)
    }

    /// Returns the quotes matching `selected`, in collection order.
    pub fn filter(&self, selected: &QuoteFilter) -> Vec<Quote> {
        self.read_state()
            .quotes
            .iter()
            .filter(|quote| selected.matches(quote))
            .cloned()
            .collect()
    }

    /// Picks one random quote among those matching `selected`.
    pub fn random(&self, selected: &QuoteFilter) -> CollectionResult<Quote> {
        let visible = self.filter(selected);
        pick_random(&visible).cloned()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.read_state().categories.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<Quote> {
        self.read_state().quotes.clone()
    }

    pub fn len(&self) -> usize {
        self.read_state().quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().quotes.is_empty()
    }

    /// Number of mutations applied since load.
    pub fn revision(&self) -> u64 {
        self.read_state().revision
    }

    /// Receiver that observes the revision after each mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    pub fn selected_filter(&self) -> QuoteFilter {
        self.read_state().selected.clone()
    }

    /// Remembers the adapter's filter choice and persists it.
    pub fn select_filter(&self, filter: QuoteFilter) -> CollectionResult<()> {
        let mut state = self.write_state();
        let saved = self.store.save(SELECTED_FILTER_KEY, filter.as_str());
        state.selected = filter;
        drop(state);
        saved?;
        Ok(())
    }

    /// Serializes the collection as a pretty JSON array of `{text, category}`.
    pub fn export_json(&self) -> CollectionResult<String> {
        let contents: Vec<QuoteContent> = self
            .read_state()
            .quotes
            .iter()
            .map(QuoteContent::from)
            .collect();
        serde_json::to_string_pretty(&contents)
            .map_err(|err| CollectionError::Format(format!("cannot serialize export: {err}")))
    }

    fn install(
        &self,
        state: &mut CollectionState,
        new_quotes: Vec<Quote>,
    ) -> CollectionResult<()> {
        state.quotes = unique_by_id(new_quotes);
        state.reindex();
        let persisted = persist_quotes(self.store.as_ref(), &state.quotes);
        self.bump_revision(state);
        persisted?;
        info!(
            "event=collection_replace module=collection status=ok count={}",
            state.quotes.len()
        );
        Ok(())
    }

    fn bump_revision(&self, state: &mut CollectionState) {
        state.revision += 1;
        self.revision_tx.send_replace(state.revision);
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CollectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CollectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Picks one element uniformly at random.
pub fn pick_random(from: &[Quote]) -> CollectionResult<&Quote> {
    from.choose(&mut rand::thread_rng())
        .ok_or(CollectionError::EmptyCollection)
}

/// Order-sensitive comparison over `(text, category)`, ignoring ids.
pub fn same_contents(left: &[Quote], right: &[Quote]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(left, right)| left.same_content(right))
}

/// Keeps the first quote for each id, preserving order.
fn unique_by_id(quotes: Vec<Quote>) -> Vec<Quote> {
    let offered = quotes.len();
    let mut seen = HashSet::new();
    let unique: Vec<Quote> = quotes
        .into_iter()
        .filter(|quote| seen.insert(quote.id.clone()))
        .collect();
    if unique.len() != offered {
        warn!(
            "event=collection_replace module=collection status=warn dropped_duplicates={}",
            offered - unique.len()
        );
    }
    unique
}

fn persist_quotes(store: &dyn KeyValueStore, quotes: &[Quote]) -> Result<(), StoreError> {
    let payload =
        serde_json::to_string(quotes).map_err(|err| StoreError::Serialization(err.to_string()))?;
    store.save(QUOTES_KEY, &payload)
}

fn parse_stored_quotes(raw: &str) -> Result<Vec<Quote>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|err| format!("invalid json: {err}"))?;
    let Value::Array(records) = value else {
        return Err("stored value is not an array".to_string());
    };

    let mut seen = HashSet::new();
    let mut quotes = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let (text, category) =
            parse_candidate(record).map_err(|err| format!("element {index}: {err}"))?;
        let mut id = record
            .get("id")
            .and_then(QuoteId::from_json)
            .unwrap_or_else(QuoteId::new_local);
        while seen.contains(&id) {
            id = QuoteId::new_local();
        }
        seen.insert(id.clone());
        quotes.push(Quote { id, text, category });
    }
    Ok(quotes)
}
