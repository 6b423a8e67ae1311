//! Key/value persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the `KeyValueStore` contract used by the quote collection.
//! - Provide a durable SQLite store and a transient in-memory session store.
//!
//! # Invariants
//! - `save` is synchronous: when it returns `Ok`, the value is durable.
//! - A failed `save` leaves the previously stored value untouched.
//! - Failures are returned to the caller, never swallowed.

mod kv_store;
mod session_store;

pub use kv_store::{KeyValueStore, SqliteKeyValueStore, StoreError, StoreResult};
pub use session_store::SessionStore;

/// Durable key holding the JSON array of quotes.
pub const QUOTES_KEY: &str = "quotes";
/// Durable key holding the selected filter string.
pub const SELECTED_FILTER_KEY: &str = "selected_filter";
/// Session-scoped key holding the last displayed quote.
pub const LAST_QUOTE_KEY: &str = "last_quote";
