//! Core logic for Quotebook.
//! This crate owns the quote collection, its persistence, and the periodic
//! reconciliation with the remote quote source.

pub mod api;
pub mod collection;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod sync;

pub use api::{ActionResponse, BootstrapError, QuotebookApi};
pub use collection::{
    pick_random, CollectionError, CollectionResult, LoadOrigin, LoadReport, QuoteCollection,
};
pub use config::{ConfigError, QuotebookConfig};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::filter::QuoteFilter;
pub use model::quote::{Quote, QuoteContent, QuoteId, QuoteValidationError};
pub use store::{KeyValueStore, SessionStore, SqliteKeyValueStore, StoreError, StoreResult};
pub use sync::{
    HttpRemoteClient, Reconciler, ReconcilerHandle, RemoteError, RemoteResult, RemoteSettings,
    RemoteSource, SyncOutcome, SyncPhase, SyncState,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
