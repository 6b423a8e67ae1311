//! In-memory quote collection with durable write-through.
//!
//! # Responsibility
//! - Own the ordered quote sequence and its derived category index.
//! - Persist every mutation through a `KeyValueStore`.
//! - Notify subscribers whenever the sequence changes.
//!
//! # Invariants
//! - The category index always equals the set of categories in the sequence.
//! - Quote ids are unique within the collection; nothing overwrites a quote
//!   under a reused id.
//! - Mutations are serialized by a single writer lock; reads share the lock.

mod defaults;
mod quote_collection;

pub use defaults::default_quotes;
pub use quote_collection::{
    pick_random, same_contents, CollectionError, CollectionResult, LoadOrigin, LoadReport,
    QuoteCollection,
};
