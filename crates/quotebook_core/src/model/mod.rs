//! Domain model for quotes and filter selection.
//!
//! # Invariants
//! - Every quote carries a non-empty `text` and `category`.
//! - `QuoteId` values are immutable once assigned.

pub mod filter;
pub mod quote;
