//! Remote snapshot sync.
//!
//! # Responsibility
//! - Fetch remote snapshots and push the local collection upstream.
//! - Reconcile divergence with a server-wins policy on a fixed schedule.
//!
//! # Invariants
//! - At most one reconciliation cycle is in flight at a time.
//! - Remote failures never mutate the local collection.
//! - Only the reconciler mutates `SyncState`.

pub mod reconciler;
pub mod remote_client;
pub mod state;

pub use reconciler::{Reconciler, ReconcilerHandle, SyncOutcome};
pub use remote_client::{HttpRemoteClient, RemoteError, RemoteResult, RemoteSettings, RemoteSource};
pub use state::{SyncPhase, SyncState};
