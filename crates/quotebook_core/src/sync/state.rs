//! Sync status surfaced to adapters.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Reconciler state machine position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    Syncing,
    Reconciled,
    ConflictResolved,
    SyncFailed,
}

/// Snapshot of sync progress, owned and mutated by the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncState {
    /// Epoch milliseconds of the last completed (non-failed) cycle.
    pub last_sync_at: Option<i64>,
    /// Whether the last completed cycle replaced local data.
    pub last_conflict: bool,
    /// Current phase; `Idle` between cycles.
    pub phase: SyncPhase,
    /// Terminal phase of the most recent cycle.
    pub last_outcome: Option<SyncPhase>,
    /// Reason the most recent fetch failed, cleared by the next success.
    pub last_error: Option<String>,
    /// Reason the most recent best-effort push failed.
    pub last_push_error: Option<String>,
    /// Set when a server-wins replacement could not be persisted.
    pub last_write_error: Option<String>,
}

impl SyncState {
    /// Short human-readable status line.
    pub fn status_text(&self) -> &'static str {
        if self.phase == SyncPhase::Syncing {
            return "Syncing...";
        }
        match self.last_outcome {
            None => "Not synced yet",
            Some(SyncPhase::SyncFailed) => "Sync failed",
            Some(SyncPhase::ConflictResolved) => "Updates arrived from the server (server wins)",
            Some(_) => "Quotes synced with server",
        }
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
