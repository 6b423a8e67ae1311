//! Periodic reconciliation between the local collection and the remote source.
//!
//! # Responsibility
//! - Run one `Idle -> Syncing -> {Reconciled|ConflictResolved|SyncFailed} -> Idle`
//!   cycle per trigger.
//! - Own the scheduled task that triggers cycles on a fixed period.
//!
//! # Invariants
//! - Single-flight: a trigger that arrives while a cycle runs is skipped.
//! - Server wins: any content divergence replaces the local sequence.
//! - A failed fetch leaves the collection and `last_conflict` untouched.

use crate::collection::QuoteCollection;
use crate::sync::remote_client::RemoteSource;
use crate::sync::state::{now_epoch_ms, SyncPhase, SyncState};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Result of one reconciliation trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote and local content matched; nothing changed.
    Reconciled,
    /// Local content diverged and was replaced by the remote snapshot.
    ConflictResolved,
    /// The fetch failed; the cycle was aborted.
    Failed(String),
    /// Another cycle was already running.
    Skipped,
}

/// Drives reconciliation cycles against one collection and one remote.
pub struct Reconciler {
    collection: Arc<QuoteCollection>,
    remote: Arc<dyn RemoteSource>,
    state: RwLock<SyncState>,
    in_flight: AtomicBool,
}

impl Reconciler {
    pub fn new(collection: Arc<QuoteCollection>, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            collection,
            remote,
            state: RwLock::new(SyncState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn sync_state(&self) -> SyncState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn collection(&self) -> &Arc<QuoteCollection> {
        &self.collection
    }

    /// Runs one cycle now, unless one is already in flight.
    pub async fn run_cycle(&self) -> SyncOutcome {
        let Some(_flight) = FlightGuard::acquire(&self.in_flight) else {
            debug!("event=sync_cycle module=sync status=skipped reason=in_flight");
            return SyncOutcome::Skipped;
        };
        self.update_state(|state| state.phase = SyncPhase::Syncing);

        let snapshot = match self.remote.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    "event=sync_cycle module=sync status=error error_code=fetch_failed error={err}"
                );
                let message = err.to_string();
                self.update_state(|state| {
                    state.phase = SyncPhase::Idle;
                    state.last_outcome = Some(SyncPhase::SyncFailed);
                    state.last_error = Some(message.clone());
                });
                return SyncOutcome::Failed(message);
            }
        };

        let mut write_error = None;
        let outcome = match self.collection.replace_if_diverged(&snapshot) {
            Ok(false) => SyncOutcome::Reconciled,
            Ok(true) => SyncOutcome::ConflictResolved,
            Err(err) => {
                warn!(
                    "event=sync_cycle module=sync status=error error_code=replace_not_persisted error={err}"
                );
                write_error = Some(err.to_string());
                SyncOutcome::ConflictResolved
            }
        };
        let conflict = outcome == SyncOutcome::ConflictResolved;

        let current = self.collection.snapshot();
        let push_error = match self.remote.push_snapshot(&current).await {
            Ok(()) => None,
            Err(err) => {
                warn!("event=sync_push module=sync status=error error={err}");
                Some(err.to_string())
            }
        };

        let terminal = if conflict {
            SyncPhase::ConflictResolved
        } else {
            SyncPhase::Reconciled
        };
        self.update_state(|state| {
            state.phase = SyncPhase::Idle;
            state.last_outcome = Some(terminal);
            state.last_conflict = conflict;
            state.last_sync_at = Some(now_epoch_ms());
            state.last_error = None;
            state.last_push_error = push_error;
            state.last_write_error = write_error;
        });
        info!(
            "event=sync_cycle module=sync status=ok outcome={terminal:?} remote_count={} local_count={}",
            snapshot.len(),
            current.len()
        );
        outcome
    }

    /// Spawns the recurring task. The first cycle runs one `period` from now.
    ///
    /// Ticks missed while a cycle is running are skipped, not queued. The task
    /// ends when [`ReconcilerHandle::stop`] is called or the handle is dropped.
    pub fn start(self: &Arc<Self>, period: Duration) -> ReconcilerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let reconciler = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                "event=sync_loop module=sync status=start period_ms={}",
                period.as_millis()
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        reconciler.run_cycle().await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("event=sync_loop module=sync status=stopped");
        });

        ReconcilerHandle { stop_tx, task }
    }

    fn update_state(&self, apply: impl FnOnce(&mut SyncState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }
}

/// Lifecycle handle for the recurring reconciliation task.
pub struct ReconcilerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReconcilerHandle {
    /// Signals the task to stop and waits for it. A cycle in progress finishes first.
    pub async fn stop(self) {
        self.stop_tx.send_replace(true);
        if let Err(err) = self.task.await {
            warn!("event=sync_loop module=sync status=error error={err}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
