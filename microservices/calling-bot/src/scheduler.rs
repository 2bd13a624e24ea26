//! Delayed Action Scheduler
//!
//! Runs follow-up actions (transfer, invite) on detached tokio tasks after a
//! delay. The scheduling caller never observes the action's outcome: errors
//! are logged and counted, panics are caught. Each action is returned as a
//! `BackgroundTask` handle that can be dropped (fire-and-forget) or joined.
//! Work that decides not to touch the call reports `Execution::Skipped` and is
//! counted apart from completed work.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::directory::Role;
use crate::error::OrchestratorError;

/// Kind of follow-up action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Transfer,
    Invite,
}

impl ActionKind {
    /// Directory role supplying the action's target
    pub fn role(self) -> Role {
        match self {
            ActionKind::Transfer => Role::TransferTarget,
            ActionKind::Invite => Role::InviteTarget,
        }
    }
}

/// Deferred unit of work against a call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledAction {
    pub id: Uuid,
    pub target_call_id: String,
    pub kind: ActionKind,
    pub fire_after: Duration,
    pub role: Role,
    pub scheduled_at: DateTime<Utc>,
}

impl ScheduledAction {
    pub fn new(target_call_id: impl Into<String>, kind: ActionKind, fire_after: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_call_id: target_call_id.into(),
            kind,
            fire_after,
            role: kind.role(),
            scheduled_at: Utc::now(),
        }
    }
}

/// What a successful unit of work did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Performed,
    /// The call was no longer usable; nothing was sent
    Skipped,
}

/// How a scheduled action ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Skipped,
    Failed(String),
    Panicked(String),
    Cancelled,
}

/// Scheduler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub pending: usize,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub cancelled: u64,
}

struct PendingEntry {
    action: ScheduledAction,
    abort: AbortHandle,
}

#[derive(Default)]
struct SchedulerInner {
    pending: DashMap<Uuid, PendingEntry>,
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl SchedulerInner {
    fn finish(&self, action: &ScheduledAction, outcome: &ActionOutcome) {
        if self.pending.remove(&action.id).is_none() {
            return;
        }
        match outcome {
            ActionOutcome::Completed => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            ActionOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            ActionOutcome::Failed(_) | ActionOutcome::Panicked(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            ActionOutcome::Cancelled => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Handle to a scheduled action
///
/// Dropping the handle detaches the task; the action still runs.
pub struct BackgroundTask {
    action: ScheduledAction,
    handle: JoinHandle<ActionOutcome>,
}

impl BackgroundTask {
    pub fn action(&self) -> &ScheduledAction {
        &self.action
    }

    /// Wait for the action to run (or be cancelled)
    pub async fn join(self) -> ActionOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => ActionOutcome::Cancelled,
            Err(err) => ActionOutcome::Panicked(err.to_string()),
        }
    }
}

/// Fire-and-forget scheduler for call follow-up actions
#[derive(Clone, Default)]
pub struct DelayedActionScheduler {
    inner: Arc<SchedulerInner>,
}

impl DelayedActionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` once, no earlier than `action.fire_after` from now
    pub fn schedule<F, Fut>(&self, action: ScheduledAction, work: F) -> BackgroundTask
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Execution, OrchestratorError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task_action = action.clone();
        let (armed_tx, armed_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            // Wait until the entry is registered so finish() always finds it
            let _ = armed_rx.await;
            tokio::time::sleep(task_action.fire_after).await;

            debug!(
                action_id = %task_action.id,
                call_id = %task_action.target_call_id,
                kind = ?task_action.kind,
                "Running scheduled action"
            );

            let outcome = match AssertUnwindSafe(async move { work().await })
                .catch_unwind()
                .await
            {
                Ok(Ok(Execution::Performed)) => ActionOutcome::Completed,
                Ok(Ok(Execution::Skipped)) => {
                    info!(
                        action_id = %task_action.id,
                        call_id = %task_action.target_call_id,
                        kind = ?task_action.kind,
                        "Scheduled action skipped"
                    );
                    ActionOutcome::Skipped
                }
                Ok(Err(err)) => {
                    warn!(
                        action_id = %task_action.id,
                        call_id = %task_action.target_call_id,
                        kind = ?task_action.kind,
                        error = %err,
                        "Scheduled action failed"
                    );
                    ActionOutcome::Failed(err.to_string())
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(
                        action_id = %task_action.id,
                        call_id = %task_action.target_call_id,
                        kind = ?task_action.kind,
                        panic = %message,
                        "Scheduled action panicked"
                    );
                    ActionOutcome::Panicked(message)
                }
            };

            inner.finish(&task_action, &outcome);
            outcome
        });

        self.inner.pending.insert(
            action.id,
            PendingEntry {
                action: action.clone(),
                abort: handle.abort_handle(),
            },
        );
        let _ = armed_tx.send(());

        info!(
            action_id = %action.id,
            call_id = %action.target_call_id,
            kind = ?action.kind,
            fire_after_ms = action.fire_after.as_millis() as u64,
            "Scheduled action"
        );

        BackgroundTask { action, handle }
    }

    /// Withdraw every pending action targeting `call_id`
    pub fn cancel_for_call(&self, call_id: &str) -> usize {
        let ids: Vec<Uuid> = self
            .inner
            .pending
            .iter()
            .filter(|entry| entry.action.target_call_id == call_id)
            .map(|entry| *entry.key())
            .collect();

        let cancelled = ids.into_iter().filter(|id| self.cancel(id)).count();
        if cancelled > 0 {
            info!(call_id = %call_id, cancelled, "Cancelled scheduled actions");
        }
        cancelled
    }

    fn cancel(&self, id: &Uuid) -> bool {
        match self.inner.pending.remove(id) {
            Some((_, entry)) => {
                entry.abort.abort();
                self.inner.cancelled.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Actions that have not finished yet
    pub fn pending(&self) -> Vec<ScheduledAction> {
        self.inner
            .pending
            .iter()
            .map(|entry| entry.action.clone())
            .collect()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            pending: self.inner.pending.len(),
            completed: self.inner.completed.load(Ordering::Relaxed),
            skipped: self.inner.skipped.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            cancelled: self.inner.cancelled.load(Ordering::Relaxed),
        }
    }

    /// Abort everything still pending
    pub fn shutdown(&self) -> usize {
        let ids: Vec<Uuid> = self.inner.pending.iter().map(|entry| *entry.key()).collect();
        let aborted = ids.into_iter().filter(|id| self.cancel(id)).count();
        info!(aborted, "Scheduler shut down");
        aborted
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
