//! Batch result accumulation and observable progress.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::outcome::{BatchDisposition, BatchResult, SendOutcome};

/// Lifecycle of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    /// Request validated, no attempt made yet.
    Pending,
    /// Attempts in flight.
    Running,
    /// Every recipient processed.
    Completed,
    /// Stopped early; outcomes cover a prefix of the batch.
    Aborted,
}

/// Point-in-time view of a batch, published after every recorded
/// outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub state: BatchState,
    pub done: usize,
    pub total: usize,
}

/// Accumulates [`SendOutcome`]s in arrival order (which equals
/// recipient order: the orchestrator is strictly sequential).
///
/// Outcomes are append-only; nothing is mutated after being recorded.
/// Every append publishes a [`BatchProgress`] snapshot so callers can
/// watch a long-running batch without touching the outcome list.
#[derive(Debug)]
pub struct BatchReporter {
    total: usize,
    outcomes: Vec<SendOutcome>,
    progress: watch::Sender<BatchProgress>,
}

impl BatchReporter {
    #[must_use]
    pub fn new(total: usize) -> Self {
        let (progress, _) = watch::channel(BatchProgress {
            state: BatchState::Pending,
            done: 0,
            total,
        });

        Self {
            total,
            outcomes: Vec::with_capacity(total),
            progress,
        }
    }

    /// A receiver for progress snapshots. Can be subscribed before the
    /// batch starts and observed while it runs.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    /// Marks the batch as running before the first attempt starts.
    pub fn begin(&self) {
        let _ = self.progress.send(BatchProgress {
            state: BatchState::Running,
            done: 0,
            total: self.total,
        });
    }

    /// Appends one outcome and publishes the updated progress.
    ///
    /// Outcomes must arrive in recipient order; the sequence index is
    /// checked against the append position.
    pub fn record(&mut self, outcome: SendOutcome) {
        debug_assert_eq!(
            outcome.index,
            self.outcomes.len() + 1,
            "outcomes must be recorded in sequence"
        );

        self.outcomes.push(outcome);
        let _ = self.progress.send(BatchProgress {
            state: BatchState::Running,
            done: self.outcomes.len(),
            total: self.total,
        });
    }

    /// Outcomes recorded so far.
    #[must_use]
    pub fn outcomes(&self) -> &[SendOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn recorded(&self) -> usize {
        self.outcomes.len()
    }

    /// Seals the batch into its immutable result and publishes the
    /// terminal state.
    #[must_use]
    pub fn finalize(self, disposition: BatchDisposition) -> BatchResult {
        let state = match disposition {
            BatchDisposition::Completed => BatchState::Completed,
            BatchDisposition::Aborted => BatchState::Aborted,
        };
        let _ = self.progress.send(BatchProgress {
            state,
            done: self.outcomes.len(),
            total: self.total,
        });

        let succeeded = self
            .outcomes
            .iter()
            .filter(|outcome| outcome.status.is_sent())
            .count();
        let failed = self.outcomes.len() - succeeded;

        BatchResult {
            outcomes: self.outcomes,
            succeeded,
            failed,
            disposition,
            completed_at: Utc::now(),
        }
    }
}
