//! The sequential dispatch loop.

use tokio::sync::watch;
use volley_common::Address;
use volley_relay::{Mailer, SendError};

use crate::outcome::{BatchDisposition, BatchResult, SendOutcome};
use crate::policy::DispatchPolicy;
use crate::report::BatchReporter;
use crate::request::DispatchRequest;

/// Caller-side handle used to cancel a running batch.
///
/// Cancellation takes effect between attempts: an attempt already in
/// flight finishes (and its outcome is recorded), but no further
/// attempts start.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Orchestrator-side view of the cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancellation is requested. A dropped
    /// [`CancelHandle`] means the batch can no longer be cancelled, so
    /// the future never resolves in that case.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Creates a linked cancel handle/token pair for one batch.
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Drives batches against a [`Mailer`], one recipient at a time.
///
/// Each batch owns its request, reporter, and cancellation signal;
/// concurrent batches share nothing but the mailer configuration, so a
/// dispatcher can be cloned freely across tasks.
#[derive(Debug, Clone)]
pub struct Dispatcher<M> {
    mailer: M,
    policy: DispatchPolicy,
}

impl<M: Mailer> Dispatcher<M> {
    #[must_use]
    pub const fn new(mailer: M, policy: DispatchPolicy) -> Self {
        Self { mailer, policy }
    }

    /// Runs a batch to completion with a private reporter and no
    /// external cancellation.
    pub async fn dispatch(&self, request: &DispatchRequest) -> BatchResult {
        let (handle, token) = cancel_pair();
        let reporter = BatchReporter::new(request.total());
        let result = self.run(request, reporter, token).await;
        drop(handle);
        result
    }

    /// Runs a batch, recording each outcome into `reporter` as soon as
    /// it is known.
    ///
    /// The loop is strictly sequential: one attempt at a time, with the
    /// configured interval between the end of one attempt and the start
    /// of the next. The interval sleep is raced against cancellation so
    /// an idle batch stops promptly.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(relay = %request.credentials().endpoint(), total = request.total())
    )]
    pub async fn run(
        &self,
        request: &DispatchRequest,
        mut reporter: BatchReporter,
        mut cancel: CancelToken,
    ) -> BatchResult {
        let total = request.total();
        let interval = request.interval();

        tracing::info!(interval = ?interval, "batch starting");
        reporter.begin();

        for (position, recipient) in request.recipients().iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(done = reporter.recorded(), "batch cancelled");
                return reporter.finalize(BatchDisposition::Aborted);
            }

            if position > 0 && !interval.is_zero() {
                tokio::select! {
                    () = cancel.cancelled() => {
                        tracing::info!(done = reporter.recorded(), "batch cancelled");
                        return reporter.finalize(BatchDisposition::Aborted);
                    }
                    () = tokio::time::sleep(interval) => {}
                }
            }

            let index = position + 1;
            match self.attempt(request, recipient).await {
                Ok(()) => {
                    tracing::debug!(recipient = %recipient, index, total, "sent");
                    reporter.record(SendOutcome::sent(recipient.clone(), index, total));
                }
                Err(error) => {
                    let abort = error.is_fatal() && self.policy.abort_on_auth_failure;
                    tracing::warn!(recipient = %recipient, index, total, error = %error, "send failed");
                    reporter.record(SendOutcome::failed(recipient.clone(), index, total, &error));

                    if abort {
                        tracing::warn!(
                            done = reporter.recorded(),
                            "aborting batch, credentials are refused"
                        );
                        return reporter.finalize(BatchDisposition::Aborted);
                    }
                }
            }
        }

        tracing::info!("batch completed");
        reporter.finalize(BatchDisposition::Completed)
    }

    /// One recipient's attempt, with the policy's immediate retries for
    /// transient failures.
    async fn attempt(&self, request: &DispatchRequest, recipient: &Address) -> Result<(), SendError> {
        let mut result = self
            .mailer
            .send(request.credentials(), request.template(), recipient)
            .await;

        let mut retries = 0;
        while let Err(error) = &result {
            if !error.is_transient() || retries >= self.policy.transient_retries {
                break;
            }
            retries += 1;
            tracing::debug!(recipient = %recipient, retries, "retrying transient failure");
            result = self
                .mailer
                .send(request.credentials(), request.template(), recipient)
                .await;
        }

        result
    }
}
