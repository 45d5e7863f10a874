//! Accrual poller with adaptive timing
//!
//! One worker per oracle. The tick cadence starts at the configured poll
//! interval and adapts when the oracle answers 429: its announced
//! requests-per-minute quota becomes the new base interval, and the
//! `Retry-After` value is honored once for the very next sleep. A wake
//! signal interrupts the sleep so new timings take effect immediately.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::client::{AccrualClient, AccrualError};
use crate::errors::AppError;
use crate::models::{Operation, OperationType};
use crate::service::OperationService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PollTiming {
    pub poll_interval: Duration,
    pub retry_after: Duration,
}

impl PollTiming {
    /// Delay before the next tick. A pending `retry_after` is consumed.
    fn effective_sleep(&mut self) -> Duration {
        if !self.retry_after.is_zero() {
            return std::mem::take(&mut self.retry_after);
        }
        self.poll_interval
    }

    /// Apply the oracle's rate-limit hints. A zero rpm is ignored.
    fn adjust(&mut self, retry_after: Duration, max_rpm: u32) -> bool {
        if max_rpm == 0 {
            return false;
        }
        self.poll_interval = Duration::from_secs(60) / max_rpm;
        self.retry_after = retry_after;
        true
    }
}

pub struct AccrualPoller {
    operations: Arc<OperationService>,
    client: AccrualClient,
    timing: Mutex<PollTiming>,
    wake_tx: mpsc::Sender<()>,
    wake_rx: tokio::sync::Mutex<mpsc::Receiver<()>>,
}

impl AccrualPoller {
    pub fn new(
        operations: Arc<OperationService>,
        client: AccrualClient,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let (wake_tx, wake_rx) = mpsc::channel(1);
        Arc::new(Self {
            operations,
            client,
            timing: Mutex::new(PollTiming {
                poll_interval,
                retry_after: Duration::ZERO,
            }),
            wake_tx,
            wake_rx: tokio::sync::Mutex::new(wake_rx),
        })
    }

    /// Run until `shutdown` fires. Each timer expiry spawns a detached
    /// tick; the skip-locked selector keeps overlapping ticks off the same
    /// row.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("accrual poller started");
        let mut wake = self.wake_rx.lock().await;
        loop {
            let sleep_for = self.timing.lock().unwrap().effective_sleep();
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("accrual poller stopped");
                    return;
                }
                _ = wake.recv() => {
                    // timings changed, re-evaluate the sleep
                    continue;
                }
                _ = tokio::time::sleep(sleep_for) => {
                    let poller = Arc::clone(&self);
                    tokio::spawn(async move { poller.tick().await });
                }
            }
        }
    }

    async fn tick(&self) {
        let result = self
            .operations
            .update_further(OperationType::OrderAccrual, |op| self.oracle_transform(op))
            .await;
        match result {
            Ok(op) => {
                tracing::info!(operation_id = op.id, status = ?op.status, "accrual operation updated")
            }
            Err(AppError::NotFound) => tracing::debug!("no accrual operations to update"),
            // timings were already adjusted; the row is retried later
            Err(AppError::TooManyRequests) => {}
            Err(e) => tracing::error!(error = %e, "accrual operation update failed"),
        }
    }

    /// Transform hook run inside the selector's transaction.
    async fn oracle_transform(&self, mut op: Operation) -> Result<Operation, AppError> {
        let Some(number) = op.order_number.clone() else {
            tracing::error!(operation_id = op.id, "accrual operation without order number");
            return Err(AppError::Internal);
        };

        match self.client.order_status(&number).await {
            Ok(reply) => {
                op.status = reply.status;
                op.amount = reply.accrual;
                Ok(op)
            }
            Err(AccrualError::TooManyRequests {
                retry_after,
                max_rpm,
            }) => {
                self.adjust_poll_timing(retry_after, max_rpm);
                Err(AppError::TooManyRequests)
            }
            Err(AccrualError::RequestFailed(reason)) => {
                tracing::warn!(operation_id = op.id, reason, "accrual request failed");
                Err(AppError::RequestFailed)
            }
        }
    }

    /// Fold the oracle's hints into the timing state and wake the loop.
    pub fn adjust_poll_timing(&self, retry_after: Duration, max_rpm: u32) {
        let mut timing = self.timing.lock().unwrap();
        if !timing.adjust(retry_after, max_rpm) {
            tracing::error!("rate-limit reply without a requests-per-minute quota");
            return;
        }
        tracing::info!(
            poll_interval = ?timing.poll_interval,
            retry_after = ?timing.retry_after,
            "poll timing adjusted"
        );
        drop(timing);
        // capacity-1 channel: a pending wake already does the job
        let _ = self.wake_tx.try_send(());
    }

    #[cfg(test)]
    pub(crate) fn timing_snapshot(&self) -> PollTiming {
        *self.timing.lock().unwrap()
    }
}
