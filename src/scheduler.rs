//! Payment reconciliation scheduler
//!
//! A background loop that polls the payment processor for every pending
//! payment and applies the resulting state transition to the payment backend.
//! Per-payment failures are logged and skipped so one bad record cannot halt
//! a cycle. Backend updates are idempotent for terminal states, which makes
//! concurrent reconcilers and the cancel endpoint safe races.

use std::sync::Arc;

use tonic::transport::Channel;
use tracing::{debug, error, info};

use crate::grpc_clients::payment::{
    self, PaymentState, payment_service_client::PaymentServiceClient,
};
use crate::processor::{PaymentProcessor, SessionStatus};

/// Decision table mapping the processor's two status signals onto a backend
/// transition. `None` leaves the payment pending for the next cycle.
#[must_use]
pub fn reconcile(status: &SessionStatus) -> Option<PaymentState> {
    if status.payment_status == "paid" && status.session_status == "complete" {
        return Some(PaymentState::Accepted);
    }
    if status.payment_status == "payment_failed" || status.session_status == "expired" {
        return Some(PaymentState::Cancelled);
    }
    None
}

pub struct PaymentReconciler {
    payments: PaymentServiceClient<Channel>,
    processor: Arc<dyn PaymentProcessor>,
    interval: std::time::Duration,
}

impl PaymentReconciler {
    #[must_use]
    pub fn new(
        payments: PaymentServiceClient<Channel>,
        processor: Arc<dyn PaymentProcessor>,
        interval_seconds: u64,
    ) -> Self {
        Self {
            payments,
            processor,
            interval: std::time::Duration::from_secs(interval_seconds),
        }
    }

    /// Run forever on the configured interval.
    pub async fn run(mut self) {
        info!("Payment reconciliation running every {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// One reconciliation pass over all pending payments.
    pub async fn run_cycle(&mut self) {
        let pending = match self
            .payments
            .get_unpaid_payments(payment::UnpaidFilter { unpaid: true })
            .await
        {
            Ok(response) => response.into_inner().payments,
            Err(e) => {
                error!("Failed to fetch pending payments: {}", e);
                return;
            }
        };

        debug!("Reconciling {} pending payments", pending.len());
        for record in pending {
            if let Err(e) = self.reconcile_one(record).await {
                error!("Reconciliation skipped a payment: {}", e);
            }
        }
    }

    async fn reconcile_one(&mut self, record: payment::PaymentDetails) -> anyhow::Result<()> {
        let status = self.processor.session_status(&record.id).await?;

        let Some(next_state) = reconcile(&status) else {
            debug!("Payment {} still open, will re-check", record.id);
            return Ok(());
        };

        let id = record.id.clone();
        self.payments
            .update_payment(payment::PaymentDetails {
                state: next_state as i32,
                ..record
            })
            .await?;

        info!("Payment {} reconciled to {:?}", id, next_state);
        Ok(())
    }
}
