//! # Billing Gateway Seam
//!
//! The engine never posts invoices itself. It assembles [`InvoiceLine`]s and
//! hands them to whatever implements [`BillingGateway`] - an accounting
//! integration in production, [`RecordingGateway`] in tests.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RentalService::create_invoice            (holds the item lock 1-3)     │
//! │       │                                                                 │
//! │       │ 1. build lines from the contract (pure)                         │
//! │       │ 2. gateway.post_invoice(...)  ──► external system               │
//! │       │ 3. on success, attach the returned invoice id (once, guarded)   │
//! │       ▼                                                                 │
//! │  If step 2 fails, NOTHING was attached - a retry starts clean.          │
//! │  A racing caller waits at the lock, re-reads the contract, and fails    │
//! │  step 1 with a duplicate - the external system never sees two posts     │
//! │  and the FIRST invoice id survives.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use thiserror::Error;
use velorent_core::InvoiceLine;

/// Errors from the external billing collaborator.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The billing system rejected the invoice.
    #[error("Invoice rejected: {0}")]
    Rejected(String),

    /// The billing system could not be reached.
    #[error("Billing system unreachable: {0}")]
    Unreachable(String),
}

/// Posts invoices to an external billing system.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Posts a draft invoice for a rental and returns the invoice id the
    /// billing system assigned.
    async fn post_invoice(
        &self,
        rental_reference: &str,
        customer_id: &str,
        lines: &[InvoiceLine],
    ) -> Result<String, BillingError>;
}

/// In-memory gateway for tests: records every posted invoice and hands out
/// sequential ids ("INV-1", "INV-2", ...). Can be primed to fail.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    posted: std::sync::Mutex<Vec<PostedInvoice>>,
    fail_next: std::sync::Mutex<Option<String>>,
}

/// One invoice as the recording gateway saw it.
#[derive(Debug, Clone)]
pub struct PostedInvoice {
    pub invoice_id: String,
    pub rental_reference: String,
    pub customer_id: String,
    pub lines: Vec<InvoiceLine>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primes the next post to fail with the given reason.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.fail_next.lock().unwrap() = Some(reason.into());
    }

    /// Returns everything posted so far.
    pub fn posted(&self) -> Vec<PostedInvoice> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingGateway for RecordingGateway {
    async fn post_invoice(
        &self,
        rental_reference: &str,
        customer_id: &str,
        lines: &[InvoiceLine],
    ) -> Result<String, BillingError> {
        // Await point, so concurrent callers interleave here the way a real
        // network round-trip would let them.
        tokio::task::yield_now().await;

        if let Some(reason) = self.fail_next.lock().unwrap().take() {
            return Err(BillingError::Unreachable(reason));
        }

        let mut posted = self.posted.lock().unwrap();
        let invoice_id = format!("INV-{}", posted.len() + 1);
        posted.push(PostedInvoice {
            invoice_id: invoice_id.clone(),
            rental_reference: rental_reference.to_string(),
            customer_id: customer_id.to_string(),
            lines: lines.to_vec(),
        });
        Ok(invoice_id)
    }
}
