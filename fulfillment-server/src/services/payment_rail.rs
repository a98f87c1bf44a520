//! Payment rail collaborator
//!
//! The engine never moves money itself: it asks the rail to execute a
//! transfer and records the result inside the same invoice-payment
//! transaction. Settlement mechanics (mobile money, bank transfer) are
//! the rail's concern.

use async_trait::async_trait;
use parking_lot::Mutex;

/// Transfer instruction handed to the rail
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub amount: f64,
    /// Destination settlement account
    pub destination_account: String,
    /// Caller reference (invoice number) echoed back by the rail
    pub reference: String,
}

/// Result returned by the rail
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub success: bool,
    /// Rail-issued settlement reference
    pub reference_id: String,
}

/// Interface to the payment settlement rail
#[async_trait]
pub trait PaymentRail: Send + Sync {
    async fn execute_transfer(&self, request: TransferRequest) -> Result<TransferReceipt, String>;
}

/// Rail stub that acknowledges every transfer and remembers what it was
/// asked to do. Used in tests and in deployments where settlement is
/// reconciled out-of-band.
#[derive(Default)]
pub struct RecordingPaymentRail {
    executed: Mutex<Vec<TransferRequest>>,
    fail_next: Mutex<bool>,
}

impl RecordingPaymentRail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfers executed so far
    pub fn executed(&self) -> Vec<TransferRequest> {
        self.executed.lock().clone()
    }

    /// Make the next transfer fail (test hook)
    pub fn fail_next(&self) {
        *self.fail_next.lock() = true;
    }
}

#[async_trait]
impl PaymentRail for RecordingPaymentRail {
    async fn execute_transfer(&self, request: TransferRequest) -> Result<TransferReceipt, String> {
        if std::mem::take(&mut *self.fail_next.lock()) {
            return Err("transfer declined by rail".to_string());
        }
        let reference_id = format!("TRF-{}", uuid::Uuid::new_v4());
        self.executed.lock().push(request);
        Ok(TransferReceipt {
            success: true,
            reference_id,
        })
    }
}
