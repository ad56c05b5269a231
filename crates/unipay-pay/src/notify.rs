//! Receipt delivery to the external notification collaborator.
//!
//! The core hands a completed receipt and recipient to a [`ReceiptNotifier`]
//! and records the boolean outcome. Retry policy, if any, belongs to the
//! collaborator — the core never retries on its own.

use std::sync::Mutex;

use unipay_core::{ReceiptNumber, Timestamp};
use unipay_org::StudentProfile;

use crate::error::{PayError, PayResult};
use crate::store::PaymentStore;
use crate::types::Receipt;

/// External email/SMS sender. Implementations live outside the core.
pub trait ReceiptNotifier: Send + Sync {
    /// Deliver the receipt to the student. Returns whether delivery
    /// succeeded.
    fn deliver(&self, receipt: &Receipt, student: &StudentProfile) -> bool;
}

/// Hand the receipt to the notifier and mark it sent on success.
///
/// Returns whether delivery succeeded. A failed delivery leaves the receipt
/// unmarked so a later attempt can be made by the caller.
pub fn dispatch_receipt(
    store: &dyn PaymentStore,
    notifier: &dyn ReceiptNotifier,
    receipt_number: &ReceiptNumber,
    student: &StudentProfile,
    now: Timestamp,
) -> PayResult<bool> {
    let mut receipt = store
        .get_receipt(receipt_number)?
        .ok_or(PayError::ReceiptNotFound)?;

    if notifier.deliver(&receipt, student) {
        receipt.email_sent = true;
        receipt.email_sent_at = Some(now);
        store.update_receipt(receipt)?;
        tracing::info!(
            receipt_number = %receipt_number,
            student = %student.id,
            "receipt delivered"
        );
        Ok(true)
    } else {
        tracing::warn!(
            receipt_number = %receipt_number,
            student = %student.id,
            "receipt delivery failed"
        );
        Ok(false)
    }
}

/// Test notifier recording every delivery attempt.
pub struct RecordingNotifier {
    pub succeed: bool,
    pub deliveries: Mutex<Vec<ReceiptNumber>>,
}

impl RecordingNotifier {
    pub fn new(succeed: bool) -> Self {
        Self {
            succeed,
            deliveries: Mutex::new(Vec::new()),
        }
    }

    pub fn delivered(&self) -> Vec<ReceiptNumber> {
        self.deliveries
            .lock()
            .expect("notifier lock poisoned")
            .clone()
    }
}

impl ReceiptNotifier for RecordingNotifier {
    fn deliver(&self, receipt: &Receipt, _student: &StudentProfile) -> bool {
        self.deliveries
            .lock()
            .expect("notifier lock poisoned")
            .push(receipt.receipt_number.clone());
        self.succeed
    }
}
