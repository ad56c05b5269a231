//! Persistence seam for the payment lifecycle.
//!
//! The core assumes a transactional store with atomic multi-row commits and
//! an atomic compare-and-swap on request status. [`PaymentStore`] is that
//! contract; [`InMemoryStore`] is the mutex-guarded reference backend used by
//! tests and embedders without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use unipay_core::{FeeTypeId, OfficerId, PaymentId, ReceiptNumber, RequestId, StudentId, Timestamp};

use crate::error::{PayError, PayResult};
use crate::types::{Payment, PaymentRequest, Receipt, RequestStatus};

pub trait PaymentStore: Send + Sync {
    /// Persist a new request. Enforces the one-pending-per-(student, fee)
    /// invariant at the storage layer as well.
    fn insert_request(&self, request: PaymentRequest) -> PayResult<()>;

    fn get_request(&self, id: &RequestId) -> PayResult<Option<PaymentRequest>>;

    /// Atomic compare-and-swap on request status: the flip happens only if
    /// the status still equals `expected` at the moment of commit. Returns
    /// whether the swap took effect.
    fn compare_and_swap_status(
        &self,
        id: &RequestId,
        expected: RequestStatus,
        new: RequestStatus,
    ) -> PayResult<bool>;

    /// The student's pending request for a fee type, if one exists.
    fn pending_request_for(
        &self,
        student: &StudentId,
        fee_type: &FeeTypeId,
    ) -> PayResult<Option<PaymentRequest>>;

    /// The student's completed, non-void payment for a fee type, if any.
    fn completed_payment_for(
        &self,
        student: &StudentId,
        fee_type: &FeeTypeId,
    ) -> PayResult<Option<Payment>>;

    fn receipt_number_exists(&self, number: &ReceiptNumber) -> PayResult<bool>;

    /// Commit a redemption as one atomic unit: flip the request from Pending
    /// to Paid and insert the payment and receipt — all three or none.
    /// Fails with `AlreadyProcessed` when the request is no longer pending
    /// at commit time.
    fn commit_redemption(
        &self,
        request_id: &RequestId,
        payment: Payment,
        receipt: Receipt,
    ) -> PayResult<()>;

    /// Record a walk-up payment (no QR request) with its receipt.
    fn insert_walk_up(&self, payment: Payment, receipt: Receipt) -> PayResult<()>;

    fn get_payment(&self, id: &PaymentId) -> PayResult<Option<Payment>>;

    /// Flip a completed payment to void. Fails with `NotVoidable` when the
    /// payment is already void.
    fn mark_void(
        &self,
        id: &PaymentId,
        voided_by: OfficerId,
        reason: String,
        at: Timestamp,
    ) -> PayResult<Payment>;

    fn get_receipt(&self, number: &ReceiptNumber) -> PayResult<Option<Receipt>>;

    fn update_receipt(&self, receipt: Receipt) -> PayResult<()>;
}

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    requests: HashMap<RequestId, PaymentRequest>,
    payments: HashMap<PaymentId, Payment>,
    receipts: HashMap<ReceiptNumber, Receipt>,
}

/// Mutex-guarded in-memory backend. One lock covers all three tables, which
/// is what makes `commit_redemption` atomic here.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PayResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| PayError::Storage("store lock poisoned".into()))
    }
}

impl PaymentStore for InMemoryStore {
    fn insert_request(&self, request: PaymentRequest) -> PayResult<()> {
        let mut inner = self.lock()?;
        if inner.requests.contains_key(&request.request_id) {
            return Err(PayError::Storage("duplicate request id".into()));
        }
        let duplicate_pending = inner.requests.values().any(|r| {
            r.student == request.student
                && r.fee_type == request.fee_type
                && r.status == RequestStatus::Pending
        });
        if duplicate_pending && request.status == RequestStatus::Pending {
            return Err(PayError::DuplicateFeeRequest);
        }
        inner.requests.insert(request.request_id, request);
        Ok(())
    }

    fn get_request(&self, id: &RequestId) -> PayResult<Option<PaymentRequest>> {
        Ok(self.lock()?.requests.get(id).cloned())
    }

    fn compare_and_swap_status(
        &self,
        id: &RequestId,
        expected: RequestStatus,
        new: RequestStatus,
    ) -> PayResult<bool> {
        let mut inner = self.lock()?;
        let request = inner
            .requests
            .get_mut(id)
            .ok_or(PayError::RequestNotFound)?;
        if request.status != expected {
            return Ok(false);
        }
        request.status = new;
        Ok(true)
    }

    fn pending_request_for(
        &self,
        student: &StudentId,
        fee_type: &FeeTypeId,
    ) -> PayResult<Option<PaymentRequest>> {
        Ok(self
            .lock()?
            .requests
            .values()
            .find(|r| {
                &r.student == student
                    && &r.fee_type == fee_type
                    && r.status == RequestStatus::Pending
            })
            .cloned())
    }

    fn completed_payment_for(
        &self,
        student: &StudentId,
        fee_type: &FeeTypeId,
    ) -> PayResult<Option<Payment>> {
        Ok(self
            .lock()?
            .payments
            .values()
            .find(|p| &p.student == student && &p.fee_type == fee_type && !p.is_void)
            .cloned())
    }

    fn receipt_number_exists(&self, number: &ReceiptNumber) -> PayResult<bool> {
        Ok(self.lock()?.receipts.contains_key(number))
    }

    fn commit_redemption(
        &self,
        request_id: &RequestId,
        payment: Payment,
        receipt: Receipt,
    ) -> PayResult<()> {
        let mut inner = self.lock()?;

        // Validate everything before mutating anything, so a failure leaves
        // no orphaned rows.
        let status = inner
            .requests
            .get(request_id)
            .ok_or(PayError::RequestNotFound)?
            .status;
        if status != RequestStatus::Pending {
            return Err(PayError::AlreadyProcessed(status));
        }
        if inner.payments.contains_key(&payment.id) {
            return Err(PayError::Storage("duplicate payment id".into()));
        }
        if inner.receipts.contains_key(&receipt.receipt_number) {
            return Err(PayError::Storage("duplicate receipt number".into()));
        }

        let paid_at = payment.created_at;
        if let Some(request) = inner.requests.get_mut(request_id) {
            request.status = RequestStatus::Paid;
            request.paid_at = Some(paid_at);
        }
        inner.payments.insert(payment.id.clone(), payment);
        inner
            .receipts
            .insert(receipt.receipt_number.clone(), receipt);
        Ok(())
    }

    fn insert_walk_up(&self, payment: Payment, receipt: Receipt) -> PayResult<()> {
        let mut inner = self.lock()?;
        if inner.payments.contains_key(&payment.id) {
            return Err(PayError::Storage("duplicate payment id".into()));
        }
        if inner.receipts.contains_key(&receipt.receipt_number) {
            return Err(PayError::Storage("duplicate receipt number".into()));
        }
        inner.payments.insert(payment.id.clone(), payment);
        inner
            .receipts
            .insert(receipt.receipt_number.clone(), receipt);
        Ok(())
    }

    fn get_payment(&self, id: &PaymentId) -> PayResult<Option<Payment>> {
        Ok(self.lock()?.payments.get(id).cloned())
    }

    fn mark_void(
        &self,
        id: &PaymentId,
        voided_by: OfficerId,
        reason: String,
        at: Timestamp,
    ) -> PayResult<Payment> {
        let mut inner = self.lock()?;
        let payment = inner.payments.get_mut(id).ok_or(PayError::PaymentNotFound)?;
        if payment.is_void {
            return Err(PayError::NotVoidable);
        }
        payment.is_void = true;
        payment.void_reason = Some(reason);
        payment.voided_by = Some(voided_by);
        payment.voided_at = Some(at);
        Ok(payment.clone())
    }

    fn get_receipt(&self, number: &ReceiptNumber) -> PayResult<Option<Receipt>> {
        Ok(self.lock()?.receipts.get(number).cloned())
    }

    fn update_receipt(&self, receipt: Receipt) -> PayResult<()> {
        let mut inner = self.lock()?;
        if !inner.receipts.contains_key(&receipt.receipt_number) {
            return Err(PayError::ReceiptNotFound);
        }
        inner
            .receipts
            .insert(receipt.receipt_number.clone(), receipt);
        Ok(())
    }
}
