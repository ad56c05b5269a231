//! Booth-side redemption: QR verification, scope checks, and the atomic
//! Pending → Paid commit.
//!
//! Check order mirrors what the officer sees: signature first (a forged or
//! stale QR never reaches business logic), then organization scope, then
//! request state, then the amount. Each refusal carries its own error kind.

use rust_decimal::Decimal;

use unipay_auth::{can_redeem, can_void, Officer};
use unipay_core::{
    parse_qr_payload, CoreError, PaymentId, PaymentMethod, ReceiptNumber, RequestId,
    SignatureService, Timestamp,
};
use unipay_org::{FeeType, OrgDirectory, StudentProfile};

use crate::error::{PayError, PayResult};
use crate::request::change_for;
use crate::status::is_expired;
use crate::store::PaymentStore;
use crate::types::{Payment, PaymentRequest, Receipt, RequestStatus};

/// Number of request-id characters kept in a derived receipt number.
const RECEIPT_NUMBER_LEN: usize = 12;

pub struct RedemptionDesk<'a> {
    store: &'a dyn PaymentStore,
    signatures: &'a SignatureService,
    orgs: &'a OrgDirectory,
}

impl<'a> RedemptionDesk<'a> {
    pub fn new(
        store: &'a dyn PaymentStore,
        signatures: &'a SignatureService,
        orgs: &'a OrgDirectory,
    ) -> Self {
        Self {
            store,
            signatures,
            orgs,
        }
    }

    /// Redeem a pending request: verify the presented signature, check the
    /// officer's scope, and commit the payment and receipt in the same
    /// atomic unit as the status flip. Exactly one of N concurrent attempts
    /// succeeds; the rest observe `AlreadyProcessed`.
    pub fn redeem(
        &self,
        officer: &Officer,
        request_id: &RequestId,
        presented_signature: &str,
        amount_received: Decimal,
        payment_method: PaymentMethod,
        notes: impl Into<String>,
        now: Timestamp,
    ) -> PayResult<(Payment, Receipt)> {
        let request = self
            .store
            .get_request(request_id)?
            .ok_or(PayError::RequestNotFound)?;

        if !self
            .signatures
            .verify(&request_id.canonical(), presented_signature)
        {
            return Err(PayError::InvalidSignature);
        }

        can_redeem(officer, &request.organization, self.orgs)?;

        if is_expired(&request, now) {
            // Lazy expiry: flip on observation, then refuse.
            let _ = self.store.compare_and_swap_status(
                request_id,
                RequestStatus::Pending,
                RequestStatus::Expired,
            )?;
            return Err(PayError::Expired);
        }
        if request.status != RequestStatus::Pending {
            return Err(PayError::AlreadyProcessed(request.status));
        }

        if amount_received < request.amount {
            return Err(PayError::InsufficientAmount {
                required: request.amount,
                received: amount_received,
            });
        }

        let receipt_number = self.derive_receipt_number(request_id, now)?;
        let (payment, receipt) = self.build_payment(
            &request,
            officer,
            amount_received,
            payment_method,
            receipt_number,
            notes.into(),
            now,
        );

        // The store re-checks Pending at commit time; a concurrent redeemer
        // that lost the race surfaces here as AlreadyProcessed.
        self.store
            .commit_redemption(request_id, payment.clone(), receipt.clone())?;

        tracing::info!(
            request_id = %request_id,
            receipt_number = %payment.receipt_number,
            officer = %officer.id,
            amount = %payment.amount,
            change = %payment.change_given,
            "payment request redeemed"
        );
        Ok((payment, receipt))
    }

    /// Redeem from the raw scanned payload (`PAYMENT_REQUEST|<id>|<sig>`).
    pub fn redeem_scanned(
        &self,
        officer: &Officer,
        payload: &str,
        amount_received: Decimal,
        payment_method: PaymentMethod,
        notes: impl Into<String>,
        now: Timestamp,
    ) -> PayResult<(Payment, Receipt)> {
        let (request_id, signature) = parse_qr_payload(payload).map_err(|err| match err {
            CoreError::MalformedQrPayload(msg) => PayError::MalformedPayload(msg),
            other => PayError::MalformedPayload(other.to_string()),
        })?;
        self.redeem(
            officer,
            &request_id,
            &signature,
            amount_received,
            payment_method,
            notes,
            now,
        )
    }

    /// Record a walk-up payment taken without a QR request. The same
    /// duplicate and amount rules apply; the receipt number derives from a
    /// fresh request id so the format stays uniform.
    pub fn record_walk_up(
        &self,
        officer: &Officer,
        student: &StudentProfile,
        fee: &FeeType,
        amount_received: Decimal,
        payment_method: PaymentMethod,
        notes: impl Into<String>,
        now: Timestamp,
    ) -> PayResult<(Payment, Receipt)> {
        can_redeem(officer, &fee.organization, self.orgs)?;

        if self
            .store
            .pending_request_for(&student.id, &fee.id)?
            .is_some()
            || self
                .store
                .completed_payment_for(&student.id, &fee.id)?
                .is_some()
        {
            return Err(PayError::DuplicateFeeRequest);
        }
        if amount_received < fee.amount {
            return Err(PayError::InsufficientAmount {
                required: fee.amount,
                received: amount_received,
            });
        }

        let transaction_id = RequestId::generate();
        let receipt_number = self.derive_receipt_number(&transaction_id, now)?;
        let payment = Payment {
            id: PaymentId::new(format!("pay-{}", transaction_id.canonical())),
            request_id: None,
            student: student.id.clone(),
            organization: fee.organization.clone(),
            fee_type: fee.id.clone(),
            amount: fee.amount,
            amount_received,
            change_given: change_for(fee.amount, amount_received),
            receipt_number: receipt_number.clone(),
            payment_method,
            processed_by: Some(officer.id.clone()),
            is_void: false,
            void_reason: None,
            voided_by: None,
            voided_at: None,
            notes: notes.into(),
            created_at: now,
        };
        let receipt = self.build_receipt(&payment, now);
        self.store.insert_walk_up(payment.clone(), receipt.clone())?;

        tracing::info!(
            receipt_number = %payment.receipt_number,
            officer = %officer.id,
            student = %student.id,
            "walk-up payment recorded"
        );
        Ok((payment, receipt))
    }

    /// Void a completed payment. Requires the void capability (or
    /// super-officer status) within scope; an already-void payment is
    /// rejected with `NotVoidable`, never silently ignored.
    pub fn void_payment(
        &self,
        officer: &Officer,
        payment_id: &PaymentId,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> PayResult<Payment> {
        let payment = self
            .store
            .get_payment(payment_id)?
            .ok_or(PayError::PaymentNotFound)?;

        can_void(officer, &payment.organization, self.orgs)?;

        let reason = reason.into();
        let voided = self
            .store
            .mark_void(payment_id, officer.id.clone(), reason.clone(), now)?;

        tracing::info!(
            payment = %payment_id,
            receipt_number = %voided.receipt_number,
            officer = %officer.id,
            reason = %reason,
            "payment voided"
        );
        Ok(voided)
    }

    /// Official receipt number: `OR-` + the request id stripped of
    /// separators, upper-cased, truncated to twelve characters. On the
    /// (practically unreachable) collision, a unix-timestamp suffix is
    /// appended.
    fn derive_receipt_number(
        &self,
        request_id: &RequestId,
        now: Timestamp,
    ) -> PayResult<ReceiptNumber> {
        let compact = request_id.compact_upper();
        let base = format!("OR-{}", &compact[..RECEIPT_NUMBER_LEN]);
        let candidate = ReceiptNumber::new(base.clone());
        if self.store.receipt_number_exists(&candidate)? {
            return Ok(ReceiptNumber::new(format!(
                "{}-{}",
                base, now.seconds_since_epoch
            )));
        }
        Ok(candidate)
    }

    fn build_payment(
        &self,
        request: &PaymentRequest,
        officer: &Officer,
        amount_received: Decimal,
        payment_method: PaymentMethod,
        receipt_number: ReceiptNumber,
        notes: String,
        now: Timestamp,
    ) -> (Payment, Receipt) {
        let payment = Payment {
            id: PaymentId::new(format!("pay-{}", request.request_id.canonical())),
            request_id: Some(request.request_id),
            student: request.student.clone(),
            organization: request.organization.clone(),
            fee_type: request.fee_type.clone(),
            amount: request.amount,
            amount_received,
            change_given: change_for(request.amount, amount_received),
            receipt_number,
            payment_method,
            processed_by: Some(officer.id.clone()),
            is_void: false,
            void_reason: None,
            voided_by: None,
            voided_at: None,
            notes,
            created_at: now,
        };
        let receipt = self.build_receipt(&payment, now);
        (payment, receipt)
    }

    /// The receipt's own signature covers the official receipt number, not
    /// the request id.
    fn build_receipt(&self, payment: &Payment, now: Timestamp) -> Receipt {
        Receipt {
            payment: payment.id.clone(),
            receipt_number: payment.receipt_number.clone(),
            verification_signature: self.signatures.sign(payment.receipt_number.as_str()),
            email_sent: false,
            email_sent_at: None,
            created_at: now,
        }
    }
}
