use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use unipay_core::{
    FeeTypeId, OfficerId, OrgId, PaymentId, PaymentMethod, ReceiptNumber, RequestId, StudentId,
    Timestamp,
};

// ---------------------------------------------------------------------------
// RequestStatus — four-state lifecycle, three absorbing terminals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Paid,
    Cancelled,
    Expired,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "PENDING"),
            RequestStatus::Paid => write!(f, "PAID"),
            RequestStatus::Cancelled => write!(f, "CANCELLED"),
            RequestStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

// ---------------------------------------------------------------------------
// PaymentRequest — the central lifecycle entity
// ---------------------------------------------------------------------------

/// A student's signed claim to pay one fee, presented as a QR code at the
/// organization's booth.
///
/// `amount` is snapshotted from the fee type at creation and never tracks
/// later fee edits. `expires_at: None` means the request never expires;
/// expiry is expressed through this timestamp alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub request_id: RequestId,
    pub student: StudentId,
    pub organization: OrgId,
    pub fee_type: FeeTypeId,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: RequestStatus,
    pub qr_signature: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub paid_at: Option<Timestamp>,
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Payment — the immutable record of money received
// ---------------------------------------------------------------------------

/// A completed payment. `request_id` is `None` for walk-up payments taken
/// without a QR request. Core facts are immutable; the void sub-state moves
/// one way only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub request_id: Option<RequestId>,
    pub student: StudentId,
    pub organization: OrgId,
    pub fee_type: FeeTypeId,
    pub amount: Decimal,
    pub amount_received: Decimal,
    pub change_given: Decimal,
    pub receipt_number: ReceiptNumber,
    pub payment_method: PaymentMethod,
    pub processed_by: Option<OfficerId>,
    pub is_void: bool,
    pub void_reason: Option<String>,
    pub voided_by: Option<OfficerId>,
    pub voided_at: Option<Timestamp>,
    pub notes: String,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// One-to-one with a payment. Carries its own verification signature, signed
/// over the official receipt number (not the request id), plus delivery
/// status for the external notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub payment: PaymentId,
    pub receipt_number: ReceiptNumber,
    pub verification_signature: String,
    pub email_sent: bool,
    pub email_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
