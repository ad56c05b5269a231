use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::RequestStatus;

/// Error type for the payment lifecycle.
///
/// Every rejected transition names the invariant it violated: callers must
/// be able to tell "wrong organization" from "already paid" from "expired"
/// to show the right user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayError {
    /// The student already holds a pending request or a completed payment
    /// for this fee type.
    #[error("a pending or completed payment already exists for this fee")]
    DuplicateFeeRequest,

    #[error("QR signature failed verification")]
    InvalidSignature,

    /// The request was not pending at redemption time.
    #[error("request is already {0:?}")]
    AlreadyProcessed(RequestStatus),

    #[error("request has expired")]
    Expired,

    #[error("amount received {received} is below the fee amount {required}")]
    InsufficientAmount { required: Decimal, received: Decimal },

    /// Void attempted on an already-void payment.
    #[error("payment is not voidable")]
    NotVoidable,

    #[error("payment request not found")]
    RequestNotFound,

    #[error("payment not found")]
    PaymentNotFound,

    #[error("receipt not found")]
    ReceiptNotFound,

    /// Only the owning student may cancel a pending request.
    #[error("request belongs to a different student")]
    NotRequestOwner,

    #[error("malformed QR payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Auth(#[from] unipay_auth::AuthError),

    #[error(transparent)]
    Org(#[from] unipay_org::OrgError),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type PayResult<T> = Result<T, PayError>;
