//! Payment-request status machine.
//!
//! States: Pending, Paid, Cancelled, Expired.
//! Valid transitions:
//!   Pending -> Paid        (redemption only)
//!   Pending -> Cancelled   (owning student, administrative)
//!   Pending -> Expired     (lazy, on read past expires_at)
//! Terminal states have no outbound transitions.

use unipay_core::Timestamp;

use crate::error::{PayError, PayResult};
use crate::types::{PaymentRequest, RequestStatus};

/// Check whether a status transition is valid.
pub fn is_valid_transition(from: RequestStatus, to: RequestStatus) -> bool {
    matches!(
        (from, to),
        (RequestStatus::Pending, RequestStatus::Paid)
            | (RequestStatus::Pending, RequestStatus::Cancelled)
            | (RequestStatus::Pending, RequestStatus::Expired)
    )
}

/// Attempt a status transition, returning the new status or the invariant
/// that blocks it.
pub fn transition(from: RequestStatus, to: RequestStatus) -> PayResult<RequestStatus> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(PayError::AlreadyProcessed(from))
    }
}

/// Pure expiry predicate: true iff the request is still pending and its
/// expiry timestamp has passed. Callers observing true are expected to flip
/// the status to Expired as a side effect; the predicate itself never does.
pub fn is_expired(request: &PaymentRequest, now: Timestamp) -> bool {
    request.status == RequestStatus::Pending
        && matches!(request.expires_at, Some(expires_at) if now > expires_at)
}
