//! Payment request creation and student-side lifecycle.

use rust_decimal::Decimal;
use unipay_core::{PaymentMethod, RequestId, SignatureService, StudentId, Timestamp};
use unipay_org::{FeeType, StudentProfile};

use crate::error::{PayError, PayResult};
use crate::status::{is_expired, transition};
use crate::store::PaymentStore;
use crate::types::{PaymentRequest, RequestStatus};

/// Create a pending payment request for one fee.
///
/// Rejects `DuplicateFeeRequest` when the student already holds a pending
/// request or a completed non-void payment for the fee type. The amount is
/// snapshotted from the fee at this moment; later edits to the fee never
/// change what an outstanding request charges. The QR signature covers the
/// request id's canonical string and nothing else.
pub fn create_request(
    store: &dyn PaymentStore,
    signatures: &SignatureService,
    student: &StudentProfile,
    fee: &FeeType,
    payment_method: PaymentMethod,
    ttl_seconds: Option<u64>,
    now: Timestamp,
) -> PayResult<PaymentRequest> {
    if store.pending_request_for(&student.id, &fee.id)?.is_some()
        || store.completed_payment_for(&student.id, &fee.id)?.is_some()
    {
        return Err(PayError::DuplicateFeeRequest);
    }

    let request_id = RequestId::generate();
    let request = PaymentRequest {
        request_id,
        student: student.id.clone(),
        organization: fee.organization.clone(),
        fee_type: fee.id.clone(),
        amount: fee.amount,
        payment_method,
        status: RequestStatus::Pending,
        qr_signature: signatures.sign(&request_id.canonical()),
        created_at: now,
        expires_at: ttl_seconds
            .map(|ttl| Timestamp::from_seconds(now.seconds_since_epoch + ttl)),
        paid_at: None,
        notes: String::new(),
    };
    store.insert_request(request.clone())?;

    tracing::info!(
        request_id = %request_id,
        student = %student.id,
        fee_type = %fee.id,
        amount = %fee.amount,
        "payment request created"
    );
    Ok(request)
}

/// Cancel a pending request. Only the owning student may cancel, and only
/// while the request is still pending.
pub fn cancel_request(
    store: &dyn PaymentStore,
    student: &StudentId,
    request_id: &RequestId,
) -> PayResult<()> {
    let request = store
        .get_request(request_id)?
        .ok_or(PayError::RequestNotFound)?;
    if &request.student != student {
        return Err(PayError::NotRequestOwner);
    }
    transition(request.status, RequestStatus::Cancelled)?;

    let swapped =
        store.compare_and_swap_status(request_id, RequestStatus::Pending, RequestStatus::Cancelled)?;
    if !swapped {
        // Status changed between the read and the flip.
        let current = store
            .get_request(request_id)?
            .ok_or(PayError::RequestNotFound)?;
        return Err(PayError::AlreadyProcessed(current.status));
    }

    tracing::info!(request_id = %request_id, student = %student, "payment request cancelled");
    Ok(())
}

/// Lazily flip a request to Expired if its deadline has passed. Expiry is
/// evaluated on read — there is no background scheduler. Returns whether the
/// request is expired after the call.
pub fn expire_if_due(
    store: &dyn PaymentStore,
    request_id: &RequestId,
    now: Timestamp,
) -> PayResult<bool> {
    let request = store
        .get_request(request_id)?
        .ok_or(PayError::RequestNotFound)?;
    if request.status == RequestStatus::Expired {
        return Ok(true);
    }
    if is_expired(&request, now) {
        // Losing this CAS means someone redeemed or cancelled first; either
        // way the request is no longer expirable.
        let swapped = store.compare_and_swap_status(
            request_id,
            RequestStatus::Pending,
            RequestStatus::Expired,
        )?;
        return Ok(swapped);
    }
    Ok(false)
}

/// The change a redemption of `amount` with `amount_received` hands back.
pub(crate) fn change_for(amount: Decimal, amount_received: Decimal) -> Decimal {
    amount_received - amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use unipay_core::{
        AcademicTerm, AccountId, FeeTypeId, OrgId, Semester, SigningSecret,
    };
    use unipay_org::{Program, YearLevels};

    fn signatures() -> SignatureService {
        SignatureService::new(&SigningSecret::from_bytes(vec![0x42; 32]).unwrap()).unwrap()
    }

    fn student() -> StudentProfile {
        StudentProfile {
            id: StudentId::new("stu-1"),
            account: AccountId::new("acct-1"),
            student_number: "2021-12345".into(),
            program: Some(Program::ComputerScience),
            year_level: 2,
            term: AcademicTerm::new("2024-2025", Semester::First),
            email: "stu-1@unipay.local".into(),
            is_active: true,
        }
    }

    fn fee() -> FeeType {
        FeeType {
            id: FeeTypeId::new("fee-000001"),
            organization: OrgId::new("COMSCI"),
            name: "Publication Fee".into(),
            amount: Decimal::new(15_000, 2),
            term: AcademicTerm::new("2024-2025", Semester::First),
            applicable_year_levels: YearLevels::All,
            deadline: None,
            is_active: true,
        }
    }

    #[test]
    fn test_create_request_snapshots_amount_and_signs() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let request = create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            Some(900),
            Timestamp::from_seconds(1_000),
        )
        .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.amount, Decimal::new(15_000, 2));
        assert_eq!(request.expires_at, Some(Timestamp::from_seconds(1_900)));
        // Signature covers the canonical request id alone.
        assert!(svc.verify(&request.request_id.canonical(), &request.qr_signature));
    }

    #[test]
    fn test_second_request_for_same_fee_rejected() {
        let store = InMemoryStore::new();
        let svc = signatures();
        create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            Some(900),
            Timestamp::from_seconds(1_000),
        )
        .unwrap();

        let result = create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            Some(900),
            Timestamp::from_seconds(1_010),
        );
        assert_eq!(result, Err(PayError::DuplicateFeeRequest));
    }

    #[test]
    fn test_request_after_cancel_allowed() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let request = create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            Some(900),
            Timestamp::from_seconds(1_000),
        )
        .unwrap();
        cancel_request(&store, &StudentId::new("stu-1"), &request.request_id).unwrap();

        assert!(create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            Some(900),
            Timestamp::from_seconds(1_100),
        )
        .is_ok());
    }

    #[test]
    fn test_amount_snapshot_ignores_later_fee_edit() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let mut fee = fee();
        let request = create_request(
            &store,
            &svc,
            &student(),
            &fee,
            PaymentMethod::Cash,
            None,
            Timestamp::from_seconds(1_000),
        )
        .unwrap();

        fee.amount = Decimal::new(99_900, 2);
        let stored = store.get_request(&request.request_id).unwrap().unwrap();
        assert_eq!(stored.amount, Decimal::new(15_000, 2));
    }

    #[test]
    fn test_no_ttl_means_no_expiry() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let request = create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            None,
            Timestamp::from_seconds(1_000),
        )
        .unwrap();
        assert_eq!(request.expires_at, None);
        assert!(!expire_if_due(
            &store,
            &request.request_id,
            Timestamp::from_seconds(u64::MAX / 2)
        )
        .unwrap());
    }

    #[test]
    fn test_cancel_requires_ownership() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let request = create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            Some(900),
            Timestamp::from_seconds(1_000),
        )
        .unwrap();

        let result = cancel_request(&store, &StudentId::new("stu-2"), &request.request_id);
        assert_eq!(result, Err(PayError::NotRequestOwner));
    }

    #[test]
    fn test_cancel_unknown_request() {
        let store = InMemoryStore::new();
        let result = cancel_request(&store, &StudentId::new("stu-1"), &RequestId::generate());
        assert_eq!(result, Err(PayError::RequestNotFound));
    }

    #[test]
    fn test_cancel_twice_reports_already_processed() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let request = create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            Some(900),
            Timestamp::from_seconds(1_000),
        )
        .unwrap();
        cancel_request(&store, &StudentId::new("stu-1"), &request.request_id).unwrap();

        let result = cancel_request(&store, &StudentId::new("stu-1"), &request.request_id);
        assert_eq!(
            result,
            Err(PayError::AlreadyProcessed(RequestStatus::Cancelled))
        );
    }

    #[test]
    fn test_expire_if_due_flips_status() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let request = create_request(
            &store,
            &svc,
            &student(),
            &fee(),
            PaymentMethod::Cash,
            Some(900),
            Timestamp::from_seconds(1_000),
        )
        .unwrap();

        assert!(!expire_if_due(&store, &request.request_id, Timestamp::from_seconds(1_500)).unwrap());
        assert!(expire_if_due(&store, &request.request_id, Timestamp::from_seconds(2_000)).unwrap());

        let stored = store.get_request(&request.request_id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Expired);

        // Idempotent on an already-expired request.
        assert!(expire_if_due(&store, &request.request_id, Timestamp::from_seconds(2_100)).unwrap());
    }

    #[test]
    fn test_change_for_is_decimal_exact() {
        let change = change_for(Decimal::new(15_000, 2), Decimal::new(20_000, 2));
        assert_eq!(change, Decimal::new(5_000, 2));
    }
}
