//! Bulk posting engine: fan a declared fee out to every eligible student in
//! an organization's accessible scope.
//!
//! Eligibility is resolved through the organization hierarchy — an org's
//! accessible set and each member org's program affiliation — never by text
//! matching against department names. Per-student failures are isolated:
//! one student's failure never aborts the batch, and already-created
//! requests are never rolled back.

use rust_decimal::Decimal;

use unipay_auth::Officer;
use unipay_core::{OrgId, PaymentMethod, SignatureService, Timestamp};
use unipay_org::{AcademicCalendar, FeeCatalog, OrgDirectory, StudentProfile, YearLevels};

use crate::error::{PayError, PayResult};
use crate::request::create_request;
use crate::store::PaymentStore;

#[derive(Debug, Clone)]
pub struct BulkFeeSpec {
    pub name: String,
    pub amount: Decimal,
    pub year_levels: YearLevels,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub fee_type: unipay_core::FeeTypeId,
    /// Whether the fee type was newly declared (false: an existing
    /// declaration had its amount updated).
    pub fee_created: bool,
    pub created: u32,
    pub failed: u32,
    /// Students excluded up front: already paid, already pending, wrong
    /// year level, or outside the organization's scope.
    pub skipped: u32,
}

/// Declare (or re-declare) a fee for `organization` and create one pending
/// request per eligible student in `roster`.
#[allow(clippy::too_many_arguments)]
pub fn post_bulk(
    store: &dyn PaymentStore,
    signatures: &SignatureService,
    orgs: &OrgDirectory,
    catalog: &mut FeeCatalog,
    calendar: &AcademicCalendar,
    roster: &[StudentProfile],
    officer: &Officer,
    organization: &OrgId,
    spec: BulkFeeSpec,
    ttl_seconds: Option<u64>,
    now: Timestamp,
) -> PayResult<BulkOutcome> {
    if !officer.is_active {
        return Err(unipay_auth::AuthError::InactiveOfficer.into());
    }
    if !orgs.in_scope(&officer.organization, organization)
        .map_err(unipay_auth::AuthError::from)?
    {
        return Err(unipay_auth::AuthError::WrongOrganization(organization.clone()).into());
    }

    let term = calendar.current_term().map_err(PayError::Org)?.clone();

    // Idempotent declaration: reposting the same (org, name, term) updates
    // the amount instead of duplicating the fee.
    let (fee_id, fee_created) = catalog.declare(
        organization.clone(),
        spec.name.clone(),
        term.clone(),
        spec.amount,
        spec.year_levels.clone(),
    );
    let fee = catalog.get(&fee_id)?.clone();

    let scope = orgs.accessible_organizations(organization)?;

    let mut created = 0u32;
    let mut failed = 0u32;
    let mut skipped = 0u32;

    for student in roster {
        if !student.is_active || student.term != term {
            skipped += 1;
            continue;
        }
        // Scope membership: some organization in the accessible set must
        // carry an affiliation covering the student's program.
        let in_scope = match student.program {
            Some(program) => scope.iter().any(|org_id| {
                orgs.get(org_id)
                    .map(|org| org.program_affiliation.covers(program))
                    .unwrap_or(false)
            }),
            None => false,
        };
        if !in_scope {
            skipped += 1;
            continue;
        }
        if !fee.applicable_year_levels.applies_to(student.year_level) {
            skipped += 1;
            continue;
        }

        match create_request(
            store,
            signatures,
            student,
            &fee,
            PaymentMethod::Cash,
            ttl_seconds,
            now,
        ) {
            Ok(_) => created += 1,
            Err(PayError::DuplicateFeeRequest) => skipped += 1,
            Err(err) => {
                tracing::warn!(
                    student = %student.id,
                    fee_type = %fee.id,
                    error = %err,
                    "bulk posting failed for one student"
                );
                failed += 1;
            }
        }
    }

    tracing::info!(
        organization = %organization,
        fee_type = %fee.id,
        created,
        failed,
        skipped,
        "bulk fee posted"
    );
    Ok(BulkOutcome {
        fee_type: fee_id,
        fee_created,
        created,
        failed,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, PaymentStore};
    use chrono::NaiveDate;
    use unipay_auth::Capabilities;
    use unipay_core::{
        AcademicTerm, AccountId, OfficerId, Semester, SigningSecret, StudentId,
    };
    use unipay_org::{
        Affiliation, FeeTier, HierarchyLevel, Organization, Program,
    };

    fn term() -> AcademicTerm {
        AcademicTerm::new("2024-2025", Semester::First)
    }

    fn signatures() -> SignatureService {
        SignatureService::new(&SigningSecret::from_bytes(vec![0x42; 32]).unwrap()).unwrap()
    }

    fn orgs() -> OrgDirectory {
        let mut dir = OrgDirectory::new();
        dir.insert(Organization {
            id: OrgId::new("ALLORG"),
            code: "ALLORG".into(),
            name: "All Organizations".into(),
            fee_tier: FeeTier::CollegeWide,
            program_affiliation: Affiliation::All,
            hierarchy_level: HierarchyLevel::College,
            parent: None,
            booth_location: "Main Office".into(),
            contact_email: "allorg@unipay.local".into(),
            is_active: true,
        })
        .unwrap();
        for (id, program) in [
            ("COMSCI", Program::ComputerScience),
            ("IT", Program::InformationTechnology),
        ] {
            dir.insert(Organization {
                id: OrgId::new(id),
                code: id.into(),
                name: id.into(),
                fee_tier: FeeTier::ProgramSpecific,
                program_affiliation: Affiliation::Program(program),
                hierarchy_level: HierarchyLevel::Program,
                parent: Some(OrgId::new("ALLORG")),
                booth_location: format!("{id} Office"),
                contact_email: format!("{}@unipay.local", id.to_lowercase()),
                is_active: true,
            })
            .unwrap();
        }
        dir
    }

    fn calendar() -> AcademicCalendar {
        let mut cal = AcademicCalendar::new();
        cal.add_period(
            term(),
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
        )
        .unwrap();
        cal.set_current(&term()).unwrap();
        cal
    }

    fn student(n: u32, program: Program) -> StudentProfile {
        StudentProfile {
            id: StudentId::new(format!("stu-{n}")),
            account: AccountId::new(format!("acct-{n}")),
            student_number: format!("2021-{n:05}"),
            program: Some(program),
            year_level: 2,
            term: term(),
            email: format!("stu-{n}@unipay.local"),
            is_active: true,
        }
    }

    fn roster() -> Vec<StudentProfile> {
        let mut students = Vec::new();
        for n in 0..5 {
            students.push(student(n, Program::ComputerScience));
        }
        for n in 5..8 {
            students.push(student(n, Program::InformationTechnology));
        }
        students
    }

    fn college_officer() -> Officer {
        Officer {
            id: OfficerId::new("off-allorg"),
            account: AccountId::new("acct-allorg"),
            organization: OrgId::new("ALLORG"),
            role_title: "College Administrator".into(),
            capabilities: Capabilities::cashier(),
            email: "allorg@unipay.local".into(),
            is_active: true,
        }
    }

    fn spec() -> BulkFeeSpec {
        BulkFeeSpec {
            name: "Library Fee".into(),
            amount: Decimal::new(30_000, 2),
            year_levels: YearLevels::All,
        }
    }

    #[test]
    fn test_bulk_post_to_college_reaches_all_children() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = calendar();

        let outcome = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster(),
            &college_officer(),
            &OrgId::new("ALLORG"),
            spec(),
            Some(86_400 * 30),
            Timestamp::from_seconds(1_000),
        )
        .unwrap();

        assert!(outcome.fee_created);
        assert_eq!(outcome.created, 8);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.skipped, 0);

        // Every created request snapshots the declared amount.
        for student in roster() {
            let pending = store
                .pending_request_for(&student.id, &outcome.fee_type)
                .unwrap()
                .expect("request should exist");
            assert_eq!(pending.amount, Decimal::new(30_000, 2));
            assert_eq!(pending.expires_at, Some(Timestamp::from_seconds(1_000 + 86_400 * 30)));
        }
    }

    #[test]
    fn test_repost_updates_amount_and_skips_existing() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = calendar();

        let first = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster(),
            &college_officer(),
            &OrgId::new("ALLORG"),
            spec(),
            None,
            Timestamp::from_seconds(1_000),
        )
        .unwrap();
        assert_eq!(first.created, 8);

        let mut updated = spec();
        updated.amount = Decimal::new(35_000, 2);
        let second = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster(),
            &college_officer(),
            &OrgId::new("ALLORG"),
            updated,
            None,
            Timestamp::from_seconds(2_000),
        )
        .unwrap();

        assert!(!second.fee_created);
        assert_eq!(second.fee_type, first.fee_type);
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 8);
        assert_eq!(catalog.get(&first.fee_type).unwrap().amount, Decimal::new(35_000, 2));
    }

    #[test]
    fn test_program_scope_excludes_other_programs() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = calendar();

        let mut officer = college_officer();
        officer.organization = OrgId::new("COMSCI");

        let outcome = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster(),
            &officer,
            &OrgId::new("COMSCI"),
            spec(),
            None,
            Timestamp::from_seconds(1_000),
        )
        .unwrap();

        // Only the five CS students are in a COMSCI-scoped posting.
        assert_eq!(outcome.created, 5);
        assert_eq!(outcome.skipped, 3);
    }

    #[test]
    fn test_officer_out_of_scope_rejected() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = calendar();

        let mut officer = college_officer();
        officer.organization = OrgId::new("COMSCI");

        let result = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster(),
            &officer,
            &OrgId::new("IT"),
            spec(),
            None,
            Timestamp::from_seconds(1_000),
        );
        assert!(matches!(
            result,
            Err(PayError::Auth(unipay_auth::AuthError::WrongOrganization(_)))
        ));
    }

    #[test]
    fn test_year_level_filter_skips() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = calendar();

        let mut seniors_only = spec();
        seniors_only.year_levels = YearLevels::only([4]);

        let outcome = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster(), // all year 2
            &college_officer(),
            &OrgId::new("ALLORG"),
            seniors_only,
            None,
            Timestamp::from_seconds(1_000),
        )
        .unwrap();
        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.skipped, 8);
    }

    #[test]
    fn test_inactive_and_off_term_students_skipped() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = calendar();

        let mut roster = roster();
        roster[0].is_active = false;
        roster[1].term = AcademicTerm::new("2023-2024", Semester::First);

        let outcome = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster,
            &college_officer(),
            &OrgId::new("ALLORG"),
            spec(),
            None,
            Timestamp::from_seconds(1_000),
        )
        .unwrap();
        assert_eq!(outcome.created, 6);
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_student_without_program_skipped() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = calendar();

        let mut roster = roster();
        roster[0].program = None;

        let outcome = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster,
            &college_officer(),
            &OrgId::new("ALLORG"),
            spec(),
            None,
            Timestamp::from_seconds(1_000),
        )
        .unwrap();
        assert_eq!(outcome.created, 7);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_no_current_period_fails() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = AcademicCalendar::new();

        let result = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster(),
            &college_officer(),
            &OrgId::new("ALLORG"),
            spec(),
            None,
            Timestamp::from_seconds(1_000),
        );
        assert_eq!(
            result,
            Err(PayError::Org(unipay_org::OrgError::NoCurrentPeriod))
        );
    }

    #[test]
    fn test_partial_failure_does_not_roll_back() {
        let store = InMemoryStore::new();
        let svc = signatures();
        let dir = orgs();
        let mut catalog = FeeCatalog::new();
        let cal = calendar();

        // Pre-create a pending request for one student by posting once with a
        // smaller roster, then post the full roster.
        let partial: Vec<StudentProfile> = roster().into_iter().take(1).collect();
        post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &partial,
            &college_officer(),
            &OrgId::new("ALLORG"),
            spec(),
            None,
            Timestamp::from_seconds(1_000),
        )
        .unwrap();

        let outcome = post_bulk(
            &store,
            &svc,
            &dir,
            &mut catalog,
            &cal,
            &roster(),
            &college_officer(),
            &OrgId::new("ALLORG"),
            spec(),
            None,
            Timestamp::from_seconds(2_000),
        )
        .unwrap();

        // The pre-existing request is skipped, the other seven are created,
        // and nothing already created is rolled back.
        assert_eq!(outcome.created, 7);
        assert_eq!(outcome.skipped, 1);
        for student in roster() {
            assert!(store
                .pending_request_for(&student.id, &outcome.fee_type)
                .unwrap()
                .is_some());
        }
    }
}
