//! Two-tier applicable-fee resolution for students.
//!
//! Tier 1: fees of program-specific organizations whose affiliation matches
//! the student's program. Tier 2: fees of college-wide organizations,
//! mandatory for everyone. Both are restricted to the current academic period
//! and the student's year level, then reduced by fees the student has already
//! paid or already has a pending request for.
//!
//! A student with no program, or a calendar with no current period, resolves
//! to the empty set. Eligibility fails closed.

use std::collections::HashSet;

use unipay_core::FeeTypeId;

use crate::catalog::FeeCatalog;
use crate::hierarchy::OrgDirectory;
use crate::period::AcademicCalendar;
use crate::types::{FeeTier, FeeType, StudentProfile};

fn fee_matches_student(
    fee: &FeeType,
    student: &StudentProfile,
    directory: &OrgDirectory,
    tier: FeeTier,
) -> bool {
    let org = match directory.get(&fee.organization) {
        Ok(org) => org,
        Err(_) => return false,
    };
    if !org.is_active || org.fee_tier != tier {
        return false;
    }
    if tier == FeeTier::ProgramSpecific {
        let program = match student.program {
            Some(p) => p,
            None => return false,
        };
        if !org.program_affiliation.covers(program) {
            return false;
        }
    }
    fee.applicable_year_levels.applies_to(student.year_level)
}

fn tier_fees<'a>(
    student: &'a StudentProfile,
    directory: &'a OrgDirectory,
    catalog: &'a FeeCatalog,
    calendar: &'a AcademicCalendar,
    tier: FeeTier,
) -> Vec<&'a FeeType> {
    let current = match calendar.current() {
        Some(period) => &period.term,
        None => return Vec::new(),
    };
    catalog
        .active_in_term(current)
        .filter(|fee| fee_matches_student(fee, student, directory, tier))
        .collect()
}

/// Tier-1 (program affiliation) fees applicable to the student.
pub fn tier1_fees<'a>(
    student: &'a StudentProfile,
    directory: &'a OrgDirectory,
    catalog: &'a FeeCatalog,
    calendar: &'a AcademicCalendar,
) -> Vec<&'a FeeType> {
    if student.program.is_none() {
        return Vec::new();
    }
    tier_fees(student, directory, catalog, calendar, FeeTier::ProgramSpecific)
}

/// Tier-2 (college-wide mandatory) fees applicable to the student.
pub fn tier2_fees<'a>(
    student: &'a StudentProfile,
    directory: &'a OrgDirectory,
    catalog: &'a FeeCatalog,
    calendar: &'a AcademicCalendar,
) -> Vec<&'a FeeType> {
    tier_fees(student, directory, catalog, calendar, FeeTier::CollegeWide)
}

/// Every fee the student currently owes: tier-1 union tier-2, minus fee types
/// already covered by a completed non-void payment (`paid`) or an outstanding
/// pending request (`pending`).
pub fn applicable_fees<'a>(
    student: &'a StudentProfile,
    directory: &'a OrgDirectory,
    catalog: &'a FeeCatalog,
    calendar: &'a AcademicCalendar,
    paid: &HashSet<FeeTypeId>,
    pending: &HashSet<FeeTypeId>,
) -> Vec<&'a FeeType> {
    // No course on record: nothing is owed, not everything.
    if student.program.is_none() {
        return Vec::new();
    }
    let mut fees = tier1_fees(student, directory, catalog, calendar);
    fees.extend(tier2_fees(student, directory, catalog, calendar));
    fees.retain(|fee| !paid.contains(&fee.id) && !pending.contains(&fee.id));
    fees.sort_by(|a, b| a.id.cmp(&b.id));
    fees.dedup_by(|a, b| a.id == b.id);
    fees
}
