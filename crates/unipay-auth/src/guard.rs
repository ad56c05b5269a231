//! Redemption authorization guard.
//!
//! Scope questions answered here, in one place: may this officer process a
//! payment for that organization, void one, or pull reports. Every refusal
//! names the violated invariant — callers must be able to tell "wrong
//! organization" apart from "already redeemed" and "not found".

use unipay_core::OrgId;
use unipay_org::OrgDirectory;

use crate::error::{AuthError, AuthResult};
use crate::types::{Capability, Officer};

fn check_active(officer: &Officer) -> AuthResult<()> {
    if !officer.is_active {
        return Err(AuthError::InactiveOfficer);
    }
    Ok(())
}

fn check_scope(officer: &Officer, target_org: &OrgId, orgs: &OrgDirectory) -> AuthResult<()> {
    if !orgs.in_scope(&officer.organization, target_org)? {
        return Err(AuthError::WrongOrganization(target_org.clone()));
    }
    Ok(())
}

/// May `officer` redeem a payment request owned by `request_org`?
pub fn can_redeem(officer: &Officer, request_org: &OrgId, orgs: &OrgDirectory) -> AuthResult<()> {
    check_active(officer)?;
    if !officer.capabilities.grants(Capability::ProcessPayments)
        && !officer.capabilities.grants(Capability::SuperOfficer)
    {
        return Err(AuthError::MissingCapability(Capability::ProcessPayments));
    }
    check_scope(officer, request_org, orgs)
}

/// May `officer` void a payment collected by `payment_org`?
/// Requires the void capability or super-officer status, plus scope.
pub fn can_void(officer: &Officer, payment_org: &OrgId, orgs: &OrgDirectory) -> AuthResult<()> {
    check_active(officer)?;
    if !officer.capabilities.grants(Capability::VoidPayments)
        && !officer.capabilities.grants(Capability::SuperOfficer)
    {
        return Err(AuthError::MissingCapability(Capability::VoidPayments));
    }
    check_scope(officer, payment_org, orgs)
}

/// May `officer` generate collection reports for `target_org`?
pub fn can_generate_reports(
    officer: &Officer,
    target_org: &OrgId,
    orgs: &OrgDirectory,
) -> AuthResult<()> {
    check_active(officer)?;
    if !officer.capabilities.grants(Capability::GenerateReports)
        && !officer.capabilities.grants(Capability::SuperOfficer)
    {
        return Err(AuthError::MissingCapability(Capability::GenerateReports));
    }
    check_scope(officer, target_org, orgs)
}
