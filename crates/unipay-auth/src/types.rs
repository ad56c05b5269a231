use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use unipay_core::{AccountId, OfficerId, OrgId, StudentId};
use unipay_org::StudentProfile;

use crate::error::{AuthError, AuthResult};

// ---------------------------------------------------------------------------
// Capabilities — independent boolean grants carried by an officer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    ProcessPayments,
    VoidPayments,
    GenerateReports,
    PromoteOfficers,
    SuperOfficer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_process_payments: bool,
    pub can_void_payments: bool,
    pub can_generate_reports: bool,
    pub can_promote_officers: bool,
    pub is_super_officer: bool,
}

impl Capabilities {
    /// Default grant for a freshly promoted booth officer.
    pub fn cashier() -> Self {
        Self {
            can_process_payments: true,
            ..Self::default()
        }
    }

    pub fn super_officer() -> Self {
        Self {
            can_process_payments: true,
            can_void_payments: true,
            can_generate_reports: true,
            can_promote_officers: true,
            is_super_officer: true,
        }
    }

    pub fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::ProcessPayments => self.can_process_payments,
            Capability::VoidPayments => self.can_void_payments,
            Capability::GenerateReports => self.can_generate_reports,
            Capability::PromoteOfficers => self.can_promote_officers,
            Capability::SuperOfficer => self.is_super_officer,
        }
    }
}

// ---------------------------------------------------------------------------
// Officer
// ---------------------------------------------------------------------------

/// Officer identity for one account, bound to exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    pub id: OfficerId,
    pub account: AccountId,
    pub organization: OrgId,
    pub role_title: String,
    pub capabilities: Capabilities,
    pub email: String,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// AccountRole — the explicit role union
// ---------------------------------------------------------------------------

/// What an account is allowed to act as, resolved once per request context.
///
/// Officer status does not destroy student status: the dual case is a named
/// variant, not an emergent property of probing two profile tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccountRole {
    Student(StudentId),
    Officer(Officer),
    StudentOfficer { student: StudentId, officer: Officer },
}

impl AccountRole {
    pub fn officer(&self) -> Option<&Officer> {
        match self {
            AccountRole::Officer(officer) => Some(officer),
            AccountRole::StudentOfficer { officer, .. } => Some(officer),
            AccountRole::Student(_) => None,
        }
    }

    pub fn student(&self) -> Option<&StudentId> {
        match self {
            AccountRole::Student(student) => Some(student),
            AccountRole::StudentOfficer { student, .. } => Some(student),
            AccountRole::Officer(_) => None,
        }
    }

    pub fn is_officer(&self) -> bool {
        self.officer().is_some()
    }
}

// ---------------------------------------------------------------------------
// AccountDirectory — arena of account records
// ---------------------------------------------------------------------------

/// One account's identities. `is_officer` is denormalized from the presence
/// of the officer record; the promotion authority keeps it synchronized on
/// every promotion and demotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub student: Option<StudentProfile>,
    pub officer: Option<Officer>,
    pub is_officer: bool,
}

#[derive(Debug, Default)]
pub struct AccountDirectory {
    accounts: HashMap<AccountId, AccountRecord>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_student(&mut self, profile: StudentProfile) {
        let account = profile.account.clone();
        let record = self
            .accounts
            .entry(account.clone())
            .or_insert_with(|| AccountRecord {
                id: account,
                student: None,
                officer: None,
                is_officer: false,
            });
        record.student = Some(profile);
    }

    pub fn get(&self, id: &AccountId) -> AuthResult<&AccountRecord> {
        self.accounts
            .get(id)
            .ok_or_else(|| AuthError::UnknownAccount(id.clone()))
    }

    pub(crate) fn get_mut(&mut self, id: &AccountId) -> AuthResult<&mut AccountRecord> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| AuthError::UnknownAccount(id.clone()))
    }

    /// Resolve the account's role from current state. Always a fresh read:
    /// a session that just promoted or demoted itself sees the new role on
    /// its next resolve, never a cached one.
    pub fn resolve_role(&self, id: &AccountId) -> AuthResult<AccountRole> {
        let record = self.get(id)?;
        match (&record.student, &record.officer) {
            (Some(student), Some(officer)) => Ok(AccountRole::StudentOfficer {
                student: student.id.clone(),
                officer: officer.clone(),
            }),
            (None, Some(officer)) => Ok(AccountRole::Officer(officer.clone())),
            (Some(student), None) => Ok(AccountRole::Student(student.id.clone())),
            (None, None) => Err(AuthError::UnknownAccount(id.clone())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountRecord> {
        self.accounts.values()
    }
}
