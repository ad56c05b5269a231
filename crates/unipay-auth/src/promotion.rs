//! Promotion/demotion authority.
//!
//! Moves an account between the student and officer capability sets, scoped
//! by the organization hierarchy. The privilege-ceiling rule lives in exactly
//! one place, [`PromotionAuthority::can_grant`]: an actor can never hand out
//! a promotion-bearing capability they do not hold themselves.
//!
//! Demotion deletes the officer identity entirely rather than flag-flipping,
//! so the account is immediately eligible for re-promotion. The denormalized
//! `is_officer` flag is synchronized on every transition.

use unipay_core::{AccountId, OfficerId, OrgId};
use unipay_org::OrgDirectory;

use crate::error::{AuthError, AuthResult};
use crate::types::{AccountDirectory, Capabilities, Capability, Officer};

pub struct PromotionAuthority<'a> {
    orgs: &'a OrgDirectory,
}

impl<'a> PromotionAuthority<'a> {
    pub fn new(orgs: &'a OrgDirectory) -> Self {
        Self { orgs }
    }

    /// The one privilege-ceiling policy point. Promotion-bearing capabilities
    /// (`PromoteOfficers`, `SuperOfficer`) require the actor to already hold
    /// that same capability; a super-officer's ceiling covers everything.
    pub fn can_grant(actor: &Capabilities, capability: Capability) -> bool {
        if actor.is_super_officer {
            return true;
        }
        match capability {
            Capability::PromoteOfficers => actor.can_promote_officers,
            Capability::SuperOfficer => actor.is_super_officer,
            Capability::ProcessPayments
            | Capability::VoidPayments
            | Capability::GenerateReports => true,
        }
    }

    fn check_actor_may_promote(&self, actor: &Officer, organization: &OrgId) -> AuthResult<()> {
        if !actor.is_active {
            return Err(AuthError::InactiveOfficer);
        }
        if !actor.capabilities.grants(Capability::PromoteOfficers)
            && !actor.capabilities.grants(Capability::SuperOfficer)
        {
            return Err(AuthError::MissingCapability(Capability::PromoteOfficers));
        }
        if !self.orgs.in_scope(&actor.organization, organization)? {
            return Err(AuthError::WrongOrganization(organization.clone()));
        }
        Ok(())
    }

    fn check_ceiling(actor: &Capabilities, granted: &Capabilities) -> AuthResult<()> {
        for capability in [
            Capability::ProcessPayments,
            Capability::VoidPayments,
            Capability::GenerateReports,
            Capability::PromoteOfficers,
            Capability::SuperOfficer,
        ] {
            if granted.grants(capability) && !Self::can_grant(actor, capability) {
                return Err(AuthError::PrivilegeCeiling(capability));
            }
        }
        Ok(())
    }

    /// Promote `target` into `organization` with the given capability set.
    ///
    /// The new officer record is created, the account's `is_officer` flag is
    /// synchronized, and the freshly resolved officer identity is returned.
    pub fn promote(
        &self,
        accounts: &mut AccountDirectory,
        actor: &Officer,
        target: &AccountId,
        organization: OrgId,
        role_title: impl Into<String>,
        capabilities: Capabilities,
    ) -> AuthResult<Officer> {
        self.check_actor_may_promote(actor, &organization)?;
        Self::check_ceiling(&actor.capabilities, &capabilities)?;
        // Validate the org exists even for super-officers.
        self.orgs.get(&organization)?;

        let record = accounts.get_mut(target)?;
        if record.officer.is_some() || record.is_officer {
            return Err(AuthError::AlreadyOfficer(target.clone()));
        }

        let officer = Officer {
            id: OfficerId::new(format!("off-{}", target.as_str())),
            account: target.clone(),
            organization: organization.clone(),
            role_title: role_title.into(),
            capabilities,
            email: record
                .student
                .as_ref()
                .map(|s| s.email.clone())
                .unwrap_or_default(),
            is_active: true,
        };
        record.officer = Some(officer.clone());
        record.is_officer = true;

        tracing::info!(
            target_account = %target,
            organization = %organization,
            actor = %actor.id,
            "account promoted to officer"
        );
        Ok(officer)
    }

    /// Demote `target` back to student-only status.
    ///
    /// The officer record is deleted (not merely deactivated) and the
    /// `is_officer` flag cleared, leaving the account re-promotable.
    pub fn demote(
        &self,
        accounts: &mut AccountDirectory,
        actor: &Officer,
        target: &AccountId,
        reason: &str,
    ) -> AuthResult<()> {
        if !actor.is_active {
            return Err(AuthError::InactiveOfficer);
        }
        if !actor.capabilities.grants(Capability::PromoteOfficers)
            && !actor.capabilities.grants(Capability::SuperOfficer)
        {
            return Err(AuthError::MissingCapability(Capability::PromoteOfficers));
        }

        let record = accounts.get_mut(target)?;
        let officer = record
            .officer
            .as_ref()
            .ok_or_else(|| AuthError::NotAnOfficer(target.clone()))?;
        let officer_org = officer.organization.clone();

        if !self.orgs.in_scope(&actor.organization, &officer_org)? {
            return Err(AuthError::WrongOrganization(officer_org));
        }

        record.officer = None;
        record.is_officer = false;

        tracing::info!(
            target_account = %target,
            organization = %officer_org,
            actor = %actor.id,
            reason = %reason,
            "officer demoted to student"
        );
        Ok(())
    }
}
