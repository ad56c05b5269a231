//! Organization arena and accessible-scope resolution.
//!
//! Organizations are stored in an arena keyed by stable id, with a nullable
//! parent reference. Scope questions ("which organizations can this officer
//! act on?") resolve through [`OrgDirectory::accessible_organizations`] in
//! one place instead of tree walks scattered through call sites.

use std::collections::{BTreeSet, HashMap, HashSet};

use unipay_core::OrgId;

use crate::error::{OrgError, OrgResult};
use crate::types::{Affiliation, FeeTier, HierarchyLevel, Organization};

#[derive(Debug, Default)]
pub struct OrgDirectory {
    orgs: HashMap<OrgId, Organization>,
    codes: HashSet<String>,
}

impl OrgDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an organization, enforcing the tree invariants:
    /// - program-specific tier requires a concrete (non-All) affiliation;
    /// - college-level nodes have no parent;
    /// - program-level parents must already exist and be either college-level
    ///   or a program-level node with an All affiliation (the college-like
    ///   fan-out case);
    /// - codes are unique.
    pub fn insert(&mut self, org: Organization) -> OrgResult<()> {
        if org.fee_tier == FeeTier::ProgramSpecific && org.program_affiliation == Affiliation::All
        {
            return Err(OrgError::MissingAffiliation);
        }
        if org.hierarchy_level == HierarchyLevel::College && org.parent.is_some() {
            return Err(OrgError::CollegeWithParent);
        }
        if let Some(ref parent_id) = org.parent {
            let parent = self
                .orgs
                .get(parent_id)
                .ok_or_else(|| OrgError::InvalidParent {
                    child: org.id.clone(),
                    reason: format!("parent {} does not exist", parent_id),
                })?;
            let parent_fans_out = parent.hierarchy_level == HierarchyLevel::College
                || parent.program_affiliation == Affiliation::All;
            if !parent_fans_out {
                return Err(OrgError::InvalidParent {
                    child: org.id.clone(),
                    reason: format!("parent {} cannot enclose other organizations", parent_id),
                });
            }
        }
        if !self.codes.insert(org.code.clone()) {
            return Err(OrgError::DuplicateCode(org.code));
        }
        self.orgs.insert(org.id.clone(), org);
        Ok(())
    }

    pub fn get(&self, id: &OrgId) -> OrgResult<&Organization> {
        self.orgs
            .get(id)
            .ok_or_else(|| OrgError::UnknownOrganization(id.clone()))
    }

    pub fn contains(&self, id: &OrgId) -> bool {
        self.orgs.contains_key(id)
    }

    pub fn children_of(&self, id: &OrgId) -> BTreeSet<OrgId> {
        self.orgs
            .values()
            .filter(|org| org.parent.as_ref() == Some(id))
            .map(|org| org.id.clone())
            .collect()
    }

    /// The set of organizations an actor scoped to `id` can act on.
    ///
    /// College-level nodes fan out to themselves plus every child. A
    /// program-level node covers only itself, unless its own affiliation is
    /// All, in which case it inherits its children's scope as well.
    pub fn accessible_organizations(&self, id: &OrgId) -> OrgResult<BTreeSet<OrgId>> {
        let org = self.get(id)?;
        let mut scope = BTreeSet::new();
        scope.insert(org.id.clone());

        let fans_out = org.hierarchy_level == HierarchyLevel::College
            || org.program_affiliation == Affiliation::All;
        if fans_out {
            scope.extend(self.children_of(id));
        }
        Ok(scope)
    }

    /// Whether an actor scoped to `actor_org` may act on `target`.
    pub fn in_scope(&self, actor_org: &OrgId, target: &OrgId) -> OrgResult<bool> {
        Ok(self.accessible_organizations(actor_org)?.contains(target))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Organization> {
        self.orgs.values()
    }
}
