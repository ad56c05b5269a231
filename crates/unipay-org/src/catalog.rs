//! Fee catalog with idempotent declaration.

use rust_decimal::Decimal;
use std::collections::HashMap;

use unipay_core::{AcademicTerm, FeeTypeId, OrgId};

use crate::error::{OrgError, OrgResult};
use crate::types::{FeeType, YearLevels};

/// All declared fee types, unique on (organization, name, term).
///
/// Re-declaring an existing combination updates the amount in place instead
/// of duplicating the fee — the contract the bulk posting engine relies on.
#[derive(Debug, Default)]
pub struct FeeCatalog {
    fees: HashMap<FeeTypeId, FeeType>,
    by_key: HashMap<(OrgId, String, AcademicTerm), FeeTypeId>,
    next_seq: u64,
}

impl FeeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a fee for (organization, name, term). Returns the fee id and
    /// whether a new fee was created (`false` means the amount of an existing
    /// declaration was updated).
    pub fn declare(
        &mut self,
        organization: OrgId,
        name: impl Into<String>,
        term: AcademicTerm,
        amount: Decimal,
        applicable_year_levels: YearLevels,
    ) -> (FeeTypeId, bool) {
        let name = name.into();
        let key = (organization.clone(), name.clone(), term.clone());
        if let Some(existing_id) = self.by_key.get(&key) {
            let id = existing_id.clone();
            if let Some(fee) = self.fees.get_mut(&id) {
                fee.amount = amount;
            }
            return (id, false);
        }

        self.next_seq += 1;
        let id = FeeTypeId::new(format!("fee-{:06}", self.next_seq));
        let fee = FeeType {
            id: id.clone(),
            organization,
            name,
            amount,
            term,
            applicable_year_levels,
            deadline: None,
            is_active: true,
        };
        self.by_key.insert(key, id.clone());
        self.fees.insert(id.clone(), fee);
        (id, true)
    }

    pub fn get(&self, id: &FeeTypeId) -> OrgResult<&FeeType> {
        self.fees.get(id).ok_or(OrgError::UnknownFeeType)
    }

    pub fn set_deadline(&mut self, id: &FeeTypeId, deadline: chrono::NaiveDate) -> OrgResult<()> {
        let fee = self.fees.get_mut(id).ok_or(OrgError::UnknownFeeType)?;
        fee.deadline = Some(deadline);
        Ok(())
    }

    pub fn deactivate(&mut self, id: &FeeTypeId) -> OrgResult<()> {
        let fee = self.fees.get_mut(id).ok_or(OrgError::UnknownFeeType)?;
        fee.is_active = false;
        Ok(())
    }

    pub fn fees_of_org<'a>(&'a self, org: &'a OrgId) -> impl Iterator<Item = &'a FeeType> {
        self.fees.values().filter(move |fee| &fee.organization == org)
    }

    /// Active fees declared for the given term.
    pub fn active_in_term<'a>(&'a self, term: &'a AcademicTerm) -> impl Iterator<Item = &'a FeeType> {
        self.fees
            .values()
            .filter(move |fee| fee.is_active && &fee.term == term)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeeType> {
        self.fees.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unipay_core::Semester;

    fn term() -> AcademicTerm {
        AcademicTerm::new("2024-2025", Semester::First)
    }

    #[test]
    fn test_declare_creates() {
        let mut catalog = FeeCatalog::new();
        let (id, created) = catalog.declare(
            OrgId::new("CSG"),
            "College Fee",
            term(),
            Decimal::new(15_000, 2),
            YearLevels::All,
        );
        assert!(created);
        let fee = catalog.get(&id).unwrap();
        assert_eq!(fee.amount, Decimal::new(15_000, 2));
        assert_eq!(fee.name, "College Fee");
    }

    #[test]
    fn test_redeclare_updates_amount_not_duplicate() {
        let mut catalog = FeeCatalog::new();
        let (id1, _) = catalog.declare(
            OrgId::new("CSG"),
            "College Fee",
            term(),
            Decimal::new(15_000, 2),
            YearLevels::All,
        );
        let (id2, created) = catalog.declare(
            OrgId::new("CSG"),
            "College Fee",
            term(),
            Decimal::new(20_000, 2),
            YearLevels::All,
        );
        assert!(!created);
        assert_eq!(id1, id2);
        assert_eq!(catalog.get(&id1).unwrap().amount, Decimal::new(20_000, 2));
        assert_eq!(catalog.iter().count(), 1);
    }

    #[test]
    fn test_same_name_different_term_is_distinct() {
        let mut catalog = FeeCatalog::new();
        let (id1, _) = catalog.declare(
            OrgId::new("CSG"),
            "College Fee",
            term(),
            Decimal::new(15_000, 2),
            YearLevels::All,
        );
        let (id2, created) = catalog.declare(
            OrgId::new("CSG"),
            "College Fee",
            AcademicTerm::new("2024-2025", Semester::Second),
            Decimal::new(15_000, 2),
            YearLevels::All,
        );
        assert!(created);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_same_name_different_org_is_distinct() {
        let mut catalog = FeeCatalog::new();
        let (id1, _) = catalog.declare(
            OrgId::new("CSG"),
            "College Fee",
            term(),
            Decimal::new(15_000, 2),
            YearLevels::All,
        );
        let (id2, created) = catalog.declare(
            OrgId::new("COMSCI"),
            "College Fee",
            term(),
            Decimal::new(15_000, 2),
            YearLevels::All,
        );
        assert!(created);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_active_in_term_excludes_deactivated() {
        let mut catalog = FeeCatalog::new();
        let (id, _) = catalog.declare(
            OrgId::new("CSG"),
            "College Fee",
            term(),
            Decimal::new(15_000, 2),
            YearLevels::All,
        );
        assert_eq!(catalog.active_in_term(&term()).count(), 1);
        catalog.deactivate(&id).unwrap();
        assert_eq!(catalog.active_in_term(&term()).count(), 0);
    }

    #[test]
    fn test_unknown_fee_type() {
        let catalog = FeeCatalog::new();
        assert_eq!(
            catalog.get(&FeeTypeId::new("missing")),
            Err(OrgError::UnknownFeeType)
        );
    }
}
