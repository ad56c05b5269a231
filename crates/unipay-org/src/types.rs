use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use unipay_core::{AcademicTerm, AccountId, FeeTypeId, OrgId, StudentId};

// ---------------------------------------------------------------------------
// Program — the five supported academic programs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Program {
    MedicalBiology,
    MarineBiology,
    ComputerScience,
    EnvironmentalScience,
    InformationTechnology,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Program::MedicalBiology => write!(f, "Medical Biology"),
            Program::MarineBiology => write!(f, "Marine Biology"),
            Program::ComputerScience => write!(f, "Computer Science"),
            Program::EnvironmentalScience => write!(f, "Environmental Science"),
            Program::InformationTechnology => write!(f, "Information Technology"),
        }
    }
}

/// An organization's program affiliation: a single program, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Affiliation {
    Program(Program),
    All,
}

impl Affiliation {
    pub fn covers(&self, program: Program) -> bool {
        match self {
            Affiliation::Program(p) => *p == program,
            Affiliation::All => true,
        }
    }
}

// ---------------------------------------------------------------------------
// FeeTier / HierarchyLevel
// ---------------------------------------------------------------------------

/// Tier 1 fees bind to a specific program; tier 2 fees are mandatory
/// college-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeTier {
    ProgramSpecific,
    CollegeWide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyLevel {
    Program,
    College,
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

/// A student organization that collects fees at a physical booth.
///
/// Organizations form a tree: college-level nodes at the root, program-level
/// nodes beneath them. The tree drives accessible-scope resolution for
/// redemption, promotion, and bulk posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub code: String,
    pub name: String,
    pub fee_tier: FeeTier,
    pub program_affiliation: Affiliation,
    pub hierarchy_level: HierarchyLevel,
    pub parent: Option<OrgId>,
    pub booth_location: String,
    pub contact_email: String,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// YearLevels — which year levels a fee applies to
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearLevels {
    All,
    Only(BTreeSet<u8>),
}

impl YearLevels {
    pub fn only(levels: impl IntoIterator<Item = u8>) -> Self {
        YearLevels::Only(levels.into_iter().collect())
    }

    pub fn applies_to(&self, year_level: u8) -> bool {
        match self {
            YearLevels::All => true,
            YearLevels::Only(levels) => levels.contains(&year_level),
        }
    }
}

// ---------------------------------------------------------------------------
// FeeType
// ---------------------------------------------------------------------------

/// A fee declared by an organization for one academic term.
/// (organization, name, term) is unique within the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeType {
    pub id: FeeTypeId,
    pub organization: OrgId,
    pub name: String,
    pub amount: Decimal,
    pub term: AcademicTerm,
    pub applicable_year_levels: YearLevels,
    pub deadline: Option<NaiveDate>,
    pub is_active: bool,
}

impl FeeType {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.deadline {
            Some(deadline) => today > deadline,
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// StudentProfile
// ---------------------------------------------------------------------------

/// Academic identity of a student account. A student with no program resolves
/// to an empty applicable-fee set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub account: AccountId,
    pub student_number: String,
    pub program: Option<Program>,
    pub year_level: u8,
    pub term: AcademicTerm,
    pub email: String,
    pub is_active: bool,
}
