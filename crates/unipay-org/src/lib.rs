//! UniPay organization model.
//!
//! The two-tier fee structure that decides who owes what:
//! - an arena of organizations forming a college → program tree, with
//!   precomputed accessible-scope resolution instead of ad-hoc tree walks;
//! - a fee catalog with idempotent declaration keyed on
//!   (organization, name, term);
//! - the academic calendar holding the single "current period" marker;
//! - applicable-fee resolution for students (tier-1 program fees plus
//!   tier-2 college-wide fees, minus what is already paid or pending).

pub mod catalog;
pub mod eligibility;
pub mod error;
pub mod hierarchy;
pub mod period;
pub mod types;

pub use catalog::FeeCatalog;
pub use eligibility::{applicable_fees, tier1_fees, tier2_fees};
pub use error::{OrgError, OrgResult};
pub use hierarchy::OrgDirectory;
pub use period::{AcademicCalendar, PeriodConfig};
pub use types::{
    Affiliation, FeeTier, FeeType, HierarchyLevel, Organization, Program, StudentProfile,
    YearLevels,
};
