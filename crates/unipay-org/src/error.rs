use thiserror::Error;
use unipay_core::OrgId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrgError {
    #[error("unknown organization: {0}")]
    UnknownOrganization(OrgId),

    #[error("duplicate organization code: {0}")]
    DuplicateCode(String),

    #[error("program-specific organizations require a concrete program affiliation")]
    MissingAffiliation,

    #[error("college-level organizations cannot have a parent")]
    CollegeWithParent,

    #[error("invalid parent for {child}: {reason}")]
    InvalidParent { child: OrgId, reason: String },

    #[error("unknown fee type")]
    UnknownFeeType,

    #[error("no current academic period is configured")]
    NoCurrentPeriod,

    #[error("unknown academic period")]
    UnknownPeriod,

    #[error("academic period already exists")]
    DuplicatePeriod,
}

pub type OrgResult<T> = Result<T, OrgError>;
