use thiserror::Error;
use unipay_core::{AccountId, OrgId};

use crate::types::Capability;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The target organization is outside the actor's accessible scope.
    /// Distinct from not-found and already-processed so callers can show the
    /// right message.
    #[error("organization {0} is outside the officer's scope")]
    WrongOrganization(OrgId),

    #[error("officer is not active")]
    InactiveOfficer,

    #[error("officer lacks the {0:?} capability")]
    MissingCapability(Capability),

    #[error("account {0} is not an officer")]
    NotAnOfficer(AccountId),

    #[error("account {0} is already an officer")]
    AlreadyOfficer(AccountId),

    /// The actor tried to grant a capability they do not hold themselves.
    #[error("cannot grant {0:?}: actor does not hold it")]
    PrivilegeCeiling(Capability),

    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error(transparent)]
    Org(#[from] unipay_org::OrgError),
}

pub type AuthResult<T> = Result<T, AuthError>;
