//! UniPay authorization.
//!
//! Who may do what, resolved against the organization hierarchy:
//! - account roles as an explicit tagged union (student, officer, or both),
//!   resolved per request context instead of probed ad hoc;
//! - the redemption authorization guard (process, void, reports) with
//!   failure kinds callers can tell apart;
//! - the promotion/demotion authority, including the single
//!   privilege-ceiling rule: nobody grants a capability they do not hold.

pub mod error;
pub mod guard;
pub mod promotion;
pub mod types;

pub use error::{AuthError, AuthResult};
pub use guard::{can_generate_reports, can_redeem, can_void};
pub use promotion::PromotionAuthority;
pub use types::{AccountDirectory, AccountRecord, AccountRole, Capabilities, Capability, Officer};
