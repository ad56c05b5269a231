//! UniPay payment lifecycle.
//!
//! The request → redemption → receipt pipeline:
//! - payment requests move `Pending → {Paid, Cancelled, Expired}`, with all
//!   terminal transitions one-way;
//! - redemption verifies the QR signature, checks officer scope, and flips
//!   the request to Paid in the same atomic unit that records the payment —
//!   concurrent redemptions of one request yield exactly one success;
//! - receipts carry their own verification signature over the official
//!   receipt number and are handed to an external notifier that the core
//!   never retries;
//! - the bulk posting engine fans a declared fee out to every eligible
//!   student in an organization's accessible scope, isolating per-student
//!   failures.
//!
//! Persistence lives behind [`PaymentStore`]; [`InMemoryStore`] is the
//! reference backend used by tests and embedders without a database.

pub mod bulk;
pub mod error;
pub mod notify;
pub mod redeem;
pub mod request;
pub mod status;
pub mod store;
pub mod types;

pub use bulk::{post_bulk, BulkFeeSpec, BulkOutcome};
pub use error::{PayError, PayResult};
pub use notify::{dispatch_receipt, ReceiptNotifier, RecordingNotifier};
pub use redeem::RedemptionDesk;
pub use request::{cancel_request, create_request, expire_if_due};
pub use status::{is_expired, is_valid_transition, transition};
pub use store::{InMemoryStore, PaymentStore};
pub use types::{Payment, PaymentRequest, Receipt, RequestStatus};
