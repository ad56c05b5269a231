//! UniPay core primitives.
//!
//! Shared vocabulary for the fee-collection platform: typed identifiers,
//! timestamps, academic terms, runtime configuration, and the HMAC-SHA256
//! signature service that backs QR payment tokens and receipt verification.
//!
//! The signing secret is a process-wide, boot-time invariant. Constructing a
//! [`SignatureService`] without a usable secret fails immediately; nothing in
//! this workspace ever falls back to an unsigned token.

pub mod config;
pub mod error;
pub mod signature;
pub mod types;

pub use config::{SigningSecret, UniPayConfig, SIGNING_SECRET_ENV};
pub use error::{CoreError, CoreResult};
pub use signature::{parse_qr_payload, qr_payload, SignatureService, QR_PAYLOAD_PREFIX};
pub use types::*;
