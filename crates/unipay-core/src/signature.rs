//! HMAC-SHA256 signing and verification for QR tokens and receipts.
//!
//! Signed message contracts (stable — changing either invalidates every
//! outstanding artifact):
//!   - payment-request QR token: the request id's canonical string, alone
//!   - receipt verification:    the official receipt number, alone
//!
//! Signatures are rendered as lowercase hex. Verification recomputes and
//! compares in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::SigningSecret;
use crate::error::{CoreError, CoreResult};
use crate::types::RequestId;

type HmacSha256 = Hmac<Sha256>;

/// Literal prefix of the QR payload handed to the scanner UI.
pub const QR_PAYLOAD_PREFIX: &str = "PAYMENT_REQUEST";

/// Process-wide signature service. Stateless apart from the secret; cheap to
/// share behind a reference.
pub struct SignatureService {
    mac: HmacSha256,
}

impl SignatureService {
    /// Build the service from a validated secret. Key setup happens here so
    /// a bad secret fails at boot, not on the first request.
    pub fn new(secret: &SigningSecret) -> CoreResult<Self> {
        let mac = HmacSha256::new_from_slice(secret.bytes())
            .map_err(|_| CoreError::MissingSigningSecret)?;
        Ok(Self { mac })
    }

    /// HMAC-SHA256 over the UTF-8 bytes of `message`, as lowercase hex.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Recompute and compare in constant time. Malformed signatures (wrong
    /// length, non-hex) verify false rather than erroring.
    pub fn verify(&self, message: &str, signature: &str) -> bool {
        let provided = match hex::decode(signature) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        let expected = mac.finalize().into_bytes();
        if provided.len() != expected.len() {
            return false;
        }
        expected.ct_eq(provided.as_slice()).into()
    }
}

/// Render the QR payload presented at the booth:
/// `PAYMENT_REQUEST|<request_id>|<qr_signature>`.
///
/// The framing is transport only — the signature covers the request id alone.
pub fn qr_payload(request_id: &RequestId, qr_signature: &str) -> String {
    format!(
        "{}|{}|{}",
        QR_PAYLOAD_PREFIX,
        request_id.canonical(),
        qr_signature
    )
}

/// Parse a scanned QR payload back into `(request_id, signature)`.
pub fn parse_qr_payload(payload: &str) -> CoreResult<(RequestId, String)> {
    let mut parts = payload.split('|');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(QR_PAYLOAD_PREFIX), Some(id), Some(sig), None) => {
            let request_id = RequestId::parse(id).ok_or_else(|| {
                CoreError::MalformedQrPayload("request id is not a valid UUID".into())
            })?;
            if sig.is_empty() {
                return Err(CoreError::MalformedQrPayload("empty signature".into()));
            }
            Ok((request_id, sig.to_string()))
        }
        _ => Err(CoreError::MalformedQrPayload(
            "expected PAYMENT_REQUEST|<id>|<signature>".into(),
        )),
    }
}
