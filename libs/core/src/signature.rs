//! Slack signing-secret verification.
//!
//! Slack signs every webhook delivery with an HMAC-SHA256 over the string
//! `v0:{timestamp}:{body}` and sends the hex digest in `X-Slack-Signature`
//! alongside the timestamp it used. Requests outside the replay window are
//! rejected before any MAC work, and digests are compared in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the unix timestamp the signature was computed against.
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";
/// Header carrying the `v0=<hex digest>` signature.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Maximum accepted clock skew between the signed timestamp and now.
pub const TOLERANCE: Duration = Duration::minutes(5);

const SIGNATURE_PREFIX: &str = "v0=";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature or timestamp header")]
    MissingHeader,
    #[error("malformed request timestamp")]
    MalformedTimestamp,
    #[error("request timestamp outside the {TOLERANCE} replay window")]
    StaleTimestamp,
    #[error("malformed signature header")]
    MalformedSignature,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verifies a signed request. `now` is injected so the replay window is
/// testable without a real clock.
///
/// Once this returns an error the body must not be interpreted further.
pub fn verify(
    secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
    now: OffsetDateTime,
) -> Result<(), SignatureError> {
    let claimed: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MalformedTimestamp)?;
    if (now.unix_timestamp() - claimed).abs() > TOLERANCE.whole_seconds() {
        return Err(SignatureError::StaleTimestamp);
    }

    let hex_digest = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureError::MalformedSignature)?;
    let provided = hex::decode(hex_digest).map_err(|_| SignatureError::MalformedSignature)?;

    let expected = compute_digest(secret, timestamp, body);
    if provided.len() == expected.len() && bool::from(provided.ct_eq(&expected)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Computes the `v0=<hex digest>` signature for a body and timestamp.
///
/// Used by tests and mock platforms to produce deliveries that pass
/// [`verify`].
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(compute_digest(secret, timestamp, body))
    )
}

fn compute_digest(secret: &str, timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}
