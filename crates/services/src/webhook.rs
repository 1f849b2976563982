use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),
}

/// Verifies a Zoom-style event signature:
/// `x-zm-signature = "v0=" + hex(hmac_sha256(secret, "v0:{timestamp}:{body}"))`.
pub fn verify_signature(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> Result<(), WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);

    let expected = format!("v0={}", hex::encode(mac.finalize().into_bytes()));
    if expected == signature {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

/// Answer to the `endpoint.url_validation` handshake: the plain token
/// hashed with the shared secret.
pub fn encrypt_validation_token(secret: &str, plain_token: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(plain_token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
