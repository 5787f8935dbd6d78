use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const LINE_SIGNATURE_HEADER: &str = "x-line-signature";

/// Checks `signature` (base64 HMAC-SHA256 of the raw body keyed by the
/// channel secret) against `body`.
pub fn verify_line_signature(body: &[u8], signature: &str, channel_secret: &str) -> Result<()> {
    let signature = signature.trim();
    if signature.is_empty() {
        bail!("signature header is missing or empty");
    }
    let expected = STANDARD
        .decode(signature)
        .context("signature is not valid base64")?;
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())
        .context("failed to initialize hmac verifier")?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| anyhow!("signature verification failed"))
}

/// Computes the signature LINE would send for `body`.
pub fn sign_line_body(body: &[u8], channel_secret: &str) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())
        .context("failed to initialize hmac signer")?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
