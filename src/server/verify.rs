//! Request signature verification
//!
//! Every interaction request is signed with the application's Ed25519 key over
//! `timestamp || body`. Unsigned or mis-signed requests are rejected before
//! the body is parsed.

use anyhow::{anyhow, Result};
use ed25519_dalek::{Signature, VerifyingKey};

pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

pub trait InteractionVerifier: Send + Sync {
    fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool;
}

pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl Ed25519Verifier {
    /// Load the application public key from its hex encoding
    pub fn from_hex(public_key: &str) -> Result<Self> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| anyhow!("public key is not valid hex: {}", e))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("public key must be 32 bytes, got {}", bytes.len()))?;
        let key = VerifyingKey::from_bytes(&arr)
            .map_err(|e| anyhow!("public key is not a valid Ed25519 point: {}", e))?;
        Ok(Self { key })
    }
}

impl InteractionVerifier for Ed25519Verifier {
    fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool {
        let Ok(sig_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(sig_arr) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_arr);

        let mut signed = Vec::with_capacity(timestamp.len() + body.len());
        signed.extend_from_slice(timestamp.as_bytes());
        signed.extend_from_slice(body);

        self.key.verify_strict(&signed, &signature).is_ok()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    pub(crate) fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    pub(crate) fn sign(timestamp: &str, body: &[u8]) -> String {
        let mut signed = timestamp.as_bytes().to_vec();
        signed.extend_from_slice(body);
        hex::encode(signing_key().sign(&signed).to_bytes())
    }

    pub(crate) fn verifier() -> Ed25519Verifier {
        Ed25519Verifier::from_hex(&hex::encode(signing_key().verifying_key().to_bytes())).unwrap()
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"type":1}"#;
        let sig = sign("1700000000", body);
        assert!(verifier().verify(&sig, "1700000000", body));
    }

    #[test]
    fn test_tampered_requests_fail() {
        let body = br#"{"type":1}"#;
        let sig = sign("1700000000", body);
        let verifier = verifier();
        assert!(!verifier.verify(&sig, "1700000001", body));
        assert!(!verifier.verify(&sig, "1700000000", br#"{"type":2}"#));
        assert!(!verifier.verify("zz", "1700000000", body));
        assert!(!verifier.verify(&sig[..64], "1700000000", body));
    }

    #[test]
    fn test_bad_public_keys() {
        assert!(Ed25519Verifier::from_hex("not hex").is_err());
        assert!(Ed25519Verifier::from_hex("abcd").is_err());
    }
}
