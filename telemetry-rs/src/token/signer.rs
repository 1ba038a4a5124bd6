use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::errors::TelemetryError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_LEN: usize = 32;

/// HMAC-SHA256 of `message` under `key`.
///
/// An empty key is a configuration defect and fails with SigningError, even
/// though HMAC itself would accept it.
pub fn sign(message: &[u8], key: &[u8]) -> Result<[u8; SIGNATURE_LEN], TelemetryError> {
    if key.is_empty() {
        return Err(TelemetryError::SigningError(
            "Signing key is empty".to_string(),
        ));
    }
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| TelemetryError::SigningError(format!("Invalid signing key: {e}")))?;
    mac.update(message);

    let mut signature = [0u8; SIGNATURE_LEN];
    signature.copy_from_slice(&mac.finalize().into_bytes());
    Ok(signature)
}

/// Standard (not url-safe) base64 of a signature.
pub fn encode(signature: &[u8]) -> String {
    STANDARD.encode(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = b"/devices/iPhone/messages/events\n1700000000";
    const PINNED_SIGNATURE: &str = "twr/5kUwJ4egRW/Rp7x+kIuUpMfY3Qntjry8VqGAfKc=";

    #[test]
    fn test_sign_pinned_fixture() {
        let signature = sign(MESSAGE, b"testkey").unwrap();
        let encoded = encode(&signature);
        assert_eq!(encoded, PINNED_SIGNATURE);
        assert_eq!(encoded.len(), 44);
    }

    #[test]
    fn test_sign_is_deterministic() {
        let first = sign(MESSAGE, b"testkey").unwrap();
        let second = sign(MESSAGE, b"testkey").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), SIGNATURE_LEN);
    }

    #[test]
    fn test_sign_depends_on_key_and_message() {
        let reference = sign(MESSAGE, b"testkey").unwrap();
        assert_ne!(reference, sign(MESSAGE, b"otherkey").unwrap());
        assert_ne!(
            reference,
            sign(b"/devices/iPhone/messages/events\n1700000001", b"testkey").unwrap()
        );
    }

    #[test]
    fn test_sign_rejects_empty_key() {
        assert!(matches!(
            sign(MESSAGE, b""),
            Err(TelemetryError::SigningError(_))
        ));
    }
}
