//! Contains tools related to Discord's Interactions Endpoint URL feature.
//!
//! "You can optionally configure an interactions endpoint to receive interactions via HTTP POSTs
//! rather than over Gateway with a bot user."
//!
//! <https://discord.com/developers/docs/interactions/overview#configuring-an-interactions-endpoint-url>
//!
//! See [`Verifier`] for example usage.

use std::fmt;

/// Parses a hex string into an array of `[u8]`
fn parse_hex<const N: usize>(s: &str) -> Option<[u8; N]> {
    if s.len() != N * 2 {
        return None;
    }

    let mut res = [0; N];
    for (i, byte) in res.iter_mut().enumerate() {
        *byte = u8::from_str_radix(s.get(2 * i..2 * (i + 1))?, 16).ok()?;
    }
    Some(res)
}

/// The application public key could not be used to verify requests.
#[derive(Debug)]
#[non_exhaustive]
pub enum InvalidKey {
    /// The key is not a 64 digit hex string.
    Hex,
    /// The bytes are not a valid Ed25519 public key.
    Key(ed25519_dalek::SignatureError),
}

impl fmt::Display for InvalidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex => f.write_str("invalid bot public key: must be a 64 digit hex string"),
            Self::Key(inner) => write!(f, "invalid bot public key: {inner}"),
        }
    }
}

impl std::error::Error for InvalidKey {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hex => None,
            Self::Key(inner) => Some(inner),
        }
    }
}

/// Used to cryptographically verify incoming interactions HTTP request for authenticity.
///
/// If incoming requests are not verified, Discord will reject the URL for security reasons.
///
/// ```rust
/// use tempest::interactions_endpoint::Verifier;
///
/// let verifier =
///     Verifier::from_hex("67c6bd767ca099e79efac9fcce4d2022a63bf7dea780e7f3d813f694c1597089")
///         .expect("valid key");
///
/// // When receiving an HTTP request:
/// # let http_headers = std::collections::HashMap::from([("X-Signature-Ed25519", ""), ("X-Signature-Timestamp", "")]);
/// # let request_body = &[];
/// let signature = http_headers["X-Signature-Ed25519"];
/// let timestamp = http_headers["X-Signature-Timestamp"];
/// if verifier.verify(signature, timestamp, request_body).is_err() {
///     // Send HTTP 401 Unauthorized response
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Verifier {
    public_key: ed25519_dalek::VerifyingKey,
}

impl Verifier {
    /// Creates a new [`Verifier`] from the given public key hex string, as shown in the developer
    /// portal.
    ///
    /// # Errors
    ///
    /// [`InvalidKey`] if the string is not 64 hex digits or the key isn't cryptographically valid.
    pub fn from_hex(public_key: &str) -> Result<Self, InvalidKey> {
        Self::try_new(parse_hex(public_key.trim()).ok_or(InvalidKey::Hex)?)
    }

    /// Creates a new [`Verifier`] from the public key bytes.
    ///
    /// # Errors
    ///
    /// [`InvalidKey`] if the key isn't cryptographically valid.
    pub fn try_new(public_key: [u8; 32]) -> Result<Self, InvalidKey> {
        Ok(Self {
            public_key: ed25519_dalek::VerifyingKey::from_bytes(&public_key)
                .map_err(InvalidKey::Key)?,
        })
    }

    /// Verifies a Discord request for authenticity, given the `X-Signature-Ed25519` HTTP header,
    /// `X-Signature-Timestamp` HTTP headers and request body.
    // We just need to differentiate "pass" and "failure". There's deliberately no data besides ().
    #[allow(clippy::result_unit_err, clippy::missing_errors_doc)]
    pub fn verify(&self, signature: &str, timestamp: &str, body: &[u8]) -> Result<(), ()> {
        use ed25519_dalek::Verifier as _;

        // Extract and parse signature
        let signature_bytes = parse_hex(signature).ok_or(())?;
        let signature = ed25519_dalek::Signature::from_bytes(&signature_bytes);

        // Verify
        let message_to_verify = [timestamp.as_bytes(), body].concat();
        self.public_key.verify(&message_to_verify, &signature).map_err(|_| ())
    }

    /// Like [`Self::verify`], failing when either header is absent.
    #[allow(clippy::result_unit_err, clippy::missing_errors_doc)]
    pub fn verify_headers(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<(), ()> {
        match (signature, timestamp) {
            (Some(signature), Some(timestamp)) => self.verify(signature, timestamp, body),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7; 32])
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex::<4>("bf7dea78"), Some([0xBF, 0x7D, 0xEA, 0x78]));
        assert_eq!(parse_hex::<4>("bf7dea7"), None);
        assert_eq!(parse_hex::<4>("bf7dea789"), None);
        assert_eq!(parse_hex::<4>("bf7dea7x"), None);
        assert_eq!(parse_hex(""), Some([]));
    }

    #[test]
    fn accepts_signed_request() {
        let key = signing_key();
        let verifier = Verifier::from_hex(&hex(key.verifying_key().as_bytes())).unwrap();

        let body: &[u8] = br#"{"type":1}"#;
        let signature = key.sign(&[b"1700000000".as_slice(), body].concat());
        let signature = hex(&signature.to_bytes());

        assert!(verifier.verify(&signature, "1700000000", body).is_ok());
        assert!(verifier.verify_headers(Some(&signature), Some("1700000000"), body).is_ok());
    }

    #[test]
    fn rejects_tampering_and_missing_headers() {
        let key = signing_key();
        let verifier = Verifier::from_hex(&hex(key.verifying_key().as_bytes())).unwrap();

        let body: &[u8] = br#"{"type":1}"#;
        let signature = hex(&key.sign(&[b"1700000000".as_slice(), body].concat()).to_bytes());

        assert!(verifier.verify(&signature, "1700000001", body).is_err());
        assert!(verifier.verify(&signature, "1700000000", br#"{"type":2}"#).is_err());
        assert!(verifier.verify("zz", "1700000000", body).is_err());
        assert!(verifier.verify_headers(None, Some("1700000000"), body).is_err());
        assert!(verifier.verify_headers(Some(&signature), None, body).is_err());
    }

    #[test]
    fn invalid_keys() {
        assert!(matches!(Verifier::from_hex("abc"), Err(InvalidKey::Hex)));
        assert!(Verifier::from_hex(&"0".repeat(63)).is_err());
    }
}
