//! # Digital Signatures
//!
//! Free-function entry points over [`ViteKeypair`] / [`VitePublicKey`] for
//! callers that hold raw bytes, which is every caller on the Rosetta side:
//! public keys and signatures arrive hex-encoded in request bodies.

use thiserror::Error;

use super::keys::{KeyError, ViteKeypair, VitePublicKey, ViteSignature};

/// Errors during signature operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignatureBytes,

    #[error("invalid public key")]
    InvalidPublicKey,
}

impl From<KeyError> for SignatureError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidSignature => Self::InvalidSignatureBytes,
            _ => Self::InvalidPublicKey,
        }
    }
}

/// Sign a message with a ledger keypair.
pub fn sign(keypair: &ViteKeypair, message: &[u8]) -> ViteSignature {
    keypair.sign(message)
}

/// Verify a signature given as raw bytes against a raw public key.
///
/// ```
/// use vite_rosetta::crypto::{sign, verify, ViteKeypair};
///
/// let kp = ViteKeypair::generate();
/// let sig = sign(&kp, b"payload");
/// assert!(verify(kp.public_key().as_bytes(), b"payload", sig.as_bytes()).is_ok());
/// ```
pub fn verify(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let public_key = VitePublicKey::try_from_slice(public_key)?;
    let signature = ViteSignature::try_from_slice(signature)?;
    if public_key.verify(message, &signature) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_roundtrip() {
        let kp = ViteKeypair::generate();
        let sig = sign(&kp, b"block");
        assert!(verify(kp.public_key().as_bytes(), b"block", sig.as_bytes()).is_ok());
    }

    #[test]
    fn test_verify_reports_failure_kind() {
        let kp = ViteKeypair::generate();
        let sig = sign(&kp, b"block");
        let pk = kp.public_key();

        assert_eq!(
            verify(pk.as_bytes(), b"other", sig.as_bytes()),
            Err(SignatureError::VerificationFailed)
        );
        assert_eq!(
            verify(pk.as_bytes(), b"block", &sig.as_bytes()[..63]),
            Err(SignatureError::InvalidSignatureBytes)
        );
        assert_eq!(
            verify(&[1, 2, 3], b"block", sig.as_bytes()),
            Err(SignatureError::InvalidPublicKey)
        );
    }
}
