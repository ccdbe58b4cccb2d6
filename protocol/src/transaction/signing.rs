//! Account block signing.
//!
//! Signing is a separate step from building because the key is normally
//! held by the client, not by this service. The signed message is the
//! block's 32-byte content hash, never the encoded block.

use super::verification::{verify_block_signature, VerificationError};
use crate::crypto::{ViteKeypair, VitePublicKey, ViteSignature};
use crate::ledger::{AccountBlock, Hash};
use crate::model::{CurveType, PublicKey, Signature, SignatureType, SigningPayload};

/// Signs a block in place and returns its content hash.
///
/// The hash is recomputed, so any field edited after building is covered.
///
/// ```rust,no_run
/// use vite_rosetta::crypto::ViteKeypair;
/// use vite_rosetta::ledger::{BlockType, Hash};
/// use vite_rosetta::transaction::{sign_block, AccountBlockBuilder};
///
/// let keypair = ViteKeypair::generate();
/// let mut block = AccountBlockBuilder::new(BlockType::SendCall, keypair.address())
///     .public_key(&keypair.public_key())
///     .build();
///
/// sign_block(&mut block, &keypair);
/// assert!(block.is_signed());
/// ```
pub fn sign_block(block: &mut AccountBlock, keypair: &ViteKeypair) -> Hash {
    let hash = block.compute_hash();
    let signature = keypair.sign(hash.as_bytes());
    attach_signature(block, &keypair.public_key(), &signature, hash);
    hash
}

/// Verifies `signature` over the block's recomputed hash and, only on
/// success, stores signature, public key and hash on the block.
pub fn apply_signature(
    block: &mut AccountBlock,
    public_key: &[u8],
    signature: &[u8],
) -> Result<Hash, VerificationError> {
    let hash = verify_block_signature(block, public_key, signature)?;
    block.public_key = public_key.to_vec();
    block.signature = Some(signature.to_vec());
    block.hash = hash;
    Ok(hash)
}

fn attach_signature(
    block: &mut AccountBlock,
    public_key: &VitePublicKey,
    signature: &ViteSignature,
    hash: Hash,
) {
    block.public_key = public_key.as_bytes().to_vec();
    block.signature = Some(signature.to_vec());
    block.hash = hash;
}

/// Produces the Rosetta signature a client would return for `payload`.
///
/// Used by the `sign` CLI command and by tests that drive the full
/// construction flow.
pub fn sign_payload(
    keypair: &ViteKeypair,
    payload: &SigningPayload,
) -> Result<Signature, hex::FromHexError> {
    let message = hex::decode(&payload.hex_bytes)?;
    let signature = keypair.sign(&message);
    Ok(Signature {
        signing_payload: payload.clone(),
        public_key: PublicKey {
            hex_bytes: keypair.public_key().to_hex(),
            curve_type: CurveType::Edwards25519,
        },
        signature_type: SignatureType::Ed25519,
        hex_bytes: signature.to_hex(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{BlockType, Quantity};
    use crate::transaction::AccountBlockBuilder;

    fn unsigned(keypair: &ViteKeypair) -> AccountBlock {
        AccountBlockBuilder::new(BlockType::SendCall, keypair.address())
            .public_key(&keypair.public_key())
            .to_address(ViteKeypair::from_seed(&[2; 32]).address())
            .amount(Quantity::from(10u64))
            .build()
    }

    #[test]
    fn sign_sets_signature_and_hash() {
        let kp = ViteKeypair::from_seed(&[1; 32]);
        let mut block = unsigned(&kp);
        assert!(!block.is_signed());

        let hash = sign_block(&mut block, &kp);
        assert!(block.is_signed());
        assert_eq!(block.hash, hash);
        assert_eq!(block.signature.as_ref().map(Vec::len), Some(64));
    }

    #[test]
    fn sign_covers_late_edits() {
        let kp = ViteKeypair::from_seed(&[1; 32]);
        let mut block = unsigned(&kp);
        let built_hash = block.hash;
        block.amount = Some(Quantity::from(11u64));
        assert_ne!(sign_block(&mut block, &kp), built_hash);
    }

    #[test]
    fn apply_signature_accepts_valid() {
        let kp = ViteKeypair::from_seed(&[1; 32]);
        let mut block = unsigned(&kp);
        let sig = kp.sign(block.compute_hash().as_bytes());

        let hash = apply_signature(&mut block, kp.public_key().as_bytes(), sig.as_bytes()).unwrap();
        assert_eq!(block.hash, hash);
        assert!(block.is_signed());
    }

    #[test]
    fn apply_signature_leaves_block_untouched_on_failure() {
        let kp = ViteKeypair::from_seed(&[1; 32]);
        let mut block = unsigned(&kp);
        let sig = kp.sign(b"not the hash");
        let before = block.clone();

        assert!(apply_signature(&mut block, kp.public_key().as_bytes(), sig.as_bytes()).is_err());
        assert_eq!(block, before);
    }

    #[test]
    fn sign_payload_matches_block_signature() {
        let kp = ViteKeypair::from_seed(&[1; 32]);
        let mut block = unsigned(&kp);
        let payload = SigningPayload {
            account_identifier: None,
            hex_bytes: block.compute_hash().to_string(),
            signature_type: Some(SignatureType::Ed25519),
        };

        let rosetta = sign_payload(&kp, &payload).unwrap();
        sign_block(&mut block, &kp);
        assert_eq!(
            hex::decode(rosetta.hex_bytes).unwrap(),
            block.signature.unwrap()
        );
        assert_eq!(rosetta.public_key.hex_bytes, kp.public_key().to_hex());
    }

    #[test]
    fn sign_payload_rejects_bad_hex() {
        let kp = ViteKeypair::from_seed(&[1; 32]);
        let payload = SigningPayload {
            account_identifier: None,
            hex_bytes: "zz".into(),
            signature_type: None,
        };
        assert!(sign_payload(&kp, &payload).is_err());
    }
}
