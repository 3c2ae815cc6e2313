//! secp256k1 signature normalization and recovery.
//!
//! Key signers return a bare `R || S`. Before it can be embedded in a
//! transaction the signature must be low-S (EIP-2) and carry the recovery id
//! that makes `ecrecover` yield the signer's address. Neither is guaranteed by
//! remote signing backends, so both are established here.

use alloy_primitives::{keccak256, Address, B256, U256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::config::RAW_SIGNATURE_LEN;
use crate::error::{GatewayError, Result};

/// A low-S signature with its recovery id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: U256,
    pub s: U256,
    /// 0 or 1.
    pub rec_id: u8,
}

impl RecoverableSignature {
    /// `R || S || v` with a caller-chosen final byte.
    pub fn to_bytes_with_v(&self, v: u8) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        out[32..64].copy_from_slice(&self.s.to_be_bytes::<32>());
        out[64] = v;
        out
    }
}

/// Address owning an uncompressed secp256k1 public key.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Turns a raw `R || S` over `digest` into a low-S signature whose
/// recovery id recovers `expected`.
///
/// Fails with an encoding error when neither recovery id recovers the
/// address. That usually means the backend signed with a different key.
pub fn normalize(digest: &B256, raw: &[u8], expected: Address) -> Result<RecoverableSignature> {
    if raw.len() != RAW_SIGNATURE_LEN {
        return Err(GatewayError::signing_backend(format!(
            "expected a {} byte signature, got {}",
            RAW_SIGNATURE_LEN,
            raw.len()
        )));
    }
    let signature = Signature::from_slice(raw)
        .map_err(|e| GatewayError::encoding(format!("malformed signature: {}", e)))?;
    let signature = signature.normalize_s().unwrap_or(signature);

    for candidate in 0u8..=1 {
        let Some(rec_id) = RecoveryId::from_byte(candidate) else {
            continue;
        };
        let Ok(key) = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, rec_id)
        else {
            continue;
        };
        if public_key_to_address(&key) == expected {
            let bytes = signature.to_bytes();
            return Ok(RecoverableSignature {
                r: U256::from_be_slice(&bytes[..32]),
                s: U256::from_be_slice(&bytes[32..]),
                rec_id: candidate,
            });
        }
    }

    Err(GatewayError::encoding("address is not recoverable"))
}
