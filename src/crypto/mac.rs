//! HMAC-SHA256 record MAC for the legacy ETM/MTE modes.
//!
//! The MAC input binds the header to the fragment:
//!
//! ```text
//! [ seq_num (8) | type (1) | version (2) | length (2) | fragment ]
//! ```
//!
//! Verification is constant-time; in encrypt-then-MAC the fragment is the
//! ciphertext, in MAC-then-encrypt it is the plaintext.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{CryptoError, HMAC_SHA256_SIZE, SEQ_NUM_LEN};

type HmacSha256 = Hmac<Sha256>;

/// MAC key storage, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct MacKey(Vec<u8>);

/// HMAC-SHA256 over record pseudo-headers and fragments.
pub struct RecordHmac {
    key: MacKey,
}

impl RecordHmac {
    /// Create a record MAC from raw key bytes.
    pub fn new(key: &[u8]) -> Self {
        Self { key: MacKey(key.to_vec()) }
    }

    /// MAC output length in bytes.
    pub fn mac_len(&self) -> usize {
        HMAC_SHA256_SIZE
    }

    /// Compute the MAC for a record fragment.
    pub fn compute(
        &self,
        seq: &[u8; SEQ_NUM_LEN],
        rtype: u8,
        version: u16,
        data: &[u8],
    ) -> Result<[u8; HMAC_SHA256_SIZE], CryptoError> {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key.0) else {
            return Err(CryptoError::MacFailed);
        };
        mac.update(seq);
        mac.update(&[rtype]);
        mac.update(&version.to_be_bytes());
        mac.update(&(data.len() as u16).to_be_bytes());
        mac.update(data);

        let mut tag = [0u8; HMAC_SHA256_SIZE];
        tag.copy_from_slice(&mac.finalize().into_bytes());
        Ok(tag)
    }

    /// Verify a received MAC in constant time.
    pub fn verify(
        &self,
        seq: &[u8; SEQ_NUM_LEN],
        rtype: u8,
        version: u16,
        data: &[u8],
        received: &[u8],
    ) -> bool {
        match self.compute(seq, rtype, version, data) {
            Ok(expected) => expected.ct_eq(received).into(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_verify_roundtrip() {
        let mac = RecordHmac::new(b"record mac key");
        let seq = [0, 0, 0, 0, 0, 0, 0, 3];
        let tag = mac.compute(&seq, 23, 0xFEFD, b"fragment").expect("mac");
        assert!(mac.verify(&seq, 23, 0xFEFD, b"fragment", &tag));
    }

    #[test]
    fn test_verify_binds_every_input() {
        let mac = RecordHmac::new(b"record mac key");
        let seq = [0, 0, 0, 0, 0, 0, 0, 3];
        let tag = mac.compute(&seq, 23, 0xFEFD, b"fragment").expect("mac");

        assert!(!mac.verify(&[0; 8], 23, 0xFEFD, b"fragment", &tag));
        assert!(!mac.verify(&seq, 22, 0xFEFD, b"fragment", &tag));
        assert!(!mac.verify(&seq, 23, 0xFEFF, b"fragment", &tag));
        assert!(!mac.verify(&seq, 23, 0xFEFD, b"tampered", &tag));
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        let mac = RecordHmac::new(b"record mac key");
        let seq = [0; 8];
        let tag = mac.compute(&seq, 23, 0xFEFD, b"fragment").expect("mac");
        assert!(!mac.verify(&seq, 23, 0xFEFD, b"fragment", &tag[..HMAC_SHA256_SIZE - 1]));
    }

    #[test]
    fn test_distinct_keys_disagree() {
        let first = RecordHmac::new(b"key one");
        let second = RecordHmac::new(b"key two");
        let seq = [0; 8];
        let tag = first.compute(&seq, 23, 0xFEFD, b"fragment").expect("mac");
        assert!(!second.verify(&seq, 23, 0xFEFD, b"fragment", &tag));
    }
}
