//! XChaCha20-Poly1305 record protection.
//!
//! The nonce is the 16-byte per-direction write IV followed by the record's
//! 8-byte sequence number, so every record in an epoch gets a distinct
//! nonce without anything extra on the wire. The AAD binds the header:
//!
//! ```text
//! [ seq_num (8) | type (1) | version (2) | length (2) ]
//! ```
//!
//! where `length` is the plaintext length.

use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    Tag, XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroize;

use crate::core::{
    AEAD_NONCE_SIZE, AEAD_TAG_SIZE, CryptoError, DiagnosticSink, RECORD_KEY_SIZE, SEQ_NUM_LEN,
    WRITE_IV_SIZE,
};

use super::cipher::{CipherMode, OpenVerdict, RecordCipher};

/// AAD length: sequence + type + version + length.
const AAD_SIZE: usize = 13;

/// A record protection key.
///
/// Zeroized on drop.
#[derive(Clone)]
pub struct RecordKey {
    key: [u8; RECORD_KEY_SIZE],
}

impl RecordKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(key: [u8; RECORD_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Raw key bytes.
    ///
    /// # Security
    /// Handle with care - this exposes sensitive key material.
    pub fn as_bytes(&self) -> &[u8; RECORD_KEY_SIZE] {
        &self.key
    }
}

impl Drop for RecordKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Build the 13-byte AAD binding the record header.
fn build_aad(seq: &[u8; SEQ_NUM_LEN], rtype: u8, version: u16, length: u16) -> [u8; AAD_SIZE] {
    let mut aad = [0u8; AAD_SIZE];
    aad[..8].copy_from_slice(seq);
    aad[8] = rtype;
    aad[9..11].copy_from_slice(&version.to_be_bytes());
    aad[11..13].copy_from_slice(&length.to_be_bytes());
    aad
}

/// XChaCha20-Poly1305 record cipher.
pub struct ChaChaRecordCipher {
    cipher: XChaCha20Poly1305,
    iv: [u8; WRITE_IV_SIZE],
}

impl ChaChaRecordCipher {
    /// Create a record cipher from a key and per-direction write IV.
    pub fn new(key: &RecordKey, iv: [u8; WRITE_IV_SIZE]) -> Self {
        Self { cipher: XChaCha20Poly1305::new(key.as_bytes().into()), iv }
    }

    fn nonce(&self, seq: &[u8; SEQ_NUM_LEN]) -> [u8; AEAD_NONCE_SIZE] {
        let mut nonce = [0u8; AEAD_NONCE_SIZE];
        nonce[..WRITE_IV_SIZE].copy_from_slice(&self.iv);
        nonce[WRITE_IV_SIZE..].copy_from_slice(seq);
        nonce
    }
}

impl RecordCipher for ChaChaRecordCipher {
    fn mode(&self) -> CipherMode {
        CipherMode::Aead
    }

    fn tag_len(&self) -> usize {
        AEAD_TAG_SIZE
    }

    fn open(
        &mut self,
        seq: &[u8; SEQ_NUM_LEN],
        rtype: u8,
        version: u16,
        body: &mut [u8],
        _mac_size: usize,
        diag: &mut DiagnosticSink,
    ) -> OpenVerdict {
        let tag_len = self.tag_len();
        if body.len() < tag_len {
            diag.record("aead", "ciphertext shorter than the tag");
            return OpenVerdict::Invalid { alert: None };
        }
        let len = body.len() - tag_len;
        let nonce = self.nonce(seq);
        let aad = build_aad(seq, rtype, version, len as u16);
        let (ciphertext, tag) = body.split_at_mut(len);

        match self.cipher.decrypt_in_place_detached(
            XNonce::from_slice(&nonce),
            &aad,
            ciphertext,
            Tag::from_slice(tag),
        ) {
            Ok(()) => OpenVerdict::Plaintext { len, mac: None },
            Err(_) => {
                diag.record("aead", "authentication failed");
                OpenVerdict::Invalid { alert: None }
            }
        }
    }

    fn seal(
        &mut self,
        seq: &[u8; SEQ_NUM_LEN],
        rtype: u8,
        version: u16,
        buf: &mut Vec<u8>,
        body_start: usize,
        diag: &mut DiagnosticSink,
    ) -> Result<(), CryptoError> {
        let len = buf.len() - body_start;
        if len > usize::from(u16::MAX) {
            diag.record("aead", "plaintext too long to seal");
            return Err(CryptoError::SealFailed);
        }
        let nonce = self.nonce(seq);
        let aad = build_aad(seq, rtype, version, len as u16);

        match self.cipher.encrypt_in_place_detached(
            XNonce::from_slice(&nonce),
            &aad,
            &mut buf[body_start..],
        ) {
            Ok(tag) => {
                buf.extend_from_slice(&tag);
                Ok(())
            }
            Err(_) => {
                diag.record("aead", "encryption failed");
                Err(CryptoError::SealFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> ChaChaRecordCipher {
        ChaChaRecordCipher::new(&RecordKey::from_bytes([0x42; RECORD_KEY_SIZE]), [0x17; WRITE_IV_SIZE])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let mut sealer = cipher();
        let mut opener = cipher();
        let mut diag = DiagnosticSink::new();
        let seq = [0, 0, 0, 0, 0, 0, 0, 9];

        let mut buf = b"hello records".to_vec();
        sealer.seal(&seq, 23, 0xFEFD, &mut buf, 0, &mut diag).expect("seal");
        assert_eq!(buf.len(), 13 + AEAD_TAG_SIZE);

        let verdict = opener.open(&seq, 23, 0xFEFD, &mut buf, 0, &mut diag);
        match verdict {
            OpenVerdict::Plaintext { len, mac: None } => {
                assert_eq!(&buf[..len], b"hello records");
            }
            _ => panic!("round trip must succeed"),
        }
        assert!(diag.is_empty());
    }

    #[test]
    fn test_open_rejects_corrupted_tag() {
        let mut sealer = cipher();
        let mut opener = cipher();
        let mut diag = DiagnosticSink::new();
        let seq = [0; 8];

        let mut buf = b"payload".to_vec();
        sealer.seal(&seq, 23, 0xFEFD, &mut buf, 0, &mut diag).expect("seal");
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;

        let verdict = opener.open(&seq, 23, 0xFEFD, &mut buf, 0, &mut diag);
        assert!(matches!(verdict, OpenVerdict::Invalid { alert: None }));
        assert!(!diag.is_empty());
    }

    #[test]
    fn test_open_binds_header_fields() {
        let mut sealer = cipher();
        let mut opener = cipher();
        let mut diag = DiagnosticSink::new();
        let seq = [0; 8];

        let mut buf = b"payload".to_vec();
        sealer.seal(&seq, 23, 0xFEFD, &mut buf, 0, &mut diag).expect("seal");

        // Same bytes presented under a different content type must fail.
        let verdict = opener.open(&seq, 22, 0xFEFD, &mut buf, 0, &mut diag);
        assert!(matches!(verdict, OpenVerdict::Invalid { alert: None }));
    }

    #[test]
    fn test_open_rejects_truncated_record() {
        let mut opener = cipher();
        let mut diag = DiagnosticSink::new();
        let mut short = vec![0u8; AEAD_TAG_SIZE - 1];
        let verdict = opener.open(&[0; 8], 23, 0xFEFD, &mut short, 0, &mut diag);
        assert!(matches!(verdict, OpenVerdict::Invalid { alert: None }));
    }

    #[test]
    fn test_distinct_sequences_produce_distinct_ciphertext() {
        let mut sealer = cipher();
        let mut diag = DiagnosticSink::new();

        let mut first = b"same plaintext".to_vec();
        sealer.seal(&[0, 0, 0, 0, 0, 0, 0, 1], 23, 0xFEFD, &mut first, 0, &mut diag).expect("seal");
        let mut second = b"same plaintext".to_vec();
        sealer.seal(&[0, 0, 0, 0, 0, 0, 0, 2], 23, 0xFEFD, &mut second, 0, &mut diag).expect("seal");

        assert_ne!(first, second);
    }
}
