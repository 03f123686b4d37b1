//! Record cipher abstraction.
//!
//! The record layer drives ciphers through [`RecordCipher`] and never looks
//! inside them. Decryption and encryption both operate **in place**: the
//! input and output are backed by the same storage, and every
//! implementation must support that aliasing.

use crate::core::{AlertDescription, CryptoError, DiagnosticSink, EXPLICIT_NONCE_LEN, SEQ_NUM_LEN};

/// How a cipher shapes the record body on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    /// Stream or null transform; no per-record IV material.
    Stream,
    /// CBC block cipher carrying an explicit IV of the block length.
    Cbc {
        /// Cipher block IV length.
        iv_len: usize,
    },
    /// AEAD with an explicit 8-byte nonce on the wire (GCM/CCM style).
    AeadExplicitNonce,
    /// AEAD deriving the whole nonce from layer state; nothing on the wire.
    Aead,
}

impl CipherMode {
    /// Bytes of explicit IV/nonce this mode writes ahead of the ciphertext.
    ///
    /// CBC IVs of a single byte or less are not carried explicitly.
    pub fn explicit_iv_len(self) -> usize {
        match self {
            Self::Stream | Self::Aead => 0,
            Self::Cbc { iv_len } => if iv_len <= 1 { 0 } else { iv_len },
            Self::AeadExplicitNonce => EXPLICIT_NONCE_LEN,
        }
    }
}

/// Outcome of an in-place decryption attempt.
#[derive(Debug)]
pub enum OpenVerdict {
    /// The record is publicly invalid, the cipher failed internally, or an
    /// AEAD/encrypt-then-MAC check failed. `alert` is set only when the
    /// failure is a genuine protocol violation; `None` means silent drop.
    Invalid {
        /// Alert raised by the cipher, if any.
        alert: Option<AlertDescription>,
    },
    /// The body was transformed in place. For MAC-then-encrypt ciphers this
    /// is returned even when padding was bad: `mac` then holds a randomized
    /// value so the caller's constant-time MAC comparison fails without a
    /// timing oracle. `len` is the body length after stripping IV/tag/MAC.
    Plaintext {
        /// Body length after the transform.
        len: usize,
        /// Trailing MAC extracted from the plaintext (MAC-then-encrypt only).
        mac: Option<Vec<u8>>,
    },
}

/// In-place record protection.
///
/// `seq` is always the full 8-byte sequence number (epoch + counter) of the
/// record being transformed; `rtype` and `version` come from the record
/// header and are bound into the transform (AAD, MAC input) so header
/// tampering is detected.
pub trait RecordCipher {
    /// Wire shape of this cipher.
    fn mode(&self) -> CipherMode;

    /// Authentication tag bytes appended to the ciphertext, if any.
    fn tag_len(&self) -> usize;

    /// Decrypt `body` in place.
    ///
    /// `body` is the received record body: explicit IV first (if the mode
    /// carries one), then ciphertext, then tag. The implementation strips
    /// all three, leaves the plaintext at the start of the slice, and
    /// returns its length. The caller has already rejected bodies shorter
    /// than `mode().explicit_iv_len() + tag_len()`.
    ///
    /// `mac_size` is non-zero only for MAC-then-encrypt, where the cipher
    /// must strip and hand back the trailing MAC. Implementations record
    /// failure detail into `diag`; the pipeline quarantines those events
    /// when it decides to drop the record silently.
    fn open(
        &mut self,
        seq: &[u8; SEQ_NUM_LEN],
        rtype: u8,
        version: u16,
        body: &mut [u8],
        mac_size: usize,
        diag: &mut DiagnosticSink,
    ) -> OpenVerdict;

    /// Encrypt the staged record body in place.
    ///
    /// The caller has reserved the first `mode().explicit_iv_len()` bytes
    /// of `buf[body_start..]` for the explicit IV; the implementation fills
    /// them, encrypts the rest of `buf[body_start..]` in place (growing the
    /// buffer if the mode pads), and appends any tag.
    fn seal(
        &mut self,
        seq: &[u8; SEQ_NUM_LEN],
        rtype: u8,
        version: u16,
        buf: &mut Vec<u8>,
        body_start: usize,
        diag: &mut DiagnosticSink,
    ) -> Result<(), CryptoError>;
}

/// Identity transform for MAC-only protection.
///
/// Pairs with a record MAC to form the legacy ETM/MTE modes: bytes pass
/// through unchanged, and in MAC-then-encrypt mode the trailing MAC is
/// extracted for the layer to verify.
#[derive(Debug, Default)]
pub struct NullRecordCipher;

impl NullRecordCipher {
    /// Create the identity cipher.
    pub fn new() -> Self {
        Self
    }
}

impl RecordCipher for NullRecordCipher {
    fn mode(&self) -> CipherMode {
        CipherMode::Stream
    }

    fn tag_len(&self) -> usize {
        0
    }

    fn open(
        &mut self,
        _seq: &[u8; SEQ_NUM_LEN],
        _rtype: u8,
        _version: u16,
        body: &mut [u8],
        mac_size: usize,
        diag: &mut DiagnosticSink,
    ) -> OpenVerdict {
        if mac_size > body.len() {
            diag.record("null-cipher", "record shorter than its MAC");
            return OpenVerdict::Invalid { alert: None };
        }
        let len = body.len() - mac_size;
        let mac = (mac_size > 0).then(|| body[len..].to_vec());
        OpenVerdict::Plaintext { len, mac }
    }

    fn seal(
        &mut self,
        _seq: &[u8; SEQ_NUM_LEN],
        _rtype: u8,
        _version: u16,
        _buf: &mut Vec<u8>,
        _body_start: usize,
        _diag: &mut DiagnosticSink,
    ) -> Result<(), CryptoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_iv_lengths() {
        assert_eq!(CipherMode::Stream.explicit_iv_len(), 0);
        assert_eq!(CipherMode::Aead.explicit_iv_len(), 0);
        assert_eq!(CipherMode::AeadExplicitNonce.explicit_iv_len(), 8);
        assert_eq!(CipherMode::Cbc { iv_len: 16 }.explicit_iv_len(), 16);
        assert_eq!(CipherMode::Cbc { iv_len: 1 }.explicit_iv_len(), 0);
    }

    #[test]
    fn test_null_cipher_extracts_trailing_mac() {
        let mut cipher = NullRecordCipher::new();
        let mut diag = DiagnosticSink::new();
        let mut body = b"payload\xAA\xBB".to_vec();

        let verdict = cipher.open(&[0; 8], 23, 0xFEFD, &mut body, 2, &mut diag);
        match verdict {
            OpenVerdict::Plaintext { len, mac } => {
                assert_eq!(len, 7);
                assert_eq!(mac.as_deref(), Some(&[0xAA, 0xBB][..]));
            }
            OpenVerdict::Invalid { .. } => panic!("null cipher must pass bytes through"),
        }
    }

    #[test]
    fn test_null_cipher_rejects_short_record() {
        let mut cipher = NullRecordCipher::new();
        let mut diag = DiagnosticSink::new();
        let mut body = vec![0u8; 3];

        let verdict = cipher.open(&[0; 8], 23, 0xFEFD, &mut body, 8, &mut diag);
        assert!(matches!(verdict, OpenVerdict::Invalid { alert: None }));
        assert!(!diag.is_empty());
    }
}
