//! Record protection: the cipher seam and the shipped suites.
//!
//! The record layer consumes cryptographic contexts through the
//! [`RecordCipher`] trait and the [`RecordHmac`] MAC; it never constructs
//! key material itself. Shipped implementations:
//!
//! - [`ChaChaRecordCipher`]: XChaCha20-Poly1305 AEAD
//! - [`NullRecordCipher`]: identity transform for the MAC-only ETM/MTE modes
//! - [`RecordHmac`]: HMAC-SHA256 with constant-time verification

mod aead;
mod cipher;
mod mac;

pub use aead::{ChaChaRecordCipher, RecordKey};
pub use cipher::{CipherMode, NullRecordCipher, OpenVerdict, RecordCipher};
pub use mac::RecordHmac;
