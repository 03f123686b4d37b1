//! Record-layer constants.
//!
//! These values are fixed by the DTLS 1.0/1.2 wire format and MUST NOT be
//! changed.

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// DTLS record header length (type + version + epoch + sequence + length).
pub const DTLS_HEADER_LEN: usize = 13;

/// Full sequence number length (2-byte epoch + 6-byte per-epoch counter).
pub const SEQ_NUM_LEN: usize = 8;

/// Content type: change_cipher_spec.
pub const CONTENT_TYPE_CHANGE_CIPHER_SPEC: u8 = 20;

/// Content type: alert.
pub const CONTENT_TYPE_ALERT: u8 = 21;

/// Content type: handshake.
pub const CONTENT_TYPE_HANDSHAKE: u8 = 22;

/// Content type: application_data.
pub const CONTENT_TYPE_APPLICATION_DATA: u8 = 23;

/// DTLS 1.0 wire version.
pub const DTLS1_0_WIRE_VERSION: u16 = 0xFEFF;

/// DTLS 1.2 wire version.
pub const DTLS1_2_WIRE_VERSION: u16 = 0xFEFD;

/// Major version byte shared by every DTLS version.
pub const DTLS_VERSION_MAJOR: u8 = 0xFE;

// =============================================================================
// RECORD SIZE LIMITS
// =============================================================================

/// Maximum plaintext fragment length.
pub const MAX_PLAIN_LENGTH: usize = 16384;

/// Maximum growth allowed by compression.
pub const MAX_COMPRESSED_OVERHEAD: usize = 1024;

/// Maximum compressed fragment length.
pub const MAX_COMPRESSED_LENGTH: usize = MAX_PLAIN_LENGTH + MAX_COMPRESSED_OVERHEAD;

/// Maximum growth allowed by record protection (IV, MAC, tag, padding).
pub const MAX_ENCRYPTED_OVERHEAD: usize = 256 + MAX_COMPRESSED_OVERHEAD;

/// Maximum ciphertext fragment length.
pub const MAX_ENCRYPTED_LENGTH: usize = MAX_COMPRESSED_LENGTH + MAX_ENCRYPTED_OVERHEAD;

/// Largest datagram the receive buffer must be able to hold.
pub const MAX_DATAGRAM_LENGTH: usize = DTLS_HEADER_LEN + MAX_ENCRYPTED_LENGTH;

// =============================================================================
// REPLAY / BUFFERING LIMITS
// =============================================================================

/// Width of the sliding replay window in record slots.
pub const REPLAY_WINDOW_BITS: u32 = 64;

/// Cap on each deferred-record queue, bounding memory against floods.
pub const DEFERRED_QUEUE_CAP: usize = 100;

// =============================================================================
// RECORD PROTECTION
// =============================================================================

/// Record cipher key size (XChaCha20-Poly1305).
pub const RECORD_KEY_SIZE: usize = 32;

/// Per-direction write IV size mixed into every nonce.
pub const WRITE_IV_SIZE: usize = 16;

/// Poly1305 authentication tag size.
pub const AEAD_TAG_SIZE: usize = 16;

/// XChaCha20 nonce size (write IV followed by the record sequence).
pub const AEAD_NONCE_SIZE: usize = 24;

/// HMAC-SHA256 output size for legacy MAC modes.
pub const HMAC_SHA256_SIZE: usize = 32;

/// Explicit nonce length carried on the wire by GCM/CCM-style ciphers.
pub const EXPLICIT_NONCE_LEN: usize = 8;
