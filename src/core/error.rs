//! Error types for the DRIFT record layer.

use std::fmt;

use thiserror::Error;

/// TLS alert descriptions surfaced at the record-layer boundary.
///
/// Silent drops carry no alert at all; an alert is only raised for genuine
/// protocol violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDescription {
    /// A record failed MAC verification in a mode where that is fatal.
    BadRecordMac,
    /// A record exceeded a negotiated or protocol-fixed length bound.
    RecordOverflow,
    /// An authenticated record failed to decompress.
    DecompressionFailure,
    /// A record was structurally malformed past the point of silent drop.
    DecodeError,
    /// The layer itself failed (bad configuration, crypto backend error).
    InternalError,
}

impl AlertDescription {
    /// Wire code of the alert description.
    pub fn code(self) -> u8 {
        match self {
            Self::BadRecordMac => 20,
            Self::RecordOverflow => 22,
            Self::DecompressionFailure => 30,
            Self::DecodeError => 50,
            Self::InternalError => 80,
        }
    }
}

impl fmt::Display for AlertDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadRecordMac => "bad_record_mac",
            Self::RecordOverflow => "record_overflow",
            Self::DecompressionFailure => "decompression_failure",
            Self::DecodeError => "decode_error",
            Self::InternalError => "internal_error",
        };
        f.write_str(name)
    }
}

/// Detail accompanying a fatal alert, naming the violated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalCause {
    /// Ciphertext longer than the protocol maximum.
    EncryptedLengthTooLong,
    /// Record shorter than its own MAC.
    LengthTooShort,
    /// MAC verification failed.
    MacMismatch,
    /// Decryption failed and the cipher raised an alert.
    DecryptFailed,
    /// Authenticated plaintext exceeded the compressed-length bound.
    CompressedLengthTooLong,
    /// Authenticated record failed to decompress.
    BadDecompression,
    /// Compression of an outbound payload failed.
    CompressionFailure,
    /// Plaintext exceeded the maximum fragment length.
    DataLengthTooLong,
    /// Outbound payload exceeded the maximum plaintext length.
    PayloadTooLong,
    /// The 8-byte write sequence counter wrapped.
    SequenceWrapped,
    /// A write retry presented different arguments than the pending write.
    BadWriteRetry,
    /// DTLS accepts exactly one record template per write.
    BadTemplateCount,
    /// The layer was built without a transport.
    MissingTransport,
    /// The transport failed with a hard error.
    TransportFailure,
    /// A cipher or MAC backend failed.
    CryptoFailure,
    /// DTLS supports exactly one receive pipeline.
    PipeliningUnsupported,
}

impl fmt::Display for FatalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EncryptedLengthTooLong => "encrypted length too long",
            Self::LengthTooShort => "length too short",
            Self::MacMismatch => "mac mismatch",
            Self::DecryptFailed => "decryption failed",
            Self::CompressedLengthTooLong => "compressed length too long",
            Self::BadDecompression => "bad decompression",
            Self::CompressionFailure => "compression failure",
            Self::DataLengthTooLong => "data length too long",
            Self::PayloadTooLong => "payload too long",
            Self::SequenceWrapped => "sequence counter wrapped",
            Self::BadWriteRetry => "bad write retry",
            Self::BadTemplateCount => "exactly one record template required",
            Self::MissingTransport => "missing transport",
            Self::TransportFailure => "transport failure",
            Self::CryptoFailure => "crypto backend failure",
            Self::PipeliningUnsupported => "pipelining unsupported",
        };
        f.write_str(name)
    }
}

/// Outcome of a record-layer operation that did not complete normally.
///
/// `WantRead`/`WantWrite` are transient: the layer keeps its staging and the
/// same call can be retried once the transport is ready. `Fatal` ends the
/// connection; the alert is also latched on the layer for retrieval.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The transport has no datagram available right now.
    #[error("transport is not ready for reading")]
    WantRead,

    /// The transport cannot accept more bytes right now.
    #[error("transport is not ready for writing")]
    WantWrite,

    /// A fatal protocol violation; the connection must terminate.
    #[error("fatal alert {alert}: {cause}")]
    Fatal {
        /// The alert to send to the peer.
        alert: AlertDescription,
        /// The rule that was violated.
        cause: FatalCause,
    },
}

impl RecordError {
    /// True for the transient want-read/want-write outcomes.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::WantRead | Self::WantWrite)
    }
}

/// Errors raised by cipher and MAC backends.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Record encryption failed.
    #[error("record encryption failed")]
    SealFailed,

    /// MAC computation failed.
    #[error("mac computation failed")]
    MacFailed,
}

/// Convenience alias for record-layer results.
pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_codes() {
        assert_eq!(AlertDescription::BadRecordMac.code(), 20);
        assert_eq!(AlertDescription::RecordOverflow.code(), 22);
        assert_eq!(AlertDescription::DecompressionFailure.code(), 30);
        assert_eq!(AlertDescription::DecodeError.code(), 50);
        assert_eq!(AlertDescription::InternalError.code(), 80);
    }

    #[test]
    fn test_error_display() {
        let err = RecordError::Fatal {
            alert: AlertDescription::BadRecordMac,
            cause: FatalCause::MacMismatch,
        };
        assert_eq!(err.to_string(), "fatal alert bad_record_mac: mac mismatch");
        assert!(!err.is_transient());
        assert!(RecordError::WantRead.is_transient());
    }
}
