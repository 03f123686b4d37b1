//! # DRIFT Protocol
//!
//! **D**atagram **R**ecord **I**ntegrity with **F**iltered **T**ransitions
//!
//! DRIFT is a DTLS 1.0/1.2 record layer: it accepts datagrams carrying
//! DTLS records, authenticates them, defends against replay, buffers
//! records that run ahead of an epoch change, and surfaces exactly one
//! decrypted record per call. It also emits a single outbound record on
//! demand. It provides:
//!
//! - **Silent drop**: malformed, forged, replayed, stale, and
//!   wrong-version records are discarded without surfacing an error
//! - **Replay defense**: a 64-entry sliding window per epoch, checked
//!   before decryption and updated only after authentication
//! - **Epoch transitions**: next-epoch handshake records are buffered in
//!   sequence order and handed to the successor layer on teardown
//! - **Error quarantine**: diagnostics from processing junk never reach
//!   the caller
//!
//! The handshake state machine, key schedule, and certificates are out of
//! scope: key material arrives through [`RecordLayerBuilder`](record::RecordLayerBuilder)
//! and datagrams through the [`RecordTransport`](transport::RecordTransport)
//! trait.
//!
//! ## Modules
//!
//! - [`core`]: constants, error types, and the diagnostic sink
//! - [`record`]: the record layer itself
//! - [`crypto`]: record-protection seam and shipped cipher suites
//! - [`transport`]: datagram transport trait and adapters
//! - [`compress`]: negotiated payload compression
//!
//! ## Example
//!
//! ```
//! use drift_protocol::prelude::*;
//!
//! // An in-memory pipe stands in for the network.
//! let (client_end, server_end) = MemoryTransport::pair();
//!
//! let key = RecordKey::from_bytes([0x42; 32]);
//! let mut client = RecordLayerBuilder::new()
//!     .protocol_version(ProtocolVersion::Dtls1_2)
//!     .cipher(Box::new(ChaChaRecordCipher::new(&key, [0x17; 16])))
//!     .transport(Box::new(client_end))
//!     .build()?;
//! let mut server = RecordLayerBuilder::new()
//!     .protocol_version(ProtocolVersion::Dtls1_2)
//!     .cipher(Box::new(ChaChaRecordCipher::new(&key, [0x17; 16])))
//!     .transport(Box::new(server_end))
//!     .build()?;
//!
//! client.write_records(&[RecordTemplate {
//!     rtype: 23,
//!     version: 0xFEFD,
//!     payload: b"application data",
//! }])?;
//!
//! server.get_more_records()?;
//! let record = server.read_record().expect("one record is staged");
//! assert_eq!(record.data, b"application data");
//! server.release_record();
//! # Ok::<(), drift_protocol::RecordError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod compress;
pub mod core;
pub mod crypto;
pub mod record;
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::compress::{CompressionError, Compressor};
    pub use crate::core::{
        AlertDescription, CryptoError, Diagnostic, DiagnosticSink, FatalCause, RecordError,
        RecordResult,
    };
    pub use crate::crypto::{
        ChaChaRecordCipher, CipherMode, NullRecordCipher, OpenVerdict, RecordCipher, RecordHmac,
        RecordKey,
    };
    pub use crate::record::{
        ProtocolVersion, ReadState, RecordHeader, RecordLayer, RecordLayerBuilder, RecordTemplate,
        RecordView, ReplayWindow,
    };
    pub use crate::transport::{MemoryTransport, RecordTransport, UdpTransport};
}

// Re-export commonly used items at crate root
pub use crate::core::{AlertDescription, RecordError, RecordResult};
pub use crate::record::{ProtocolVersion, RecordLayer, RecordLayerBuilder, RecordTemplate, RecordView};
pub use crate::transport::RecordTransport;
