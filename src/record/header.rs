//! DTLS record header codec.
//!
//! The 13-byte header layout (all fields big-endian):
//!
//! ```text
//! [ type (1) | version (2) | epoch (2) | sequence (6) | length (2) ]
//! ```

use crate::core::{DTLS_HEADER_LEN, DTLS_VERSION_MAJOR, DTLS1_0_WIRE_VERSION, DTLS1_2_WIRE_VERSION, SEQ_NUM_LEN};

/// Negotiated protocol version, or the pre-negotiation wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    /// No version negotiated yet; accepts any DTLS minor version.
    #[default]
    Any,
    /// DTLS 1.0 (`0xFEFF`).
    Dtls1_0,
    /// DTLS 1.2 (`0xFEFD`).
    Dtls1_2,
}

impl ProtocolVersion {
    /// Wire encoding, or `None` for the wildcard.
    pub fn wire(self) -> Option<u16> {
        match self {
            Self::Any => None,
            Self::Dtls1_0 => Some(DTLS1_0_WIRE_VERSION),
            Self::Dtls1_2 => Some(DTLS1_2_WIRE_VERSION),
        }
    }

    /// Major version byte records must carry.
    pub fn major(self) -> u8 {
        match self {
            Self::Any | Self::Dtls1_0 | Self::Dtls1_2 => DTLS_VERSION_MAJOR,
        }
    }

    /// Decode a wire version into a known protocol version.
    pub fn from_wire(wire: u16) -> Option<Self> {
        match wire {
            DTLS1_0_WIRE_VERSION => Some(Self::Dtls1_0),
            DTLS1_2_WIRE_VERSION => Some(Self::Dtls1_2),
            _ => None,
        }
    }
}

/// Parsed 13-byte DTLS record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Content type byte.
    pub rtype: u8,
    /// Wire protocol version.
    pub version: u16,
    /// Epoch the record belongs to.
    pub epoch: u16,
    /// Per-epoch 48-bit sequence number, big-endian.
    pub seq: [u8; 6],
    /// Ciphertext length.
    pub length: u16,
}

impl RecordHeader {
    /// Parse a header from the first [`DTLS_HEADER_LEN`] bytes of `buf`.
    ///
    /// Only the layout is interpreted here; version and length gating is the
    /// receive driver's job.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < DTLS_HEADER_LEN {
            return None;
        }
        let mut seq = [0u8; 6];
        seq.copy_from_slice(&buf[5..11]);
        Some(Self {
            rtype: buf[0],
            version: u16::from_be_bytes([buf[1], buf[2]]),
            epoch: u16::from_be_bytes([buf[3], buf[4]]),
            seq,
            length: u16::from_be_bytes([buf[11], buf[12]]),
        })
    }

    /// Serialize the header into its 13-byte wire form.
    pub fn serialize(&self) -> [u8; DTLS_HEADER_LEN] {
        let mut buf = [0u8; DTLS_HEADER_LEN];
        buf[0] = self.rtype;
        buf[1..3].copy_from_slice(&self.version.to_be_bytes());
        buf[3..5].copy_from_slice(&self.epoch.to_be_bytes());
        buf[5..11].copy_from_slice(&self.seq);
        buf[11..13].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Full 8-byte sequence number: epoch followed by the 48-bit counter.
    pub fn seq_num(&self) -> [u8; SEQ_NUM_LEN] {
        let mut seq = [0u8; SEQ_NUM_LEN];
        seq[..2].copy_from_slice(&self.epoch.to_be_bytes());
        seq[2..].copy_from_slice(&self.seq);
        seq
    }
}

/// State of the record currently staged in the layer.
///
/// `length` tracks the live body length as the decrypt pipeline strips MACs
/// and tags; the payload always starts at [`DTLS_HEADER_LEN`] in the staged
/// packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordDescriptor {
    /// Content type byte.
    pub rtype: u8,
    /// Wire protocol version from the header.
    pub version: u16,
    /// Epoch the record belongs to.
    pub epoch: u16,
    /// Full 8-byte sequence number (epoch + counter).
    pub seq_num: [u8; SEQ_NUM_LEN],
    /// Current body length.
    pub length: usize,
}

impl RecordDescriptor {
    /// Build a descriptor for a freshly parsed header.
    pub fn from_header(header: &RecordHeader) -> Self {
        Self {
            rtype: header.rtype,
            version: header.version,
            epoch: header.epoch,
            seq_num: header.seq_num(),
            length: usize::from(header.length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CONTENT_TYPE_HANDSHAKE;

    #[test]
    fn test_parse_fields() {
        let bytes = hex::decode("16fefd0001000000000007000c").expect("valid hex");
        let header = RecordHeader::parse(&bytes).expect("13 bytes");
        assert_eq!(header.rtype, CONTENT_TYPE_HANDSHAKE);
        assert_eq!(header.version, 0xFEFD);
        assert_eq!(header.epoch, 1);
        assert_eq!(header.seq, [0, 0, 0, 0, 0, 7]);
        assert_eq!(header.length, 12);
        assert_eq!(header.seq_num(), [0, 1, 0, 0, 0, 0, 0, 7]);
    }

    #[test]
    fn test_parse_serialize_bijection() {
        let samples = [
            RecordHeader { rtype: 23, version: 0xFEFD, epoch: 0, seq: [0; 6], length: 0 },
            RecordHeader { rtype: 22, version: 0xFEFF, epoch: 1, seq: [0, 0, 0, 0, 1, 2], length: 512 },
            RecordHeader { rtype: 21, version: 0xFEFD, epoch: 0xFFFF, seq: [0xFF; 6], length: u16::MAX },
        ];
        for header in samples {
            let bytes = header.serialize();
            assert_eq!(RecordHeader::parse(&bytes), Some(header));
        }
    }

    #[test]
    fn test_parse_rejects_short_input() {
        assert!(RecordHeader::parse(&[0u8; DTLS_HEADER_LEN - 1]).is_none());
    }

    #[test]
    fn test_protocol_version_wire() {
        assert_eq!(ProtocolVersion::Dtls1_2.wire(), Some(0xFEFD));
        assert_eq!(ProtocolVersion::Dtls1_0.wire(), Some(0xFEFF));
        assert_eq!(ProtocolVersion::Any.wire(), None);
        assert_eq!(ProtocolVersion::from_wire(0xFEFD), Some(ProtocolVersion::Dtls1_2));
        assert_eq!(ProtocolVersion::from_wire(0x0303), None);
        assert_eq!(ProtocolVersion::Any.major(), 0xFE);
    }
}
