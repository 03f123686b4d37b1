//! Single-record transmit path.
//!
//! Builds one outbound record: header, optional compression, MAC and
//! cipher in the negotiated order, sequence bump, then one datagram to the
//! transport. DTLS writes exactly one record per call.
//!
//! A partial transport write retains the unsent tail for a retry, and the
//! retry must present the same arguments it originally did. A hard
//! transport failure instead drops the staged datagram - losing it is the
//! whole point of running over a datagram service.

use tracing::trace;

use crate::core::{
    AlertDescription, FatalCause, RecordError, RecordResult, DTLS_HEADER_LEN, MAX_PLAIN_LENGTH,
};

use super::layer::RecordLayer;
use super::seq;

/// One outbound record to build and send.
#[derive(Debug, Clone, Copy)]
pub struct RecordTemplate<'a> {
    /// Content type byte.
    pub rtype: u8,
    /// Wire protocol version to stamp into the header.
    pub version: u16,
    /// Plaintext payload.
    pub payload: &'a [u8],
}

impl RecordLayer {
    /// Build and send one record.
    ///
    /// DTLS accepts exactly one template per call. Returns the number of
    /// payload bytes consumed; [`RecordError::WantWrite`] means the
    /// transport was not ready and the call should be repeated with the
    /// same arguments once it is.
    pub fn write_records(&mut self, templates: &[RecordTemplate<'_>]) -> RecordResult<usize> {
        let [template] = templates else {
            return Err(self.fatal(AlertDescription::InternalError, FatalCause::BadTemplateCount));
        };

        // A pending partial write must be finished before a new record may
        // be built, and the retry has to match what was originally staged.
        if self.write_left() > 0 {
            if self.wpend_tot > template.payload.len()
                || (!self.accept_moving_write_buffer
                    && template.payload.as_ptr() as usize != self.wpend_buf)
                || template.rtype != self.wpend_type
            {
                return Err(self.fatal(AlertDescription::InternalError, FatalCause::BadWriteRetry));
            }
            return self.flush_pending();
        }

        if template.payload.len() > MAX_PLAIN_LENGTH {
            return Err(self.fatal(AlertDescription::RecordOverflow, FatalCause::PayloadTooLong));
        }

        // Sequence snapshot for this record; the header, MAC, and nonce all
        // see the same bytes.
        let seq_num = self.write_sequence;

        // Header: type and version now, epoch/sequence/length once the
        // final ciphertext length is known.
        self.wbuf.clear();
        self.wbuf.push(template.rtype);
        self.wbuf.extend_from_slice(&template.version.to_be_bytes());
        self.wbuf.extend_from_slice(&[0u8; 10]);
        let body_start = DTLS_HEADER_LEN;

        // Explicit IV: CBC modes carry their block IV on the wire, the
        // GCM/CCM-style modes an 8-byte nonce. The region is reserved here,
        // ahead of the payload, and filled by the cipher during seal; it
        // counts toward the record length.
        let eivlen = self.cipher.as_ref().map_or(0, |c| c.mode().explicit_iv_len());
        self.wbuf.resize(DTLS_HEADER_LEN + eivlen, 0);

        // Compress, or carry the payload as-is.
        let deflated = self.compressor.as_ref().map(|c| c.compress(template.payload));
        match deflated {
            Some(Ok(bytes)) => self.wbuf.extend_from_slice(&bytes),
            Some(Err(_)) => {
                return Err(self.fatal(AlertDescription::InternalError, FatalCause::CompressionFailure));
            }
            None => self.wbuf.extend_from_slice(template.payload),
        }

        // MAC-then-encrypt: the MAC covers the plaintext (not the explicit
        // IV) and goes under the cipher.
        if !self.use_etm {
            if let Some(mac) = &self.mac {
                let Ok(tag) = mac.compute(
                    &seq_num,
                    template.rtype,
                    template.version,
                    &self.wbuf[body_start + eivlen..],
                ) else {
                    return Err(self.fatal(AlertDescription::InternalError, FatalCause::CryptoFailure));
                };
                self.wbuf.extend_from_slice(&tag);
            }
        }

        if let Some(cipher) = self.cipher.as_mut() {
            if cipher
                .seal(
                    &seq_num,
                    template.rtype,
                    template.version,
                    &mut self.wbuf,
                    body_start,
                    &mut self.diag,
                )
                .is_err()
            {
                return Err(self.fatal(AlertDescription::InternalError, FatalCause::CryptoFailure));
            }
        }

        // Encrypt-then-MAC: the MAC covers the explicit IV and ciphertext.
        if self.use_etm {
            if let Some(mac) = &self.mac {
                let Ok(tag) = mac.compute(
                    &seq_num,
                    template.rtype,
                    template.version,
                    &self.wbuf[body_start..],
                ) else {
                    return Err(self.fatal(AlertDescription::InternalError, FatalCause::CryptoFailure));
                };
                self.wbuf.extend_from_slice(&tag);
            }
        }

        let length = self.wbuf.len() - body_start;
        if length > usize::from(u16::MAX) {
            self.drop_staged_write();
            return Err(self.fatal(AlertDescription::InternalError, FatalCause::EncryptedLengthTooLong));
        }
        self.wbuf[3..5].copy_from_slice(&self.epoch.to_be_bytes());
        self.wbuf[5..11].copy_from_slice(&seq_num[2..]);
        self.wbuf[11..13].copy_from_slice(&(length as u16).to_be_bytes());

        if !seq::increment(&mut self.write_sequence) {
            self.drop_staged_write();
            return Err(self.fatal(AlertDescription::InternalError, FatalCause::SequenceWrapped));
        }

        // Memorize the arguments so a retry after a partial write can be
        // validated.
        self.wbuf_offset = 0;
        self.wpend_tot = template.payload.len();
        self.wpend_buf = template.payload.as_ptr() as usize;
        self.wpend_type = template.rtype;
        self.wpend_ret = template.payload.len();

        trace!(length, rtype = template.rtype, "record sealed");
        self.flush_pending()
    }

    /// True if a partially written record is staged.
    pub fn write_pending(&self) -> bool {
        self.write_left() > 0
    }

    fn write_left(&self) -> usize {
        self.wbuf.len() - self.wbuf_offset
    }

    /// Push the staged datagram to the transport.
    ///
    /// A short write keeps the unsent tail for a retry. A not-ready or
    /// failed transport drops the datagram: it is lost by design, exactly
    /// as if the network had eaten it.
    fn flush_pending(&mut self) -> RecordResult<usize> {
        while self.write_left() > 0 {
            match self.transport.send(&self.wbuf[self.wbuf_offset..]) {
                Ok(n) if n >= self.write_left() => break,
                Ok(0) => {
                    self.drop_staged_write();
                    return Err(RecordError::WantWrite);
                }
                Ok(n) => {
                    self.wbuf_offset += n;
                    return Err(RecordError::WantWrite);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    self.drop_staged_write();
                    return Err(RecordError::WantWrite);
                }
                Err(_) => {
                    self.drop_staged_write();
                    return Err(self.fatal(AlertDescription::InternalError, FatalCause::TransportFailure));
                }
            }
        }
        self.wbuf.clear();
        self.wbuf_offset = 0;
        Ok(self.wpend_ret)
    }

    fn drop_staged_write(&mut self) {
        self.wbuf.clear();
        self.wbuf_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::core::{CONTENT_TYPE_APPLICATION_DATA, CONTENT_TYPE_HANDSHAKE, DTLS1_2_WIRE_VERSION};
    use crate::record::layer::RecordLayerBuilder;
    use crate::record::header::ProtocolVersion;
    use crate::transport::{MemoryTransport, RecordTransport};

    /// Transport that accepts at most `chunk` bytes per send.
    struct ChokedTransport {
        chunk: usize,
    }

    impl RecordTransport for ChokedTransport {
        fn recv(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::WouldBlock.into())
        }

        fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len().min(self.chunk))
        }
    }

    /// Transport whose send never becomes ready.
    struct BlockedTransport;

    impl RecordTransport for BlockedTransport {
        fn recv(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::WouldBlock.into())
        }

        fn send(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::WouldBlock.into())
        }
    }

    fn plain_layer(transport: Box<dyn RecordTransport>, moving: bool) -> crate::record::layer::RecordLayer {
        RecordLayerBuilder::new()
            .protocol_version(ProtocolVersion::Dtls1_2)
            .accept_moving_write_buffer(moving)
            .transport(transport)
            .build()
            .expect("layer builds")
    }

    fn template(payload: &[u8]) -> [RecordTemplate<'_>; 1] {
        [RecordTemplate {
            rtype: CONTENT_TYPE_APPLICATION_DATA,
            version: DTLS1_2_WIRE_VERSION,
            payload,
        }]
    }

    #[test]
    fn test_header_layout_and_sequence_bump() {
        let transport = MemoryTransport::new();
        let tap = transport.clone();
        let mut layer = plain_layer(Box::new(transport), false);

        assert_eq!(layer.write_records(&template(b"abc")).expect("write"), 3);
        assert_eq!(layer.write_records(&template(b"defg")).expect("write"), 4);

        let first = tap.take_outgoing().expect("datagram out");
        assert_eq!(first[0], CONTENT_TYPE_APPLICATION_DATA);
        assert_eq!(&first[1..3], &DTLS1_2_WIRE_VERSION.to_be_bytes());
        assert_eq!(&first[3..5], &[0, 0]); // epoch
        assert_eq!(&first[5..11], &[0, 0, 0, 0, 0, 0]); // sequence 0
        assert_eq!(&first[11..13], &3u16.to_be_bytes());
        assert_eq!(&first[13..], b"abc");

        let second = tap.take_outgoing().expect("datagram out");
        assert_eq!(&second[5..11], &[0, 0, 0, 0, 0, 1]); // sequence 1
        assert_eq!(&second[13..], b"defg");
    }

    #[test]
    fn test_exactly_one_template_required() {
        let mut layer = plain_layer(Box::new(MemoryTransport::new()), false);
        let err = layer.write_records(&[]).expect_err("no template");
        assert!(matches!(err, RecordError::Fatal { .. }));

        let pair = [template(b"a")[0], template(b"b")[0]];
        let err = layer.write_records(&pair).expect_err("two templates");
        assert!(matches!(err, RecordError::Fatal { .. }));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut layer = plain_layer(Box::new(MemoryTransport::new()), false);
        let big = vec![0u8; MAX_PLAIN_LENGTH + 1];
        let err = layer.write_records(&template(&big)).expect_err("too long");
        assert!(matches!(
            err,
            RecordError::Fatal { alert: AlertDescription::RecordOverflow, .. }
        ));
    }

    #[test]
    fn test_partial_write_retry_completes() {
        let mut layer = plain_layer(Box::new(ChokedTransport { chunk: 5 }), false);
        let payload = b"twelve bytes";
        let templates = template(payload);

        let mut attempts = 0;
        let written = loop {
            match layer.write_records(&templates) {
                Ok(n) => break n,
                Err(RecordError::WantWrite) => {
                    assert!(layer.write_pending());
                    attempts += 1;
                    assert!(attempts < 10, "retry must converge");
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        };
        assert_eq!(written, payload.len());
        assert!(!layer.write_pending());
    }

    #[test]
    fn test_bad_write_retry_is_fatal() {
        let mut layer = plain_layer(Box::new(ChokedTransport { chunk: 5 }), false);
        let payload = b"twelve bytes";
        assert!(matches!(
            layer.write_records(&template(payload)),
            Err(RecordError::WantWrite)
        ));

        // Same buffer, different content type.
        let err = layer
            .write_records(&[RecordTemplate {
                rtype: CONTENT_TYPE_HANDSHAKE,
                version: DTLS1_2_WIRE_VERSION,
                payload,
            }])
            .expect_err("type changed between retries");
        assert!(matches!(err, RecordError::Fatal { .. }));
    }

    #[test]
    fn test_moved_buffer_rejected_unless_enabled() {
        let payload = b"twelve bytes".to_vec();
        let relocated = payload.clone();

        let mut strict = plain_layer(Box::new(ChokedTransport { chunk: 5 }), false);
        assert!(matches!(
            strict.write_records(&template(&payload)),
            Err(RecordError::WantWrite)
        ));
        let err = strict
            .write_records(&template(&relocated))
            .expect_err("buffer moved between retries");
        assert!(matches!(err, RecordError::Fatal { .. }));

        let mut moving = plain_layer(Box::new(ChokedTransport { chunk: 5 }), true);
        assert!(matches!(
            moving.write_records(&template(&payload)),
            Err(RecordError::WantWrite)
        ));
        let mut attempts = 0;
        loop {
            match moving.write_records(&template(&relocated)) {
                Ok(n) => {
                    assert_eq!(n, relocated.len());
                    break;
                }
                Err(RecordError::WantWrite) => {
                    attempts += 1;
                    assert!(attempts < 10, "retry must converge");
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }

    #[test]
    fn test_blocked_transport_drops_datagram() {
        let mut layer = plain_layer(Box::new(BlockedTransport), false);
        assert!(matches!(
            layer.write_records(&template(b"lost to the void")),
            Err(RecordError::WantWrite)
        ));
        // The datagram is gone, as a datagram service would lose it.
        assert!(!layer.write_pending());
    }

    #[test]
    fn test_sequence_wrap_is_fatal() {
        let transport = MemoryTransport::new();
        let mut layer = plain_layer(Box::new(transport), false);
        layer.write_sequence = [0xFF; 8];

        let err = layer.write_records(&template(b"last straw")).expect_err("wrapped");
        assert!(matches!(
            err,
            RecordError::Fatal { cause: FatalCause::SequenceWrapped, .. }
        ));
        assert_eq!(layer.alert_code(), Some(80));
    }
}
