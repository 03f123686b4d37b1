//! The DTLS record layer.
//!
//! One [`RecordLayer`] instance serves one epoch generation of one
//! half-connection. The receive driver pulls datagrams from the transport,
//! parses and routes records, runs the replay check, decrypts, and stages
//! exactly one plaintext record per successful call. Structurally bad,
//! unauthenticated, duplicate, stale, and wrong-version records are
//! silently discarded and the driver keeps going; the caller never sees
//! them.
//!
//! The layer is single-threaded and caller-driven. The only suspension
//! points are the transport itself: a non-blocking transport surfaces
//! want-read / want-write, and the staged state survives so the same call
//! resumes where it left off.

use tracing::{debug, trace};

use crate::compress::Compressor;
use crate::core::{
    AlertDescription, DiagnosticSink, FatalCause, RecordError, RecordResult, Diagnostic,
    CONTENT_TYPE_ALERT, CONTENT_TYPE_HANDSHAKE, DTLS_HEADER_LEN, MAX_COMPRESSED_LENGTH,
    MAX_DATAGRAM_LENGTH, MAX_ENCRYPTED_LENGTH, MAX_ENCRYPTED_OVERHEAD, MAX_PLAIN_LENGTH,
    SEQ_NUM_LEN,
};
use crate::crypto::{OpenVerdict, RecordCipher, RecordHmac};
use crate::transport::RecordTransport;

use super::header::{ProtocolVersion, RecordDescriptor, RecordHeader};
use super::queue::{BufferedRecord, DeferredQueue};
use super::window::ReplayWindow;

/// Parsing state of the staged record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Waiting for (more of) a 13-byte record header.
    ReadHeader,
    /// Header parsed; waiting for the record body.
    ReadBody,
}

/// Which replay window a record was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Route {
    /// The record belongs to the current epoch.
    Current,
    /// The record belongs to the prospective next epoch.
    Next,
}

/// Outcome of the decrypt/authenticate pipeline.
enum Processed {
    /// The record authenticated and is staged for the caller.
    Accepted,
    /// The record failed verification and must be silently discarded.
    Dropped,
}

/// Borrowed view of the staged decrypted record.
#[derive(Debug)]
pub struct RecordView<'a> {
    /// Content type byte.
    pub rtype: u8,
    /// Wire protocol version from the record header.
    pub version: u16,
    /// Epoch the record belongs to.
    pub epoch: u16,
    /// Full 8-byte sequence number (epoch + counter).
    pub seq_num: [u8; SEQ_NUM_LEN],
    /// Decrypted record payload.
    pub data: &'a [u8],
}

/// A DTLS record layer instance for one epoch generation.
pub struct RecordLayer {
    pub(super) transport: Box<dyn RecordTransport>,
    pub(super) next: Option<Box<dyn RecordTransport>>,

    pub(super) epoch: u16,
    /// Read-side sequence staging: epoch in the top 2 bytes, the current
    /// record's 48-bit counter below. Feeds the replay check, MAC and nonce.
    pub(super) sequence: [u8; SEQ_NUM_LEN],
    /// Write-side counter in the same layout, incremented per record.
    pub(super) write_sequence: [u8; SEQ_NUM_LEN],

    pub(super) bitmap: ReplayWindow,
    pub(super) next_bitmap: ReplayWindow,
    pub(super) unprocessed_rcds: DeferredQueue,
    pub(super) processed_rcds: DeferredQueue,

    /// Current datagram, and how much of it has been consumed.
    pub(super) read_buffer: Vec<u8>,
    pub(super) read_len: usize,
    pub(super) read_pos: usize,
    /// Bytes of the record being assembled (header plus body).
    pub(super) packet: Vec<u8>,
    pub(super) rrec: RecordDescriptor,
    pub(super) num_recs: usize,
    pub(super) rstate: ReadState,

    pub(super) in_init: bool,
    pub(super) version: ProtocolVersion,
    pub(super) is_first_record: bool,
    pub(super) max_frag_len: usize,
    pub(super) alert: Option<AlertDescription>,
    pub(super) diag: DiagnosticSink,

    pub(super) cipher: Option<Box<dyn RecordCipher>>,
    pub(super) mac: Option<RecordHmac>,
    pub(super) use_etm: bool,
    pub(super) compressor: Option<Compressor>,

    /// Write staging and pending-retry bookkeeping.
    pub(super) wbuf: Vec<u8>,
    pub(super) wbuf_offset: usize,
    pub(super) wpend_tot: usize,
    pub(super) wpend_buf: usize,
    pub(super) wpend_type: u8,
    pub(super) wpend_ret: usize,
    pub(super) accept_moving_write_buffer: bool,

    pub(super) flushed: bool,
}

/// Builder for [`RecordLayer`].
pub struct RecordLayerBuilder {
    epoch: u16,
    version: ProtocolVersion,
    in_init: bool,
    first_handshake: bool,
    max_frag_len: usize,
    use_etm: bool,
    accept_moving_write_buffer: bool,
    cipher: Option<Box<dyn RecordCipher>>,
    mac: Option<RecordHmac>,
    compressor: Option<Compressor>,
    transport: Option<Box<dyn RecordTransport>>,
    next: Option<Box<dyn RecordTransport>>,
}

impl Default for RecordLayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordLayerBuilder {
    /// Start a builder with defaults: epoch 0, no protection, handshake in
    /// progress, wildcard protocol version.
    pub fn new() -> Self {
        Self {
            epoch: 0,
            version: ProtocolVersion::Any,
            in_init: true,
            first_handshake: false,
            max_frag_len: MAX_PLAIN_LENGTH,
            use_etm: false,
            accept_moving_write_buffer: false,
            cipher: None,
            mac: None,
            compressor: None,
            transport: None,
            next: None,
        }
    }

    /// Epoch this layer serves.
    pub fn epoch(mut self, epoch: u16) -> Self {
        self.epoch = epoch;
        self
    }

    /// Negotiated protocol version.
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Whether a handshake is currently in progress.
    pub fn in_init(mut self, in_init: bool) -> Self {
        self.in_init = in_init;
        self
    }

    /// Relax exact version matching until the first record is accepted.
    pub fn first_handshake(mut self, first: bool) -> Self {
        self.first_handshake = first;
        self
    }

    /// Maximum plaintext fragment length.
    pub fn max_frag_len(mut self, len: usize) -> Self {
        self.max_frag_len = len.min(MAX_PLAIN_LENGTH);
        self
    }

    /// Record cipher; absent means plaintext records (epoch 0).
    pub fn cipher(mut self, cipher: Box<dyn RecordCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Record MAC for the legacy ETM/MTE modes.
    pub fn mac(mut self, mac: RecordHmac) -> Self {
        self.mac = Some(mac);
        self
    }

    /// Use encrypt-then-MAC ordering instead of MAC-then-encrypt.
    pub fn use_etm(mut self, etm: bool) -> Self {
        self.use_etm = etm;
        self
    }

    /// Negotiated payload compressor.
    pub fn compressor(mut self, compressor: Compressor) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Allow write retries to present a different buffer address.
    pub fn accept_moving_write_buffer(mut self, accept: bool) -> Self {
        self.accept_moving_write_buffer = accept;
        self
    }

    /// Datagram transport the layer reads from and writes to. Required.
    pub fn transport(mut self, transport: Box<dyn RecordTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Successor transport; records addressed to the next epoch are pushed
    /// here on teardown.
    pub fn next(mut self, next: Box<dyn RecordTransport>) -> Self {
        self.next = Some(next);
        self
    }

    /// Build the record layer.
    pub fn build(self) -> RecordResult<RecordLayer> {
        let Some(transport) = self.transport else {
            return Err(RecordError::Fatal {
                alert: AlertDescription::InternalError,
                cause: FatalCause::MissingTransport,
            });
        };
        let mut sequence = [0u8; SEQ_NUM_LEN];
        sequence[..2].copy_from_slice(&self.epoch.to_be_bytes());
        Ok(RecordLayer {
            transport,
            next: self.next,
            epoch: self.epoch,
            sequence,
            write_sequence: sequence,
            bitmap: ReplayWindow::new(),
            next_bitmap: ReplayWindow::new(),
            unprocessed_rcds: DeferredQueue::new(self.epoch.wrapping_add(1)),
            processed_rcds: DeferredQueue::new(self.epoch),
            read_buffer: vec![0; MAX_DATAGRAM_LENGTH],
            read_len: 0,
            read_pos: 0,
            packet: Vec::new(),
            rrec: RecordDescriptor::default(),
            num_recs: 0,
            rstate: ReadState::ReadHeader,
            in_init: self.in_init,
            version: self.version,
            is_first_record: self.first_handshake,
            max_frag_len: self.max_frag_len,
            alert: None,
            diag: DiagnosticSink::new(),
            cipher: self.cipher,
            mac: self.mac,
            use_etm: self.use_etm,
            compressor: self.compressor,
            wbuf: Vec::new(),
            wbuf_offset: 0,
            wpend_tot: 0,
            wpend_buf: 0,
            wpend_type: 0,
            wpend_ret: 0,
            accept_moving_write_buffer: self.accept_moving_write_buffer,
            flushed: false,
        })
    }
}

impl RecordLayer {
    /// Start building a record layer.
    pub fn builder() -> RecordLayerBuilder {
        RecordLayerBuilder::new()
    }

    /// Drive the receive path until one decrypted record is staged.
    ///
    /// `Ok(())` means exactly one record is available through
    /// [`read_record`](Self::read_record). Noise on the wire (malformed,
    /// forged, replayed, stale, or wrong-epoch records) is skipped
    /// internally and never surfaces; the call only returns early with
    /// [`RecordError::WantRead`] when the transport runs dry, or with a
    /// fatal error on a genuine protocol violation.
    pub fn get_more_records(&mut self) -> RecordResult<()> {
        if self.num_recs > 0 {
            self.release_record();
        }

        loop {
            // Around a renegotiation there may be records that were already
            // decrypted but not yet consumed.
            if let Some(buffered) = self.processed_rcds.pop() {
                self.restore_buffered(buffered);
                self.num_recs = 1;
                return Ok(());
            }

            if self.rstate == ReadState::ReadHeader {
                if self.packet.len() < DTLS_HEADER_LEN {
                    if self.read_pos >= self.read_len {
                        self.fill_datagram()?;
                    }
                    self.take(DTLS_HEADER_LEN - self.packet.len());
                    if self.packet.len() < DTLS_HEADER_LEN {
                        self.discard("partial header");
                        continue;
                    }
                }

                let Some(header) = RecordHeader::parse(&self.packet) else {
                    self.discard("unparseable header");
                    continue;
                };
                self.sequence[..2].copy_from_slice(&header.epoch.to_be_bytes());
                self.sequence[2..].copy_from_slice(&header.seq);
                self.rrec = RecordDescriptor::from_header(&header);
                self.rstate = ReadState::ReadBody;

                // Alerts are tolerated with an inexact version, e.g. for
                // protocol-version failures.
                if !self.is_first_record && self.rrec.rtype != CONTENT_TYPE_ALERT {
                    if let Some(wire) = self.version.wire() {
                        if self.rrec.version != wire {
                            self.discard("unexpected version");
                            continue;
                        }
                    }
                }
                if (self.rrec.version >> 8) as u8 != self.version.major() {
                    self.discard("wrong major version");
                    continue;
                }
                if self.rrec.length > MAX_ENCRYPTED_LENGTH {
                    self.discard("record too long");
                    continue;
                }
                if self.rrec.length > self.max_frag_len + MAX_ENCRYPTED_OVERHEAD {
                    self.discard("record exceeds fragment limit");
                    continue;
                }
            }

            // rstate == ReadBody: the rest of the record must already be in
            // this datagram; datagrams never span records.
            let body_have = self.packet.len() - DTLS_HEADER_LEN;
            if body_have < self.rrec.length {
                self.take(self.rrec.length - body_have);
                if self.packet.len() - DTLS_HEADER_LEN < self.rrec.length {
                    self.discard("partial body");
                    continue;
                }
            }
            self.rstate = ReadState::ReadHeader;

            let Some(route) = self.select_window() else {
                self.discard("wrong epoch");
                continue;
            };

            if !self.transport.is_reliable_ordered() {
                let seq = self.sequence;
                let fresh = match route {
                    Route::Current => self.bitmap.check(&seq),
                    Route::Next => self.next_bitmap.check(&seq),
                };
                if !fresh {
                    self.discard("replayed or stale");
                    continue;
                }
            }

            if self.rrec.length == 0 {
                self.discard("empty record");
                continue;
            }

            // Records from the next epoch cannot be processed until the new
            // keys are installed; hold them while the handshake runs.
            if route == Route::Next {
                if self.in_init {
                    self.buffer_unprocessed();
                }
                self.discard("awaiting next epoch");
                continue;
            }

            match self.process_record(route)? {
                Processed::Dropped => {
                    self.discard("failed verification");
                    continue;
                }
                Processed::Accepted => {
                    self.num_recs = 1;
                    self.is_first_record = false;
                    return Ok(());
                }
            }
        }
    }

    /// View the staged decrypted record, if any.
    pub fn read_record(&self) -> Option<RecordView<'_>> {
        if self.num_recs == 0 {
            return None;
        }
        Some(RecordView {
            rtype: self.rrec.rtype,
            version: self.rrec.version,
            epoch: self.rrec.epoch,
            seq_num: self.rrec.seq_num,
            data: &self.packet[DTLS_HEADER_LEN..DTLS_HEADER_LEN + self.rrec.length],
        })
    }

    /// Consume the staged record and free its staging.
    pub fn release_record(&mut self) {
        self.num_recs = 0;
        self.packet.clear();
        self.rrec = RecordDescriptor::default();
    }

    /// Stash the staged decrypted record for re-delivery by a later
    /// [`get_more_records`](Self::get_more_records) call.
    ///
    /// Used around renegotiation, when a record surfaces that the caller
    /// cannot consume yet. Returns `false` if nothing is staged or the
    /// queue is full.
    pub fn buffer_processed_record(&mut self) -> bool {
        if self.num_recs == 0 {
            return false;
        }
        let key = self.rrec.seq_num;
        let record = BufferedRecord { packet: std::mem::take(&mut self.packet), rec: self.rrec };
        self.num_recs = 0;
        self.rrec = RecordDescriptor::default();
        self.processed_rcds.insert(key, record)
    }

    // ------------------------------------------------------------------
    // Receive internals
    // ------------------------------------------------------------------

    /// Pull the next datagram from the transport into the read buffer.
    fn fill_datagram(&mut self) -> RecordResult<()> {
        match self.transport.recv(&mut self.read_buffer) {
            Ok(n) => {
                self.read_len = n;
                self.read_pos = 0;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(RecordError::WantRead),
            Err(_) => Err(self.fatal(AlertDescription::InternalError, FatalCause::TransportFailure)),
        }
    }

    /// Move up to `want` bytes from the current datagram into the packet.
    fn take(&mut self, want: usize) {
        let available = self.read_len - self.read_pos;
        let n = want.min(available);
        self.packet.extend_from_slice(&self.read_buffer[self.read_pos..self.read_pos + n]);
        self.read_pos += n;
    }

    /// Silently drop the staged record and restart header parsing.
    fn discard(&mut self, reason: &'static str) {
        debug!(reason, "discarding record");
        self.packet.clear();
        self.rrec = RecordDescriptor::default();
        self.rstate = ReadState::ReadHeader;
    }

    /// Route a record to a replay window by epoch and content type.
    ///
    /// Only handshake and alert records may run ahead into the next epoch,
    /// and only once every unprocessed record from the previous epoch
    /// change has been drained. Anything else outside the current epoch is
    /// dropped on the floor.
    fn select_window(&self) -> Option<Route> {
        if self.rrec.epoch == self.epoch {
            return Some(Route::Current);
        }
        if self.rrec.epoch == self.epoch.wrapping_add(1)
            && self.unprocessed_rcds.epoch() != self.epoch
            && (self.rrec.rtype == CONTENT_TYPE_HANDSHAKE || self.rrec.rtype == CONTENT_TYPE_ALERT)
        {
            return Some(Route::Next);
        }
        None
    }

    /// Park the staged raw record until its epoch opens.
    fn buffer_unprocessed(&mut self) {
        let key = self.rrec.seq_num;
        let record = BufferedRecord { packet: std::mem::take(&mut self.packet), rec: self.rrec };
        debug!(epoch = self.rrec.epoch, "buffering record for next epoch");
        if !self.unprocessed_rcds.insert(key, record) {
            debug!("deferred queue full, dropping record");
        }
    }

    /// Reinstate a buffered record as the staged record.
    fn restore_buffered(&mut self, buffered: BufferedRecord) {
        self.packet = buffered.packet;
        self.rrec = buffered.rec;
        // Restore the sequence staging so MAC computations over the
        // re-staged record use the correct per-epoch counter.
        if self.packet.len() >= DTLS_HEADER_LEN {
            self.sequence[2..].copy_from_slice(&self.packet[5..11]);
        }
    }

    /// Decrypt and authenticate the staged record in place.
    ///
    /// The only fatal outcomes are genuine protocol violations; forged or
    /// damaged records come back as [`Processed::Dropped`] with the
    /// diagnostic queue rewound to its pre-attempt state.
    fn process_record(&mut self, route: Route) -> RecordResult<Processed> {
        if self.rrec.length > MAX_ENCRYPTED_LENGTH {
            return Err(self.fatal(AlertDescription::RecordOverflow, FatalCause::EncryptedLengthTooLong));
        }

        let mac_size = self.mac.as_ref().map_or(0, RecordHmac::mac_len);
        let mut cipher_mac_size = mac_size;

        // Encrypt-then-MAC: verify over the ciphertext, before any
        // decryption happens.
        if self.use_etm && mac_size > 0 {
            if self.rrec.length < mac_size {
                return Err(self.fatal(AlertDescription::DecodeError, FatalCause::LengthTooShort));
            }
            self.rrec.length -= mac_size;
            let data_end = DTLS_HEADER_LEN + self.rrec.length;
            let verified = match &self.mac {
                Some(mac) => mac.verify(
                    &self.sequence,
                    self.rrec.rtype,
                    self.rrec.version,
                    &self.packet[DTLS_HEADER_LEN..data_end],
                    &self.packet[data_end..data_end + mac_size],
                ),
                None => false,
            };
            if !verified {
                return Err(self.fatal(AlertDescription::BadRecordMac, FatalCause::MacMismatch));
            }
            // The MAC is handled; there is none inside the encrypted record.
            cipher_mac_size = 0;
        }

        // Publicly invalid: too short to hold the cipher's explicit IV and
        // authentication tag. Dropped before any crypto runs.
        if let Some(cipher) = self.cipher.as_ref() {
            if self.rrec.length < cipher.mode().explicit_iv_len() + cipher.tag_len() {
                return Ok(Processed::Dropped);
            }
        }

        // Quarantine diagnostics around the decryption attempt: bad packets
        // are just ignored, and events from processing bogus junk must not
        // linger in the caller-visible queue.
        let mark = self.diag.mark();
        let body_end = DTLS_HEADER_LEN + self.rrec.length;
        let verdict = match self.cipher.as_mut() {
            Some(cipher) => cipher.open(
                &self.sequence,
                self.rrec.rtype,
                self.rrec.version,
                &mut self.packet[DTLS_HEADER_LEN..body_end],
                cipher_mac_size,
                &mut self.diag,
            ),
            None => OpenVerdict::Plaintext { len: self.rrec.length, mac: None },
        };

        let (len, extracted_mac) = match verdict {
            OpenVerdict::Invalid { alert } => {
                self.diag.pop_to_mark(mark);
                if let Some(alert) = alert {
                    return Err(self.fatal(alert, FatalCause::DecryptFailed));
                }
                return Ok(Processed::Dropped);
            }
            // Success, or an MTE failure carrying a randomized MAC that the
            // comparison below will reject in constant time.
            OpenVerdict::Plaintext { len, mac } => (len, mac),
        };
        self.rrec.length = len;
        trace!(length = len, "record decrypted");

        // MAC-then-encrypt: verify over the recovered plaintext.
        if !self.use_etm && self.cipher.is_some() && mac_size > 0 {
            let data_end = DTLS_HEADER_LEN + self.rrec.length;
            let verified = match (&self.mac, &extracted_mac) {
                (Some(mac), Some(received)) => mac.verify(
                    &self.sequence,
                    self.rrec.rtype,
                    self.rrec.version,
                    &self.packet[DTLS_HEADER_LEN..data_end],
                    received,
                ),
                _ => false,
            };
            if !verified || self.rrec.length > MAX_COMPRESSED_LENGTH + mac_size {
                // Silent drop: rewind anything the cipher recorded while
                // producing the randomized MAC.
                self.diag.pop_to_mark(mark);
                return Ok(Processed::Dropped);
            }
        }

        if self.compressor.is_some() && self.rrec.length > MAX_COMPRESSED_LENGTH {
            return Err(self.fatal(AlertDescription::RecordOverflow, FatalCause::CompressedLengthTooLong));
        }
        if let Some(compressor) = self.compressor.as_ref() {
            let body_end = DTLS_HEADER_LEN + self.rrec.length;
            let inflated = compressor.decompress(&self.packet[DTLS_HEADER_LEN..body_end]);
            match inflated {
                Ok(plain) => {
                    self.packet.truncate(DTLS_HEADER_LEN);
                    self.packet.extend_from_slice(&plain);
                    self.rrec.length = plain.len();
                }
                Err(_) => {
                    return Err(self.fatal(
                        AlertDescription::DecompressionFailure,
                        FatalCause::BadDecompression,
                    ));
                }
            }
        }

        if self.rrec.length > self.max_frag_len {
            return Err(self.fatal(AlertDescription::RecordOverflow, FatalCause::DataLengthTooLong));
        }

        // Mark receipt only now: the record is fully authenticated, so
        // forgeries can never advance the window.
        let seq = self.rrec.seq_num;
        match route {
            Route::Current => self.bitmap.update(&seq),
            Route::Next => self.next_bitmap.update(&seq),
        }
        Ok(Processed::Accepted)
    }

    // ------------------------------------------------------------------
    // Settings and queries
    // ------------------------------------------------------------------

    /// Latch a fatal alert and build the matching error.
    pub(super) fn fatal(&mut self, alert: AlertDescription, cause: FatalCause) -> RecordError {
        self.alert = Some(alert);
        RecordError::Fatal { alert, cause }
    }

    /// Epoch this layer serves.
    pub fn epoch(&self) -> u16 {
        self.epoch
    }

    /// Current parsing state.
    pub fn read_state(&self) -> ReadState {
        self.rstate
    }

    /// Wire code of the last fatal alert, if any.
    pub fn alert_code(&self) -> Option<u8> {
        self.alert.map(AlertDescription::code)
    }

    /// Update the negotiated protocol version.
    pub fn set_protocol_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    /// Mark whether the first handshake is in flight, relaxing exact
    /// version matching until a record is accepted.
    pub fn set_first_handshake(&mut self, first: bool) {
        self.is_first_record = first;
    }

    /// Update the handshake-in-progress flag gating next-epoch buffering.
    pub fn set_in_init(&mut self, in_init: bool) {
        self.in_init = in_init;
    }

    /// Update the maximum plaintext fragment length.
    pub fn set_max_frag_len(&mut self, len: usize) {
        self.max_frag_len = len.min(MAX_PLAIN_LENGTH);
    }

    /// DTLS processes exactly one record at a time; any other pipeline
    /// count is rejected.
    pub fn set_max_pipelines(&mut self, pipelines: usize) -> RecordResult<()> {
        if pipelines != 1 {
            return Err(self.fatal(AlertDescription::InternalError, FatalCause::PipeliningUnsupported));
        }
        Ok(())
    }

    /// Replace the datagram transport.
    pub fn set_transport(&mut self, transport: Box<dyn RecordTransport>) {
        self.transport = transport;
    }

    /// True if a negotiated compressor is attached.
    pub fn has_compression(&self) -> bool {
        self.compressor.is_some()
    }

    /// True if raw next-epoch records are parked in the layer.
    pub fn unprocessed_read_pending(&self) -> bool {
        !self.unprocessed_rcds.is_empty()
    }

    /// True if decrypted records are parked for re-delivery.
    pub fn processed_read_pending(&self) -> bool {
        !self.processed_rcds.is_empty()
    }

    /// Diagnostic events that survived quarantine.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diag.events()
    }

    /// Remove and return all queued diagnostic events.
    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diag.drain()
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Push everything addressed to the successor layer to the `next`
    /// transport: unconsumed datagram bytes first, then every buffered
    /// next-epoch record in ascending sequence order.
    ///
    /// Called automatically on drop; call it eagerly to observe transport
    /// errors. Parked processed records are discarded either way - they
    /// were addressed to this layer's caller, which is going away.
    pub fn shutdown(&mut self) -> std::io::Result<()> {
        self.flushed = true;
        let mut result = Ok(());

        let Some(next) = self.next.as_mut() else {
            return result;
        };
        if self.read_pos < self.read_len {
            if let Err(e) = next.send(&self.read_buffer[self.read_pos..self.read_len]) {
                result = Err(e);
            }
            self.read_pos = self.read_len;
        }
        while let Some(record) = self.unprocessed_rcds.pop() {
            if let Err(e) = next.send(&record.packet) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

impl Drop for RecordLayer {
    fn drop(&mut self) {
        if !self.flushed {
            let _ = self.shutdown();
        }
    }
}
