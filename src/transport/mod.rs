//! Datagram transport abstraction.
//!
//! The record layer reads and writes whole datagrams through
//! [`RecordTransport`] and knows nothing about sockets. Non-blocking
//! transports signal "not ready" with [`std::io::ErrorKind::WouldBlock`],
//! which the layer surfaces as want-read / want-write; those are the only
//! suspension points in the whole layer.
//!
//! Shipped adapters:
//!
//! - [`MemoryTransport`]: in-memory datagram pipe, used by tests and as the
//!   hand-off channel between an old epoch layer and its successor
//! - [`UdpTransport`]: `std::net::UdpSocket` adapter

mod mem;
mod udp;

use std::io;

pub use mem::MemoryTransport;
pub use udp::UdpTransport;

/// A datagram byte source and sink.
pub trait RecordTransport {
    /// Receive one whole datagram into `buf`, returning its length.
    ///
    /// Datagrams larger than `buf` are truncated, matching UDP semantics.
    /// `WouldBlock` means no datagram is available right now.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Send one whole datagram, returning the number of bytes accepted.
    ///
    /// `WouldBlock` means the transport cannot take a datagram right now.
    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// True for substrates that already guarantee ordered, reliable,
    /// non-duplicated delivery; the layer then skips its replay check.
    fn is_reliable_ordered(&self) -> bool {
        false
    }
}
