//! UDP socket adapter.
//!
//! Thin wrapper over `std::net::UdpSocket` for connected sockets. With the
//! socket in non-blocking mode, `WouldBlock` flows straight through to the
//! record layer as want-read / want-write.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use super::RecordTransport;

/// Connected UDP datagram transport.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind a socket to the given local address.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self { socket: UdpSocket::bind(addr)? })
    }

    /// Wrap an existing socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self { socket }
    }

    /// Connect to the remote peer; required before use.
    pub fn connect(&self, addr: SocketAddr) -> io::Result<()> {
        self.socket.connect(addr)
    }

    /// Switch the socket between blocking and non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        self.socket.set_nonblocking(nonblocking)
    }

    /// Local address of the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Borrow the underlying socket.
    pub fn inner(&self) -> &UdpSocket {
        &self.socket
    }
}

impl RecordTransport for UdpTransport {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf)
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().expect("loopback addr")
    }

    #[test]
    fn test_datagram_roundtrip() {
        let mut a = UdpTransport::bind(loopback()).expect("bind");
        let mut b = UdpTransport::bind(loopback()).expect("bind");
        a.connect(b.local_addr().expect("addr")).expect("connect");
        b.connect(a.local_addr().expect("addr")).expect("connect");

        a.send(b"over the wire").expect("send");
        let mut buf = [0u8; 64];
        let n = b.recv(&mut buf).expect("recv");
        assert_eq!(&buf[..n], b"over the wire");
    }

    #[test]
    fn test_nonblocking_recv_would_block() {
        let mut socket = UdpTransport::bind(loopback()).expect("bind");
        socket.set_nonblocking(true).expect("nonblocking");
        let mut buf = [0u8; 64];
        let err = socket.recv(&mut buf).expect_err("nothing queued");
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }
}
