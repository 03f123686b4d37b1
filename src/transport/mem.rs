//! In-memory datagram pipe.
//!
//! A pair of shared queues standing in for a network path: everything one
//! side sends becomes receivable by the other. Clones share the same
//! queues, which lets tests keep a tap on a transport after handing it to a
//! record layer, and lets an old epoch layer hand buffered records to its
//! successor.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use super::RecordTransport;

type DatagramQueue = Arc<Mutex<VecDeque<Vec<u8>>>>;

fn lock(queue: &DatagramQueue) -> std::sync::MutexGuard<'_, VecDeque<Vec<u8>>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory datagram transport.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    incoming: DatagramQueue,
    outgoing: DatagramQueue,
    reliable: bool,
}

impl MemoryTransport {
    /// Create a standalone transport with its own queues.
    ///
    /// Datagrams are fed in with [`inject`](Self::inject) and sent datagrams
    /// collected with [`take_outgoing`](Self::take_outgoing).
    pub fn new() -> Self {
        Self {
            incoming: Arc::new(Mutex::new(VecDeque::new())),
            outgoing: Arc::new(Mutex::new(VecDeque::new())),
            reliable: false,
        }
    }

    /// Create a cross-wired pair: datagrams sent by one side are received
    /// by the other.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Mutex::new(VecDeque::new()));
        let b_to_a = Arc::new(Mutex::new(VecDeque::new()));
        (
            Self { incoming: Arc::clone(&b_to_a), outgoing: Arc::clone(&a_to_b), reliable: false },
            Self { incoming: a_to_b, outgoing: b_to_a, reliable: false },
        )
    }

    /// Mark this transport as an ordered-reliable substrate.
    pub fn set_reliable_ordered(&mut self, reliable: bool) {
        self.reliable = reliable;
    }

    /// Queue a datagram for this side to receive.
    pub fn inject(&self, datagram: Vec<u8>) {
        lock(&self.incoming).push_back(datagram);
    }

    /// Pop the oldest datagram this side has sent.
    pub fn take_outgoing(&self) -> Option<Vec<u8>> {
        lock(&self.outgoing).pop_front()
    }

    /// Number of datagrams waiting to be received.
    pub fn pending_incoming(&self) -> usize {
        lock(&self.incoming).len()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordTransport for MemoryTransport {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(datagram) = lock(&self.incoming).pop_front() else {
            return Err(io::ErrorKind::WouldBlock.into());
        };
        let n = datagram.len().min(buf.len());
        buf[..n].copy_from_slice(&datagram[..n]);
        Ok(n)
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.outgoing).push_back(buf.to_vec());
        Ok(buf.len())
    }

    fn is_reliable_ordered(&self) -> bool {
        self.reliable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_crosses_datagrams() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.send(b"ping").expect("send");
        b.send(b"pong").expect("send");

        let mut buf = [0u8; 16];
        assert_eq!(b.recv(&mut buf).expect("recv"), 4);
        assert_eq!(&buf[..4], b"ping");
        assert_eq!(a.recv(&mut buf).expect("recv"), 4);
        assert_eq!(&buf[..4], b"pong");
    }

    #[test]
    fn test_empty_queue_would_block() {
        let (mut a, _b) = MemoryTransport::pair();
        let mut buf = [0u8; 16];
        let err = a.recv(&mut buf).expect_err("no datagram queued");
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_clone_shares_queues() {
        let transport = MemoryTransport::new();
        let mut tap = transport.clone();

        transport.inject(b"fed".to_vec());
        let mut buf = [0u8; 16];
        assert_eq!(tap.recv(&mut buf).expect("recv"), 3);

        tap.send(b"sent").expect("send");
        assert_eq!(transport.take_outgoing(), Some(b"sent".to_vec()));
    }

    #[test]
    fn test_oversized_datagram_truncates() {
        let mut transport = MemoryTransport::new();
        transport.inject(vec![7u8; 32]);
        let mut buf = [0u8; 8];
        assert_eq!(transport.recv(&mut buf).expect("recv"), 8);
    }
}
