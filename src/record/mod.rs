//! The DTLS record layer: receive driver, replay defense, epoch routing,
//! deferred-record queues, and the single-record transmit path.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Handshake / application          │
//! ├─────────────────────────────────────────┤
//! │          Record layer                   │  ← this module
//! │  parse → route → replay → decrypt       │
//! ├─────────────────────────────────────────┤
//! │       Datagram transport                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! [`RecordLayer`] is the central object, one per epoch generation per
//! half-connection. The leaves underneath it: big-endian sequence
//! arithmetic ([`seq`]), the sliding replay window ([`ReplayWindow`]), the
//! 13-byte header codec ([`RecordHeader`]), and the sequence-ordered
//! deferred queues ([`DeferredQueue`]) that carry records across an epoch
//! change.

pub mod seq;

mod header;
mod layer;
mod queue;
mod window;
mod write;

pub use header::{ProtocolVersion, RecordDescriptor, RecordHeader};
pub use layer::{ReadState, RecordLayer, RecordLayerBuilder, RecordView};
pub use queue::{BufferedRecord, DeferredQueue};
pub use window::ReplayWindow;
pub use write::RecordTemplate;
