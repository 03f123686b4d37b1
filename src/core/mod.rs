//! Core constants, error types, and diagnostics.
//!
//! Everything here is shared by the record, crypto, and transport modules
//! and carries no wire-format logic of its own.

pub mod constants;
mod diag;
mod error;

pub use constants::*;
pub use diag::{Diagnostic, DiagnosticSink, Savepoint};
pub use error::{AlertDescription, CryptoError, FatalCause, RecordError, RecordResult};
