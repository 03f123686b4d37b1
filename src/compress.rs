//! Record payload compression.
//!
//! zstd-backed, negotiated per layer. Unlike opportunistic application
//! compression, a negotiated record compressor always runs: the peer
//! decompresses every record, so there is no "stored uncompressed" escape
//! hatch. Decompression enforces a hard output cap since the input is
//! attacker-adjacent even after authentication.

use std::io::Read;

use thiserror::Error;

use crate::core::{MAX_COMPRESSED_LENGTH, MAX_PLAIN_LENGTH};

/// Default zstd compression level.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Errors from record compression.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Zstd compression failed.
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Zstd decompression failed.
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// Output exceeded a record-layer length bound.
    #[error("size exceeded limit: {size} > {limit}")]
    SizeExceeded {
        /// Actual output size.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },
}

/// Per-layer zstd compressor.
#[derive(Debug, Clone)]
pub struct Compressor {
    level: i32,
}

impl Compressor {
    /// Create a compressor at the default level.
    pub fn new() -> Self {
        Self { level: DEFAULT_COMPRESSION_LEVEL }
    }

    /// Create a compressor at an explicit level (clamped to 1..=22).
    pub fn with_level(level: i32) -> Self {
        Self { level: level.clamp(1, 22) }
    }

    /// Compression level in use.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Compress a record payload.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let out = zstd::encode_all(data, self.level)
            .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;
        if out.len() > MAX_COMPRESSED_LENGTH {
            return Err(CompressionError::SizeExceeded {
                size: out.len(),
                limit: MAX_COMPRESSED_LENGTH,
            });
        }
        Ok(out)
    }

    /// Decompress an authenticated record body.
    ///
    /// Output is capped at the maximum plaintext fragment length; anything
    /// larger is an error, never a larger allocation.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let decoder = zstd::Decoder::new(data)
            .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;

        let mut out = Vec::new();
        decoder
            .take(MAX_PLAIN_LENGTH as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;

        if out.len() > MAX_PLAIN_LENGTH {
            return Err(CompressionError::SizeExceeded {
                size: out.len(),
                limit: MAX_PLAIN_LENGTH,
            });
        }
        Ok(out)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}
