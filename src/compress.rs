//! Per-entry deflate compression
//!
//! Every file is compressed on its own with a fresh encoder, so entries can
//! be processed on any thread. An entry is stored raw whenever deflate does
//! not make it smaller.

use crate::config::PackingConfig;
use crate::{Error, Result};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Bytes of one entry as written to the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    pub payload: Vec<u8>,
    pub compressed: bool,
}

/// When and how hard to compress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    pub level: u32,
    /// Smaller inputs are stored without trying
    pub min_size: u64,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        let config = PackingConfig::default();
        Self::from(&config)
    }
}

impl From<&PackingConfig> for CompressionPolicy {
    fn from(config: &PackingConfig) -> Self {
        Self {
            level: config.compression_level.min(9),
            min_size: config.min_compress_size,
        }
    }
}

impl CompressionPolicy {
    /// Compress `raw`, falling back to storing it unchanged
    pub fn compress(&self, raw: Vec<u8>) -> Result<CompressedData> {
        if (raw.len() as u64) < self.min_size || raw.is_empty() {
            return Ok(CompressedData {
                payload: raw,
                compressed: false,
            });
        }

        let mut encoder = DeflateEncoder::new(
            Vec::with_capacity(raw.len() / 2),
            Compression::new(self.level),
        );
        encoder.write_all(&raw)?;
        let deflated = encoder.finish()?;

        if deflated.len() >= raw.len() {
            Ok(CompressedData {
                payload: raw,
                compressed: false,
            })
        } else {
            Ok(CompressedData {
                payload: deflated,
                compressed: true,
            })
        }
    }
}

/// Inflate a compressed payload, checking it yields exactly `raw_len` bytes
pub fn decompress(payload: &[u8], raw_len: u64) -> Result<Vec<u8>> {
    // raw_len comes from the file, so it only bounds the read
    let mut raw = Vec::with_capacity(payload.len().saturating_mul(4));
    DeflateDecoder::new(payload)
        .take(raw_len.saturating_add(1))
        .read_to_end(&mut raw)
        .map_err(|e| Error::InvalidArchive(format!("corrupt deflate stream: {}", e)))?;

    if raw.len() as u64 != raw_len {
        return Err(Error::InvalidArchive(format!(
            "decompressed {} bytes, expected {}",
            raw.len(),
            raw_len
        )));
    }

    Ok(raw)
}
