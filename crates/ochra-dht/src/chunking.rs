//! Multi-record chunking for large DHT values.
//!
//! When a value exceeds the [`MAX_RECORD_SIZE`](crate::MAX_RECORD_SIZE) limit
//! (1000 bytes), it is split into multiple chunks. Each chunk is stored as a
//! separate DHT record, and a manifest record contains the list of chunk hashes
//! needed for reassembly.
//!
//! ## Chunk Format
//!
//! Each chunk is stored as an immutable DHT record (content-addressed by its hash).
//! The manifest record contains:
//! - `total_chunks`: number of chunks
//! - `total_size`: total size of the original value
//! - `chunk_hashes`: ordered list of 32-byte BLAKE3 hashes of each chunk
//!
//! ## Reassembly
//!
//! To reassemble:
//! 1. Retrieve the manifest record.
//! 2. For each chunk hash, retrieve the corresponding immutable record.
//! 3. Concatenate chunks in order.
//! 4. Verify the reassembled value against the expected total size.

use serde::{Deserialize, Serialize};

use crate::{DhtError, Result, MAX_RECORD_SIZE};

/// Overhead per chunk for framing (index, total, etc.). We keep a safety
/// margin so that chunk data plus any serialization overhead fits within
/// [`MAX_RECORD_SIZE`].
const CHUNK_OVERHEAD: usize = 48;

/// Maximum data payload per chunk.
const CHUNK_DATA_SIZE: usize = MAX_RECORD_SIZE - CHUNK_OVERHEAD;

/// A single chunk of a split record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based index of this chunk.
    pub index: u32,
    /// Total number of chunks in the split.
    pub total: u32,
    /// The chunk data payload.
    pub data: Vec<u8>,
}

/// A manifest describing the chunks of a split record.
///
/// This manifest itself is stored as a DHT record (must fit within
/// [`MAX_RECORD_SIZE`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkManifest {
    /// Total number of chunks.
    pub total_chunks: u32,
    /// Total size of the original value in bytes.
    pub total_size: u64,
    /// Ordered list of BLAKE3 hashes, one per chunk.
    pub chunk_hashes: Vec<[u8; 32]>,
}

/// Split a large value into chunks suitable for DHT storage.
///
/// Returns a list of [`Chunk`]s. Each chunk's data will be at most
/// [`CHUNK_DATA_SIZE`] bytes, ensuring the serialized chunk fits within
/// [`MAX_RECORD_SIZE`].
///
/// If the value fits within a single record, returns a single chunk.
pub fn split_record(value: &[u8]) -> Vec<Chunk> {
    if value.is_empty() {
        return vec![Chunk {
            index: 0,
            total: 1,
            data: Vec::new(),
        }];
    }

    let chunks_needed = value.len().div_ceil(CHUNK_DATA_SIZE);
    let total = chunks_needed as u32;

    let mut chunks = Vec::with_capacity(chunks_needed);
    for (i, chunk_data) in value.chunks(CHUNK_DATA_SIZE).enumerate() {
        chunks.push(Chunk {
            index: i as u32,
            total,
            data: chunk_data.to_vec(),
        });
    }

    chunks
}

/// Build a [`ChunkManifest`] from a list of chunks.
///
/// Computes the BLAKE3 hash of each chunk's data to build the hash list.
pub fn build_manifest(chunks: &[Chunk], total_size: u64) -> ChunkManifest {
    let chunk_hashes: Vec<[u8; 32]> = chunks
        .iter()
        .map(|c| ochra_crypto::blake3::hash(&c.data))
        .collect();

    ChunkManifest {
        total_chunks: chunks.len() as u32,
        total_size,
        chunk_hashes,
    }
}

/// Reassemble a value from its constituent chunks.
///
/// The chunks are sorted by index and concatenated. The manifest is used to
/// verify completeness and integrity.
///
/// # Errors
///
/// Returns [`DhtError::MissingChunk`] if any chunk is missing.
/// Returns [`DhtError::Serialization`] if a chunk's data hash does not match
/// the manifest.
pub fn assemble_record(manifest: &ChunkManifest, chunks: &[Chunk]) -> Result<Vec<u8>> {
    // Sort chunks by index.
    let mut sorted_chunks = chunks.to_vec();
    sorted_chunks.sort_by_key(|c| c.index);

    // Verify we have all chunks.
    if sorted_chunks.len() != manifest.total_chunks as usize {
        // Find the first missing chunk.
        for i in 0..manifest.total_chunks {
            if !sorted_chunks.iter().any(|c| c.index == i) {
                return Err(DhtError::MissingChunk {
                    index: i,
                    total: manifest.total_chunks,
                });
            }
        }
    }

    // Verify each chunk's hash matches the manifest.
    let mut result = Vec::with_capacity(manifest.total_size as usize);
    for (i, chunk) in sorted_chunks.iter().enumerate() {
        if i >= manifest.chunk_hashes.len() {
            return Err(DhtError::MissingChunk {
                index: chunk.index,
                total: manifest.total_chunks,
            });
        }

        let expected_hash = &manifest.chunk_hashes[i];
        let actual_hash = ochra_crypto::blake3::hash(&chunk.data);
        if actual_hash != *expected_hash {
            return Err(DhtError::Serialization(format!(
                "chunk {} hash mismatch: expected {}, got {}",
                i,
                hex::encode(expected_hash),
                hex::encode(actual_hash),
            )));
        }

        result.extend_from_slice(&chunk.data);
    }

    // Verify total size.
    if result.len() as u64 != manifest.total_size {
        return Err(DhtError::Serialization(format!(
            "reassembled size {} does not match expected {}",
            result.len(),
            manifest.total_size,
        )));
    }

    Ok(result)
}

/// Check whether a value needs chunking (exceeds single-record size).
pub fn needs_chunking(value: &[u8]) -> bool {
    value.len() > CHUNK_DATA_SIZE
}

/// Return the maximum data payload size per chunk.
pub fn max_chunk_data_size() -> usize {
    CHUNK_DATA_SIZE
}
