//! Outer save envelope: an opaque header followed by independently
//! zlib-compressed chunks that concatenate into one decoded body.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::debug;

use crate::error::{Result, SaveError, SaveErrorCode};
use crate::layout::{ChunkDescriptor, ChunkLayout};
use crate::reader::ByteCursor;
use crate::types::{
    CHUNK_LENGTH_FIELDS_LEN, CHUNK_SIGNATURE, HEADER_VERSION_OFFSET, MAX_CHUNK_SIZE_OFFSET,
    chunk_header_len,
};

/// Everything before the first chunk, kept verbatim.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    bytes: Vec<u8>,
    header_version: u32,
}

impl ContainerHeader {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn header_version(&self) -> u32 {
        self.header_version
    }
}

/// Chunk header fields reused unmodified for every emitted chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkParams {
    pub prefix: Vec<u8>,
    pub max_chunk_size: u64,
}

#[derive(Debug)]
pub struct Decompressed {
    pub body: Vec<u8>,
    pub params: ChunkParams,
    pub layout: ChunkLayout,
}

pub fn split(raw: &[u8]) -> Result<(ContainerHeader, &[u8])> {
    let header_end = raw
        .windows(CHUNK_SIGNATURE.len())
        .position(|w| w == CHUNK_SIGNATURE)
        .ok_or_else(|| {
            SaveError::new(
                SaveErrorCode::SignatureNotFound,
                "chunk signature C1 83 2A 9E not found",
            )
        })?;

    let header_bytes = &raw[..header_end];
    let mut cur = ByteCursor::new(header_bytes);
    cur.skip(HEADER_VERSION_OFFSET)?;
    let header_version = cur.read_u32()?;

    Ok((
        ContainerHeader {
            bytes: header_bytes.to_vec(),
            header_version,
        },
        &raw[header_end..],
    ))
}

pub fn decompress(compressed_body: &[u8], header_version: u32) -> Result<Decompressed> {
    let header_len = chunk_header_len(header_version);
    let prefix_len = header_len - CHUNK_LENGTH_FIELDS_LEN;

    let mut cur = ByteCursor::new(compressed_body);
    let mut params: Option<ChunkParams> = None;
    let mut chunks = Vec::new();
    let mut body = Vec::new();

    while !cur.is_exhausted() {
        let chunk_header = cur.read_bytes(header_len)?;
        let mut fields = ByteCursor::new(chunk_header);

        if params.is_none() {
            fields.seek_to(MAX_CHUNK_SIZE_OFFSET)?;
            let max_chunk_size = fields.read_u64()?;
            params = Some(ChunkParams {
                prefix: chunk_header[..prefix_len].to_vec(),
                max_chunk_size,
            });
        }

        fields.seek_to(prefix_len)?;
        let compressed_size = to_usize(fields.read_u64()?, "compressed chunk size")?;
        let uncompressed_size = to_usize(fields.read_u64()?, "uncompressed chunk size")?;

        let compressed_offset = cur.position();
        let payload = cur.read_bytes(compressed_size)?;
        let inflated = inflate(payload, uncompressed_size, chunks.len())?;
        body.extend_from_slice(&inflated);

        chunks.push(ChunkDescriptor {
            compressed_offset,
            compressed_size,
            uncompressed_size,
        });
    }

    let params = params.ok_or_else(|| {
        SaveError::new(SaveErrorCode::Truncated, "container holds no chunks")
    })?;

    let layout = ChunkLayout {
        chunk_header_len: header_len,
        compressed_len: compressed_body.len(),
        body_len: body.len(),
        chunks,
    };

    debug!(
        chunks = layout.chunks.len(),
        body_len = layout.body_len,
        max_chunk_size = params.max_chunk_size,
        "body_decompressed"
    );

    Ok(Decompressed {
        body,
        params,
        layout,
    })
}

pub fn compress(body: &[u8], header_bytes: &[u8], params: &ChunkParams) -> Result<Vec<u8>> {
    if params.max_chunk_size == 0 {
        return Err(SaveError::new(
            SaveErrorCode::InvalidChunkSize,
            "max chunk size must be non-zero",
        ));
    }
    let max_chunk_size = to_usize(params.max_chunk_size, "max chunk size")?;

    let mut out = Vec::with_capacity(header_bytes.len() + body.len() / 2);
    out.extend_from_slice(header_bytes);

    for slice in body.chunks(max_chunk_size) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(slice)?;
        let compressed = encoder.finish()?;

        let compressed_len = compressed.len() as u64;
        let uncompressed_len = slice.len() as u64;
        out.extend_from_slice(&params.prefix);
        out.extend_from_slice(&compressed_len.to_le_bytes());
        out.extend_from_slice(&uncompressed_len.to_le_bytes());
        out.extend_from_slice(&compressed_len.to_le_bytes());
        out.extend_from_slice(&uncompressed_len.to_le_bytes());
        out.extend_from_slice(&compressed);
    }

    Ok(out)
}

fn inflate(payload: &[u8], expected_len: usize, index: usize) -> Result<Vec<u8>> {
    // Bounded by the declared size, never pre-allocated from it.
    let limit = u64::try_from(expected_len).unwrap_or(u64::MAX).saturating_add(1);
    let mut decoder = ZlibDecoder::new(payload).take(limit);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| {
        SaveError::new(
            SaveErrorCode::Decompress,
            format!("zlib decode of chunk {index} failed: {e}"),
        )
    })?;
    if out.len() != expected_len {
        return Err(SaveError::new(
            SaveErrorCode::Decompress,
            format!(
                "chunk {index} size mismatch: expected {expected_len}, got {}",
                out.len()
            ),
        ));
    }
    Ok(out)
}

fn to_usize(value: u64, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        SaveError::new(
            SaveErrorCode::OutOfRange,
            format!("{what} {value} does not fit in memory"),
        )
    })
}
