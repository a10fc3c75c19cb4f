#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Serialized elements of one array property, in decoded-body coordinates.
/// The count field and element type string are outside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArraySpan {
    pub range: ByteRange,
    pub element_count: usize,
}

/// One compressed chunk. `compressed_offset` points at the payload (after the
/// chunk header) within the compressed body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub compressed_offset: usize,
    pub compressed_size: usize,
    pub uncompressed_size: usize,
}

#[derive(Debug, Clone)]
pub struct ChunkLayout {
    pub chunk_header_len: usize,
    pub compressed_len: usize,
    pub body_len: usize,
    pub chunks: Vec<ChunkDescriptor>,
}
