//! Transfer planning
//!
//! Pure decisions about how to move an object: whether a transfer runs
//! as one request or as chunks, and the exact byte range of every chunk.
//! Nothing here touches the network, so the orchestrators in osc-s3 and
//! the tests share one source of truth for chunk geometry.

/// Default chunk size for multipart uploads and ranged downloads (5 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Default number of concurrent workers for parallel transfers
pub const DEFAULT_WORKERS: usize = 4;

/// Smallest part size S3 accepts for any part other than the last
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Most parts a single multipart upload may have
pub const MAX_PARTS: usize = 10_000;

/// How a transfer will be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// One request moves the whole object
    Single,
    /// The object moves as multiple chunks
    Chunked,
}

/// A user override of the size-based mode decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedMode {
    Single,
    Chunked,
}

/// Decide how to execute a transfer.
///
/// Without an override, objects strictly larger than `threshold` go
/// chunked and everything else goes as a single request. An override
/// wins unconditionally, regardless of size.
pub fn decide(size: u64, threshold: u64, forced: Option<ForcedMode>) -> TransferMode {
    match forced {
        Some(ForcedMode::Single) => TransferMode::Single,
        Some(ForcedMode::Chunked) => TransferMode::Chunked,
        None => {
            if size > threshold {
                TransferMode::Chunked
            } else {
                TransferMode::Single
            }
        }
    }
}

/// One chunk of a planned transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    /// Zero-based position in the plan
    pub index: usize,

    /// Byte offset of the first byte of this chunk
    pub offset: u64,

    /// Length of this chunk in bytes
    pub len: u64,
}

impl ChunkSpec {
    /// One-based part number as used by the multipart upload protocol
    pub fn part_number(&self) -> u32 {
        self.index as u32 + 1
    }

    /// HTTP Range header value covering this chunk, or None for an
    /// empty chunk (a zero-byte object is fetched without a Range).
    pub fn http_range(&self) -> Option<String> {
        if self.len == 0 {
            return None;
        }
        Some(format!(
            "bytes={}-{}",
            self.offset,
            self.offset + self.len - 1
        ))
    }
}

/// A complete plan for a chunked transfer
#[derive(Debug, Clone)]
pub struct TransferPlan {
    size: u64,
    chunk_size: u64,
    workers: usize,
}

impl TransferPlan {
    /// Plan a transfer of `size` bytes in chunks of `chunk_size`.
    ///
    /// A zero chunk size or worker count is clamped to one.
    pub fn new(size: u64, chunk_size: u64, workers: usize) -> Self {
        Self {
            size,
            chunk_size: chunk_size.max(1),
            workers: workers.max(1),
        }
    }

    /// Total object size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Chunk size in bytes
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Concurrency limit for parallel execution
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of chunks in the plan.
    ///
    /// A zero-byte object still yields one (empty) chunk so that every
    /// transfer produces at least one request.
    pub fn chunk_count(&self) -> usize {
        if self.size == 0 {
            return 1;
        }
        self.size.div_ceil(self.chunk_size) as usize
    }

    /// The chunks of this plan, in offset order.
    ///
    /// Chunks tile the byte range exactly: offsets are contiguous, all
    /// chunks but the last are `chunk_size` long, and the last covers
    /// the remainder.
    pub fn chunks(&self) -> Vec<ChunkSpec> {
        if self.size == 0 {
            return vec![ChunkSpec {
                index: 0,
                offset: 0,
                len: 0,
            }];
        }

        (0..self.chunk_count())
            .map(|index| {
                let offset = index as u64 * self.chunk_size;
                let len = self.chunk_size.min(self.size - offset);
                ChunkSpec { index, offset, len }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_decide_by_size() {
        assert_eq!(decide(100, 5 * MIB, None), TransferMode::Single);
        assert_eq!(decide(5 * MIB, 5 * MIB, None), TransferMode::Single);
        assert_eq!(decide(5 * MIB + 1, 5 * MIB, None), TransferMode::Chunked);
        assert_eq!(decide(0, 5 * MIB, None), TransferMode::Single);
    }

    #[test]
    fn test_decide_forced_overrides_size() {
        assert_eq!(
            decide(100, 5 * MIB, Some(ForcedMode::Chunked)),
            TransferMode::Chunked
        );
        assert_eq!(
            decide(100 * MIB, 5 * MIB, Some(ForcedMode::Single)),
            TransferMode::Single
        );
    }

    #[test]
    fn test_twelve_mib_in_five_mib_chunks() {
        let plan = TransferPlan::new(12 * MIB, 5 * MIB, 4);
        let chunks = plan.chunks();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].len, 5 * MIB);
        assert_eq!(chunks[1].offset, 5 * MIB);
        assert_eq!(chunks[1].len, 5 * MIB);
        assert_eq!(chunks[2].offset, 10 * MIB);
        assert_eq!(chunks[2].len, 2 * MIB);

        assert_eq!(chunks[0].part_number(), 1);
        assert_eq!(chunks[1].part_number(), 2);
        assert_eq!(chunks[2].part_number(), 3);
    }

    #[test]
    fn test_exact_multiple_has_no_tail() {
        let plan = TransferPlan::new(10 * MIB, 5 * MIB, 4);
        let chunks = plan.chunks();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len == 5 * MIB));
    }

    #[test]
    fn test_small_object_is_one_chunk() {
        let plan = TransferPlan::new(100, 5 * MIB, 4);
        let chunks = plan.chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].len, 100);
    }

    #[test]
    fn test_zero_byte_object_is_one_empty_chunk() {
        let plan = TransferPlan::new(0, 5 * MIB, 4);
        let chunks = plan.chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len, 0);
        assert_eq!(chunks[0].http_range(), None);
    }

    #[test]
    fn test_chunks_tile_the_object_exactly() {
        for size in [1, 99, MIB, 5 * MIB, 5 * MIB + 1, 12 * MIB, 17 * MIB + 3] {
            let plan = TransferPlan::new(size, 5 * MIB, 4);
            let chunks = plan.chunks();

            let mut expected_offset = 0;
            for chunk in &chunks {
                assert_eq!(chunk.offset, expected_offset, "size {size}");
                assert!(chunk.len > 0, "size {size}");
                expected_offset += chunk.len;
            }
            assert_eq!(expected_offset, size, "size {size}");
        }
    }

    #[test]
    fn test_http_range_is_inclusive() {
        let plan = TransferPlan::new(12 * MIB, 5 * MIB, 4);
        let chunks = plan.chunks();
        assert_eq!(chunks[0].http_range().unwrap(), "bytes=0-5242879");
        assert_eq!(chunks[1].http_range().unwrap(), "bytes=5242880-10485759");
        assert_eq!(chunks[2].http_range().unwrap(), "bytes=10485760-12582911");
    }

    #[test]
    fn test_zero_chunk_size_clamped() {
        let plan = TransferPlan::new(100, 0, 0);
        assert_eq!(plan.chunk_size(), 1);
        assert_eq!(plan.workers(), 1);
        assert_eq!(plan.chunk_count(), 100);
    }
}
