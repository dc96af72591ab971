//! Low-level zstd frame walker.
//!
//! This module finds frame boundaries in a zstd stream, reading from any
//! source that implements the [`RangeFetcher`] trait. It never decodes
//! compressed payloads; it only reads the few bytes needed to know where
//! each frame starts and ends.
//!
//! ## Walking Strategy
//!
//! A zstd archive is a plain concatenation of frames:
//! 1. Read the 4-byte magic at the current offset
//! 2. Skippable frames declare their size right after the magic; jump over them
//! 3. A data frame's header length comes from its descriptor byte
//! 4. Block headers (3 bytes each) give every block's on-disk length; walk
//!    them until the one flagged last
//! 5. An optional 4-byte checksum follows the last block
//!
//! Each step is a handful of bytes, so sizing a frame costs one small
//! ranged read per block rather than a download of the frame.

use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::io::RangeFetcher;

use super::structures::*;

/// zstd frame walker over a ranged data source.
///
/// Each method takes an offset and returns a new one; the parser itself
/// holds no position. [`StreamCursor`](crate::StreamCursor) owns that.
///
/// ## Example
///
/// ```ignore
/// let parser = FrameParser::new(reader);
/// let start = parser.locate(0).await?;
/// let size = parser.size_of(start).await?;
/// ```
pub struct FrameParser<R: RangeFetcher> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
    layout: FrameLayout,
}

impl<R: RangeFetcher> FrameParser<R> {
    /// Create a parser using the fixed 6-byte header layout.
    pub fn new(reader: Arc<R>) -> Self {
        Self::with_layout(reader, FrameLayout::default())
    }

    pub fn with_layout(reader: Arc<R>, layout: FrameLayout) -> Self {
        let size = reader.size();
        Self {
            reader,
            size,
            layout,
        }
    }

    /// Fetch `length` bytes at `offset`, refusing ranges past the archive end.
    async fn read_exact(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        match offset.checked_add(length as u64) {
            Some(end) if end <= self.size => self.reader.fetch(offset, length).await,
            _ => Err(Error::out_of_bounds(offset, length as u64, self.size)),
        }
    }

    /// Read and classify the magic number at `offset`.
    pub async fn read_magic(&self, offset: u64) -> Result<FrameMagic> {
        let buf = self.read_exact(offset, MAGIC_SIZE).await?;
        FrameMagic::from_bytes(&buf, offset)
    }

    /// Offset just past the skippable frame starting at `offset`.
    ///
    /// The caller must already know a skippable frame starts there.
    pub async fn skip_frame(&self, offset: u64) -> Result<u64> {
        let buf = self.read_exact(offset + MAGIC_SIZE as u64, 4).await?;
        let skip_size = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as u64;
        trace!(offset, skip_size, "skipping skippable frame");
        Ok(offset + SKIPPABLE_HEADER_SIZE + skip_size)
    }

    /// Find the first data frame at or after `offset`.
    ///
    /// Skippable frames are jumped over one by one; anything that is
    /// neither a data frame nor a skippable frame is an error.
    pub async fn locate(&self, offset: u64) -> Result<u64> {
        let mut pos = offset;
        loop {
            match self.read_magic(pos).await? {
                FrameMagic::DataFrame => {
                    debug!(offset = pos, "located data frame");
                    return Ok(pos);
                }
                FrameMagic::SkippableFrame => pos = self.skip_frame(pos).await?,
            }
        }
    }

    /// Like [`locate`](Self::locate), but returns `None` when the skippable
    /// frames end exactly at the end of the archive.
    ///
    /// A data frame or skippable frame cut short by the end of the archive
    /// is still an error.
    pub async fn locate_or_end(&self, offset: u64) -> Result<Option<u64>> {
        let mut pos = offset;
        loop {
            if pos == self.size {
                debug!(offset = pos, "no data frame before end of archive");
                return Ok(None);
            }
            match self.read_magic(pos).await? {
                FrameMagic::DataFrame => {
                    debug!(offset = pos, "located data frame");
                    return Ok(Some(pos));
                }
                FrameMagic::SkippableFrame => pos = self.skip_frame(pos).await?,
            }
        }
    }

    /// Decode the block header at `offset`.
    pub async fn next_block(&self, offset: u64) -> Result<Block> {
        let buf = self.read_exact(offset, BLOCK_HEADER_SIZE).await?;
        let header = BlockHeader::from_bytes(&buf)?;

        if header.block_type == BlockType::Reserved {
            return Err(Error::invalid_frame(offset, "reserved block type"));
        }

        let next_offset = offset + BLOCK_HEADER_SIZE as u64 + header.content_len();
        trace!(
            offset,
            size = header.block_size,
            kind = ?header.block_type,
            last = header.is_last,
            "block"
        );

        Ok(Block {
            offset,
            header,
            next_offset,
        })
    }

    /// Read the descriptor of the data frame at `frame_start` and resolve
    /// its header and trailer lengths for the configured layout.
    pub async fn frame_header(&self, frame_start: u64) -> Result<(u64, u64)> {
        let buf = self.read_exact(frame_start + MAGIC_SIZE as u64, 1).await?;
        let header = FrameHeader::from_descriptor(buf[0], frame_start)?;

        match self.layout {
            FrameLayout::Fixed => {
                if header.header_len() != FIXED_FRAME_HEADER_SIZE {
                    return Err(Error::invalid_frame(
                        frame_start,
                        format!(
                            "frame header is {} bytes, fixed layout expects {}",
                            header.header_len(),
                            FIXED_FRAME_HEADER_SIZE
                        ),
                    ));
                }
                if !header.has_checksum {
                    return Err(Error::invalid_frame(
                        frame_start,
                        "fixed layout expects a content checksum",
                    ));
                }
                Ok((FIXED_FRAME_HEADER_SIZE, CHECKSUM_SIZE))
            }
            FrameLayout::Descriptor => Ok((header.header_len(), header.checksum_len())),
        }
    }

    /// Locate the frame's blocks and measure its whole span.
    pub async fn frame_span(&self, frame_start: u64) -> Result<FrameSpan> {
        let (header_len, trailer_len) = self.frame_header(frame_start).await?;

        let mut block_pos = frame_start + header_len;
        let mut block_count = 0;
        let blocks_end = loop {
            let block = self.next_block(block_pos).await?;
            block_count += 1;
            if block.is_last() {
                break block.next_offset;
            }
            block_pos = block.next_offset;
        };

        let end = blocks_end + trailer_len;
        if end > self.size {
            return Err(Error::out_of_bounds(
                frame_start,
                end - frame_start,
                self.size,
            ));
        }

        let span = FrameSpan {
            start: frame_start,
            size: end - frame_start,
            block_count,
        };
        debug!(
            offset = span.start,
            size = span.size,
            blocks = span.block_count,
            "sized data frame"
        );
        Ok(span)
    }

    /// Total size in bytes of the data frame at `frame_start`.
    pub async fn size_of(&self, frame_start: u64) -> Result<u64> {
        Ok(self.frame_span(frame_start).await?.size)
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    pub fn archive_len(&self) -> u64 {
        self.size
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}
