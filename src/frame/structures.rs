use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};

/// Magic number of a zstd data frame
pub const DATA_FRAME_MAGIC: u32 = 0xFD2FB528;

/// First skippable frame magic number; the low nibble may take any value
pub const SKIPPABLE_FRAME_MAGIC: u32 = 0x184D2A50;

const SKIPPABLE_MAGIC_MASK: u32 = 0xFFFFFFF0;

pub const MAGIC_SIZE: usize = 4;

/// Magic number plus the 4-byte size field
pub const SKIPPABLE_HEADER_SIZE: u64 = 8;

pub const BLOCK_HEADER_SIZE: usize = 3;

/// Header length assumed by [`FrameLayout::Fixed`]
pub const FIXED_FRAME_HEADER_SIZE: u64 = 6;

pub const CHECKSUM_SIZE: u64 = 4;

/// Kind of frame starting at a given offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMagic {
    DataFrame,
    SkippableFrame,
}

impl FrameMagic {
    pub fn from_u32(value: u32) -> Option<Self> {
        if value == DATA_FRAME_MAGIC {
            Some(FrameMagic::DataFrame)
        } else if value & SKIPPABLE_MAGIC_MASK == SKIPPABLE_FRAME_MAGIC {
            Some(FrameMagic::SkippableFrame)
        } else {
            None
        }
    }

    /// Decode the magic number at the start of `data`.
    ///
    /// `offset` is only used for error reporting.
    pub fn from_bytes(data: &[u8], offset: u64) -> Result<Self> {
        let magic = Cursor::new(data).read_u32::<LittleEndian>()?;
        Self::from_u32(magic).ok_or(Error::UnknownMagic { offset, magic })
    }
}

/// zstd block types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Raw,
    Rle,
    Compressed,
    Reserved,
}

impl BlockType {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => BlockType::Raw,
            1 => BlockType::Rle,
            2 => BlockType::Compressed,
            _ => BlockType::Reserved,
        }
    }
}

/// Block header - 3 bytes, little-endian
///
/// ```text
/// bit 0      Last_Block
/// bits 1-2   Block_Type
/// bits 3-23  Block_Size
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub is_last: bool,
    pub block_type: BlockType,
    pub block_size: u32,
}

impl BlockHeader {
    pub fn from_u24(value: u32) -> Self {
        Self {
            is_last: value & 1 == 1,
            block_type: BlockType::from_bits(value >> 1),
            block_size: value >> 3,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let value = Cursor::new(data).read_u24::<LittleEndian>()?;
        Ok(Self::from_u24(value))
    }

    /// Bytes the block's content occupies in the archive.
    ///
    /// An RLE block stores a single byte; its size field is the
    /// regenerated length.
    pub fn content_len(&self) -> u64 {
        match self.block_type {
            BlockType::Rle => 1,
            _ => self.block_size as u64,
        }
    }
}

/// How the header and trailer lengths of a data frame are determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameLayout {
    /// 6-byte header and 4-byte checksum, as written by the zstd CLI with
    /// default settings. Frames whose descriptor disagrees are rejected.
    #[default]
    Fixed,
    /// Header and checksum lengths taken from the frame header descriptor
    Descriptor,
}

/// Frame header descriptor fields needed for sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub descriptor: u8,
    pub single_segment: bool,
    pub has_checksum: bool,
    pub dictionary_id_size: u64,
    pub content_size_size: u64,
}

impl FrameHeader {
    /// Decode the Frame_Header_Descriptor byte.
    ///
    /// `offset` is the frame start, used for error reporting.
    pub fn from_descriptor(descriptor: u8, offset: u64) -> Result<Self> {
        if descriptor & 0b0000_1000 != 0 {
            return Err(Error::invalid_frame(
                offset,
                "reserved bit set in frame header descriptor",
            ));
        }

        let single_segment = descriptor & 0b0010_0000 != 0;
        let content_size_size = match descriptor >> 6 {
            0 if single_segment => 1,
            0 => 0,
            1 => 2,
            2 => 4,
            _ => 8,
        };
        let dictionary_id_size = match descriptor & 0b11 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };

        Ok(Self {
            descriptor,
            single_segment,
            has_checksum: descriptor & 0b0000_0100 != 0,
            dictionary_id_size,
            content_size_size,
        })
    }

    /// Header length including the magic number
    pub fn header_len(&self) -> u64 {
        let window_descriptor = if self.single_segment { 0 } else { 1 };
        MAGIC_SIZE as u64 + 1 + window_descriptor + self.dictionary_id_size + self.content_size_size
    }

    pub fn checksum_len(&self) -> u64 {
        if self.has_checksum { CHECKSUM_SIZE } else { 0 }
    }
}

/// Byte span of one data frame in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpan {
    pub start: u64,
    pub size: u64,
    pub block_count: usize,
}

impl FrameSpan {
    pub fn end(&self) -> u64 {
        self.start + self.size
    }
}

/// One decoded block and where the next one begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub offset: u64,
    pub header: BlockHeader,
    pub next_offset: u64,
}

impl Block {
    pub fn is_last(&self) -> bool {
        self.header.is_last
    }
}
