//! zstd frame location, sizing and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: Magic numbers, block headers and frame header descriptors
//! - [`parser`]: Frame walking over a ranged reader (locate, block walk, size)
//! - [`extractor`]: Fetching a sized frame and decompressing it
//!
//! ## zstd Format Overview
//!
//! A zstd archive is a sequence of frames:
//! 1. Data frames: magic `0xFD2FB528`, a 2-14 byte header, one or more
//!    blocks, and an optional 4-byte checksum
//! 2. Skippable frames: magic `0x184D2A5?`, a 4-byte size, opaque payload
//!
//! Every data frame decompresses on its own, so an archive can be consumed
//! from any frame boundary.
//!
//! ## Limitations
//!
//! - Dictionaries are not supported by the downstream decoder
//! - Checksums are counted for sizing but not verified while walking

mod extractor;
mod parser;
mod structures;

pub use extractor::FrameExtractor;
pub use parser::FrameParser;
pub use structures::*;
