//! # runzst
//!
//! Walk a zstd archive frame by frame over HTTP Range requests.
//!
//! Large zstd archives such as the Lichess PGN dumps are concatenations of
//! independently decodable frames. This library finds those frames by
//! reading only their magic numbers and block headers, so a consumer can
//! fetch and decompress one frame at a time, stop, and later resume from
//! the same frame boundary without downloading what came before.
//!
//! ## Features
//!
//! - Locate data frames, skipping skippable frames
//! - Size frames by walking their block headers
//! - Resumable cursor with a JSON state file
//! - Local files, in-memory buffers and HTTP/HTTPS URLs as sources
//! - Optional read-ahead window to batch small header reads
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use runzst::{FrameExtractor, FrameParser, HttpRangeReader, StreamCursor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let url = "https://example.com/games.pgn.zst".to_string();
//!     let reader = Arc::new(HttpRangeReader::new(url.clone()).await?);
//!
//!     let mut cursor = StreamCursor::new(FrameParser::new(reader.clone()), url);
//!     let extractor = FrameExtractor::new(reader);
//!
//!     let span = cursor.next_frame().await?;
//!     let text = extractor.decompress_frame(&span).await?;
//!     println!("{} bytes of PGN, resume at {}", text.len(), cursor.current());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod cursor;
pub mod error;
pub mod frame;
pub mod io;
pub mod session;
pub mod state;

pub use cli::Cli;
pub use cursor::{CursorPhase, CursorState, StreamCursor};
pub use error::{Error, ErrorKind, Result};
pub use frame::{FrameExtractor, FrameLayout, FrameParser, FrameSpan};
pub use io::{HttpConfig, HttpRangeReader, LocalFileReader, MemoryReader, RangeFetcher, ReadAheadReader};
pub use session::ArchiveSession;
pub use state::StateFile;
