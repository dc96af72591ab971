//! Resumable position within a zstd archive.
//!
//! The cursor only moves after a whole frame has been located and sized,
//! so an error or a dropped future in the middle of [`StreamCursor::advance`]
//! leaves it at the last frame boundary it reached.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::frame::{FrameParser, FrameSpan};
use crate::io::RangeFetcher;

/// Persisted form of a cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    pub url: String,
    pub current_pos: u64,
}

/// Where the cursor is in its advance cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    Idle,
    /// Skipping to the next data frame
    Resolving,
    /// Walking the frame's blocks
    Sizing,
    /// Moved past a frame; the next advance starts from here
    Advanced,
    /// The last advance failed; the position is unchanged
    Failed,
}

/// Frame-by-frame cursor over one archive
pub struct StreamCursor<R: RangeFetcher> {
    parser: FrameParser<R>,
    url: String,
    current_pos: u64,
    phase: CursorPhase,
}

impl<R: RangeFetcher> StreamCursor<R> {
    /// Start at the beginning of the archive
    pub fn new(parser: FrameParser<R>, url: impl Into<String>) -> Self {
        Self {
            parser,
            url: url.into(),
            current_pos: 0,
            phase: CursorPhase::Idle,
        }
    }

    /// Resume from a saved state
    pub fn from_state(parser: FrameParser<R>, state: CursorState) -> Result<Self> {
        let mut cursor = Self::new(parser, state.url.clone());
        cursor.load(state)?;
        Ok(cursor)
    }

    pub fn current(&self) -> u64 {
        self.current_pos
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Phase of the last advance.
    ///
    /// If an advance future is dropped before it completes, the phase stays
    /// at `Resolving` or `Sizing`. The position is untouched in that case
    /// and the next advance starts again from [`current`](Self::current).
    pub fn phase(&self) -> CursorPhase {
        self.phase
    }

    pub fn is_at_end(&self) -> bool {
        self.current_pos >= self.parser.archive_len()
    }

    pub fn parser(&self) -> &FrameParser<R> {
        &self.parser
    }

    /// Replace the url and position with a saved state
    pub fn load(&mut self, state: CursorState) -> Result<()> {
        let archive_len = self.parser.archive_len();
        if state.current_pos > archive_len {
            return Err(Error::out_of_bounds(state.current_pos, 0, archive_len));
        }
        self.url = state.url;
        self.current_pos = state.current_pos;
        self.phase = CursorPhase::Idle;
        Ok(())
    }

    pub fn snapshot(&self) -> CursorState {
        CursorState {
            url: self.url.clone(),
            current_pos: self.current_pos,
        }
    }

    /// Move past the next data frame and return its span.
    ///
    /// Skippable frames before it are consumed as well; the cursor ends up
    /// at `span.end()`.
    pub async fn next_frame(&mut self) -> Result<FrameSpan> {
        let walked = self.walk_frame(false).await;
        let archive_len = self.parser.archive_len();
        self.settle(walked)?
            .ok_or_else(|| Error::out_of_bounds(archive_len, 0, archive_len))
    }

    /// Like [`next_frame`](Self::next_frame), but returns `None` when only
    /// skippable frames are left before the end of the archive.
    ///
    /// The cursor then moves to the end. A data frame cut short by the end
    /// of the archive is still an error.
    pub async fn try_next_frame(&mut self) -> Result<Option<FrameSpan>> {
        let walked = self.walk_frame(true).await;
        self.settle(walked)
    }

    /// Move past the next data frame and return the new position
    pub async fn advance(&mut self) -> Result<u64> {
        self.next_frame().await.map(|span| span.end())
    }

    fn settle(&mut self, walked: Result<Option<FrameSpan>>) -> Result<Option<FrameSpan>> {
        match walked {
            Ok(span) => {
                self.current_pos = match &span {
                    Some(span) => span.end(),
                    None => self.parser.archive_len(),
                };
                self.phase = CursorPhase::Advanced;
                Ok(span)
            }
            Err(e) => {
                warn!(offset = self.current_pos, error = %e, "advance failed");
                self.phase = CursorPhase::Failed;
                Err(e)
            }
        }
    }

    async fn walk_frame(&mut self, stop_at_end: bool) -> Result<Option<FrameSpan>> {
        self.phase = CursorPhase::Resolving;
        let frame_start = if stop_at_end {
            match self.parser.locate_or_end(self.current_pos).await? {
                Some(start) => start,
                None => {
                    debug!(from = self.current_pos, "only skippable frames remain");
                    return Ok(None);
                }
            }
        } else {
            self.parser.locate(self.current_pos).await?
        };

        self.phase = CursorPhase::Sizing;
        let span = self.parser.frame_span(frame_start).await?;
        debug!(from = self.current_pos, to = span.end(), "advanced cursor");
        Ok(Some(span))
    }
}
