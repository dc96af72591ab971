//! One consuming run over an archive.
//!
//! An [`ArchiveSession`] ties a [`StreamCursor`] to an optional
//! [`StateFile`]. It resumes from saved state when the saved url matches,
//! stops cleanly when only skippable frames remain, and saves the position
//! each time the caller commits a frame.

use tracing::{debug, info, warn};

use crate::cursor::StreamCursor;
use crate::error::Result;
use crate::frame::{FrameParser, FrameSpan};
use crate::io::RangeFetcher;
use crate::state::StateFile;

pub struct ArchiveSession<R: RangeFetcher> {
    cursor: StreamCursor<R>,
    state_file: Option<StateFile>,
    limit: Option<u64>,
    frames: u64,
}

impl<R: RangeFetcher> ArchiveSession<R> {
    /// Open a session on `source`.
    ///
    /// Saved state is used only when it names the same source and `restart`
    /// is not set. State for another source is ignored with a warning.
    pub async fn open(
        parser: FrameParser<R>,
        source: impl Into<String>,
        state_file: Option<StateFile>,
        restart: bool,
    ) -> Result<Self> {
        let mut cursor = StreamCursor::new(parser, source);

        if let Some(file) = &state_file
            && !restart
        {
            match file.load().await? {
                Some(state) if state.url == cursor.url() => {
                    info!(offset = state.current_pos, "resuming");
                    cursor.load(state)?;
                }
                Some(state) => warn!("Ignoring saved state for a different source: {}", state.url),
                None => {}
            }
        }

        Ok(Self {
            cursor,
            state_file,
            limit: None,
            frames: 0,
        })
    }

    /// Stop after `limit` frames
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Next data frame, or `None` once the limit or the end of the archive
    /// is reached.
    ///
    /// Trailing skippable frames count as the end. Every other failure,
    /// including a data frame cut short by the end of the archive, is
    /// returned as an error.
    pub async fn next_frame(&mut self) -> Result<Option<FrameSpan>> {
        if self.limit.is_some_and(|limit| self.frames >= limit) {
            debug!(frames = self.frames, "frame limit reached");
            return Ok(None);
        }
        if self.cursor.is_at_end() {
            return Ok(None);
        }

        let span = self.cursor.try_next_frame().await?;
        if span.is_some() {
            self.frames += 1;
        }
        Ok(span)
    }

    /// Save the cursor position, if a state file was given
    pub async fn commit(&self) -> Result<()> {
        match &self.state_file {
            Some(file) => file.save(&self.cursor.snapshot()).await,
            None => Ok(()),
        }
    }

    /// Frames returned so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn cursor(&self) -> &StreamCursor<R> {
        &self.cursor
    }
}
