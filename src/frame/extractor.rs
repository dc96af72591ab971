use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::io::RangeFetcher;

use super::structures::FrameSpan;

/// Fetches sized frames and hands them to the zstd decoder
pub struct FrameExtractor<R: RangeFetcher> {
    reader: Arc<R>,
}

impl<R: RangeFetcher> FrameExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self { reader }
    }

    /// Fetch the raw compressed bytes of a frame in a single ranged read
    pub async fn read_frame(&self, span: &FrameSpan) -> Result<Vec<u8>> {
        let end = span.start.checked_add(span.size);
        if end.is_none_or(|end| end > self.reader.size()) {
            return Err(Error::out_of_bounds(span.start, span.size, self.reader.size()));
        }
        self.reader.fetch(span.start, span.size as usize).await
    }

    /// Fetch a frame and decompress it
    pub async fn decompress_frame(&self, span: &FrameSpan) -> Result<Vec<u8>> {
        let compressed = self.read_frame(span).await?;
        zstd::stream::decode_all(compressed.as_slice()).map_err(|source| Error::Decompress {
            offset: span.start,
            source,
        })
    }

    /// Decompress a frame into any async writer
    pub async fn extract_to_writer<W>(&self, span: &FrameSpan, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let data = self.decompress_frame(span).await?;
        writer.write_all(&data).await.map_err(Error::LocalIo)?;
        Ok(data.len() as u64)
    }

    /// Decompress a frame to stdout
    pub async fn extract_to_stdout(&self, span: &FrameSpan) -> Result<u64> {
        let mut stdout = tokio::io::stdout();
        let written = self.extract_to_writer(span, &mut stdout).await?;
        stdout.flush().await.map_err(Error::LocalIo)?;
        Ok(written)
    }
}
