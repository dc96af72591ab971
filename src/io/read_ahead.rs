use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use super::RangeFetcher;
use crate::error::Result;

/// Read-ahead window over another reader.
///
/// Frame and block headers are tiny and usually sit close together, so a
/// small read that misses the window pulls in `window` bytes at once and
/// subsequent header reads are served from memory. Reads at least as large
/// as the window bypass it.
pub struct ReadAheadReader<R: RangeFetcher> {
    inner: R,
    window: usize,
    cached: Mutex<Option<(u64, Vec<u8>)>>,
}

impl<R: RangeFetcher> ReadAheadReader<R> {
    pub fn new(inner: R, window: usize) -> Self {
        Self {
            inner,
            window: window.max(1),
            cached: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

#[async_trait]
impl<R: RangeFetcher> RangeFetcher for ReadAheadReader<R> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if buf.len() >= self.window {
            return self.inner.read_at(offset, buf).await;
        }

        let mut cached = self.cached.lock().await;

        if let Some((start, data)) = cached.as_ref() {
            let end = start + data.len() as u64;
            if offset >= *start && offset + buf.len() as u64 <= end {
                let from = (offset - start) as usize;
                buf.copy_from_slice(&data[from..from + buf.len()]);
                return Ok(buf.len());
            }
        }

        let want = (self.window as u64).min(self.inner.size().saturating_sub(offset)) as usize;
        let mut data = vec![0u8; want.max(buf.len())];
        let n = self.inner.read_at(offset, &mut data).await?;
        data.truncate(n);
        trace!(offset, len = n, "filled read-ahead window");

        let copied = n.min(buf.len());
        buf[..copied].copy_from_slice(&data[..copied]);
        *cached = Some((offset, data));

        Ok(copied)
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;

    #[tokio::test]
    async fn test_serves_adjacent_reads_from_window() {
        let data: Vec<u8> = (0..=255).collect();
        let reader = ReadAheadReader::new(MemoryReader::with_read_log(data), 64);

        assert_eq!(reader.fetch(10, 4).await.unwrap(), vec![10, 11, 12, 13]);
        assert_eq!(reader.fetch(14, 3).await.unwrap(), vec![14, 15, 16]);
        assert_eq!(reader.fetch(80, 2).await.unwrap(), vec![80, 81]);

        // Only the first and the third read went to the inner reader
        assert_eq!(reader.inner().read_log(), vec![(10, 64), (80, 64)]);
    }

    #[tokio::test]
    async fn test_window_clamped_at_end() {
        let reader = ReadAheadReader::new(MemoryReader::with_read_log(vec![7u8; 20]), 64);
        assert_eq!(reader.fetch(16, 4).await.unwrap(), vec![7; 4]);
        assert_eq!(reader.inner().read_log(), vec![(16, 4)]);
        assert!(reader.fetch(18, 4).await.is_err());
    }

    #[tokio::test]
    async fn test_large_reads_bypass_window() {
        let reader = ReadAheadReader::new(MemoryReader::with_read_log(vec![1u8; 100]), 8);
        assert_eq!(reader.fetch(0, 50).await.unwrap().len(), 50);
        assert_eq!(reader.inner().read_log(), vec![(0, 50)]);
    }
}
