use async_trait::async_trait;
use std::sync::Mutex;

use super::RangeFetcher;
use crate::error::Result;

/// In-memory archive, mostly for tests and for callers that already hold
/// the compressed bytes.
#[derive(Debug, Default)]
pub struct MemoryReader {
    data: Vec<u8>,
    reads: Option<Mutex<Vec<(u64, usize)>>>,
}

impl MemoryReader {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            reads: None,
        }
    }

    /// Like [`MemoryReader::new`], but records every read as
    /// `(offset, length)`.
    ///
    /// The log grows by one entry per read until [`clear_read_log`]
    /// is called, so keep it to inspecting access patterns.
    ///
    /// [`clear_read_log`]: MemoryReader::clear_read_log
    pub fn with_read_log(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            reads: Some(Mutex::new(Vec::new())),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reads issued so far, in order. Empty unless logging was enabled.
    pub fn read_log(&self) -> Vec<(u64, usize)> {
        self.reads
            .as_ref()
            .and_then(|log| log.lock().ok().map(|log| log.clone()))
            .unwrap_or_default()
    }

    pub fn read_count(&self) -> usize {
        self.reads
            .as_ref()
            .and_then(|log| log.lock().ok().map(|log| log.len()))
            .unwrap_or_default()
    }

    pub fn clear_read_log(&self) {
        if let Some(Ok(mut log)) = self.reads.as_ref().map(|log| log.lock()) {
            log.clear();
        }
    }
}

#[async_trait]
impl RangeFetcher for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if let Some(Ok(mut log)) = self.reads.as_ref().map(|log| log.lock()) {
            log.push((offset, buf.len()));
        }

        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_log_is_opt_in() {
        let plain = MemoryReader::new(vec![1u8; 8]);
        plain.fetch(0, 4).await.unwrap();
        assert_eq!(plain.read_count(), 0);
        assert!(plain.read_log().is_empty());

        let logged = MemoryReader::with_read_log(vec![1u8; 8]);
        logged.fetch(0, 4).await.unwrap();
        logged.fetch(4, 2).await.unwrap();
        assert_eq!(logged.read_log(), vec![(0, 4), (4, 2)]);

        logged.clear_read_log();
        assert_eq!(logged.read_count(), 0);
    }
}
