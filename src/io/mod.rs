mod http;
mod local;
mod memory;
mod read_ahead;

pub use http::{HttpConfig, HttpRangeReader};
pub use local::LocalFileReader;
pub use memory::MemoryReader;
pub use read_ahead::ReadAheadReader;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Trait for ranged reads from a data source
#[async_trait]
pub trait RangeFetcher: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fetch exactly `length` bytes starting at `offset`.
    ///
    /// Anything shorter is reported as [`Error::ShortRead`].
    async fn fetch(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; length];
        let n = self.read_at(offset, &mut buf).await?;
        if n != length {
            return Err(Error::ShortRead {
                offset,
                expected: length,
                actual: n,
            });
        }
        Ok(buf)
    }
}

#[async_trait]
impl<R: RangeFetcher + ?Sized> RangeFetcher for std::sync::Arc<R> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read_at(offset, buf).await
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}
