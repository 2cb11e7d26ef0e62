//! Capabilities supplied by the host e-book manager.
//!
//! Henkan never renders AZW3 itself and owns no library storage. The host
//! injects both through these traits, which keeps the rebuild and sidecar
//! logic testable against synthetic archives.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BookId, BookMetadata};

/// Turns the bytes of a source e-book into a ZIP archive of page images.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Converts `source` (e.g. an AZW3 file) for the given book.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - Bytes of a ZIP container holding the rendered pages
    /// * `Err(Error)` - Usually [`Error::Engine`](crate::error::Error::Engine)
    async fn convert(&self, book_id: BookId, source: Vec<u8>) -> Result<Vec<u8>>;
}

/// Plain functions and closures are engines; they run inline.
#[async_trait]
impl<F> ConversionEngine for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync,
{
    async fn convert(&self, _book_id: BookId, source: Vec<u8>) -> Result<Vec<u8>> {
        self(&source)
    }
}

/// Read and write access to the host's library catalog.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Bytes of the book's file in `format` (e.g. `"AZW3"`), if the book has one.
    async fn format(&self, book_id: BookId, format: &str) -> Result<Option<Vec<u8>>>;

    /// Descriptive metadata of the book.
    async fn metadata(&self, book_id: BookId) -> Result<BookMetadata>;

    /// Cover image bytes, if the catalog keeps one.
    async fn cover(&self, _book_id: BookId) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    /// Stores `data` as the book's file in `format`, replacing any previous one.
    async fn add_format(&self, book_id: BookId, format: &str, data: Vec<u8>) -> Result<()>;
}
