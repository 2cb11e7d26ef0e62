//! Henkan - AZW3 to CBZ post-processing library
//!
//! This crate turns the page-image archive produced by a host's e-book
//! conversion engine into a CBZ file: entries are rewritten uncompressed,
//! a cover can be inserted as the first page, and a `ComicInfo.xml` sidecar
//! is generated from the book's catalog metadata.
//!
//! The host stays in charge of everything else. It injects its rendering
//! engine through [`host::ConversionEngine`] and its library through
//! [`host::BookCatalog`], and passes an explicit [`HenkanConfig`] to every
//! call.
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use henkan::prelude::*;
//!
//! # struct Library;
//! # #[async_trait::async_trait]
//! # impl BookCatalog for Library {
//! #     async fn format(&self, _: BookId, _: &str) -> henkan::error::Result<Option<Vec<u8>>> { Ok(None) }
//! #     async fn metadata(&self, _: BookId) -> henkan::error::Result<BookMetadata> { Ok(BookMetadata::default()) }
//! #     async fn add_format(&self, _: BookId, _: &str, _: Vec<u8>) -> henkan::error::Result<()> { Ok(()) }
//! # }
//! #[tokio::main]
//! async fn main() -> henkan::error::Result<()> {
//!     let library = Library;
//!     // The host's renderer; here the "AZW3" already is a page archive.
//!     let engine = |azw3: &[u8]| -> henkan::error::Result<Vec<u8>> { Ok(azw3.to_vec()) };
//!
//!     let config = HenkanConfig::builder()
//!         .include_comic_info(true)
//!         .store_uncompressed(true)
//!         .build()?;
//!
//!     let report = config.convert_books(&engine, &library, &[1, 2, 3]).await?;
//!     println!(
//!         "{} converted, {} skipped, {} failed",
//!         report.converted.len(),
//!         report.skipped.len(),
//!         report.failed.len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! The rebuild and sidecar steps are also usable on their own, see
//! [`generator::rebuild`] and [`generator::render_comic_info`].

pub mod error;
pub mod generator;
pub mod henkan;
pub mod host;
pub mod naming;
pub mod path_utils;
pub mod types;

pub use henkan::HenkanConfig;
pub use henkan::HenkanConfigBuilder;

pub use types::{
    ArchiveEntry, BatchReport, BookId, BookMetadata, ConversionOutcome, ConversionSummary,
    RebuildOutput, RebuiltArchive, SkipReason, SourceArchive,
};

/// Prelude module for convenient imports.
///
/// Re-exports the commonly used types and traits so a host integration can
/// start with a single `use henkan::prelude::*;`.
pub mod prelude {
    pub use super::{
        ArchiveEntry, BatchReport, BookId, BookMetadata, ConversionOutcome, ConversionSummary,
        HenkanConfig, HenkanConfigBuilder, RebuildOutput, RebuiltArchive, SkipReason,
        SourceArchive, error, generator, types,
    };
    pub use crate::generator::{CbzRebuilder, rebuild, render_comic_info};
    pub use crate::host::{BookCatalog, ConversionEngine};
    pub use crate::types::{count_pages, is_page_image};
    pub use chrono::NaiveDate;
}
