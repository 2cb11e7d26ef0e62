use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::CompressionMethod;

use crate::error::{Error, Result};
use crate::generator::CbzRebuilder;
use crate::generator::comic_info::render_comic_info;
use crate::host::{BookCatalog, ConversionEngine};
use crate::naming::{DEFAULT_NAMING_SCHEME, render_file_name, validate_template};
use crate::path_utils::{normalize_path, path_to_string_lossy};
use crate::types::{
    BatchReport, BookId, BookMetadata, COMIC_INFO_FILE_NAME, ConversionOutcome,
    ConversionSummary, RebuildOutput, RebuiltArchive, SkipReason, SourceArchive, count_pages,
};

/// Settings snapshot for converting library books to CBZ, built declaratively
/// using the builder pattern.
///
/// A host passes one of these to every entry point; nothing is read from
/// global state. Defaults are declared once, on the builder:
///
/// | Setting                   | Default                                |
/// |---------------------------|----------------------------------------|
/// | `include_comic_info`      | `true`                                 |
/// | `insert_cover_as_page`    | `true`                                 |
/// | `store_uncompressed`      | `true`                                 |
/// | `naming_scheme`           | `"{series} #{series_index} - {title}"` |
/// | `auto_convert_on_import`  | `false`                                |
/// | `source_format`           | `"AZW3"`                               |
/// | `target_format`           | `"CBZ"`                                |
///
/// Entry points:
///
/// - [`convert_book`](HenkanConfig::convert_book): one book, end to end
/// - [`convert_books`](HenkanConfig::convert_books): a selection, skip-and-continue
/// - [`on_format_added`](HenkanConfig::on_format_added): post-import hook
/// - [`rebuild_archive`](HenkanConfig::rebuild_archive): the pure rebuild step
/// - [`export`](HenkanConfig::export): write a rebuilt archive to a directory
///
/// ```rust,no_run
/// # use henkan::prelude::*;
/// let config = HenkanConfig::builder()
///     .include_comic_info(true)
///     .naming_scheme("{title}")
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HenkanConfig {
    /// Append a generated `ComicInfo.xml` as the last archive entry.
    #[builder(default = "true")]
    pub include_comic_info: bool,

    /// Insert the catalog's cover image as the first page (`000_cover.<ext>`)
    /// when the catalog has one.
    #[builder(default = "true")]
    pub insert_cover_as_page: bool,

    /// Write every entry uncompressed. When `false`, entries are deflated.
    #[builder(default = "true")]
    pub store_uncompressed: bool,

    /// Template for exported file names, see [`crate::naming`].
    #[builder(default = "DEFAULT_NAMING_SCHEME.to_string()")]
    pub naming_scheme: String,

    /// Whether [`on_format_added`](HenkanConfig::on_format_added) converts
    /// newly imported books.
    #[builder(default = "false")]
    pub auto_convert_on_import: bool,

    /// Catalog format converted from.
    #[builder(default = "\"AZW3\".to_string()")]
    pub source_format: String,

    /// Catalog format the rebuilt archive is stored as.
    #[builder(default = "\"CBZ\".to_string()")]
    pub target_format: String,
}

impl HenkanConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(scheme) = &self.naming_scheme {
            validate_template(scheme).map_err(|e| format!("Invalid naming_scheme: {}", e))?;
        }
        if let Some(format) = &self.source_format {
            if format.trim().is_empty() {
                return Err("source_format must not be empty".to_string());
            }
        }
        if let Some(format) = &self.target_format {
            if format.trim().is_empty() {
                return Err("target_format must not be empty".to_string());
            }
        }
        Ok(())
    }
}

impl HenkanConfig {
    /// Creates a new builder with every setting at its default.
    pub fn builder() -> HenkanConfigBuilder {
        HenkanConfigBuilder::default()
    }

    fn compression_method(&self) -> CompressionMethod {
        if self.store_uncompressed {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        }
    }

    /// Rebuilds a converted page archive according to these settings.
    ///
    /// This is the synchronous core of a conversion: it counts the pages of
    /// `source`, renders `ComicInfo.xml` when enabled, and writes the new
    /// archive. `cover` is only used when `insert_cover_as_page` is set; a
    /// cover that is not a recognizable image is dropped with a warning.
    /// An inserted cover counts as a page.
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveFormat`] if `source` is not a readable ZIP container.
    pub fn rebuild_archive(
        &self,
        source: &SourceArchive,
        metadata: &BookMetadata,
        cover: Option<Vec<u8>>,
    ) -> Result<RebuildOutput> {
        let names = source.entry_names()?;
        let mut rebuilder = CbzRebuilder::new().compression(self.compression_method());
        let mut page_count = count_pages(&names);
        let mut cover_inserted = false;

        if let Some(image) = cover.filter(|_| self.insert_cover_as_page) {
            match rebuilder.clone().cover_page(image) {
                Ok(with_cover) => {
                    cover_inserted = with_cover
                        .cover_entry_name()
                        .is_some_and(|name| !names.iter().any(|n| n == name));
                    if cover_inserted {
                        page_count += 1;
                    }
                    rebuilder = with_cover;
                }
                Err(e) => warn!("Ignoring cover for '{}': {}", metadata.title, e),
            }
        }

        if self.include_comic_info {
            rebuilder = rebuilder.sidecar(
                COMIC_INFO_FILE_NAME,
                render_comic_info(metadata, page_count),
            );
        }

        Ok(RebuildOutput {
            archive: rebuilder.rebuild(source)?,
            page_count,
            cover_inserted,
        })
    }

    /// Converts a single book and stores the result in the catalog.
    ///
    /// Steps:
    /// 1. Fetch the `source_format` file; books without one are skipped
    /// 2. Render pages through the injected `engine`
    /// 3. Rebuild the archive with optional cover and `ComicInfo.xml`
    /// 4. Store it as `target_format` under the same `book_id`
    ///
    /// # Returns
    ///
    /// * `Ok(ConversionOutcome::Converted(_))` - The CBZ was stored
    /// * `Ok(ConversionOutcome::Skipped(_, SkipReason::NoSourceFormat))` - Nothing to convert
    /// * `Err(Error)` - Engine, catalog or archive failure; nothing was stored
    pub async fn convert_book<E, C>(
        &self,
        engine: &E,
        catalog: &C,
        book_id: BookId,
    ) -> Result<ConversionOutcome>
    where
        E: ConversionEngine + ?Sized,
        C: BookCatalog + ?Sized,
    {
        let source_book = match catalog.format(book_id, &self.source_format).await? {
            Some(bytes) => bytes,
            None => {
                debug!(
                    "Book {} has no {} format, skipping",
                    book_id, self.source_format
                );
                return Ok(ConversionOutcome::Skipped(
                    book_id,
                    SkipReason::NoSourceFormat,
                ));
            }
        };

        let converted = engine.convert(book_id, source_book).await?;
        let metadata = catalog.metadata(book_id).await?;
        let cover = if self.insert_cover_as_page {
            catalog.cover(book_id).await?
        } else {
            None
        };

        let config = self.clone();
        let title = metadata.title.clone();
        let output = spawn_blocking(move || {
            config.rebuild_archive(&SourceArchive::from_bytes(converted), &metadata, cover)
        })
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        let RebuildOutput {
            archive: rebuilt,
            page_count,
            cover_inserted,
        } = output;
        let entry_count = rebuilt.entry_names()?.len();
        let archive_size = rebuilt.len();
        catalog
            .add_format(book_id, &self.target_format, rebuilt.into_bytes())
            .await?;

        info!(
            "Converted book {} ('{}') to {}: {} pages, {} bytes",
            book_id, title, self.target_format, page_count, archive_size
        );

        Ok(ConversionOutcome::Converted(ConversionSummary {
            book_id,
            title,
            page_count,
            entry_count,
            has_comic_info: self.include_comic_info,
            has_cover_page: cover_inserted,
            archive_size,
        }))
    }

    /// Converts every selected book, one after another.
    ///
    /// A failure for one book is recorded in the report and the batch goes
    /// on with the next book.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySelection`] if `book_ids` is empty.
    pub async fn convert_books<E, C>(
        &self,
        engine: &E,
        catalog: &C,
        book_ids: &[BookId],
    ) -> Result<BatchReport>
    where
        E: ConversionEngine + ?Sized,
        C: BookCatalog + ?Sized,
    {
        if book_ids.is_empty() {
            return Err(Error::EmptySelection);
        }

        let mut report = BatchReport::default();
        for &book_id in book_ids {
            match self.convert_book(engine, catalog, book_id).await {
                Ok(ConversionOutcome::Converted(summary)) => report.converted.push(summary),
                Ok(ConversionOutcome::Skipped(id, reason)) => report.skipped.push((id, reason)),
                Err(e) => {
                    warn!("Conversion of book {} failed: {}", book_id, e);
                    report.failed.push((book_id, e.to_string()));
                }
            }
        }

        info!(
            "Batch finished: {} converted, {} skipped, {} failed",
            report.converted.len(),
            report.skipped.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Post-import hook: called by the host after a format was added to a book.
    ///
    /// Converts only when `auto_convert_on_import` is enabled and `format`
    /// matches `source_format` (case-insensitive).
    pub async fn on_format_added<E, C>(
        &self,
        engine: &E,
        catalog: &C,
        book_id: BookId,
        format: &str,
    ) -> Result<ConversionOutcome>
    where
        E: ConversionEngine + ?Sized,
        C: BookCatalog + ?Sized,
    {
        if !self.auto_convert_on_import {
            return Ok(ConversionOutcome::Skipped(
                book_id,
                SkipReason::AutoConvertDisabled,
            ));
        }
        if !format.eq_ignore_ascii_case(&self.source_format) {
            return Ok(ConversionOutcome::Skipped(
                book_id,
                SkipReason::OtherFormat(format.to_string()),
            ));
        }
        self.convert_book(engine, catalog, book_id).await
    }

    /// File name (with `.cbz` extension) of an exported archive.
    pub fn export_file_name(&self, metadata: &BookMetadata) -> String {
        format!("{}.cbz", render_file_name(&self.naming_scheme, metadata))
    }

    /// Writes a rebuilt archive into `output_dir`, named by `naming_scheme`.
    ///
    /// The directory is created when missing. An existing file of the same
    /// name is overwritten.
    pub async fn export(
        &self,
        archive: &RebuiltArchive,
        metadata: &BookMetadata,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let normalized_dir = normalize_path(output_dir)?;
        if !normalized_dir.exists() {
            fs::create_dir_all(&normalized_dir).await?;
        }

        let output_path = normalize_path(&normalized_dir.join(self.export_file_name(metadata)))?;
        fs::write(&output_path, archive.as_bytes())
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to write '{}': {}",
                        path_to_string_lossy(&output_path),
                        e
                    ),
                ))
            })?;

        debug!("Exported '{}'", path_to_string_lossy(&output_path));
        Ok(output_path)
    }
}
