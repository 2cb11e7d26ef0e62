//! Core data types for the Henkan conversion library.
//!
//! This module defines the fundamental data structures used throughout Henkan:
//! - Archive buffers (`SourceArchive`, `RebuiltArchive`) and their entries (`ArchiveEntry`)
//! - Descriptive book metadata (`BookMetadata`)
//! - Orchestration results (`ConversionOutcome`, `ConversionSummary`, `BatchReport`)
//! - Page detection helpers (`is_page_image`, `count_pages`)

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use zip::{CompressionMethod, ZipArchive};

use crate::error::{Error, Result};

/// Opaque catalog key identifying a book in the host library.
pub type BookId = u64;

/// File extensions (lowercase) that are counted as comic pages.
pub const PAGE_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Name of the generated metadata sidecar inside a CBZ.
pub const COMIC_INFO_FILE_NAME: &str = "ComicInfo.xml";

/// A single named entry of a ZIP container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Directory entries are stored with a trailing slash and no content.
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Immutable bytes of a ZIP container produced by the external conversion step.
///
/// The buffer is not validated on construction; [`SourceArchive::entries`]
/// reports [`Error::ArchiveFormat`] when the container cannot be read.
#[derive(Debug, Clone)]
pub struct SourceArchive {
    bytes: Vec<u8>,
}

impl SourceArchive {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Reads every entry name and its content, in central directory order.
    pub fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        let mut archive = open_archive(&self.bytes)?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::archive_format("Corrupt entry header", e))?;
            let name = file.name().to_string();
            // The declared size comes from the header and may be forged
            let capacity = file.size().min(self.bytes.len() as u64) as usize;
            let mut data = Vec::with_capacity(capacity);
            file.read_to_end(&mut data)
                .map_err(|e| Error::archive_format(&format!("Corrupt entry '{}'", name), e))?;
            entries.push(ArchiveEntry { name, data });
        }

        Ok(entries)
    }

    /// Lists entry names without decompressing their content.
    pub fn entry_names(&self) -> Result<Vec<String>> {
        let mut archive = open_archive(&self.bytes)?;
        (0..archive.len())
            .map(|index| {
                archive
                    .by_index_raw(index)
                    .map(|file| file.name().to_string())
                    .map_err(|e| Error::archive_format("Corrupt entry header", e))
            })
            .collect()
    }
}

/// Output of the archive rebuild, ready to be persisted by the caller.
#[derive(Debug, Clone)]
pub struct RebuiltArchive {
    bytes: Vec<u8>,
}

impl RebuiltArchive {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads the entries back, e.g. for verification.
    pub fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        SourceArchive::from_bytes(self.bytes.clone()).entries()
    }

    pub fn entry_names(&self) -> Result<Vec<String>> {
        SourceArchive::from_bytes(self.bytes.clone()).entry_names()
    }

    /// Compression method recorded for each entry, in order.
    pub fn compression_methods(&self) -> Result<Vec<(String, CompressionMethod)>> {
        let mut archive = open_archive(&self.bytes)?;
        (0..archive.len())
            .map(|index| {
                let file = archive
                    .by_index_raw(index)
                    .map_err(|e| Error::archive_format("Corrupt entry header", e))?;
                Ok((file.name().to_string(), file.compression()))
            })
            .collect()
    }
}

/// A rebuilt archive together with what went into it.
#[derive(Debug, Clone)]
pub struct RebuildOutput {
    pub archive: RebuiltArchive,
    /// Page count written to `ComicInfo.xml`, cover included.
    pub page_count: usize,
    pub cover_inserted: bool,
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::archive_format("Unreadable central directory", e))
}

/// Descriptive metadata of a library book, as supplied by the host catalog.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub comments: Option<String>, // Summary / description
    pub language: Option<String>, // e.g., "eng", "ja"
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    pub series: Option<String>,
    pub series_index: Option<f64>,
    pub pubdate: Option<NaiveDate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub identifiers: BTreeMap<String, String>, // e.g., "isbn", "url"
}

impl BookMetadata {
    /// Creates metadata carrying only a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// The `url` identifier, used for the `Web` element of ComicInfo.xml.
    pub fn url(&self) -> Option<&str> {
        self.identifiers.get("url").map(String::as_str)
    }
}

/// Why a book was left untouched by the orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SkipReason {
    /// The book has no format to convert from.
    NoSourceFormat,
    /// The post-import hook fired but automatic conversion is disabled.
    AutoConvertDisabled,
    /// The post-import hook fired for a format other than the source format.
    OtherFormat(String),
}

/// Details of a successful single-book conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConversionSummary {
    pub book_id: BookId,
    pub title: String,
    pub page_count: usize,
    pub entry_count: usize,
    pub has_comic_info: bool,
    pub has_cover_page: bool,
    pub archive_size: usize,
}

/// Result of running the orchestration for one book.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ConversionOutcome {
    Converted(ConversionSummary),
    Skipped(BookId, SkipReason),
}

/// Report of a bulk conversion. Failures do not abort the batch.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BatchReport {
    pub converted: Vec<ConversionSummary>,
    pub skipped: Vec<(BookId, SkipReason)>,
    pub failed: Vec<(BookId, String)>, // Book, error message
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Returns the lowercase page-image extension of an entry name, if any.
///
/// The extension is the raw text after the last `.`, compared lowercased.
/// A name without any dot is taken whole, so a bare `jpg` counts, while a
/// directory entry such as `chapter.jpg/` does not.
pub fn page_image_extension(name: &str) -> Option<String> {
    let extension = name.rsplit('.').next()?.to_lowercase();
    PAGE_IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

pub fn is_page_image(name: &str) -> bool {
    page_image_extension(name).is_some()
}

/// Counts the entries that look like page images.
///
/// Every image-extension entry counts, including a standalone cover file
/// placed next to the numbered pages.
pub fn count_pages<S: AsRef<str>>(names: &[S]) -> usize {
    names.iter().filter(|name| is_page_image(name.as_ref())).count()
}

/// Utility function: Determines the file extension and MIME type of image bytes
///
/// # Arguments
///
/// * `data` - Raw image content
///
/// # Returns
///
/// * `Ok((&str, &str))` - A tuple containing (file extension, MIME type)
/// * `Err(Error)` - An error if the bytes are not a supported page image
///
/// # Supported formats
///
/// - JPEG: image/jpeg
/// - PNG: image/png
/// - GIF: image/gif
/// - WebP: image/webp
pub fn get_image_info(data: &[u8]) -> Result<(&'static str, &'static str)> {
    match image::guess_format(data)? {
        image::ImageFormat::Jpeg => Ok(("jpg", "image/jpeg")),
        image::ImageFormat::Png => Ok(("png", "image/png")),
        image::ImageFormat::Gif => Ok(("gif", "image/gif")),
        image::ImageFormat::WebP => Ok(("webp", "image/webp")),
        other => Err(Error::Unsupported(format!("Image format {:?}", other))),
    }
}
