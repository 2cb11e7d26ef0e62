use crate::error::{Error, Result};
use crate::types::{ArchiveEntry, RebuiltArchive, SourceArchive, get_image_info};
use log::{debug, warn};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name prefix of an inserted cover page; sorts before numbered pages.
pub const COVER_PAGE_STEM: &str = "000_cover";

/// Rebuilds a converted page archive into a CBZ.
///
/// All source entries are copied in their original order with their bytes
/// untouched. By default every entry is written with
/// [`CompressionMethod::Stored`], which comic readers handle best and which
/// avoids re-encoding page images. An optional cover page is written first
/// and an optional text sidecar (usually `ComicInfo.xml`) last.
#[derive(Debug, Clone)]
pub struct CbzRebuilder {
    options: SimpleFileOptions,
    cover: Option<ArchiveEntry>,
    sidecar: Option<ArchiveEntry>,
}

impl Default for CbzRebuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CbzRebuilder {
    pub fn new() -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);

        CbzRebuilder {
            options,
            cover: None,
            sidecar: None,
        }
    }

    /// Overrides the compression method used for every written entry.
    pub fn compression(mut self, method: CompressionMethod) -> Self {
        self.options = self.options.compression_method(method);
        self
    }

    /// Inserts an image as the first entry, named `000_cover.<ext>`.
    ///
    /// The extension is sniffed from the image bytes; unsupported data is an
    /// error so the caller can decide to go on without a cover.
    pub fn cover_page(mut self, image: Vec<u8>) -> Result<Self> {
        let (extension, _) = get_image_info(&image)?;
        self.cover = Some(ArchiveEntry::new(
            format!("{}.{}", COVER_PAGE_STEM, extension),
            image,
        ));
        Ok(self)
    }

    /// Appends a text entry after all source entries.
    pub fn sidecar(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.sidecar = Some(ArchiveEntry::new(name, content.into().into_bytes()));
        self
    }

    pub fn cover_entry_name(&self) -> Option<&str> {
        self.cover.as_ref().map(|entry| entry.name.as_str())
    }

    /// Produces the rebuilt archive.
    ///
    /// Fails with [`Error::ArchiveFormat`] when `source` cannot be read. A
    /// source entry sharing the sidecar's name is replaced by the sidecar,
    /// and a cover whose name is already taken is not inserted.
    pub fn rebuild(&self, source: &SourceArchive) -> Result<RebuiltArchive> {
        let entries = source.entries()?;
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        if let Some(cover) = &self.cover {
            if entries.iter().any(|entry| entry.name == cover.name) {
                warn!(
                    "Source already contains '{}', skipping cover insertion",
                    cover.name
                );
            } else {
                self.write_entry(&mut zip, cover)?;
            }
        }

        for entry in &entries {
            let replaced_by_sidecar = self
                .sidecar
                .as_ref()
                .is_some_and(|sidecar| sidecar.name == entry.name);
            if replaced_by_sidecar {
                warn!(
                    "Source already contains '{}', replacing it with the generated one",
                    entry.name
                );
                continue;
            }
            self.write_entry(&mut zip, entry)?;
        }

        if let Some(sidecar) = &self.sidecar {
            self.write_entry(&mut zip, sidecar)?;
        }

        let bytes = zip.finish()?.into_inner();
        debug!(
            "Rebuilt archive with {} source entries into {} bytes",
            entries.len(),
            bytes.len()
        );

        Ok(RebuiltArchive::from_bytes(bytes))
    }

    fn write_entry(
        &self,
        zip: &mut ZipWriter<Cursor<Vec<u8>>>,
        entry: &ArchiveEntry,
    ) -> Result<()> {
        if entry.is_dir() {
            zip.add_directory(entry.name.as_str(), self.options)?;
            return Ok(());
        }
        zip.start_file(entry.name.as_str(), self.options)?;
        zip.write_all(&entry.data).map_err(Error::Io)?;
        Ok(())
    }
}

/// Copies `source` into a new archive with uncompressed entries, appending
/// `extra_entry` as `(name, text)` when given.
///
/// Source entries keep their names and order, with one
/// exception: a source entry carrying the same name as `extra_entry` (for
/// example an existing `ComicInfo.xml`) is dropped with a warning, since a
/// ZIP container cannot hold two entries of the same name. The generated
/// entry takes its place at the end.
///
/// # Errors
///
/// [`Error::ArchiveFormat`] if `source` is not a readable ZIP container.
pub fn rebuild(
    source: &SourceArchive,
    extra_entry: Option<(&str, &str)>,
) -> Result<RebuiltArchive> {
    let mut rebuilder = CbzRebuilder::new();
    if let Some((name, content)) = extra_entry {
        rebuilder = rebuilder.sidecar(name, content);
    }
    rebuilder.rebuild(source)
}
