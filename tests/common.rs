//! Common test utilities for the Henkan crate.
//!
//! Provides synthetic page archives, an in-memory catalog standing in for
//! the host library, and helpers to inspect produced CBZ files.

use async_trait::async_trait;
use henkan::error::{Error, Result};
use henkan::prelude::*;
use image::{ImageFormat, Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";

/// Builds a ZIP container from `(name, content)` pairs. Names ending in `/`
/// become directory entries.
#[allow(dead_code)]
pub fn build_zip(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

/// Rewrites the central directory record of a single-entry archive so
/// that it declares an uncompressed size of `u64::MAX` through a ZIP64
/// extra field. Entry data and CRC stay untouched.
#[allow(dead_code)]
pub fn forge_zip64_size(mut bytes: Vec<u8>) -> Vec<u8> {
    let find = |bytes: &[u8], signature: &[u8; 4]| {
        bytes
            .windows(4)
            .rposition(|w| w == signature)
            .expect("signature not found")
    };
    let le16 = |bytes: &[u8], at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);

    let header = find(&bytes[..], b"PK\x01\x02");
    let name_len = le16(&bytes[..], header + 28) as usize;
    let extra_len = le16(&bytes[..], header + 30);

    let mut zip64 = Vec::with_capacity(12);
    zip64.extend_from_slice(&1u16.to_le_bytes());
    zip64.extend_from_slice(&8u16.to_le_bytes());
    zip64.extend_from_slice(&u64::MAX.to_le_bytes());

    bytes[header + 24..header + 28].copy_from_slice(&u32::MAX.to_le_bytes());
    bytes[header + 30..header + 32].copy_from_slice(&(extra_len + 12).to_le_bytes());
    let extra_start = header + 46 + name_len;
    bytes.splice(extra_start..extra_start, zip64);

    let end = find(&bytes[..], b"PK\x05\x06");
    let cd_size = u32::from_le_bytes(bytes[end + 12..end + 16].try_into().unwrap());
    bytes[end + 12..end + 16].copy_from_slice(&(cd_size + 12).to_le_bytes());
    bytes
}

/// The three-page archive used by most scenarios.
#[allow(dead_code)]
pub fn three_page_archive() -> Vec<u8> {
    let pages: [(&str, &[u8]); 3] = [("001.jpg", b"A"), ("002.jpg", b"B"), ("cover.jpg", b"C")];
    build_zip(&pages, CompressionMethod::Deflated)
}

/// Metadata `{title: "Foo", authors: ["Bar"], series: "Baz", series_index: 1}`.
#[allow(dead_code)]
pub fn foo_metadata() -> BookMetadata {
    BookMetadata {
        title: "Foo".to_string(),
        authors: vec!["Bar".to_string()],
        series: Some("Baz".to_string()),
        series_index: Some(1.0),
        ..Default::default()
    }
}

/// Encodes a small solid-color JPEG.
#[allow(dead_code)]
pub fn dummy_jpeg() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb([200, 30, 30]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
    buffer.into_inner()
}

/// Reads all `(name, content)` pairs of an archive, in order.
#[allow(dead_code)]
pub fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

/// Compression method of every entry, in order.
#[allow(dead_code)]
pub fn compression_methods(bytes: &[u8]) -> Vec<CompressionMethod> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index_raw(i).unwrap().compression())
        .collect()
}

/// Reads the ComicInfo.xml of a CBZ.
#[allow(dead_code)]
pub fn get_comic_info_xml(bytes: &[u8]) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name("ComicInfo.xml").unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

/// Creates a unique, not yet existing directory path under `tests/tmp`.
#[allow(dead_code)]
pub fn unique_test_dir(sub_path: &str) -> PathBuf {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string))
}

/// In-memory stand-in for the host library.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryCatalog {
    formats: Mutex<HashMap<(BookId, String), Vec<u8>>>,
    metadata: Mutex<HashMap<BookId, BookMetadata>>,
    covers: Mutex<HashMap<BookId, Vec<u8>>>,
}

#[allow(dead_code)]
impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_book(&self, book_id: BookId, metadata: BookMetadata) {
        self.metadata.lock().unwrap().insert(book_id, metadata);
    }

    pub fn set_format(&self, book_id: BookId, format: &str, data: Vec<u8>) {
        self.formats
            .lock()
            .unwrap()
            .insert((book_id, format.to_string()), data);
    }

    pub fn set_cover(&self, book_id: BookId, data: Vec<u8>) {
        self.covers.lock().unwrap().insert(book_id, data);
    }

    pub fn stored(&self, book_id: BookId, format: &str) -> Option<Vec<u8>> {
        self.formats
            .lock()
            .unwrap()
            .get(&(book_id, format.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BookCatalog for MemoryCatalog {
    async fn format(&self, book_id: BookId, format: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.stored(book_id, format))
    }

    async fn metadata(&self, book_id: BookId) -> Result<BookMetadata> {
        self.metadata
            .lock()
            .unwrap()
            .get(&book_id)
            .cloned()
            .ok_or_else(|| Error::Catalog(format!("Unknown book {}", book_id)))
    }

    async fn cover(&self, book_id: BookId) -> Result<Option<Vec<u8>>> {
        Ok(self.covers.lock().unwrap().get(&book_id).cloned())
    }

    async fn add_format(&self, book_id: BookId, format: &str, data: Vec<u8>) -> Result<()> {
        self.set_format(book_id, format, data);
        Ok(())
    }
}

/// Engine that treats the stored "AZW3" as an already rendered page archive
/// and counts how often it was invoked.
#[allow(dead_code)]
#[derive(Default)]
pub struct PassthroughEngine {
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl PassthroughEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversionEngine for PassthroughEngine {
    async fn convert(&self, _book_id: BookId, source: Vec<u8>) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(source)
    }
}
