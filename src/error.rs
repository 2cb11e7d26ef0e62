//! Custom error types and result handling for Henkan operations.
//!
//! All fallible operations return a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. Rendering `ComicInfo.xml` never fails;
//! everything else surfaces one of the variants below.
//!
use std::path::PathBuf;

/// Type alias for Results with Henkan errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all Henkan operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The supplied bytes are not a readable ZIP container
    #[error("Invalid archive: {0}")]
    ArchiveFormat(String),
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// ZIP write errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Image sniffing errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    HenkanBuilder(#[from] crate::henkan::HenkanConfigBuilderError),
    /// The injected conversion engine failed
    #[error("Conversion engine failed: {0}")]
    Engine(String),
    /// The host catalog failed to read or store a book
    #[error("Catalog operation failed: {0}")]
    Catalog(String),
    /// Bulk conversion was started without any book
    #[error("No books selected; select at least one book")]
    EmptySelection,
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    #[error("Path '{0:?}' is not valid UTF-8")]
    PathUtf8Error(PathBuf),
    #[error("Path '{0:?}' exceeds the platform path length limit")]
    PathTooLong(PathBuf),
    #[error("Asynchronous task failed: {0}")]
    AsyncTaskError(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Wraps a ZIP read failure as [`Error::ArchiveFormat`].
    pub(crate) fn archive_format(context: &str, err: impl std::fmt::Display) -> Self {
        Error::ArchiveFormat(format!("{}: {}", context, err))
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
