//! Generator module: produces the CBZ output of a conversion.
//!
//! - [`cbz`] rebuilds a converted page archive with uncompressed entries.
//! - [`comic_info`] renders the `ComicInfo.xml` sidecar appended to it.

pub mod cbz;
pub mod comic_info;

pub use cbz::{CbzRebuilder, rebuild};
pub use comic_info::render_comic_info;
