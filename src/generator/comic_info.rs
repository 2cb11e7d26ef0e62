//! Rendering of the `ComicInfo.xml` metadata sidecar.
//!
//! The document layout is fixed by `templates/ComicInfo.xml`; element order
//! and naming must not change, downstream comic readers depend on it.

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::types::BookMetadata;

const TEMPLATE: &str = include_str!("../../templates/ComicInfo.xml");

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"%([a-z]+)%").unwrap();
}

/// Escapes the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

/// Formats a series index for the `Number` element.
///
/// Integral values drop the decimal point (`3.0` -> `3`), anything else keeps
/// its plain numeric form (`3.5` -> `3.5`), and a missing index is empty.
pub fn format_series_index(index: Option<f64>) -> String {
    match index {
        Some(value) if value.is_finite() && value.fract() == 0.0 => format!("{:.0}", value),
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

/// Renders a complete `ComicInfo.xml` document for a book.
///
/// Every element is always emitted; absent optional fields render as empty
/// text and never as `0`. Values are substituted in a single pass, so text
/// that happens to look like a placeholder is written out literally.
pub fn render_comic_info(mi: &BookMetadata, page_count: usize) -> String {
    let pubdate = mi.pubdate;

    PLACEHOLDER
        .replace_all(TEMPLATE.trim_end(), |caps: &Captures| match &caps[1] {
            "title" => escape_xml(&mi.title),
            "writer" => escape_xml(&mi.authors.join(", ")),
            "publisher" => escape_xml(mi.publisher.as_deref().unwrap_or("")),
            "summary" => escape_xml(mi.comments.as_deref().unwrap_or("")),
            "language" => escape_xml(mi.language.as_deref().unwrap_or("")),
            "genre" => escape_xml(&mi.tags.join(", ")),
            "series" => escape_xml(mi.series.as_deref().unwrap_or("")),
            "number" => escape_xml(&format_series_index(mi.series_index)),
            "pagecount" => page_count.to_string(),
            "year" => pubdate.map(|d| d.year().to_string()).unwrap_or_default(),
            "month" => pubdate.map(|d| d.month().to_string()).unwrap_or_default(),
            "day" => pubdate.map(|d| d.day().to_string()).unwrap_or_default(),
            "web" => escape_xml(mi.url().unwrap_or("")),
            other => format!("%{}%", other),
        })
        .into_owned()
}
