//! File naming templates for exported CBZ files.
//!
//! A template is plain text with `{placeholder}` fields, for example the
//! default `{series} #{series_index} - {title}`. Separators next to a field
//! that is empty for a book are tidied away, so a book without a series is
//! simply named after its title. Field values themselves are never trimmed.

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::generator::comic_info::format_series_index;
use crate::path_utils::sanitize_filename;
use crate::types::BookMetadata;

/// Default naming scheme.
pub const DEFAULT_NAMING_SCHEME: &str = "{series} #{series_index} - {title}";

/// Placeholders understood by [`render_file_name`].
pub const NAMING_PLACEHOLDERS: [&str; 8] = [
    "title",
    "series",
    "series_index",
    "authors",
    "author",
    "publisher",
    "language",
    "year",
];

lazy_static! {
    static ref FIELD: Regex = Regex::new(r"\{([a-z_]+)\}").unwrap();
    static ref SPACES: Regex = Regex::new(r"\s{2,}").unwrap();
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '#' | '-' | '_' | '.' | ',' | ':' | '|')
}

/// Checks that a template only uses known placeholders.
pub fn validate_template(template: &str) -> Result<()> {
    if template.trim().is_empty() {
        return Err(Error::Other("Naming scheme must not be empty".to_string()));
    }
    for caps in FIELD.captures_iter(template) {
        if !NAMING_PLACEHOLDERS.contains(&&caps[1]) {
            return Err(Error::Unsupported(format!(
                "Unknown naming placeholder '{{{}}}'",
                &caps[1]
            )));
        }
    }
    Ok(())
}

fn field_value(mi: &BookMetadata, field: &str) -> String {
    match field {
        "title" => mi.title.clone(),
        "series" => mi.series.clone().unwrap_or_default(),
        "series_index" if mi.series.is_some() => format_series_index(mi.series_index),
        "series_index" => String::new(),
        "authors" => mi.authors.join(", "),
        "author" => mi.authors.first().cloned().unwrap_or_default(),
        "publisher" => mi.publisher.clone().unwrap_or_default(),
        "language" => mi.language.clone().unwrap_or_default(),
        "year" => mi.pubdate.map(|d| d.year().to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}

/// Substitutes every field, dropping the separator text around empty ones.
///
/// Between two non-empty neighbours the separators of an empty field
/// collapse into one (the one following the field, if any); at either end of
/// the name they disappear. Only template text is trimmed.
fn fill_fields(template: &str, mi: &BookMetadata) -> String {
    let mut literals = Vec::new();
    let mut values = Vec::new();
    let mut last = 0;
    for caps in FIELD.captures_iter(template) {
        let field = caps.get(0).map_or(0..0, |m| m.range());
        literals.push(&template[last..field.start]);
        values.push(field_value(mi, &caps[1]));
        last = field.end;
    }
    literals.push(&template[last..]);

    let has_content_after = |index: usize| {
        (index..values.len()).any(|j| {
            !values[j].is_empty() || !literals[j + 1].trim_matches(is_separator).is_empty()
        })
    };

    let mut out = literals[0].to_string();
    // Start of the template text written since the last non-empty value
    let mut literal_start = 0;
    for (index, value) in values.iter().enumerate() {
        let next = literals[index + 1];
        if !value.is_empty() {
            out.push_str(value);
            literal_start = out.len();
            out.push_str(next);
            continue;
        }

        let kept = out[literal_start..].trim_end_matches(is_separator).len();
        let left_separator = out.split_off(literal_start + kept);
        let right_text = next.trim_start_matches(is_separator);
        let right_separator = &next[..next.len() - right_text.len()];

        let has_content_before = !out.trim_matches(is_separator).is_empty();
        if has_content_before && (!right_text.is_empty() || has_content_after(index + 1)) {
            if right_separator.is_empty() {
                out.push_str(&left_separator);
            } else {
                out.push_str(right_separator);
            }
        }
        out.push_str(right_text);
    }
    out
}

/// Renders a template into a file name (without extension).
///
/// The result never contains path separators or characters rejected by
/// common file systems. It falls back to the title, then to `"Untitled"`,
/// when the template renders to nothing.
pub fn render_file_name(template: &str, mi: &BookMetadata) -> String {
    let rendered = fill_fields(template, mi);
    let collapsed = SPACES.replace_all(&rendered, " ");

    let name = if collapsed.trim().is_empty() {
        mi.title.trim().to_string()
    } else {
        collapsed.trim().to_string()
    };

    let name = sanitize_filename(&name);
    if name.trim().is_empty() {
        "Untitled".to_string()
    } else {
        name
    }
}
