//! Object key conventions.
//!
//! Uploaded documents carry their tracking identifiers in the file name as two
//! adjacent parenthesised groups, e.g. `invoice(ORD1)(ITEM1).pdf`. The first
//! group is the order, the second the order item.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

const PDF_SUFFIX: &str = ".pdf";
const PNG_SUFFIX: &str = ".png";

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(([^)]+)\)\(([^)]+)\)").expect("identifier pattern is valid")
});

/// Order and order item identifiers extracted from an object key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilenameIdentifiers {
    pub order_id: String,
    pub order_item_id: String,
}

impl FilenameIdentifiers {
    pub fn new(order_id: impl Into<String>, order_item_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            order_item_id: order_item_id.into(),
        }
    }
}

/// Extracts `(order)(item)` from anywhere in the key. The first match wins.
///
/// Groups are taken verbatim, whitespace included; they only need to be
/// non-empty.
pub fn parse_identifiers(key: &str) -> Option<FilenameIdentifiers> {
    let caps = IDENTIFIER_PATTERN.captures(key)?;
    Some(FilenameIdentifiers::new(
        caps.get(1)?.as_str(),
        caps.get(2)?.as_str(),
    ))
}

/// Whether the key names a PDF (case-insensitive extension).
pub fn is_pdf(key: &str) -> bool {
    key.len() > PDF_SUFFIX.len()
        && key
            .get(key.len() - PDF_SUFFIX.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_SUFFIX))
}

/// Key of the rendered image: the trailing `.pdf` becomes `.png`, any
/// directory prefix is kept. `None` for keys that are not PDFs.
pub fn output_key(key: &str) -> Option<String> {
    if !is_pdf(key) {
        return None;
    }
    let stem = &key[..key.len() - PDF_SUFFIX.len()];
    Some(format!("{stem}{PNG_SUFFIX}"))
}
