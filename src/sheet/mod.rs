// src/sheet/mod.rs

pub mod csv;
pub mod header;
pub mod pattern;
pub mod strategy;

pub use csv::{parse_line, parse_sheet, RawSheet};
pub use header::{locate_header, HeaderMap, MIN_DOCUMENT_DIGITS};
pub use strategy::{RowClassifier, StrategyKind};

use crate::record::DegreeType;

/// A data row accepted by a classifier, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Zero-based row index within the parsed sheet.
    pub row: usize,
    /// Digits only.
    pub document_number: String,
    pub full_name: Option<String>,
    pub graduation_date: Option<String>,
    pub diploma_number: Option<String>,
    pub degree_type: DegreeType,
}

/// Strip everything that is not an ASCII digit.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// `Some(trimmed)` for a non-blank cell.
pub(crate) fn non_empty(cell: Option<&String>) -> Option<String> {
    cell.map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
