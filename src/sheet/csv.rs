// src/sheet/csv.rs

use std::mem::take;

/// A parsed sheet: rows of trimmed cells in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    rows: Vec<Vec<String>>,
}

impl RawSheet {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split one physical line into trimmed cells.
///
/// A `"` toggles quoting and is dropped; doubled quotes are not an escape.
/// Commas inside quotes stay in the cell.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(take(&mut field).trim().to_string()),
            _ => field.push(ch),
        }
    }
    cells.push(field.trim().to_string());
    cells
}

/// Tokenize a whole CSV export. LF and CRLF both end a row; blank lines are
/// skipped. Quote state never spans lines, so multi-line quoted cells split.
pub fn parse_sheet(text: &str) -> RawSheet {
    let rows = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect();
    RawSheet { rows }
}
