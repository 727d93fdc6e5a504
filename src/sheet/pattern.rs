// src/sheet/pattern.rs

use once_cell::sync::Lazy;
use regex::Regex;

use super::{digits_only, non_empty, Candidate, RawSheet};
use crate::config::{ColumnLayout, SheetConfig};

/// Digit count range of a plausible national ID.
const DOCUMENT_DIGITS: std::ops::RangeInclusive<usize> = 7..=12;
/// Digit count range of a diploma or act number.
const DIPLOMA_DIGITS: std::ops::RangeInclusive<usize> = 2..=5;
/// Characters that mark a date, time or decimal rather than an ID.
const FORMATTED_NUMBER_CHARS: [char; 4] = ['/', '-', ':', '.'];

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L} ]+$").expect("name pattern should compile"));

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}[/-]\d{1,2}[/-]\d{4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})")
        .expect("date pattern should compile")
});

/// Fields the pattern classifier pulled out of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFields {
    pub document_column: usize,
    pub document_number: String,
    pub full_name: Option<String>,
    pub graduation_date: Option<String>,
    pub diploma_number: Option<String>,
}

/// True when `cell` looks like a national ID.
pub fn is_document_cell(cell: &str) -> bool {
    let digits = digits_only(cell);
    DOCUMENT_DIGITS.contains(&digits.len())
        && !cell.contains(FORMATTED_NUMBER_CHARS)
        && digits.chars().any(|c| c != '0')
}

/// Leftmost cell that looks like a national ID, ignoring `excluded` columns.
pub fn document_column(row: &[String], excluded: &[usize]) -> Option<usize> {
    row.iter()
        .enumerate()
        .find(|(col, cell)| !excluded.contains(col) && is_document_cell(cell))
        .map(|(col, _)| col)
}

pub fn is_name_cell(cell: &str) -> bool {
    cell.chars().count() > 5 && NAME_RE.is_match(cell)
}

pub fn is_date_cell(cell: &str) -> bool {
    DATE_RE.is_match(cell)
}

/// Classify every cell of `row` by content, independent of position.
///
/// The longest alphabetic cell is the name; the last date-shaped cell is
/// the graduation date; the last short number other than the document is
/// the diploma. Fields still missing are read from `layout`. Cells in
/// `excluded` columns are never classified.
pub fn classify_row(row: &[String], layout: ColumnLayout, excluded: &[usize]) -> Option<RowFields> {
    let document_column = document_column(row, excluded)?;
    let document_number = digits_only(&row[document_column]);

    let mut fields = RowFields {
        document_column,
        document_number,
        ..Default::default()
    };

    for (col, cell) in row.iter().enumerate() {
        let cell = cell.trim();
        if col == document_column || cell.is_empty() || excluded.contains(&col) {
            continue;
        }

        if is_name_cell(cell) {
            let longer = fields
                .full_name
                .as_ref()
                .map_or(true, |current| cell.chars().count() > current.chars().count());
            if longer {
                fields.full_name = Some(cell.to_string());
            }
        } else if is_date_cell(cell) {
            fields.graduation_date = Some(cell.to_string());
        } else {
            let digits = digits_only(cell);
            if DIPLOMA_DIGITS.contains(&digits.len()) && digits != fields.document_number {
                fields.diploma_number = Some(cell.to_string());
            }
        }
    }

    apply_layout(row, layout, &mut fields);
    Some(fields)
}

fn apply_layout(row: &[String], layout: ColumnLayout, fields: &mut RowFields) {
    let doc = fields.document_column;
    let (name, date, diploma) = match layout {
        ColumnLayout::None => return,
        ColumnLayout::Fixed {
            name,
            date,
            diploma,
        } => (Some(name), Some(date), Some(diploma)),
        ColumnLayout::Relative {
            name,
            date,
            diploma,
        } => (
            doc.checked_add_signed(name),
            doc.checked_add_signed(date),
            doc.checked_add_signed(diploma),
        ),
    };

    let cell_at = |col: Option<usize>| {
        col.filter(|&c| c != doc)
            .and_then(|c| non_empty(row.get(c)))
    };

    if fields.full_name.is_none() {
        fields.full_name = cell_at(name);
    }
    if fields.graduation_date.is_none() {
        fields.graduation_date = cell_at(date);
    }
    if fields.diploma_number.is_none() {
        fields.diploma_number = cell_at(diploma);
    }
}

/// Every row that contains a document-shaped cell, no header required.
pub fn accepted_rows(sheet: &RawSheet, config: &SheetConfig) -> Vec<Candidate> {
    sheet
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let fields = classify_row(row, config.layout, &config.excluded_columns)?;
            Some(Candidate {
                row: idx,
                document_number: fields.document_number,
                full_name: fields.full_name,
                graduation_date: fields.graduation_date,
                diploma_number: fields.diploma_number,
                degree_type: config.degree_type,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DegreeType;
    use crate::sheet::parse_line;

    fn row(line: &str) -> Vec<String> {
        parse_line(line)
    }

    #[test]
    fn document_cell_rules() {
        assert!(is_document_cell("1123114905"));
        assert!(is_document_cell("1234567"));
        assert!(is_document_cell("123456789012"));
        assert!(!is_document_cell("123456"));
        assert!(!is_document_cell("1234567890123"));
        assert!(!is_document_cell("0000000000"));
        assert!(!is_document_cell("11.231.149"));
        assert!(!is_document_cell("08/01/2020"));
        assert!(!is_document_cell("2020-01-08"));
        assert!(!is_document_cell("10:30:45:12"));
    }

    #[test]
    fn leftmost_document_cell_wins() {
        let r = row("x,40123456,1123114905");
        assert_eq!(document_column(&r, &[]), Some(1));
    }

    #[test]
    fn formatted_numbers_are_never_documents() {
        let r = row("1.123.114.905,08/01/2020,2020-01-08,12:34:56:789");
        assert_eq!(document_column(&r, &[]), None);
        assert!(classify_row(&r, ColumnLayout::None, &[]).is_none());
    }

    #[test]
    fn classifies_by_content_not_position() {
        let r = row("345,08/01/2020,ANA MARIA PEREZ,1123114905,,ANA");
        let fields = classify_row(&r, ColumnLayout::None, &[]).unwrap();
        assert_eq!(fields.document_column, 3);
        assert_eq!(fields.document_number, "1123114905");
        assert_eq!(fields.full_name.as_deref(), Some("ANA MARIA PEREZ"));
        assert_eq!(fields.graduation_date.as_deref(), Some("08/01/2020"));
        assert_eq!(fields.diploma_number.as_deref(), Some("345"));
    }

    #[test]
    fn longest_name_and_last_date_and_diploma_win() {
        let r = row("LUIS PEREZ,1123114905,01/01/2019,12,LUIS ALBERTO PEREZ,2020-02-03,345");
        let fields = classify_row(&r, ColumnLayout::None, &[]).unwrap();
        assert_eq!(fields.full_name.as_deref(), Some("LUIS ALBERTO PEREZ"));
        assert_eq!(fields.graduation_date.as_deref(), Some("2020-02-03"));
        assert_eq!(fields.diploma_number.as_deref(), Some("345"));
    }

    #[test]
    fn accented_names_are_names() {
        assert!(is_name_cell("JOSÉ NUÑEZ"));
        assert!(!is_name_cell("ANA"));
        assert!(!is_name_cell("ANA 2"));
    }

    #[test]
    fn excluded_phone_column_is_never_the_document() {
        let r = row("3101234567,ANA MARIA PEREZ,1123114905,08/01/2020,12,345");
        assert_eq!(document_column(&r, &[]), Some(0));

        let fields = classify_row(&r, ColumnLayout::None, &[0]).unwrap();
        assert_eq!(fields.document_column, 2);
        assert_eq!(fields.document_number, "1123114905");
        assert_eq!(fields.full_name.as_deref(), Some("ANA MARIA PEREZ"));
        assert_eq!(fields.graduation_date.as_deref(), Some("08/01/2020"));
        assert_eq!(fields.diploma_number.as_deref(), Some("345"));
    }

    #[test]
    fn row_with_only_an_excluded_id_is_skipped() {
        let r = row("3101234567,ANA MARIA PEREZ,,08/01/2020");
        assert!(classify_row(&r, ColumnLayout::None, &[0]).is_none());
    }

    #[test]
    fn relative_layout_fills_missing_fields() {
        // no cell is a clean name or date, so everything comes from offsets
        let r = row("ANA P3REZ,1123114905,s1n fecha,12,x");
        let layout = ColumnLayout::Relative {
            name: -1,
            date: 1,
            diploma: 3,
        };
        let fields = classify_row(&r, layout, &[]).unwrap();
        assert_eq!(fields.document_column, 1);
        assert_eq!(fields.full_name.as_deref(), Some("ANA P3REZ"));
        assert_eq!(fields.graduation_date.as_deref(), Some("s1n fecha"));
        assert_eq!(fields.diploma_number.as_deref(), Some("12"));
    }

    #[test]
    fn relative_offset_before_first_column_is_ignored() {
        let r = row("1123114905,s1n fecha");
        let layout = ColumnLayout::Relative {
            name: -1,
            date: 1,
            diploma: 3,
        };
        let fields = classify_row(&r, layout, &[]).unwrap();
        assert_eq!(fields.full_name, None);
        assert_eq!(fields.graduation_date.as_deref(), Some("s1n fecha"));
        assert_eq!(fields.diploma_number, None);
    }

    #[test]
    fn fixed_layout_fills_missing_fields() {
        let r = row("x,M4RTA DIAZ,52123456,sin-fecha,1,ABC-9");
        let layout = ColumnLayout::Fixed {
            name: 1,
            date: 3,
            diploma: 5,
        };
        let fields = classify_row(&r, layout, &[]).unwrap();
        assert_eq!(fields.full_name.as_deref(), Some("M4RTA DIAZ"));
        assert_eq!(fields.graduation_date.as_deref(), Some("sin-fecha"));
        assert_eq!(fields.diploma_number.as_deref(), Some("ABC-9"));
    }

    #[test]
    fn sheet_without_header_yields_candidates() {
        let text = "\
ANA MARIA PEREZ,1123114905,08/01/2020,345
solo texto,sin numeros
JUAN GOMEZ,08/01/2020,12
";
        let sheet = crate::sheet::parse_sheet(text);
        let rows = accepted_rows(&sheet, &SheetConfig::high_school());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, 0);
        assert_eq!(rows[0].document_number, "1123114905");
        assert_eq!(rows[0].degree_type, DegreeType::HighSchool);
    }
}
