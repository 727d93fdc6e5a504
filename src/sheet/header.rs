// src/sheet/header.rs

use std::collections::HashMap;
use tracing::{debug, trace};

use super::{digits_only, Candidate, RawSheet};
use crate::config::SheetConfig;

/// The header row is assumed to sit within the first rows of the export.
pub const HEADER_SCAN_ROWS: usize = 10;
/// Shorter document numbers are treated as filler rows.
pub const MIN_DOCUMENT_DIGITS: usize = 5;

/// Semantic columns a header can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DocumentNumber,
    FullName,
    GraduationDate,
    DiplomaNumber,
}

/// Header row of one sheet and the columns each field resolves to.
///
/// A field can resolve to several columns (one per alias that matched);
/// the first non-empty value among them wins for a given row.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    row: usize,
    headers: Vec<String>,
    fields: HashMap<Field, Vec<usize>>,
}

impl HeaderMap {
    /// Locate the header row and resolve every field's columns.
    pub fn build(sheet: &RawSheet, config: &SheetConfig) -> Option<Self> {
        let row = locate_header(sheet, &config.header_labels)?;
        let headers: Vec<String> = sheet.rows()[row]
            .iter()
            .map(|c| c.trim().to_string())
            .collect();

        let mut fields = HashMap::new();
        for (field, aliases) in [
            (Field::DocumentNumber, &config.document_aliases),
            (Field::FullName, &config.name_aliases),
            (Field::GraduationDate, &config.date_aliases),
            (Field::DiplomaNumber, &config.diploma_aliases),
        ] {
            let columns = resolve_columns(&headers, aliases);
            trace!(?field, ?columns, "resolved header columns");
            if !columns.is_empty() {
                fields.insert(field, columns);
            }
        }

        Some(Self {
            row,
            headers,
            fields,
        })
    }

    pub fn row_index(&self) -> usize {
        self.row
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Primary column for `field`.
    pub fn column(&self, field: Field) -> Option<usize> {
        self.fields.get(&field).and_then(|cols| cols.first().copied())
    }

    /// First non-empty value for `field` in `row`.
    pub fn value(&self, row: &[String], field: Field) -> Option<String> {
        self.fields
            .get(&field)?
            .iter()
            .filter_map(|&col| row.get(col))
            .map(|cell| cell.trim())
            .find(|cell| !cell.is_empty())
            .map(str::to_string)
    }
}

/// Index of the first row (within [`HEADER_SCAN_ROWS`]) with a cell that
/// contains one of `labels`. Case-insensitive.
pub fn locate_header(sheet: &RawSheet, labels: &[String]) -> Option<usize> {
    let labels: Vec<String> = labels
        .iter()
        .map(|l| l.trim().to_uppercase())
        .filter(|l| !l.is_empty())
        .collect();

    sheet
        .rows()
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            row.iter().any(|cell| {
                let cell = cell.to_uppercase();
                labels.iter().any(|label| cell.contains(label.as_str()))
            })
        })
}

/// Columns matching `aliases`: exact (case-insensitive) matches in alias
/// order first, then substring matches in alias order.
fn resolve_columns(headers: &[String], aliases: &[String]) -> Vec<usize> {
    let upper: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    let aliases: Vec<String> = aliases
        .iter()
        .map(|a| a.trim().to_uppercase())
        .filter(|a| !a.is_empty())
        .collect();

    let mut columns = Vec::new();
    let mut push = |col: usize| {
        if !columns.contains(&col) {
            columns.push(col);
        }
    };

    for alias in &aliases {
        for (col, header) in upper.iter().enumerate() {
            if header == alias {
                push(col);
            }
        }
    }
    for alias in &aliases {
        for (col, header) in upper.iter().enumerate() {
            if !header.is_empty() && header.contains(alias.as_str()) {
                push(col);
            }
        }
    }
    columns
}

/// Data rows below the header whose document number has at least
/// [`MIN_DOCUMENT_DIGITS`] digits. The document number is stored digits-only.
pub fn accepted_rows(sheet: &RawSheet, config: &SheetConfig) -> Option<Vec<Candidate>> {
    let Some(map) = HeaderMap::build(sheet, config) else {
        debug!(sheet = %config.name, "no header row found");
        return None;
    };
    debug!(
        sheet = %config.name,
        row = map.row_index(),
        headers = ?map.headers().iter().take(8).collect::<Vec<_>>(),
        "header row located"
    );

    let candidates = sheet
        .rows()
        .iter()
        .enumerate()
        .skip(map.row_index() + 1)
        .filter(|(_, row)| row.iter().any(|c| !c.trim().is_empty()))
        .filter_map(|(idx, row)| {
            let raw = map.value(row, Field::DocumentNumber)?;
            let document_number = digits_only(&raw);
            if document_number.len() < MIN_DOCUMENT_DIGITS {
                return None;
            }
            Some(Candidate {
                row: idx,
                document_number,
                full_name: map.value(row, Field::FullName),
                graduation_date: map.value(row, Field::GraduationDate),
                diploma_number: map.value(row, Field::DiplomaNumber),
                degree_type: config.degree_type,
            })
        })
        .collect();
    Some(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DegreeType;
    use crate::sheet::parse_sheet;

    const TECNICOS: &str = "\
LISTADO DE GRADUADOS,,,,,
,,,,,
Número Celular,NOMBRES Y APELLIDOS,TÉCNICOS LABORAL NÚMERO DE DOCUMENTO,FECHA DE GRADO,No. Acta,NÚMERO DE DIPLOMA
3101234567,ANA MARIA PEREZ,\"1.123.114.905\",08/01/2020,12,345
3209876543,JUAN GOMEZ,123,08/01/2020,12,346
,,,,,
3001112233,LUISA FERNANDA RIOS,40123456,15/12/2019,11,301
";

    #[test]
    fn finds_header_below_title_rows() {
        let sheet = parse_sheet(TECNICOS);
        let config = SheetConfig::technical();
        let map = HeaderMap::build(&sheet, &config).expect("header");
        assert_eq!(map.row_index(), 2);
        assert_eq!(map.column(Field::DocumentNumber), Some(2));
        assert_eq!(map.column(Field::FullName), Some(1));
        assert_eq!(map.column(Field::GraduationDate), Some(3));
        assert_eq!(map.column(Field::DiplomaNumber), Some(5));
    }

    #[test]
    fn accepts_rows_with_long_enough_documents() {
        let sheet = parse_sheet(TECNICOS);
        let rows = accepted_rows(&sheet, &SheetConfig::technical()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].document_number, "1123114905");
        assert_eq!(rows[0].full_name.as_deref(), Some("ANA MARIA PEREZ"));
        assert_eq!(rows[0].graduation_date.as_deref(), Some("08/01/2020"));
        assert_eq!(rows[0].diploma_number.as_deref(), Some("345"));
        assert_eq!(rows[0].degree_type, DegreeType::Technical);

        assert_eq!(rows[1].document_number, "40123456");
    }

    #[test]
    fn header_beyond_scan_window_is_not_found() {
        let mut text = "titulo\n".repeat(HEADER_SCAN_ROWS);
        text.push_str("NUMERO DE DOCUMENTO,NOMBRES Y APELLIDOS\n1123114905,ANA\n");
        let sheet = parse_sheet(&text);
        assert_eq!(locate_header(&sheet, &SheetConfig::technical().header_labels), None);
        assert!(accepted_rows(&sheet, &SheetConfig::technical()).is_none());
    }

    #[test]
    fn label_match_ignores_case() {
        let sheet = parse_sheet("x\nnombre,numero de documento\n");
        let labels = vec!["NUMERO DE DOCUMENTO".to_string()];
        assert_eq!(locate_header(&sheet, &labels), Some(1));
    }

    #[test]
    fn exact_alias_beats_substring_alias() {
        let headers: Vec<String> = ["CEDULA DEL ACUDIENTE", "CEDULA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let aliases = vec!["CEDULA".to_string()];
        assert_eq!(resolve_columns(&headers, &aliases), vec![1, 0]);
    }

    #[test]
    fn falls_back_to_later_alias_column_when_first_is_blank() {
        let text = "\
BACHILLERES NUMERO DE DOCUMENTO,CEDULA,NOMBRES Y APELLIDOS
,52123456,MARTA LUCIA DIAZ
";
        let sheet = parse_sheet(text);
        let rows = accepted_rows(&sheet, &SheetConfig::high_school()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].document_number, "52123456");
        assert_eq!(rows[0].degree_type, DegreeType::HighSchool);
    }
}
