// src/record.rs

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Institution;
use crate::sheet::Candidate;

/// Placeholder for an empty graduation date.
pub const NOT_SPECIFIED: &str = "No especificada";
/// Placeholder for any other empty text field.
pub const NOT_AVAILABLE: &str = "No disponible";

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Which roster a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DegreeType {
    Technical,
    HighSchool,
}

impl DegreeType {
    /// Spanish label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            DegreeType::Technical => "Técnico",
            DegreeType::HighSchool => "Bachiller",
        }
    }
}

impl fmt::Display for DegreeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The normalized answer to a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraduateRecord {
    pub document_number: String,
    pub full_name: String,
    pub graduation_date: String,
    pub diploma_number: String,
    pub degree_type: DegreeType,
    pub institution: String,
    pub city: String,
}

impl GraduateRecord {
    pub fn from_candidate(candidate: &Candidate, institution: &Institution) -> Self {
        Self {
            document_number: candidate.document_number.clone(),
            full_name: or_placeholder(candidate.full_name.as_deref()),
            graduation_date: format_graduation_date(
                candidate.graduation_date.as_deref().unwrap_or(""),
            ),
            diploma_number: or_placeholder(candidate.diploma_number.as_deref()),
            degree_type: candidate.degree_type,
            institution: institution.name.clone(),
            city: institution.city.clone(),
        }
    }
}

fn or_placeholder(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Render a sheet date as "8 de enero de 2020".
///
/// Slash dates are read day-first (`DD/MM/YYYY`), or year-first when the
/// first part has four digits. Anything unparseable comes back unchanged;
/// blank input yields [`NOT_SPECIFIED`].
pub fn format_graduation_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NOT_SPECIFIED.to_string();
    }

    let parsed = if trimmed.contains('/') {
        parse_slash_date(trimmed)
    } else {
        parse_generic_date(trimmed)
    };

    match parsed {
        Some(date) => long_date(date),
        None => raw.to_string(),
    }
}

fn long_date(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    // gviz exports sometimes append a time: "08/01/2020 0:00:00"
    let date_part = s.split_whitespace().next()?;
    let parts: Vec<&str> = date_part.split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    let (year, month, day) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else {
        (parts[2], parts[1], parts[0])
    };
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_generic_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    ["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
