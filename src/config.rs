// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};
use tracing::info;

use crate::record::DegreeType;
use crate::sheet::strategy::StrategyKind;

/// Env var naming an optional YAML config file.
pub const CONFIG_ENV: &str = "DIPLOMA_CONFIG";

/// Everything the lookup needs to know about its data sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spreadsheet_id: String,
    /// Sheets in preference order.
    pub sheets: Vec<SheetConfig>,
    /// Classifiers in priority order; the first is authoritative.
    pub strategies: Vec<StrategyKind>,
    pub institution: Institution,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    /// Bodies shorter than this are treated as a failed fetch.
    pub min_body_len: usize,
    pub statistics: PublishedStatistics,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: "1s4beQ2-EJOwkjKwy_6jvJOtABPjD1104QyxS7kympo0".to_string(),
            sheets: vec![SheetConfig::technical(), SheetConfig::high_school()],
            strategies: vec![StrategyKind::Header, StrategyKind::Pattern],
            institution: Institution::default(),
            user_agent: "Mozilla/5.0 (compatible; DiplomaVerification/1.0)".to_string(),
            fetch_timeout_secs: 15,
            min_body_len: 100,
            statistics: PublishedStatistics::default(),
        }
    }
}

impl Config {
    /// Read the file named by `DIPLOMA_CONFIG`, or fall back to defaults.
    pub fn load() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(path.trim()),
            _ => {
                info!("no {} set, using built-in configuration", CONFIG_ENV);
                Ok(Self::default())
            }
        }
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!(path = %path.display(), sheets = config.sheets.len(), "loaded configuration");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.spreadsheet_id.trim().is_empty() {
            bail!("spreadsheet_id must not be empty");
        }
        if self.sheets.is_empty() {
            bail!("at least one sheet must be configured");
        }
        if self.strategies.is_empty() {
            bail!("at least one strategy must be configured");
        }
        for sheet in &self.sheets {
            if sheet.document_aliases.is_empty() {
                bail!("sheet {} has no document aliases", sheet.name);
            }
        }
        Ok(())
    }

    pub fn sheet(&self, degree_type: DegreeType) -> Option<&SheetConfig> {
        self.sheets.iter().find(|s| s.degree_type == degree_type)
    }
}

/// One published tab of the spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub name: String,
    pub gid: String,
    pub degree_type: DegreeType,
    /// Substrings that mark the header row.
    #[serde(default = "default_header_labels")]
    pub header_labels: Vec<String>,
    /// Header names for the document column, highest priority first.
    #[serde(default = "default_document_aliases")]
    pub document_aliases: Vec<String>,
    #[serde(default = "default_name_aliases")]
    pub name_aliases: Vec<String>,
    #[serde(default = "default_date_aliases")]
    pub date_aliases: Vec<String>,
    #[serde(default = "default_diploma_aliases")]
    pub diploma_aliases: Vec<String>,
    /// Positional fallback for the pattern classifier.
    #[serde(default)]
    pub layout: ColumnLayout,
    /// Columns the pattern classifier must never read, such as a phone
    /// number that would pass for a document.
    #[serde(default)]
    pub excluded_columns: Vec<usize>,
}

impl SheetConfig {
    /// The "técnicos" roster: phone, name, document, date, act, diploma.
    pub fn technical() -> Self {
        Self {
            name: "tecnicos".to_string(),
            gid: "1426995834".to_string(),
            degree_type: DegreeType::Technical,
            header_labels: strings(&[
                "NUMERO DE DOCUMENTO",
                "NÚMERO DE DOCUMENTO",
                "TÉCNICOS LABORAL NÚMERO",
            ]),
            document_aliases: prepend(
                &["TÉCNICOS LABORAL NÚMERO DE DOCUMENTO", "TÉCNICOS LABORAL NÚMERO"],
                default_document_aliases(),
            ),
            name_aliases: default_name_aliases(),
            date_aliases: default_date_aliases(),
            diploma_aliases: default_diploma_aliases(),
            layout: ColumnLayout::Fixed {
                name: 1,
                date: 3,
                diploma: 5,
            },
            excluded_columns: vec![0],
        }
    }

    /// The "bachilleres" roster.
    pub fn high_school() -> Self {
        Self {
            name: "bachilleres".to_string(),
            gid: "0".to_string(),
            degree_type: DegreeType::HighSchool,
            header_labels: strings(&[
                "NUMERO DE DOCUMENTO",
                "NÚMERO DE DOCUMENTO",
                "BACHILLERES NUMERO DE D",
            ]),
            document_aliases: prepend(
                &["BACHILLERES NUMERO DE DOCUMENTO", "BACHILLERES NUMERO DE D"],
                default_document_aliases(),
            ),
            name_aliases: default_name_aliases(),
            date_aliases: default_date_aliases(),
            diploma_aliases: default_diploma_aliases(),
            layout: ColumnLayout::Fixed {
                name: 1,
                date: 3,
                diploma: 5,
            },
            excluded_columns: Vec::new(),
        }
    }
}

/// Where the pattern classifier looks for fields it could not recognise by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnLayout {
    /// Offsets from the document column.
    Relative { name: isize, date: isize, diploma: isize },
    /// Absolute column indexes.
    Fixed { name: usize, date: usize, diploma: usize },
    /// Content classification only.
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub name: String,
    pub city: String,
    pub country: String,
}

impl Default for Institution {
    fn default() -> Self {
        Self {
            name: "Inandina".to_string(),
            city: "Villavicencio".to_string(),
            country: "Colombia".to_string(),
        }
    }
}

/// Fixed figures published on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedStatistics {
    pub diplomas_registrados: u32,
    pub estudiantes: u32,
    pub instituciones: u32,
}

impl Default for PublishedStatistics {
    fn default() -> Self {
        Self {
            diplomas_registrados: 2794,
            estudiantes: 2794,
            instituciones: 1,
        }
    }
}

/// Process-level settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub log_level: String,
    pub public_dir: PathBuf,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let public_dir = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public"));
        Self {
            port,
            log_level,
            public_dir,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn prepend(first: &[&str], rest: Vec<String>) -> Vec<String> {
    let mut out = strings(first);
    out.extend(rest);
    out
}

fn default_header_labels() -> Vec<String> {
    strings(&[
        "NUMERO DE DOCUMENTO",
        "NÚMERO DE DOCUMENTO",
        "TÉCNICOS LABORAL NÚMERO",
        "BACHILLERES NUMERO DE D",
    ])
}

fn default_document_aliases() -> Vec<String> {
    strings(&[
        "NUMERO DE DOCUMENTO",
        "NÚMERO DE DOCUMENTO",
        "NUMERO DE CEDULA",
        "CEDULA",
        "CÉDULA",
        "IDENTIFICACION",
        "IDENTIFICACIÓN",
        "NUMERO DE IDENTIFICACION",
        "NÚMERO DE IDENTIFICACIÓN",
    ])
}

fn default_name_aliases() -> Vec<String> {
    strings(&["NOMBRES Y APELLIDOS", "NOMBRE COMPLETO", "NOMBRES", "NOMBRE"])
}

fn default_date_aliases() -> Vec<String> {
    strings(&["FECHA DE GRADO", "FECHA GRADO", "FECHA DE GRADUACION"])
}

fn default_diploma_aliases() -> Vec<String> {
    strings(&["NUMERO DE DIPLOMA", "NÚMERO DE DIPLOMA", "DIPLOMA"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.sheets[0].degree_type, DegreeType::Technical);
        assert_eq!(config.sheets[1].degree_type, DegreeType::HighSchool);
        assert_eq!(config.strategies[0], StrategyKind::Header);
        assert_eq!(config.sheets[0].excluded_columns, vec![0]);
        assert!(config.sheets[1].excluded_columns.is_empty());
    }

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let config = Config::from_yaml_str(
            r#"
institution:
  name: Otra
  city: Bogota
  country: Colombia
strategies: [pattern, header]
"#,
        )?;
        assert_eq!(config.institution.city, "Bogota");
        assert_eq!(
            config.strategies,
            vec![StrategyKind::Pattern, StrategyKind::Header]
        );
        assert_eq!(config.sheets.len(), 2);
        assert_eq!(config.min_body_len, 100);
        Ok(())
    }

    #[test]
    fn sheet_entries_fill_alias_defaults() -> Result<()> {
        let config = Config::from_yaml_str(
            r#"
sheets:
  - name: egresados
    gid: "42"
    degree_type: HighSchool
    layout:
      kind: fixed
      name: 0
      date: 2
      diploma: 3
"#,
        )?;
        let sheet = &config.sheets[0];
        assert_eq!(sheet.gid, "42");
        assert!(sheet.excluded_columns.is_empty());
        assert!(sheet
            .document_aliases
            .contains(&"NUMERO DE DOCUMENTO".to_string()));
        assert_eq!(
            sheet.layout,
            ColumnLayout::Fixed {
                name: 0,
                date: 2,
                diploma: 3
            }
        );
        Ok(())
    }

    #[test]
    fn empty_sheet_list_is_rejected() {
        let err = Config::from_yaml_str("sheets: []\n").unwrap_err();
        assert!(err.to_string().contains("at least one sheet"));
    }

    #[test]
    fn reads_yaml_from_disk() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "min_body_len: 0")?;
        writeln!(file, "fetch_timeout_secs: 3")?;
        let config = Config::from_yaml_file(file.path())?;
        assert_eq!(config.min_body_len, 0);
        assert_eq!(config.fetch_timeout_secs, 3);
        Ok(())
    }
}
