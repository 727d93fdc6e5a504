// src/lookup.rs

use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, SheetConfig};
use crate::error::{LookupError, SheetFailure};
use crate::fetch::SheetSource;
use crate::record::{DegreeType, GraduateRecord};
use crate::sheet::{
    digits_only, parse_sheet, Candidate, RawSheet, StrategyKind, MIN_DOCUMENT_DIGITS,
};

/// Reduce a free-text identifier to its digits. Fewer than
/// [`MIN_DOCUMENT_DIGITS`] digits is rejected before any fetch.
pub fn normalize_identifier(raw: &str) -> Result<String, LookupError> {
    if raw.trim().is_empty() {
        return Err(LookupError::MissingIdentifier);
    }
    let digits = digits_only(raw);
    if digits.len() < MIN_DOCUMENT_DIGITS {
        return Err(LookupError::IdentifierTooShort {
            digits: digits.len(),
            min: MIN_DOCUMENT_DIGITS,
        });
    }
    Ok(digits)
}

/// A record plus where it was found.
#[derive(Debug, Clone, Serialize)]
pub struct LookupMatch {
    pub record: GraduateRecord,
    /// Name of the sheet the row came from.
    pub sheet: String,
    pub strategy: StrategyKind,
    /// Zero-based row within the parsed sheet.
    pub row: usize,
}

#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(Box<LookupMatch>),
    NotFound,
}

/// A sheet that was fetched and tokenized for one request.
#[derive(Debug)]
pub struct LoadedSheet<'a> {
    pub config: &'a SheetConfig,
    pub sheet: RawSheet,
}

/// Accepted-row counts for one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct SheetCount {
    pub sheet: String,
    pub degree_type: DegreeType,
    pub rows: usize,
    pub records: usize,
    pub strategy: Option<StrategyKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetStats {
    pub total: usize,
    pub by_degree: BTreeMap<DegreeType, usize>,
    pub sheets: Vec<SheetCount>,
}

/// Finds a graduate across every configured sheet.
pub struct Lookup<S> {
    source: S,
    config: Config,
}

impl<S: SheetSource> Lookup<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Normalize `raw_id`, fetch every sheet concurrently and run the
    /// configured strategies until one yields an exact document match.
    #[instrument(level = "info", skip(self))]
    pub async fn lookup(&self, raw_id: &str) -> Result<LookupOutcome, LookupError> {
        let target = normalize_identifier(raw_id)?;
        let sheets = self.load_sheets().await?;

        let Some((candidate, loaded, strategy)) =
            find_match(&sheets, &target, &self.config.strategies)
        else {
            info!(%target, "no matching record");
            return Ok(LookupOutcome::NotFound);
        };

        info!(%target, sheet = %loaded.config.name, %strategy, row = candidate.row, "record found");
        let record = GraduateRecord::from_candidate(&candidate, &self.config.institution);
        Ok(LookupOutcome::Found(Box::new(LookupMatch {
            record,
            sheet: loaded.config.name.clone(),
            strategy,
            row: candidate.row,
        })))
    }

    /// Fetch and tokenize every sheet. Individual failures are logged and
    /// skipped; only a total failure is an error.
    pub async fn load_sheets(&self) -> Result<Vec<LoadedSheet<'_>>, LookupError> {
        let fetches = self.config.sheets.iter().map(|sheet| async move {
            let result = self.source.fetch(sheet).await;
            (sheet, result)
        });

        let mut loaded = Vec::with_capacity(self.config.sheets.len());
        let mut failures = Vec::new();
        for (config, result) in join_all(fetches).await {
            match result {
                Ok(text) => {
                    let sheet = parse_sheet(&text);
                    debug!(sheet = %config.name, rows = sheet.len(), "sheet parsed");
                    loaded.push(LoadedSheet { config, sheet });
                }
                Err(error) => {
                    warn!(sheet = %config.name, %error, "sheet unavailable, continuing without it");
                    failures.push(SheetFailure {
                        sheet: config.name.clone(),
                        error,
                    });
                }
            }
        }

        if loaded.is_empty() {
            return Err(LookupError::Unavailable { failures });
        }
        Ok(loaded)
    }

    /// Per-sheet counts of accepted rows, using the first strategy that
    /// applies to each sheet.
    #[instrument(level = "info", skip(self))]
    pub async fn statistics(&self) -> Result<SheetStats, LookupError> {
        let sheets = self.load_sheets().await?;
        Ok(count_records(&sheets, &self.config.strategies))
    }
}

/// Try each strategy over each sheet in order; first exact match wins.
///
/// A sheet belongs to the first strategy that produces rows for it. Later
/// strategies only see sheets where every earlier one declined or came up
/// empty.
pub fn find_match<'s, 'c>(
    sheets: &'s [LoadedSheet<'c>],
    target: &str,
    strategies: &[StrategyKind],
) -> Option<(Candidate, &'s LoadedSheet<'c>, StrategyKind)> {
    let mut claimed = vec![false; sheets.len()];

    for &strategy in strategies {
        let classifier = strategy.classifier();
        for (idx, loaded) in sheets.iter().enumerate() {
            if claimed[idx] {
                debug!(sheet = %loaded.config.name, %strategy, "sheet already read by an earlier strategy");
                continue;
            }
            let candidates = match classifier.candidates(&loaded.sheet, loaded.config) {
                Some(candidates) if !candidates.is_empty() => candidates,
                Some(_) => {
                    debug!(sheet = %loaded.config.name, %strategy, "strategy produced no rows");
                    continue;
                }
                None => {
                    debug!(sheet = %loaded.config.name, %strategy, "strategy not applicable");
                    continue;
                }
            };
            claimed[idx] = true;

            let rows = candidates.len();
            let hit = candidates
                .into_iter()
                .find(|c| c.document_number == target);
            info!(
                sheet = %loaded.config.name,
                %strategy,
                rows,
                matched = hit.is_some(),
                "strategy finished"
            );
            if let Some(candidate) = hit {
                return Some((candidate, loaded, strategy));
            }
        }
    }
    None
}

pub fn count_records(sheets: &[LoadedSheet<'_>], strategies: &[StrategyKind]) -> SheetStats {
    let mut by_degree = BTreeMap::new();
    let mut counts = Vec::with_capacity(sheets.len());

    for loaded in sheets {
        let found = strategies.iter().find_map(|&strategy| {
            strategy
                .classifier()
                .candidates(&loaded.sheet, loaded.config)
                .filter(|c| !c.is_empty())
                .map(|c| (strategy, c.len()))
        });
        let (strategy, records) = match found {
            Some((strategy, n)) => (Some(strategy), n),
            None => (None, 0),
        };

        *by_degree.entry(loaded.config.degree_type).or_insert(0) += records;
        counts.push(SheetCount {
            sheet: loaded.config.name.clone(),
            degree_type: loaded.config.degree_type,
            rows: loaded.sheet.len(),
            records,
            strategy,
        });
    }

    SheetStats {
        total: counts.iter().map(|c| c.records).sum(),
        by_degree,
        sheets: counts,
    }
}
