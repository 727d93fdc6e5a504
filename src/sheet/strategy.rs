// src/sheet/strategy.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{header, pattern, Candidate, RawSheet};
use crate::config::SheetConfig;

/// A way of turning a parsed sheet into candidate records.
pub trait RowClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the classifier cannot be applied to this sheet at all
    /// (e.g. no header row); `Some(vec![])` when it applied and found nothing.
    fn candidates(&self, sheet: &RawSheet, config: &SheetConfig) -> Option<Vec<Candidate>>;
}

/// Header-driven: find the label row, read columns by name.
pub struct HeaderClassifier;

impl RowClassifier for HeaderClassifier {
    fn name(&self) -> &'static str {
        "header"
    }

    fn candidates(&self, sheet: &RawSheet, config: &SheetConfig) -> Option<Vec<Candidate>> {
        header::accepted_rows(sheet, config)
    }
}

/// Schema-free: classify each row's cells by content.
pub struct PatternClassifier;

impl RowClassifier for PatternClassifier {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn candidates(&self, sheet: &RawSheet, config: &SheetConfig) -> Option<Vec<Candidate>> {
        Some(pattern::accepted_rows(sheet, config))
    }
}

static HEADER: HeaderClassifier = HeaderClassifier;
static PATTERN: PatternClassifier = PatternClassifier;

/// Configurable name of a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Header,
    Pattern,
}

impl StrategyKind {
    pub fn classifier(self) -> &'static dyn RowClassifier {
        match self {
            StrategyKind::Header => &HEADER,
            StrategyKind::Pattern => &PATTERN,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.classifier().name())
    }
}
