// src/lib.rs

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lookup;
pub mod record;
pub mod sheet;

pub use config::{Config, SheetConfig};
pub use error::{LookupError, SourceFetchError};
pub use lookup::{normalize_identifier, Lookup, LookupMatch, LookupOutcome};
pub use record::{DegreeType, GraduateRecord};
pub use sheet::MIN_DOCUMENT_DIGITS;
