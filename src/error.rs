// src/error.rs

use thiserror::Error;

/// Why a single sheet could not be read.
#[derive(Debug, Error)]
pub enum SourceFetchError {
    #[error("GET {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("body from {url} is too short ({len} bytes, expected at least {min})")]
    ShortBody { url: String, len: usize, min: usize },

    #[error("no endpoint could be built for sheet {sheet}: {reason}")]
    Endpoint { sheet: String, reason: String },
}

/// A sheet that failed to load during one lookup.
#[derive(Debug)]
pub struct SheetFailure {
    pub sheet: String,
    pub error: SourceFetchError,
}

/// Errors surfaced to the caller of a lookup. "Not found" is not one of them.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("El número de cédula es requerido")]
    MissingIdentifier,

    #[error("El número de documento debe tener al menos {min} dígitos")]
    IdentifierTooShort { digits: usize, min: usize },

    #[error("no sheet could be fetched ({} failures)", failures.len())]
    Unavailable { failures: Vec<SheetFailure> },
}

impl LookupError {
    /// True when the request itself was malformed.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LookupError::MissingIdentifier | LookupError::IdentifierTooShort { .. }
        )
    }
}
