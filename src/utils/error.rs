// src/utils/error.rs
use thiserror::Error;

use crate::extractors::kinds::TableKind;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 500 Internal Server Error

    #[error("Stats site rate limit likely exceeded")]
    RateLimited,

    #[error("Could not find page: {0}")]
    PageNotFound(String),

    #[error("Could not read saved page {path}: {source}")]
    SavedPage {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    // Classification failures
    #[error("Table has no subtitle cell")]
    MissingSubtitle,

    #[error("Unknown table kind: '{0}'")]
    UnknownTableKind(String),

    // Structural failures
    #[error("No row window registered for table kind {0}")]
    UnsupportedTableKind(TableKind),

    #[error("Table of kind {kind} has {rows} rows, its row window needs at least {required}")]
    TooFewRows {
        kind: TableKind,
        rows: usize,
        required: usize,
    },

    #[error("Header row {0} has no header cells")]
    EmptyHeader(usize),

    #[error("Header cell {column} has no usable name")]
    BlankHeader { column: usize },

    #[error("Header names field '{0}' more than once")]
    DuplicateField(String),

    #[error("Row has {found} cells, schema expects {expected}")]
    RowWidth { expected: usize, found: usize },

    #[error("Table has no title cell and no earlier table named a team")]
    MissingTeam,

    // Output boundary
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Invalid table kind catalog: {0}")]
    Catalog(String),
}

/// An extraction failure tied to the table fragment (and row) it came from.
#[derive(Error, Debug)]
#[error("table #{fragment}{}: {source}", .row.map(|r| format!(" row {}", r)).unwrap_or_default())]
pub struct FragmentError {
    pub fragment: usize,
    pub row: Option<usize>,
    #[source]
    pub source: ExtractError,
}

impl FragmentError {
    pub fn new(fragment: usize, source: ExtractError) -> Self {
        Self { fragment, row: None, source }
    }

    pub fn at_row(fragment: usize, row: usize, source: ExtractError) -> Self {
        Self { fragment, row: Some(row), source }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Cannot write record: {0}")]
    Record(#[from] ExtractError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Fetching stats page failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
