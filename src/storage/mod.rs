// src/storage/mod.rs
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::extractors::record::Schema;
use crate::extractors::{Record, TableKind};
use crate::swehockey::League;
use crate::utils::error::{ExtractError, StorageError};

pub struct StorageManager {
    base_dir: PathBuf,
}

/// What one extraction pass produced, saved next to the CSV files.
#[derive(Debug, Serialize)]
pub struct ExtractionSummary {
    pub label: String,
    pub league: Option<League>,
    pub source: String,
    pub records: BTreeMap<TableKind, usize>,
    /// Teams in the order the page lists them.
    pub teams: Vec<String>,
    /// Cells that did not match their field's expected shape.
    pub absent_values: usize,
    pub skipped: Vec<String>,
    /// Selected field names no table on the page has.
    pub unmatched_fields: Vec<String>,
    #[serde(skip)]
    seen_fields: BTreeSet<String>,
}

impl ExtractionSummary {
    pub fn new(label: &str, league: Option<League>, source: &str) -> Self {
        Self {
            label: label.to_string(),
            league,
            source: source.to_string(),
            records: BTreeMap::new(),
            teams: Vec::new(),
            absent_values: 0,
            skipped: Vec::new(),
            unmatched_fields: Vec::new(),
            seen_fields: BTreeSet::new(),
        }
    }

    /// Counts one delivered record.
    pub fn note(&mut self, record: &Record) {
        *self.records.entry(record.kind()).or_default() += 1;
        if !self.teams.iter().any(|t| t == record.team()) {
            self.teams.push(record.team().to_string());
        }
        self.absent_values += record.iter().filter(|(_, value)| value.is_absent()).count();
        for name in record.schema().fields() {
            if !self.seen_fields.contains(name) {
                self.seen_fields.insert(name.clone());
            }
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.values().sum()
    }

    /// Notes which selected fields never matched a table, once the page is done.
    pub fn check_selection(&mut self, selection: Option<&[String]>) {
        let Some(selection) = selection else { return };
        self.unmatched_fields = selection
            .iter()
            .filter(|name| !self.seen_fields.contains(*name))
            .cloned()
            .collect();
        if !self.unmatched_fields.is_empty() {
            tracing::warn!(
                "No table on {} has the selected field(s): {}",
                self.source,
                self.unmatched_fields.join(", ")
            );
        }
    }
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Directory for one page's output, e.g. `output/3905/players_by_team`.
    pub fn target_dir(&self, label: &str) -> Result<PathBuf, StorageError> {
        let dir = self.base_dir.join(label);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Opens a sink writing one CSV file per table kind under `label`.
    ///
    /// Each file's columns come from the first record of its kind, narrowed
    /// by `fields` as [`select_columns`] does.
    pub fn record_sink(&self, label: &str, fields: Option<Vec<String>>) -> Result<RecordSink, StorageError> {
        Ok(RecordSink {
            dir: self.target_dir(label)?,
            fields,
            writers: HashMap::new(),
            unwritten: HashSet::new(),
        })
    }

    /// Saves the summary of an extraction pass as JSON.
    pub fn save_metadata(&self, summary: &ExtractionSummary) -> Result<PathBuf, StorageError> {
        let file_path = self.target_dir(&summary.label)?.join("metadata.json");

        let metadata = serde_json::json!({
            "summary": summary,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });
        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }
}

pub struct RecordSink {
    dir: PathBuf,
    fields: Option<Vec<String>>,
    writers: HashMap<TableKind, (Vec<String>, csv::Writer<File>)>,
    /// Kinds that share no column with the field selection.
    unwritten: HashSet<TableKind>,
}

impl RecordSink {
    /// Appends a record to its kind's file, creating the file on first use.
    ///
    /// Fails with [`StorageError::Record`] when the record lacks a column its
    /// file already has; nothing is written for it in that case.
    pub fn write(&mut self, record: &Record) -> Result<(), StorageError> {
        let kind = record.kind();
        if self.unwritten.contains(&kind) {
            return Ok(());
        }
        if !self.writers.contains_key(&kind) {
            let columns = select_columns(self.fields.as_deref(), record.schema());
            if columns.is_empty() {
                tracing::warn!("None of the selected fields exist in {} tables, not writing them", kind);
                self.unwritten.insert(kind);
                return Ok(());
            }
            let path = self.dir.join(format!("{}.csv", kind));
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(&columns)?;
            tracing::debug!("Writing {} records to {}", kind, path.display());
            self.writers.insert(kind, (columns, writer));
        }

        if let Some((columns, writer)) = self.writers.get_mut(&kind) {
            writer.write_record(render_row(record, columns)?)?;
        }
        Ok(())
    }

    /// Flushes every file.
    pub fn finish(mut self) -> Result<(), StorageError> {
        for (_, writer) in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Columns to output for records of `schema`: the selected names this schema
/// has, in selection order, or the whole schema when nothing is selected.
pub fn select_columns(selection: Option<&[String]>, schema: &Schema) -> Vec<String> {
    match selection {
        Some(names) => names
            .iter()
            .filter(|name| schema.position(name).is_some())
            .cloned()
            .collect(),
        None => schema.fields().to_vec(),
    }
}

/// Text for the selected columns of a record; absent values become empty cells.
pub fn render_row(record: &Record, columns: &[String]) -> Result<Vec<String>, ExtractError> {
    columns
        .iter()
        .map(|name| record.get(name).map(ToString::to_string))
        .collect()
}
