// src/extractors/table.rs

// --- Imports ---
use std::ops::Range;
use std::sync::Arc;

use once_cell::sync::Lazy;
use scraper::{html::Select, ElementRef, Html, Selector};

use super::classify::classify;
use super::coercion::CoercionRegistry;
use super::columns::{cell_text, header_names};
use super::kinds::{KindCatalog, TableKind};
use super::record::{Record, Schema, Value};
use crate::utils::error::{ExtractError, FragmentError};

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.tblContent").expect("Failed to compile TABLE_SELECTOR")
});

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th.tdTitle").expect("Failed to compile TITLE_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td").expect("Failed to compile CELL_SELECTOR")
});

/// Where a table's data lives, as decided by its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub kind: TableKind,
    pub header_row: usize,
    pub data_rows: Range<usize>,
}

// --- Main Extractor Structure ---
/// Turns the stats tables of a parsed page into typed [`Record`]s.
///
/// Holds only shared references to the catalog and coercion table, so it is
/// cheap to copy and one pair of tables can serve any number of documents.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'r> {
    catalog: &'r KindCatalog,
    coercions: &'r CoercionRegistry,
}

impl<'r> Extractor<'r> {
    pub fn new(catalog: &'r KindCatalog, coercions: &'r CoercionRegistry) -> Self {
        Self { catalog, coercions }
    }

    /// Candidate stats tables in document order.
    pub fn fragments(document: &Html) -> Select<'_, 'static> {
        document.select(&TABLE_SELECTOR)
    }

    /// Classifies a table and works out its header row and data rows.
    pub fn layout(&self, table: ElementRef) -> Result<TableLayout, ExtractError> {
        let kind = classify(table, self.catalog)?;
        let window = self.catalog.resolve(kind)?;
        let total = table.select(&ROW_SELECTOR).count();
        let data_rows = window.data_rows(kind, total)?;
        Ok(TableLayout { kind, header_row: window.start, data_rows })
    }

    /// Lazily extracts every record on the page.
    ///
    /// A table that cannot be classified or is too short yields a single error
    /// and extraction resumes with the next table. A row whose cell count does
    /// not match the header yields an error for that row only.
    pub fn extract<'a>(&self, document: &'a Html) -> Records<'a, 'r> {
        Records {
            tables: Self::fragments(document),
            extractor: *self,
            next_fragment: 0,
            team: None,
            current: None,
        }
    }
}

/// Iterator returned by [`Extractor::extract`]. Single pass; records come out
/// in table order, then row order.
pub struct Records<'a, 'r> {
    tables: Select<'a, 'static>,
    extractor: Extractor<'r>,
    next_fragment: usize,
    /// Team named by the most recent title cell. Goalie and officials tables
    /// carry no title and belong to the table right before them.
    team: Option<String>,
    current: Option<Fragment<'a>>,
}

struct Fragment<'a> {
    index: usize,
    team: String,
    schema: Arc<Schema>,
    rows: std::vec::IntoIter<(usize, ElementRef<'a>)>,
}

impl<'a, 'r> Records<'a, 'r> {
    fn open(&mut self, index: usize, table: ElementRef<'a>) -> Result<Fragment<'a>, ExtractError> {
        if let Some(title) = table.select(&TITLE_SELECTOR).next() {
            self.team = Some(cell_text(title));
        }

        let layout = self.extractor.layout(table)?;
        let team = self.team.clone().ok_or(ExtractError::MissingTeam)?;

        let rows: Vec<ElementRef<'a>> = table.select(&ROW_SELECTOR).collect();
        let header = header_names(rows[layout.header_row]);
        if header.is_empty() {
            return Err(ExtractError::EmptyHeader(layout.header_row));
        }
        let schema = Arc::new(Schema::new(layout.kind, header)?);

        tracing::debug!(
            "Table #{}: {} for '{}', {} fields, data rows {:?}",
            index,
            layout.kind,
            team,
            schema.len(),
            layout.data_rows
        );

        let data: Vec<(usize, ElementRef<'a>)> = layout.data_rows.map(|i| (i, rows[i])).collect();
        Ok(Fragment { index, team, schema, rows: data.into_iter() })
    }
}

impl Fragment<'_> {
    fn record(&self, row_index: usize, row: ElementRef, coercions: &CoercionRegistry) -> Result<Record, FragmentError> {
        let cells: Vec<String> = row.select(&CELL_SELECTOR).map(cell_text).collect();
        let expected = self.schema.len() - 1;
        if cells.len() != expected {
            return Err(FragmentError::at_row(
                self.index,
                row_index,
                ExtractError::RowWidth { expected, found: cells.len() },
            ));
        }

        let mut values = Vec::with_capacity(self.schema.len());
        values.push(Value::Text(self.team.clone()));
        values.extend(
            self.schema.fields()[1..]
                .iter()
                .zip(&cells)
                .map(|(field, text)| coercions.coerce(field, text)),
        );
        Ok(Record::new(Arc::clone(&self.schema), values))
    }
}

impl Iterator for Records<'_, '_> {
    type Item = Result<Record, FragmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(fragment) = &mut self.current {
                if let Some((row_index, row)) = fragment.rows.next() {
                    return Some(fragment.record(row_index, row, self.extractor.coercions));
                }
                self.current = None;
            }

            let table = self.tables.next()?;
            let index = self.next_fragment;
            self.next_fragment += 1;

            match self.open(index, table) {
                Ok(fragment) => self.current = Some(fragment),
                Err(e) => return Some(Err(FragmentError::new(index, e))),
            }
        }
    }
}
