// src/extractors/classify.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::columns::element_text;
use super::kinds::{KindCatalog, TableKind};
use crate::utils::error::ExtractError;

static SUBTITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th.tdSubTitle").expect("Failed to compile SUBTITLE_SELECTOR")
});

/// Normalized text of the table's subtitle cell (`Playing Statistics` -> `playingstatistics`).
pub fn subtitle_key(table: ElementRef) -> Option<String> {
    let subtitle = table.select(&SUBTITLE_SELECTOR).next()?;
    let key: String = element_text(subtitle)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    Some(key.to_lowercase())
}

/// Determines a table's kind from its subtitle.
pub fn classify(table: ElementRef, catalog: &KindCatalog) -> Result<TableKind, ExtractError> {
    let key = subtitle_key(table).ok_or(ExtractError::MissingSubtitle)?;
    tracing::trace!("Subtitle key '{}'", key);
    catalog.kind_for(&key)
}
