// src/extractors/columns.rs

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

static HEADER_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th.tdHeader").expect("Failed to compile HEADER_CELL_SELECTOR")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

/// All text inside an element, nested formatting included.
pub fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

/// Cell text with surrounding whitespace trimmed and inner runs collapsed to one space.
pub fn cell_text(element: ElementRef) -> String {
    WHITESPACE_RE.replace_all(element_text(element).trim(), " ").into_owned()
}

/// Turns header text like `+/-` or `SVS%` into a field name (`plusminus`, `svsperc`).
pub fn normalize(header: &str) -> String {
    let replaced = header
        .trim()
        .replace('\n', "")
        .replace('+', "plus")
        .replace('-', "minus")
        .replace('/', "")
        .replace('%', "perc");
    WHITESPACE_RE.replace_all(&replaced, "").to_lowercase()
}

/// Normalized names of the `th.tdHeader` cells in a header row, in column order.
pub fn header_names(row: ElementRef) -> Vec<String> {
    row.select(&HEADER_CELL_SELECTOR)
        .map(|cell| normalize(&element_text(cell)))
        .collect()
}
