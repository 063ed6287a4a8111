// src/utils/html_debug.rs
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use scraper::{ElementRef, Html};

use crate::extractors::table::TableLayout;
use crate::extractors::Extractor;
use crate::utils::error::{AppError, ExtractError};

/// Saves one table fragment with a banner describing how it was read.
pub fn save_fragment_html(
    dir: &Path,
    index: usize,
    fragment: ElementRef,
    layout: &Result<TableLayout, ExtractError>,
) -> Result<PathBuf, AppError> {
    let path = dir.join(format!("fragment_{:02}.html", index));
    let mut file = File::create(&path)?;

    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
    debug_html.push_str(".highlight-ok { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-skipped { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    let (css_class, note) = match layout {
        Ok(l) => (
            "highlight-ok",
            format!("table #{}: {} (header row {}, data rows {:?})", index, l.kind, l.header_row, l.data_rows),
        ),
        Err(e) => ("highlight-skipped", format!("table #{}: skipped, {}", index, e)),
    };
    debug_html.push_str(&format!("<p class=\"{}\">{}</p>\n", css_class, note));
    debug_html.push_str(&fragment.html());
    debug_html.push_str("\n</body>\n</html>");

    file.write_all(debug_html.as_bytes())?;

    tracing::debug!("Saved debug HTML to {}", path.display());
    Ok(path)
}

/// Dumps every candidate table of a document into `dir`.
pub fn dump_fragments(document: &Html, extractor: &Extractor, dir: &Path) -> Result<usize, AppError> {
    std::fs::create_dir_all(dir)?;
    let mut count = 0;
    for (index, fragment) in Extractor::fragments(document).enumerate() {
        save_fragment_html(dir, index, fragment, &extractor.layout(fragment))?;
        count += 1;
    }
    tracing::info!("Saved {} table fragments to {}", count, dir.display());
    Ok(count)
}
