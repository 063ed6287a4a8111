// src/extractors/kinds.rs
//! Known table kinds and the row windows that isolate their data rows.
//!
//! The windows encode the markup shape stats.swehockey.se uses for each kind:
//!
//! | kind            | rows                                              | window      |
//! |-----------------|---------------------------------------------------|-------------|
//! | skater stats    | title, subtitle, header, data...                  | `(2, None)` |
//! | goalie stats    | subtitle, header, data... (team from prior table) | `(1, None)` |
//! | team roster     | title, subtitle, header, data..., 2 footer rows   | `(2, -2)`   |
//! | team officials  | subtitle, header, data...                         | `(1, None)` |
//!
//! When the site changes its layout these are the numbers to revisit; they can
//! be overridden at run time with a JSON catalog (`--catalog`).

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::utils::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    SkaterStats,
    GoalieStats,
    TeamRoster,
    TeamOfficials,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::SkaterStats => "skater_stats",
            TableKind::GoalieStats => "goalie_stats",
            TableKind::TeamRoster => "team_roster",
            TableKind::TeamOfficials => "team_officials",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row offsets into a table's full `<tr>` sequence.
///
/// `start` is the header row; data begins right after it. `end` is exclusive;
/// negative values count back from the last row, `None` runs to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    pub start: usize,
    pub end: Option<isize>,
}

impl RowWindow {
    pub const fn new(start: usize, end: Option<isize>) -> Self {
        Self { start, end }
    }

    /// Smallest row count a table needs for this window to make sense, or
    /// `None` when the offsets overflow.
    pub fn required_rows(&self) -> Option<usize> {
        let first = self.start.checked_add(1)?;
        match self.end {
            None => Some(first),
            Some(e) if e < 0 => first.checked_add(e.unsigned_abs()),
            Some(e) => Some((e as usize).max(first)),
        }
    }

    /// Indices of the data rows in a table of `total` rows.
    pub fn data_rows(&self, kind: TableKind, total: usize) -> Result<Range<usize>, ExtractError> {
        let required = self
            .required_rows()
            .ok_or_else(|| ExtractError::Catalog(format!("row window {:?} for '{}' overflows", self, kind)))?;
        if total < required {
            return Err(ExtractError::TooFewRows { kind, rows: total, required });
        }
        let first = self.start + 1;
        let stop = match self.end {
            None => total,
            Some(e) if e < 0 => total - e.unsigned_abs(),
            Some(e) => e as usize,
        };
        Ok(first..stop.max(first))
    }
}

/// One catalog entry: the subtitle key that identifies a kind, and its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSpec {
    pub kind: TableKind,
    /// Normalized subtitle text, e.g. `playingstatistics`.
    pub subtitle: String,
    pub start: usize,
    #[serde(default)]
    pub end: Option<isize>,
}

impl KindSpec {
    pub fn new(kind: TableKind, subtitle: &str, start: usize, end: Option<isize>) -> Self {
        Self { kind, subtitle: subtitle.to_string(), start, end }
    }

    pub fn window(&self) -> RowWindow {
        RowWindow::new(self.start, self.end)
    }
}

/// Immutable lookup from subtitle key to kind, and from kind to row window.
/// Built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct KindCatalog {
    specs: Vec<KindSpec>,
}

impl KindCatalog {
    pub fn new(specs: Vec<KindSpec>) -> Result<Self, ExtractError> {
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.subtitle == spec.subtitle) {
                return Err(ExtractError::Catalog(format!("duplicate subtitle '{}'", spec.subtitle)));
            }
            if specs[..i].iter().any(|s| s.kind == spec.kind) {
                return Err(ExtractError::Catalog(format!("duplicate kind '{}'", spec.kind)));
            }
            if spec.window().required_rows().is_none() {
                return Err(ExtractError::Catalog(format!(
                    "row window for '{}' is out of range (start {}, end {:?})",
                    spec.kind, spec.start, spec.end
                )));
            }
        }
        Ok(Self { specs })
    }

    /// The layouts observed on stats.swehockey.se.
    pub fn standard() -> Self {
        Self {
            specs: vec![
                KindSpec::new(TableKind::SkaterStats, "playingstatistics", 2, None),
                KindSpec::new(TableKind::GoalieStats, "goalkeepingstatistics", 1, None),
                KindSpec::new(TableKind::TeamRoster, "teamroster", 2, Some(-2)),
                KindSpec::new(TableKind::TeamOfficials, "teamofficials", 1, None),
            ],
        }
    }

    /// Parses a catalog override, a JSON array of [`KindSpec`].
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        let specs: Vec<KindSpec> =
            serde_json::from_str(json).map_err(|e| ExtractError::Catalog(e.to_string()))?;
        Self::new(specs)
    }

    pub fn kind_for(&self, subtitle_key: &str) -> Result<TableKind, ExtractError> {
        self.specs
            .iter()
            .find(|s| s.subtitle == subtitle_key)
            .map(|s| s.kind)
            .ok_or_else(|| ExtractError::UnknownTableKind(subtitle_key.to_string()))
    }

    pub fn resolve(&self, kind: TableKind) -> Result<RowWindow, ExtractError> {
        self.specs
            .iter()
            .find(|s| s.kind == kind)
            .map(KindSpec::window)
            .ok_or(ExtractError::UnsupportedTableKind(kind))
    }
}

impl Default for KindCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_windows() {
        let catalog = KindCatalog::standard();
        assert_eq!(catalog.resolve(TableKind::SkaterStats).unwrap(), RowWindow::new(2, None));
        assert_eq!(catalog.resolve(TableKind::GoalieStats).unwrap(), RowWindow::new(1, None));
        assert_eq!(catalog.resolve(TableKind::TeamRoster).unwrap(), RowWindow::new(2, Some(-2)));
        assert_eq!(catalog.resolve(TableKind::TeamOfficials).unwrap(), RowWindow::new(1, None));
    }

    #[test]
    fn test_kind_for_subtitle() {
        let catalog = KindCatalog::standard();
        assert_eq!(catalog.kind_for("teamroster").unwrap(), TableKind::TeamRoster);
        assert!(matches!(
            catalog.kind_for("refereestatistics"),
            Err(ExtractError::UnknownTableKind(k)) if k == "refereestatistics"
        ));
    }

    #[test]
    fn test_data_rows_trims_footer() {
        let roster = RowWindow::new(2, Some(-2));
        // title, subtitle, header, 4 players, 2 footer rows
        assert_eq!(roster.data_rows(TableKind::TeamRoster, 9).unwrap(), 3..7);
        // header and footers only
        assert_eq!(roster.data_rows(TableKind::TeamRoster, 5).unwrap(), 3..3);
        assert!(matches!(
            roster.data_rows(TableKind::TeamRoster, 4),
            Err(ExtractError::TooFewRows { rows: 4, required: 5, .. })
        ));
    }

    #[test]
    fn test_data_rows_open_end() {
        let skaters = RowWindow::new(2, None);
        assert_eq!(skaters.data_rows(TableKind::SkaterStats, 10).unwrap(), 3..10);
        assert!(skaters.data_rows(TableKind::SkaterStats, 2).is_err());
    }

    #[test]
    fn test_catalog_override_from_json() {
        let json = r#"[
            {"kind": "team_roster", "subtitle": "teamroster", "start": 1, "end": -1},
            {"kind": "skater_stats", "subtitle": "playingstatistics", "start": 2}
        ]"#;
        let catalog = KindCatalog::from_json(json).unwrap();
        assert_eq!(catalog.resolve(TableKind::TeamRoster).unwrap(), RowWindow::new(1, Some(-1)));
        assert!(matches!(
            catalog.resolve(TableKind::GoalieStats),
            Err(ExtractError::UnsupportedTableKind(TableKind::GoalieStats))
        ));
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let specs = vec![
            KindSpec::new(TableKind::SkaterStats, "playingstatistics", 2, None),
            KindSpec::new(TableKind::GoalieStats, "playingstatistics", 1, None),
        ];
        assert!(matches!(KindCatalog::new(specs), Err(ExtractError::Catalog(_))));
    }

    #[test]
    fn test_catalog_rejects_overflowing_windows() {
        let huge_start = r#"[{"kind": "skater_stats", "subtitle": "playingstatistics", "start": 18446744073709551615}]"#;
        assert!(matches!(KindCatalog::from_json(huge_start), Err(ExtractError::Catalog(_))));

        let specs = vec![KindSpec::new(TableKind::TeamRoster, "teamroster", usize::MAX - 1, Some(-2))];
        assert!(matches!(KindCatalog::new(specs), Err(ExtractError::Catalog(_))));

        // A window built by hand is checked again when it is applied.
        let window = RowWindow::new(usize::MAX, None);
        assert_eq!(window.required_rows(), None);
        assert!(matches!(window.data_rows(TableKind::SkaterStats, 10), Err(ExtractError::Catalog(_))));
    }
}
