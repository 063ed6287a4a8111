// src/main.rs
mod utils;
mod swehockey;
mod extractors;
mod storage;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use scraper::Html;

use extractors::{CoercionRegistry, Extractor, KindCatalog, Record};
use storage::{select_columns, ExtractionSummary, RecordSink, StorageManager};
use swehockey::{client, leagues, Page};
use utils::error::StorageError;
use utils::AppError;

const REQUEST_DELAY_ENV: &str = "SWEHOCKEY_REQUEST_DELAY_MS";

/// Extracts typed player statistics and rosters from stats.swehockey.se
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// League id on stats.swehockey.se (see --list-leagues)
    #[arg(short, long, required_unless_present_any = ["input", "list_leagues"])]
    league: Option<u32>,

    /// Which league pages to fetch
    #[arg(short, long, value_enum, default_value_t = PageArg::All)]
    page: PageArg,

    /// Extract from a saved HTML page instead of fetching
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for extracted records
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Comma-separated fields to write, in order (default: all fields of each table kind)
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,

    /// Print records as JSON lines instead of writing CSV files
    #[arg(long)]
    stdout: bool,

    /// Keep every value as text, without number/date coercion
    #[arg(long)]
    raw: bool,

    /// JSON file replacing the built-in table kind catalog
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// List known leagues and exit
    #[arg(long)]
    list_leagues: bool,

    /// Debug mode - save each table fragment as annotated HTML
    #[arg(short, long)]
    debug: bool,

    /// Delay before each request in milliseconds (default: $SWEHOCKEY_REQUEST_DELAY_MS or 150)
    #[arg(long)]
    request_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PageArg {
    /// Players by team (skater and goalie statistics)
    Stats,
    /// Team rosters and officials
    Roster,
    All,
}

impl PageArg {
    fn pages(self) -> Vec<Page> {
        match self {
            PageArg::Stats => vec![Page::PlayersByTeam],
            PageArg::Roster => vec![Page::TeamRoster],
            PageArg::All => vec![Page::PlayersByTeam, Page::TeamRoster],
        }
    }
}

/// A page to extract from: where it came from and its body.
struct Source {
    label: String,
    origin: String,
    body: String,
}

/// Where extracted records go: CSV files per kind, or JSON lines on stdout.
enum Output {
    Files(RecordSink),
    Lines(std::io::StdoutLock<'static>),
}

impl Output {
    fn write(&mut self, record: &Record, fields: Option<&[String]>) -> Result<(), AppError> {
        match self {
            Output::Files(sink) => sink.write(record)?,
            Output::Lines(out) => {
                let line = match fields {
                    Some(_) => {
                        let columns = select_columns(fields, record.schema());
                        if columns.is_empty() {
                            return Ok(());
                        }
                        let mut selected = serde_json::Map::new();
                        for name in columns {
                            let value = serde_json::to_value(record.get(&name)?)?;
                            selected.insert(name, value);
                        }
                        serde_json::json!({ "kind": record.kind(), "record": selected })
                    }
                    None => serde_json::json!({ "kind": record.kind(), "record": record }),
                };
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<(), AppError> {
        match self {
            Output::Files(sink) => sink.finish()?,
            Output::Lines(mut out) => out.flush()?,
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments and set up logging (reads RUST_LOG env var)
    let args = Args::parse();
    utils::logging::setup_logging(args.debug);
    tracing::info!("Starting processing for args: {:?}", args);

    if args.list_leagues {
        for league in leagues::all() {
            println!("{}\t{}\t{}\t{:?}", league.id, league.name, league.season, league.phase);
        }
        return Ok(());
    }

    // 2. Resolve configuration: flag, then environment, then default
    let delay = Duration::from_millis(request_delay_ms(args.request_delay_ms)?);

    let catalog = match &args.catalog {
        Some(path) => {
            tracing::info!("Loading table kind catalog from {}", path.display());
            KindCatalog::from_json(&std::fs::read_to_string(path)?)?
        }
        None => KindCatalog::standard(),
    };
    let coercions = if args.raw { CoercionRegistry::text_only() } else { CoercionRegistry::standard() };
    let extractor = Extractor::new(&catalog, &coercions);

    let league = args.league.and_then(|id| {
        let found = leagues::lookup(id);
        match found {
            Some(l) => tracing::info!("League {}: {} {} ({:?})", id, l.name, l.season, l.phase),
            None => tracing::warn!("League {} is not in the built-in list, fetching anyway", id),
        }
        found.copied()
    });

    // 3. Initialize storage unless records go to stdout
    let storage = if args.stdout { None } else { Some(StorageManager::new(&args.output_dir)?) };

    // 4. Collect the pages to process
    let mut sources = Vec::new();
    let mut failure_count = 0;
    if let Some(path) = &args.input {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "input".to_string());
        sources.push(Source {
            label: stem,
            origin: path.display().to_string(),
            body: client::load_page(path).await?,
        });
    } else if let Some(league_id) = args.league {
        for page in args.page.pages() {
            let url = page.url(league_id);
            match client::download_page(&url, delay).await {
                Ok(body) => sources.push(Source {
                    label: format!("{}/{}", league_id, page.label()),
                    origin: url,
                    body,
                }),
                Err(e) => {
                    tracing::error!("Failed to download {}: {}", url, e);
                    failure_count += 1;
                }
            }
        }
    }

    // 5. Extract each page
    let mut success_count = 0;
    for source in &sources {
        match process_source(source, &extractor, storage.as_ref(), &args, league) {
            Ok(summary) => {
                tracing::info!(
                    "Extracted {} records for {} teams from {} ({} skipped)",
                    summary.record_count(),
                    summary.teams.len(),
                    source.origin,
                    summary.skipped.len()
                );
                success_count += 1;
            }
            Err(e) => {
                tracing::error!("Failed to extract records from {}: {}", source.origin, e);
                failure_count += 1;
            }
        }
    }

    tracing::info!("Processing finished. Success: {}, Failures: {}", success_count, failure_count);

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!("Failed to extract records from {} pages", failure_count)));
    }

    Ok(())
}

fn request_delay_ms(flag: Option<u64>) -> Result<u64, AppError> {
    if let Some(ms) = flag {
        return Ok(ms);
    }
    match std::env::var(REQUEST_DELAY_ENV) {
        Ok(value) => value
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number of milliseconds, got '{}'", REQUEST_DELAY_ENV, value))),
        Err(_) => Ok(client::DEFAULT_REQUEST_DELAY_MS),
    }
}

fn process_source(
    source: &Source,
    extractor: &Extractor,
    storage: Option<&StorageManager>,
    args: &Args,
    league: Option<leagues::League>,
) -> Result<ExtractionSummary, AppError> {
    let document = Html::parse_document(&source.body);

    if args.debug {
        if let Some(storage) = storage {
            let dir = storage.target_dir(&source.label)?.join("debug");
            if let Err(e) = utils::html_debug::dump_fragments(&document, extractor, &dir) {
                tracing::warn!("Failed to save debug fragments: {}", e);
            }
        }
    }

    let mut summary = ExtractionSummary::new(&source.label, league, &source.origin);
    let fields = args.fields.as_deref();
    let mut output = match storage {
        Some(storage) => Output::Files(storage.record_sink(&source.label, args.fields.clone())?),
        None => Output::Lines(std::io::stdout().lock()),
    };

    for item in extractor.extract(&document) {
        let record = match item {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping {}", e);
                summary.skipped.push(e.to_string());
                continue;
            }
        };
        match output.write(&record, fields) {
            Ok(()) => summary.note(&record),
            // A record that does not fit its kind's columns is dropped, not the page.
            Err(AppError::Storage(StorageError::Record(e))) | Err(AppError::Extraction(e)) => {
                let reason = format!("{} record for '{}': {}", record.kind(), record.team(), e);
                tracing::warn!("Skipping {}", reason);
                summary.skipped.push(reason);
            }
            Err(e) => return Err(e),
        }
    }
    output.finish()?;
    summary.check_selection(fields);

    if let Some(storage) = storage {
        storage.save_metadata(&summary)?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TEAM_ROSTER: &str = include_str!("../tests/fixtures/team_roster.html");

    fn roster_source() -> Source {
        Source {
            label: "3905/team_roster".to_string(),
            origin: "tests/fixtures/team_roster.html".to_string(),
            body: TEAM_ROSTER.to_string(),
        }
    }

    fn run(name: &str, fields: &str) -> (std::path::PathBuf, Result<ExtractionSummary, AppError>) {
        let dir = std::env::temp_dir().join(format!("swehockey_stats_main_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let output_dir = dir.display().to_string();
        let args = Args::parse_from([
            "swehockey_stats",
            "--input",
            "tests/fixtures/team_roster.html",
            "--output-dir",
            output_dir.as_str(),
            "--fields",
            fields,
        ]);
        let catalog = KindCatalog::standard();
        let coercions = CoercionRegistry::standard();
        let extractor = Extractor::new(&catalog, &coercions);
        let storage = StorageManager::new(&dir).unwrap();
        let result = process_source(&roster_source(), &extractor, Some(&storage), &args, leagues::lookup(3905).copied());
        (dir, result)
    }

    #[test]
    fn test_field_selection_spans_mixed_kinds() {
        let (dir, result) = run("mixed", "no,name");
        let summary = result.unwrap();
        assert_eq!(summary.record_count(), 8);
        assert!(summary.skipped.is_empty());
        assert!(summary.unmatched_fields.is_empty());

        let page_dir = dir.join("3905/team_roster");
        let roster = fs::read_to_string(page_dir.join("team_roster.csv")).unwrap();
        assert_eq!(roster.lines().next(), Some("no,name"));
        let officials = fs::read_to_string(page_dir.join("team_officials.csv")).unwrap();
        assert_eq!(officials.lines().count(), 4);

        let metadata: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(page_dir.join("metadata.json")).unwrap()).unwrap();
        assert_eq!(metadata["summary"]["records"]["team_officials"], 3);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unknown_selected_field_still_saves_metadata() {
        let (dir, result) = run("unmatched", "birthdate,weight_kg");
        let summary = result.unwrap();
        assert_eq!(summary.unmatched_fields, vec!["weight_kg".to_string()]);

        let page_dir = dir.join("3905/team_roster");
        assert!(page_dir.join("team_roster.csv").exists());
        assert!(!page_dir.join("team_officials.csv").exists());
        let metadata: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(page_dir.join("metadata.json")).unwrap()).unwrap();
        assert_eq!(metadata["summary"]["unmatched_fields"][0], "weight_kg");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_request_delay_flag_wins() {
        assert_eq!(request_delay_ms(Some(5)).unwrap(), 5);
    }
}
