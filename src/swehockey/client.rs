// src/swehockey/client.rs
use std::path::Path;
use std::time::Duration;

use reqwest::header;

use crate::utils::error::FetchError;

const BASE_URL: &str = "http://stats.swehockey.se";
const USER_AGENT: &str = concat!("swehockey_stats/", env!("CARGO_PKG_VERSION"));
// Be polite to a small volunteer-run site.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 150;

/// The two pages that carry team tables for a league.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Skater and goalie statistics per team.
    PlayersByTeam,
    /// Rosters and officials per team.
    TeamRoster,
}

impl Page {
    pub fn url(&self, league_id: u32) -> String {
        match self {
            Page::PlayersByTeam => format!("{}/Teams/Info/PlayersByTeam/{}", BASE_URL, league_id),
            Page::TeamRoster => format!("{}/Teams/Info/TeamRoster/{}", BASE_URL, league_id),
        }
    }

    /// Used for output directories and file names.
    pub fn label(&self) -> &'static str {
        match self {
            Page::PlayersByTeam => "players_by_team",
            Page::TeamRoster => "team_roster",
        }
    }
}

/// Creates a reqwest client configured for the stats site.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
}

/// Downloads a page, waiting `delay` first.
pub async fn download_page(url: &str, delay: Duration) -> Result<String, FetchError> {
    let client = build_client()?;

    tracing::info!("Downloading page from: {}", url);
    tokio::time::sleep(delay).await;

    let response = client
        .get(url)
        .header(header::ACCEPT, "text/html,*/*")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Received {} - slow down with --request-delay-ms.", status);
            return Err(FetchError::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::PageNotFound(url.to_string()));
        }
        return Err(FetchError::Http(status));
    }

    // A declared charset is decoded by reqwest; an undeclared one is sniffed.
    let declares_charset = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("charset="));
    let body = if declares_charset {
        response.text_with_charset("utf-8").await?
    } else {
        decode_page(&response.bytes().await?)
    };
    tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}

/// Reads a previously saved page from disk.
pub async fn load_page(path: &Path) -> Result<String, FetchError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| FetchError::SavedPage {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!("Loaded saved page {} ({} bytes)", path.display(), bytes.len());
    Ok(decode_page(&bytes))
}

/// UTF-8 if valid, otherwise windows-1252, which older pages on the site use
/// (they are labelled ISO-8859-1, a label browsers also read as windows-1252).
pub fn decode_page(bytes: &[u8]) -> String {
    if let Some(text) = encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return text.into_owned();
    }
    let (text, encoding, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    tracing::debug!("Page is not UTF-8, decoded as {}", encoding.name());
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_urls() {
        assert_eq!(
            Page::PlayersByTeam.url(3905),
            "http://stats.swehockey.se/Teams/Info/PlayersByTeam/3905"
        );
        assert_eq!(Page::TeamRoster.url(3906), "http://stats.swehockey.se/Teams/Info/TeamRoster/3906");
        assert_eq!(Page::TeamRoster.label(), "team_roster");
    }

    #[test]
    fn test_decode_page() {
        assert_eq!(decode_page("Färjestad".as_bytes()), "Färjestad");
        // "Färjestad" in ISO-8859-1
        let latin1 = [0x46, 0xE4, 0x72, 0x6A, 0x65, 0x73, 0x74, 0x61, 0x64];
        assert_eq!(decode_page(&latin1), "Färjestad");
    }

    #[test]
    fn test_decode_page_windows_1252_punctuation() {
        // "O’Neil" with the right single quote at 0x92
        assert_eq!(decode_page(&[0x4F, 0x92, 0x4E, 0x65, 0x69, 0x6C]), "O\u{2019}Neil");
        // en dash and euro sign
        assert_eq!(decode_page(&[0x31, 0x96, 0x32, 0x20, 0x80]), "1\u{2013}2 \u{20AC}");
    }

    #[test]
    fn test_load_saved_page() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/team_roster.html");
        let body = tokio_test::block_on(load_page(&path)).unwrap();
        assert!(body.contains("Frölunda HC"));

        let missing = tokio_test::block_on(load_page(Path::new("does/not/exist.html")));
        assert!(matches!(missing, Err(FetchError::SavedPage { .. })));
    }
}
