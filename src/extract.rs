//! Record extraction
//!
//! Extraction is the CPU-bound tail of the pipeline and runs after the
//! task has released its admission permit. The [`Extract`] trait keeps the
//! record shape caller-defined; [`TitleExtractor`] is the bundled
//! implementation, pulling the page `<title>` into a [`PageRecord`].

use crate::error::ExtractError;
use crate::fetch::FetchedPage;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Abstract extract operation
///
/// Assumed pure and fast: no network I/O, no retries. A failure here is
/// recorded as that URL's terminal outcome, exactly like retry exhaustion.
pub trait Extract: Send + Sync {
    /// Record type produced for each successfully processed URL
    type Record: Send + 'static;

    /// Extract a record from a fetched page
    fn extract(&self, url: &str, page: &FetchedPage) -> Result<Self::Record, ExtractError>;
}

/// Record produced by [`TitleExtractor`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// The input URL the record was extracted for
    pub url: String,
    /// The page title, or "No Title" if the document has none
    pub title: String,
}

/// Fallback title for documents without a usable `<title>` element
const NO_TITLE: &str = "No Title";

/// Extracts the page `<title>` text
#[derive(Clone, Copy, Debug, Default)]
pub struct TitleExtractor;

impl Extract for TitleExtractor {
    type Record = PageRecord;

    fn extract(&self, url: &str, page: &FetchedPage) -> Result<PageRecord, ExtractError> {
        let document = Html::parse_document(&page.body);
        // "title" is a valid selector; the map_err satisfies the parser's
        // fallible signature without panicking paths in library code
        let selector = Selector::parse("title")
            .map_err(|e| ExtractError::Malformed(format!("title selector: {e}")))?;

        let title = document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        Ok(PageRecord {
            url: url.to_string(),
            title,
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            final_url: "https://example.com/".to_string(),
            status: 200,
            content_type: Some("text/html".to_string()),
            body: body.to_string(),
        }
    }

    #[test]
    fn extracts_title_text() {
        let record = TitleExtractor
            .extract(
                "https://example.com/",
                &page("<html><head><title>Example Domain</title></head></html>"),
            )
            .unwrap();
        assert_eq!(record.title, "Example Domain");
        assert_eq!(record.url, "https://example.com/");
    }

    #[test]
    fn missing_title_falls_back() {
        let record = TitleExtractor
            .extract("https://example.com/", &page("<html><body>hi</body></html>"))
            .unwrap();
        assert_eq!(record.title, "No Title");
    }

    #[test]
    fn empty_title_falls_back() {
        let record = TitleExtractor
            .extract("https://example.com/", &page("<title>   </title>"))
            .unwrap();
        assert_eq!(record.title, "No Title");
    }

    #[test]
    fn title_whitespace_is_trimmed() {
        let record = TitleExtractor
            .extract("https://example.com/", &page("<title>\n  Spaced Out \n</title>"))
            .unwrap();
        assert_eq!(record.title, "Spaced Out");
    }

    #[test]
    fn first_title_wins() {
        let record = TitleExtractor
            .extract(
                "https://example.com/",
                &page("<title>First</title><title>Second</title>"),
            )
            .unwrap();
        assert_eq!(record.title, "First");
    }

    #[test]
    fn tolerates_malformed_markup() {
        // html5ever error-corrects rather than failing; extraction should too
        let record = TitleExtractor
            .extract(
                "https://example.com/",
                &page("<title>Broken</title><div><span></div>"),
            )
            .unwrap();
        assert_eq!(record.title, "Broken");
    }

    #[test]
    fn record_serializes_round_trip() {
        let record = PageRecord {
            url: "https://example.com/".to_string(),
            title: "Example".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: PageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
