//! Content extraction functionality for the crawler module
//!
//! Parsing and policy are kept apart: this module only reads titles and raw
//! `href` values out of a document. Resolving and validating those values is
//! the normalizer's job.

use crate::crawler::error::CrawlError;
use scraper::{Html, Selector};

/// Title recorded for pages without a usable `<title>`
pub const NO_TITLE: &str = "No Title";

/// Pre-compiled selectors for title and anchor extraction
#[derive(Debug, Clone)]
pub struct PageParser {
    title: Selector,
    anchors: Selector,
}

impl PageParser {
    /// Compile the selectors used for extraction
    pub fn new() -> Result<Self, CrawlError> {
        let title = Selector::parse("title")
            .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse title selector: {}", e)))?;
        let anchors = Selector::parse("a")
            .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse anchor selector: {}", e)))?;

        Ok(Self { title, anchors })
    }

    /// Text of the first `<title>` element, or [`NO_TITLE`] if it is missing or blank
    pub fn title(&self, document: &Html) -> String {
        document
            .select(&self.title)
            .next()
            .map(|element| element.text().collect::<String>())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string())
    }

    /// Raw `href` values of every anchor, in document order
    ///
    /// Anchors with a missing or empty `href` are skipped.
    pub fn links<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = &'a str> + 'a {
        document
            .select(&self.anchors)
            .filter_map(|element| element.value().attr("href"))
            .filter(|href| !href.trim().is_empty())
    }
}

/// Parse `html` and collect its raw links
pub fn extract_links(parser: &PageParser, html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    parser.links(&document).map(str::to_owned).collect()
}

/// Parse `html` and extract its title
pub fn extract_title(parser: &PageParser, html: &str) -> String {
    let document = Html::parse_document(html);
    parser.title(&document)
}
