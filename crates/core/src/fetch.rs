//! Page fetching from URLs, files, and stdin.
//!
//! This module retrieves raw HTML, reduces it to visible text, and wraps the
//! result in a [`RawDocument`] that the rest of the pipeline consumes once.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Node};
use serde::Serialize;
use url::Url;

use crate::{ChartwiseError, Result};

/// Elements whose text never reaches the page reader.
const HIDDEN_TEXT_PARENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/119.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Scraped page text, consumed once per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawDocument {
    /// Where the text came from (URL, file path, or `-` for stdin).
    pub url: String,
    /// Visible text of the page.
    pub text: String,
    /// Screenshot of the rendered page, when one was captured.
    pub screenshot: Option<PathBuf>,
}

impl RawDocument {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self { url: url.into(), text: text.into(), screenshot: None }
    }

    /// Builds a document from an HTML string, keeping only its visible text.
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        Self::new(url, html_to_text(html))
    }

    /// Returns at most `limit` characters of the text.
    pub fn excerpt(&self, limit: usize) -> &str {
        char_prefix(&self.text, limit)
    }
}

/// The first `limit` characters of `text`, cut on a char boundary.
pub(crate) fn char_prefix(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Fetches HTML content from a URL.
///
/// This function performs an HTTP GET request and returns the response body as text.
/// It follows redirects, respects the configured timeout, and sends a browser
/// User-Agent since many sites refuse obvious bots.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| ChartwiseError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(ChartwiseError::InvalidUrl(format!(
            "unsupported scheme '{}' (expected http or https)",
            parsed_url.scheme()
        )));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(ChartwiseError::HttpError)?;

    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() { ChartwiseError::Timeout { timeout: config.timeout } } else { ChartwiseError::HttpError(e) }
        })?;

    let content = response.text().await?;

    Ok(content)
}

/// Fetches a URL and reduces the page to its visible text.
pub async fn fetch_document(url: &str, config: &FetchConfig) -> Result<RawDocument> {
    let html = fetch_url(url, config).await?;
    tracing::debug!(url, bytes = html.len(), "fetched page");
    Ok(RawDocument::from_html(url, &html))
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(ChartwiseError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(ChartwiseError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(ChartwiseError::from)?;

    Ok(buffer)
}

/// Extracts the visible text of an HTML document, one text run per line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .is_some_and(|name| HIDDEN_TEXT_PARENTS.contains(&name));
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}
