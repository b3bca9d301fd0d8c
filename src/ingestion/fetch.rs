//! URL fetching: bounded-timeout HTTP GET with retry, normalized into a
//! single cleaned text document.

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::config::Settings;
use crate::error::RagError;
use crate::ingestion::retry::{RetryPolicy, retry_with_backoff};
use crate::types::{Document, Origin};

/// Fetches web pages and normalizes them into [`Document`]s.
#[derive(Clone, Debug)]
pub struct UrlFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl UrlFetcher {
    /// Builds a fetcher with the configured timeout, identifying user agent
    /// and retry schedule.
    pub fn new(settings: &Settings) -> Result<Self, RagError> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.fetch_timeout)
            .use_rustls_tls()
            .build()?;
        Ok(Self {
            client,
            policy: settings.retry,
        })
    }

    /// Wraps an existing client; used by tests to point at a mock server
    /// with a fast retry schedule.
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Fetches `url` and returns exactly one cleaned document, or an empty
    /// list when the page has no text content. Transient failures are
    /// retried per the policy before surfacing [`RagError::Fetch`].
    pub async fn fetch_url(&self, url: &Url) -> Result<Vec<Document>, RagError> {
        let body = retry_with_backoff(self.policy, |attempt| {
            let client = self.client.clone();
            let url = url.clone();
            async move {
                debug!(%url, attempt, "fetching url");
                let response = client.get(url).send().await?.error_for_status()?;
                response.text().await
            }
        })
        .await
        .map_err(|(err, attempts)| RagError::Fetch {
            url: url.to_string(),
            attempts,
            reason: err.to_string(),
        })?;

        let cleaned = extract_text(&body);
        if cleaned.is_empty() {
            warn!(%url, "no content retrieved");
            return Ok(Vec::new());
        }

        let document = Document::new(cleaned, Origin::Url, url.as_str())
            .with_metadata("source", url.as_str());
        Ok(vec![document])
    }
}

/// Flattens an HTML page into trimmed, space-joined text. Prefers the
/// `<body>` element and falls back to the whole tree for fragments.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let fragments: Vec<String> = match Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
    {
        Some(body) => collect_text(body.text()),
        None => collect_text(document.root_element().text()),
    };
    fragments.join(" ")
}

fn collect_text<'a>(texts: impl Iterator<Item = &'a str>) -> Vec<String> {
    texts
        .filter_map(|text| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_trims_and_space_joins() {
        let html = r#"<html><body>
            <h1>Title</h1>
            <p>First   paragraph.</p>
            <p>Second paragraph.</p>
        </body></html>"#;
        assert_eq!(
            extract_text(html),
            "Title First   paragraph. Second paragraph."
        );
    }

    #[test]
    fn extract_text_of_empty_page_is_empty() {
        assert_eq!(extract_text("<html><body>  </body></html>"), "");
    }
}
