use anyhow::anyhow;
use async_trait::async_trait;
use tally_common::{Result, TallyError};
use tally_http::{HttpClient, RequestOpts};
use url::Url;

use crate::document::Document;

/// Parse `raw` and accept it only as an absolute `http`/`https` URL with a
/// host.
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| TallyError::InvalidUrl(format!("{trimmed} ({e})")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TallyError::InvalidUrl(format!(
            "{trimmed} (unsupported scheme `{}`)",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(TallyError::InvalidUrl(format!("{trimmed} (missing host)")));
    }
    Ok(url)
}

pub fn is_valid_url(raw: &str) -> bool {
    validate_url(raw).is_ok()
}

/// Retrieves raw page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// [`PageFetcher`] backed by [`HttpClient`].
#[derive(Clone)]
pub struct HttpFetcher {
    client: HttpClient,
}

impl HttpFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let body = self
            .client
            .get_text(url, RequestOpts::default())
            .await
            .map_err(|e| TallyError::Fetch(anyhow!(e).context(format!("GET {url}"))))?;
        tracing::info!(url = %url, bytes = body.len(), "fetch.complete");
        Ok(body)
    }
}

/// Validate `raw_url`, fetch it and wrap the markup in a [`Document`].
///
/// Validation happens first, so an invalid URL never reaches the fetcher.
pub async fn fetch_document(
    fetcher: &dyn PageFetcher,
    raw_url: &str,
    count_head: bool,
) -> Result<Document> {
    let url = validate_url(raw_url)?;
    let markup = fetcher.fetch(&url).await?;
    Ok(Document::from_markup(markup, count_head))
}
