use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tally_common::Result;
use tally_config::{FetchSettings, OutputSettings};
use tally_http::HttpClient;
use tally_web::count::{RankedEntry, TopN, WordCounter};
use tally_web::fetch::{HttpFetcher, PageFetcher, fetch_document};

use crate::sink;

/// Everything one run needs after config and flags are merged.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub url: String,
    pub top: TopN,
    pub count_head: bool,
    pub output: OutputSettings,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub entries: Vec<RankedEntry>,
    /// File the ranking was written to, if file output is enabled.
    pub written: Option<PathBuf>,
}

pub fn build_fetcher(fetch: &FetchSettings) -> anyhow::Result<HttpFetcher> {
    let client = HttpClient::with_connect_timeout(Duration::from_secs(fetch.connect_timeout_secs))
        .context("building HTTP client")?
        .with_timeout(Duration::from_secs(fetch.timeout_secs))
        .with_retries(fetch.retries)
        .with_user_agent(&fetch.user_agent)
        .context("configuring User-Agent")?;
    Ok(HttpFetcher::new(client))
}

/// Validate, fetch, clean, count, rank, then hand the ranking to the sink.
pub async fn run(fetcher: &dyn PageFetcher, settings: &RunSettings) -> Result<RunReport> {
    tracing::info!(url = %settings.url, top = ?settings.top, count_head = settings.count_head, "run.start");

    let doc = fetch_document(fetcher, &settings.url, settings.count_head).await?;
    let counter = WordCounter::from_document(doc)?;
    let entries = counter.top_words(settings.top);

    let written = sink::write_results(&entries, &settings.output)?;
    tracing::info!(
        entries = entries.len(),
        written = ?written,
        "run.complete"
    );
    Ok(RunReport { entries, written })
}
