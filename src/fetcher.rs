use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, PageRow, PendingPage};
use crate::error::SourceError;
use crate::settings::Settings;

const BASE_BACKOFF_MS: u64 = 2000;
const MAX_BACKOFF_MS: u64 = 60_000;

/// Retrieves the raw markup behind a detail URL.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<String, SourceError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(HttpFetcher { client: build_client(settings)? })
    }
}

pub fn build_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .user_agent(&settings.user_agent)
        .build()
        .context("Failed to create HTTP client")
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let request_err = |source| SourceError::Request { url: url.to_string(), source };
        let response = self.client.get(url).send().await.map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { url: url.to_string(), status });
        }
        response.text().await.map_err(request_err)
    }
}

/// Scrape stats returned after completion.
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch pages one at a time in listing order, saving each outcome as it
/// arrives. A failed page is recorded and skipped; the batch carries on.
pub async fn scrape_pages<F: Fetch>(
    conn: &Connection,
    fetcher: &F,
    pages: Vec<PendingPage>,
    settings: &Settings,
) -> Result<ScrapeStats> {
    let total = pages.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut ok = 0usize;
    let mut errors = 0usize;

    for (i, page) in pages.into_iter().enumerate() {
        if i > 0 && !settings.request_delay().is_zero() {
            tokio::time::sleep(settings.request_delay()).await;
        }

        let start = Instant::now();
        let result = fetch_with_retry(fetcher, &page.announcement.url, settings.max_retries).await;
        let latency_ms = Some(start.elapsed().as_millis() as i64);

        let row = match result {
            Ok(html) => {
                ok += 1;
                PageRow { announcement_id: page.id, html: Some(html), error: None, latency_ms }
            }
            Err(e) => {
                errors += 1;
                warn!("Skipping {} ({}): {}", page.announcement.info_id, page.announcement.title, e);
                PageRow {
                    announcement_id: page.id,
                    html: None,
                    error: Some(e.to_string()),
                    latency_ms,
                }
            }
        };
        db::save_page(conn, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraped {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(ScrapeStats { total, ok, errors })
}

async fn fetch_with_retry<F: Fetch>(
    fetcher: &F,
    url: &str,
    max_retries: u32,
) -> Result<String, SourceError> {
    let mut attempt = 0;
    loop {
        match fetcher.fetch(url).await {
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let backoff = backoff_delay(attempt);
                attempt += 1;
                warn!(
                    "{} (attempt {}/{}), backing off {:.1}s",
                    e,
                    attempt,
                    max_retries,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
            }
            result => return result,
        }
    }
}

/// Doubles from the base on every attempt, capped at a minute.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}
