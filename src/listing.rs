use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::category::Category;
use crate::error::SourceError;
use crate::settings::Settings;

static AWARD_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"中标(结果)?公[示告]$").unwrap());

/// One listing entry, resolved to an absolute detail URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub info_id: String,
    pub project_type: String,
    pub region: String,
    pub title: String,
    pub info_date: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    totalcount: u64,
    #[serde(default)]
    records: Vec<SearchRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchRecord {
    infodatepx: String,
    infoid: String,
    areaname: String,
    title: String,
    linkurl: String,
}

/// Titles of actual award notices; failed tenders and other bulletins don't match.
pub fn is_award_notice(title: &str) -> bool {
    AWARD_TITLE_RE.is_match(title.trim())
}

fn search_body(code: &str, page_size: usize) -> Value {
    json!({
        "pn": 0,
        "rn": page_size,
        "fields": "title",
        "cnum": "001",
        "sort": "{\"infodatepx\":\"0\"}",
        "ssort": "title",
        "cl": 200,
        "condition": [{
            "fieldName": "categorynum",
            "equal": code,
            "notEqual": null,
            "equalList": null,
            "notEqualList": null,
            "isLike": true,
            "likeType": 2
        }],
        "isBusiness": "1"
    })
}

/// Query the search API for one category, newest first.
pub async fn fetch_announcements(
    client: &reqwest::Client,
    settings: &Settings,
    category: &Category,
    include_failed: bool,
) -> Result<Vec<Announcement>, SourceError> {
    let url = &settings.search_url;
    info!("Searching category {} ({})", category.code(), category.label());

    let request_err = |source| SourceError::Request { url: url.clone(), source };
    let response = client
        .post(url)
        .json(&search_body(category.code(), settings.page_size))
        .send()
        .await
        .map_err(request_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status { url: url.clone(), status });
    }
    let text = response.text().await.map_err(request_err)?;

    parse_listing(&text, &settings.site_base, category, include_failed)
}

fn parse_listing(
    text: &str,
    site_base: &str,
    category: &Category,
    include_failed: bool,
) -> Result<Vec<Announcement>, SourceError> {
    let body: SearchResponse = serde_json::from_str(text)?;
    let SearchResult { totalcount, records } = body.result;
    info!(
        "Category {} ({}) has {} announcements, got {} this time",
        category.code(),
        category.label(),
        totalcount,
        records.len()
    );

    let announcements: Vec<Announcement> = records
        .into_iter()
        .filter(|r| {
            let keep = include_failed || is_award_notice(&r.title);
            if !keep {
                debug!("Skipping {}", r.title);
            }
            keep
        })
        .map(|r| Announcement {
            info_id: r.infoid,
            project_type: category.label().to_string(),
            region: r.areaname,
            title: r.title,
            info_date: r.infodatepx,
            url: format!("{}{}", site_base, r.linkurl),
        })
        .collect();

    info!("Award notices kept: {}", announcements.len());
    Ok(announcements)
}
