use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

const SEARCH_URL: &str =
    "http://ggzy.jgswj.gxzf.gov.cn/inteligentsearchgxes/rest/esinteligentsearch/getFullTextDataNew";
const SITE_BASE: &str = "http://ggzy.jgswj.gxzf.gov.cn/gxggzy";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Runtime settings. Every key can be overridden with a `GGZY_` env var,
/// e.g. `GGZY_PAGE_SIZE=200`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub search_url: String,
    pub site_base: String,
    pub db_path: String,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub request_delay_ms: u64,
    pub max_retries: u32,
    pub user_agent: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_env(Environment::with_prefix("GGZY").try_parsing(true))
    }

    fn from_env(env: Environment) -> Result<Self> {
        Config::builder()
            .set_default("search_url", SEARCH_URL)?
            .set_default("site_base", SITE_BASE)?
            .set_default("db_path", "data/ggzy.sqlite")?
            .set_default("page_size", 5000)?
            .set_default("request_timeout_secs", 30)?
            .set_default("request_delay_ms", 200)?
            .set_default("max_retries", 3)?
            .set_default("user_agent", USER_AGENT)?
            .add_source(env)
            .build()?
            .try_deserialize()
            .context("Invalid GGZY_* settings")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
