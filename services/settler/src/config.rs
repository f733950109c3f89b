use std::env;
use std::time::Duration;

use crate::error::SettleError;

/// Process configuration, read from the environment once at job start. Jobs
/// never consult the environment afterwards.
#[derive(Clone, Debug)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    /// Key for the paid rendering service. Absent means the paid fallback is
    /// disabled and only the free sources are walked.
    pub scraperapi_key: Option<String>,
    pub alert_webhook_url: Option<String>,
    pub notify_webhook_url: Option<String>,
    /// Wall-clock budget granted by the external scheduler to one job.
    pub job_budget: Duration,
}

impl Config {
    pub fn from_env() -> Result<Config, SettleError> {
        let supabase_url = require("SUPABASE_URL")?;
        let supabase_key = require("SUPABASE_SERVICE_KEY")?;
        let job_budget = env::var("JOB_BUDGET_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(600));

        Ok(Config {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_key,
            scraperapi_key: optional("SCRAPERAPI_KEY"),
            alert_webhook_url: optional("SCRAPER_ALERT_WEBHOOK_URL"),
            notify_webhook_url: optional("BET_NOTIFY_WEBHOOK_URL"),
            job_budget,
        })
    }
}

fn require(key: &'static str) -> Result<String, SettleError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(SettleError::MissingConfig(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
