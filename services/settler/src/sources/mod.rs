use std::time::Duration;

use async_trait::async_trait;
use banca_protocol::drawing::House;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::Config;

pub mod caixa;
pub mod federal;
pub mod paid;
pub mod primary;
pub mod secondary;

pub use caixa::CaixaApiSource;
pub use federal::FederalListingSource;
pub use paid::PaidRenderSource;
pub use primary::PrimarySource;
pub use secondary::SecondarySource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(8);

/// What one adapter call produced, recorded in the attempt trail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok,
    Empty,
    RateLimited,
    Error,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::Empty => "empty",
            FetchOutcome::RateLimited => "rate_limited",
            FetchOutcome::Error => "error",
        }
    }
}

/// Diagnostic trace of one source call; the scrape orchestrator keeps these
/// to account for paid-credit spend and to log why a house came back empty.
#[derive(Clone, Debug)]
pub struct Attempt {
    pub source: &'static str,
    pub outcome: FetchOutcome,
}

/// Body of a successful fetch, or the reason there is none.
pub enum Fetched {
    Body(String),
    Unavailable(FetchOutcome),
}

/// One way of obtaining the raw results page for a `(house, date)`. Adapters
/// are stateless, share the process HTTP client, and never parse semantics.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Paid adapters burn one credit per call and must sit last in the plan.
    fn is_paid(&self) -> bool {
        false
    }

    async fn fetch(&self, house: House, date: NaiveDate) -> Fetched;
}

/// The shared HTTP client: one per process, 30 s per request.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent("Mozilla/5.0 (X11; Linux x86_64) banca-settler/0.2")
        .build()
        .expect("reqwest client")
}

/// GET with bounded retries. Transient failures and HTTP 429 back off
/// exponentially (1 s, 2 s, 4 s, capped at 8 s); anything else gives up.
pub async fn get_with_retry(client: &reqwest::Client, url: &str) -> Fetched {
    let mut rate_limited = false;
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let backoff = BACKOFF_BASE * 2u32.saturating_pow(attempt - 1);
            tokio::time::sleep(backoff.min(BACKOFF_CAP)).await;
        }
        match client.get(url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                rate_limited = true;
                debug!(url, attempt, "rate limited, backing off");
            }
            Ok(response) if response.status().is_success() => {
                return match response.text().await {
                    Ok(body) if body.trim().is_empty() => Fetched::Unavailable(FetchOutcome::Empty),
                    Ok(body) => Fetched::Body(body),
                    Err(error) => {
                        warn!(url, %error, "failed reading response body");
                        Fetched::Unavailable(FetchOutcome::Error)
                    }
                };
            }
            Ok(response) => {
                debug!(url, status = %response.status(), "non-success response");
                return Fetched::Unavailable(FetchOutcome::Error);
            }
            Err(error) if error.is_timeout() || error.is_connect() => {
                debug!(url, attempt, %error, "transient fetch failure");
            }
            Err(error) => {
                warn!(url, %error, "fetch failed");
                return Fetched::Unavailable(FetchOutcome::Error);
            }
        }
    }
    Fetched::Unavailable(if rate_limited {
        FetchOutcome::RateLimited
    } else {
        FetchOutcome::Error
    })
}

/// The ordered fallback plan for one house: primary free site, secondary free
/// site, then the paid renderer when a key is configured.
pub fn plan_for(house: House, client: &reqwest::Client, config: &Config) -> Vec<Box<dyn SourceAdapter>> {
    if house == House::RioFederal {
        // The federal listing has its own dedicated pages before the shared
        // sites are tried.
        let mut plan: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(FederalListingSource::new(client.clone())),
            Box::new(PrimarySource::new(client.clone())),
            Box::new(SecondarySource::new(client.clone())),
        ];
        push_paid(&mut plan, client, config);
        return plan;
    }
    let mut plan: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(PrimarySource::new(client.clone())),
        Box::new(SecondarySource::new(client.clone())),
    ];
    push_paid(&mut plan, client, config);
    plan
}

fn push_paid(plan: &mut Vec<Box<dyn SourceAdapter>>, client: &reqwest::Client, config: &Config) {
    if let Some(key) = &config.scraperapi_key {
        plan.push(Box::new(PaidRenderSource::new(client.clone(), key.clone())));
    }
}
