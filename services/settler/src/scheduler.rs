use std::time::Duration;

use banca_protocol::drawing::{House, Lottery};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
use tracing::{debug, info, warn};

use crate::alert;
use crate::config::Config;
use crate::error::SettleError;
use crate::parser;
use crate::settlement::{settle_date, RunSummary};
use crate::sources::{self, Attempt, CaixaApiSource, Fetched, FetchOutcome, SourceAdapter};
use crate::state::{Deadline, DrawingBoard};
use crate::store::Store;

/// Pause between houses so the free sources never see a request burst.
const INTER_HOUSE_DELAY: Duration = Duration::from_secs(2);

/// All date and hour reasoning runs on São Paulo local time. The target
/// period has no DST, so a fixed offset is exact.
pub fn brasilia_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

pub fn now_brasilia() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&brasilia_offset())
}

/// The scrape-and-settle trigger fires every half hour at 01:00 and from
/// 07:00 through 23:30.
pub fn within_scrape_window(now: DateTime<FixedOffset>) -> bool {
    let hour = now.hour();
    hour == 1 || (7..=23).contains(&hour)
}

/// How many drawings a house publishes on a normal day. Once today's count
/// reaches this the house is done and its sources are not hit again.
pub fn expected_drawings(house: House) -> usize {
    match house {
        House::RioFederal => 6,
        House::Bahia => 5,
        House::Lotece => 4,
        House::Lotep => 5,
        House::SaoPaulo => 8,
        House::Goias => 8,
        House::Minas => 3,
        House::Brasilia => 5,
        House::Natal => 6,
        House::Aracaju => 4,
        House::Recife => 4,
        House::Vitoria => 4,
        House::Parana => 4,
        House::Nacional => 5,
        House::Caixa => 3,
    }
}

/// Outcome of one house's source walk.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub stored: usize,
    pub attempts: Vec<Attempt>,
    pub paid_credits: u32,
}

/// Walks the house's source plan until one source yields a parseable page,
/// upserting every drawing it produced. Sources that fetched but parsed to
/// nothing count as `empty` in the attempt trail.
pub async fn scrape_house(
    client: &reqwest::Client,
    config: &Config,
    store: &dyn Store,
    house: House,
    date: NaiveDate,
) -> ScrapeReport {
    let mut report = ScrapeReport::default();
    for adapter in sources::plan_for(house, client, config) {
        if adapter.is_paid() {
            report.paid_credits += 1;
        }
        match adapter.fetch(house, date).await {
            Fetched::Body(body) => {
                let drawings = parser::parse_source(adapter.name(), house, date, &body);
                if drawings.is_empty() {
                    report.attempts.push(Attempt {
                        source: adapter.name(),
                        outcome: FetchOutcome::Empty,
                    });
                    continue;
                }
                report.attempts.push(Attempt {
                    source: adapter.name(),
                    outcome: FetchOutcome::Ok,
                });
                for drawing in &drawings {
                    match store.upsert_drawing(drawing).await {
                        Ok(()) => report.stored += 1,
                        Err(error) => {
                            warn!(house = %house, time = %drawing.time, %error, "upsert failed");
                        }
                    }
                }
                return report;
            }
            Fetched::Unavailable(outcome) => {
                report.attempts.push(Attempt {
                    source: adapter.name(),
                    outcome,
                });
            }
        }
    }
    report
}

/// CAIXA is not a fallback walk: each game has its own endpoint and all
/// three are fetched, concurrently since they never rate-limit each other.
pub async fn scrape_caixa(
    client: &reqwest::Client,
    store: &dyn Store,
    date: NaiveDate,
) -> ScrapeReport {
    let mut report = ScrapeReport::default();
    let adapters: Vec<CaixaApiSource> = [Lottery::LotoFacil, Lottery::Quina, Lottery::MegaSena]
        .into_iter()
        .map(|lottery| CaixaApiSource::new(client.clone(), lottery))
        .collect();
    let fetches =
        futures::future::join_all(adapters.iter().map(|adapter| adapter.fetch(House::Caixa, date)))
            .await;
    for (adapter, fetched) in adapters.iter().zip(fetches) {
        match fetched {
            Fetched::Body(body) => {
                let drawings = parser::parse_source(adapter.name(), House::Caixa, date, &body);
                let outcome = if drawings.is_empty() {
                    FetchOutcome::Empty
                } else {
                    FetchOutcome::Ok
                };
                report.attempts.push(Attempt {
                    source: adapter.name(),
                    outcome,
                });
                for drawing in &drawings {
                    match store.upsert_drawing(drawing).await {
                        Ok(()) => report.stored += 1,
                        Err(error) => {
                            warn!(lottery = %adapter.lottery(), %error, "CAIXA upsert failed");
                        }
                    }
                }
            }
            Fetched::Unavailable(outcome) => {
                report.attempts.push(Attempt {
                    source: adapter.name(),
                    outcome,
                });
            }
        }
    }
    report
}

/// The main half-hourly job: scrape every incomplete house for today, then
/// settle today's and yesterday's pending bets.
pub async fn run_scrape_and_settle(
    store: &dyn Store,
    config: &Config,
    now: DateTime<FixedOffset>,
) -> Result<(), SettleError> {
    let deadline = Deadline::new(config.job_budget);
    let client = sources::http_client();
    let today = now.date_naive();

    if within_scrape_window(now) {
        scrape_all(&client, config, store, today, &deadline).await;
    } else {
        info!(hour = now.hour(), "outside the scrape window, settling only");
    }

    let yesterday = today.pred_opt().unwrap_or(today);
    for date in [today, yesterday] {
        match settle_date(store, config, date, now, &deadline).await {
            Ok(summary) => log_summary(date, &summary),
            Err(error) => {
                alert::report(
                    &client,
                    config,
                    "settlement_aborted",
                    &format!("settlement for {date} aborted before any terminal transition"),
                    "scrape_and_settle",
                    &error.to_string(),
                )
                .await;
            }
        }
    }
    Ok(())
}

async fn scrape_all(
    client: &reqwest::Client,
    config: &Config,
    store: &dyn Store,
    today: NaiveDate,
    deadline: &Deadline,
) {
    // Baseline for the skip planner: what already landed today.
    let board = match store.list_drawings(today).await {
        Ok(drawings) => DrawingBoard::load(drawings),
        Err(error) => {
            warn!(%error, "could not load today's drawings, scraping everything");
            DrawingBoard::default()
        }
    };

    let mut total_credits = 0u32;
    let mut first = true;
    for house in House::all() {
        if deadline.soft_expired() {
            warn!("budget nearly burned, stopping the scrape walk");
            break;
        }
        let done = board.house_count(*house) >= expected_drawings(*house);
        if done {
            debug!(house = %house, "house complete for today, skipping");
            continue;
        }
        if !first {
            tokio::time::sleep(INTER_HOUSE_DELAY).await;
        }
        first = false;

        let report = if *house == House::Caixa {
            scrape_caixa(client, store, today).await
        } else {
            scrape_house(client, config, store, *house, today).await
        };
        total_credits += report.paid_credits;
        let trail: Vec<String> = report
            .attempts
            .iter()
            .map(|attempt| format!("{}={}", attempt.source, attempt.outcome.as_str()))
            .collect();
        info!(
            house = %house,
            stored = report.stored,
            attempts = trail.join(","),
            "house scraped"
        );
    }
    if total_credits > 0 {
        info!(total_credits, "paid fetch credits spent this run");
    }
}

/// Settle-only job for one date.
pub async fn run_settle(
    store: &dyn Store,
    config: &Config,
    date: NaiveDate,
    now: DateTime<FixedOffset>,
) -> Result<RunSummary, SettleError> {
    let deadline = Deadline::new(config.job_budget);
    match settle_date(store, config, date, now, &deadline).await {
        Ok(summary) => {
            log_summary(date, &summary);
            Ok(summary)
        }
        Err(error) => {
            alert::report(
                &sources::http_client(),
                config,
                "settlement_aborted",
                &format!("settlement for {date} aborted before any terminal transition"),
                "settle",
                &error.to_string(),
            )
            .await;
            Err(error)
        }
    }
}

/// Scrape-only job, one house or all of them.
pub async fn run_scrape(
    store: &dyn Store,
    config: &Config,
    house: Option<House>,
    date: NaiveDate,
) -> Result<(), SettleError> {
    let deadline = Deadline::new(config.job_budget);
    let client = sources::http_client();
    match house {
        Some(House::Caixa) => {
            let report = scrape_caixa(&client, store, date).await;
            info!(stored = report.stored, "CAIXA scraped");
        }
        Some(house) => {
            let report = scrape_house(&client, config, store, house, date).await;
            info!(house = %house, stored = report.stored, "house scraped");
        }
        None => scrape_all(&client, config, store, date, &deadline).await,
    }
    Ok(())
}

pub fn parse_house(raw: &str) -> Option<House> {
    let wanted = raw.trim().to_uppercase().replace(['-', '_', ' ', '/'], "");
    House::all()
        .iter()
        .find(|house| house.as_str().replace(['/', '-'], "") == wanted)
        .copied()
}

fn log_summary(date: NaiveDate, summary: &RunSummary) {
    info!(
        %date,
        evaluated = summary.evaluated,
        won = summary.won,
        lost = summary.lost,
        refunded = summary.refunded,
        pending = summary.pending,
        errors = summary.errors,
        weekday = ?date.weekday(),
        "settlement summary"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_hour(hour: u32) -> DateTime<FixedOffset> {
        brasilia_offset()
            .with_ymd_and_hms(2026, 1, 15, hour, 15, 0)
            .unwrap()
    }

    #[test]
    fn scrape_window_covers_the_published_hours() {
        assert!(within_scrape_window(at_hour(1)));
        assert!(within_scrape_window(at_hour(7)));
        assert!(within_scrape_window(at_hour(23)));
        assert!(!within_scrape_window(at_hour(2)));
        assert!(!within_scrape_window(at_hour(6)));
        assert!(!within_scrape_window(at_hour(0)));
    }

    #[test]
    fn houses_parse_from_cli_spellings() {
        assert_eq!(parse_house("bahia"), Some(House::Bahia));
        assert_eq!(parse_house("rio/federal"), Some(House::RioFederal));
        assert_eq!(parse_house("sao-paulo"), Some(House::SaoPaulo));
        assert_eq!(parse_house("marte"), None);
    }
}
