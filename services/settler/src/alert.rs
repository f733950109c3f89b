use serde_json::json;
use tracing::{error, warn};

use crate::config::Config;

/// Posts an operational alert to the configured webhook. When no webhook is
/// configured the alert goes to stderr through the error log instead; alerts
/// must never take a job down, so delivery failures are only warned about.
pub async fn report(
    client: &reqwest::Client,
    config: &Config,
    title: &str,
    message: &str,
    source: &str,
    exception: &str,
) {
    error!(title, source, exception, "{message}");
    let Some(url) = &config.alert_webhook_url else {
        return;
    };
    let payload = json!({
        "title": title,
        "message": message,
        "source": source,
        "exception": exception,
    });
    if let Err(delivery_error) = client.post(url).json(&payload).send().await {
        warn!(%delivery_error, "alert webhook unreachable");
    }
}

/// Optional notification after a successful payout. Fire-and-forget.
pub async fn notify_win(
    client: &reqwest::Client,
    config: &Config,
    bet_id: i64,
    user_id: &str,
    payout: rust_decimal::Decimal,
) {
    let Some(url) = &config.notify_webhook_url else {
        return;
    };
    let payload = json!({
        "event": "bet_won",
        "bet_id": bet_id,
        "user_id": user_id,
        "payout": payout,
    });
    if let Err(delivery_error) = client.post(url).json(&payload).send().await {
        warn!(bet_id, %delivery_error, "win notification failed");
    }
}
