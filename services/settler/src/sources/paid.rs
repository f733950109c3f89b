use async_trait::async_trait;
use banca_protocol::drawing::House;
use chrono::NaiveDate;

use super::{get_with_retry, primary::PrimarySource, Fetched, SourceAdapter};

/// Paid rendering service. Requests an HTML rendering of the primary URL
/// through the provider's proxy; every call burns one credit, so this adapter
/// only ever runs after both free sources came back empty.
pub struct PaidRenderSource {
    client: reqwest::Client,
    api_key: String,
}

impl PaidRenderSource {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        PaidRenderSource { client, api_key }
    }

    fn url(&self, house: House, date: NaiveDate) -> String {
        let target = PrimarySource::url(house, date);
        format!(
            "https://api.scraperapi.com/?api_key={}&render=true&url={}",
            self.api_key,
            urlencode(&target)
        )
    }
}

fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() * 3);
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[async_trait]
impl SourceAdapter for PaidRenderSource {
    fn name(&self) -> &'static str {
        "paid_render"
    }

    fn is_paid(&self) -> bool {
        true
    }

    async fn fetch(&self, house: House, date: NaiveDate) -> Fetched {
        get_with_retry(&self.client, &self.url(house, date)).await
    }
}
