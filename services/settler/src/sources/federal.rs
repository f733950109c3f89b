use async_trait::async_trait;
use banca_protocol::drawing::House;
use chrono::NaiveDate;

use super::{get_with_retry, Fetched, FetchOutcome, SourceAdapter};

const FEDERAL_URL: &str = "https://www.resultadofacil.com.br/resultados-loteria-federal";
const FEDERAL_FALLBACK_URL: &str = "https://www.ojogodobicho.com/loteria-federal.html";

/// The federal draw listing: a single page carrying many dates, filtered to
/// the target date by the parser. Has its own fallback URL.
pub struct FederalListingSource {
    client: reqwest::Client,
}

impl FederalListingSource {
    pub fn new(client: reqwest::Client) -> Self {
        FederalListingSource { client }
    }
}

#[async_trait]
impl SourceAdapter for FederalListingSource {
    fn name(&self) -> &'static str {
        "federal_listing"
    }

    async fn fetch(&self, _house: House, _date: NaiveDate) -> Fetched {
        match get_with_retry(&self.client, FEDERAL_URL).await {
            Fetched::Body(body) => Fetched::Body(body),
            Fetched::Unavailable(FetchOutcome::RateLimited) => {
                Fetched::Unavailable(FetchOutcome::RateLimited)
            }
            Fetched::Unavailable(_) => get_with_retry(&self.client, FEDERAL_FALLBACK_URL).await,
        }
    }
}
