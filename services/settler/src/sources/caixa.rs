use async_trait::async_trait;
use banca_protocol::drawing::{House, Lottery};
use chrono::NaiveDate;

use super::{get_with_retry, Fetched, FetchOutcome, SourceAdapter};

/// Official CAIXA results API. Returns JSON with an explicit `listaDezenas`
/// field; one endpoint per game, always the latest draw.
pub struct CaixaApiSource {
    client: reqwest::Client,
    lottery: Lottery,
}

impl CaixaApiSource {
    pub fn new(client: reqwest::Client, lottery: Lottery) -> Self {
        CaixaApiSource { client, lottery }
    }

    pub fn lottery(&self) -> Lottery {
        self.lottery
    }

    fn url(&self) -> Option<&'static str> {
        match self.lottery {
            Lottery::LotoFacil => {
                Some("https://servicebus2.caixa.gov.br/portaldeloterias/api/lotofacil")
            }
            Lottery::Quina => Some("https://servicebus2.caixa.gov.br/portaldeloterias/api/quina"),
            Lottery::MegaSena => {
                Some("https://servicebus2.caixa.gov.br/portaldeloterias/api/megasena")
            }
            _ => None,
        }
    }
}

#[async_trait]
impl SourceAdapter for CaixaApiSource {
    fn name(&self) -> &'static str {
        "caixa_api"
    }

    async fn fetch(&self, _house: House, _date: NaiveDate) -> Fetched {
        match self.url() {
            Some(url) => get_with_retry(&self.client, url).await,
            None => Fetched::Unavailable(FetchOutcome::Error),
        }
    }
}
