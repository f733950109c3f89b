use async_trait::async_trait;
use banca_protocol::drawing::House;
use chrono::NaiveDate;

use super::{get_with_retry, Fetched, SourceAdapter};

/// Second public site, tried when the primary page yields nothing. Different
/// host, different slugs, same contract.
pub struct SecondarySource {
    client: reqwest::Client,
}

impl SecondarySource {
    pub fn new(client: reqwest::Client) -> Self {
        SecondarySource { client }
    }

    pub fn url(house: House, date: NaiveDate) -> String {
        format!(
            "https://www.ojogodobicho.com/deu_no_poste/{}/{}.html",
            slug(house),
            date.format("%d-%m-%Y")
        )
    }
}

fn slug(house: House) -> &'static str {
    match house {
        House::RioFederal => "rio",
        House::Bahia => "ba",
        House::Lotece => "ce",
        House::Lotep => "pb",
        House::SaoPaulo => "sp",
        House::Goias => "go",
        House::Minas => "mg",
        House::Brasilia => "df",
        House::Natal => "rn",
        House::Aracaju => "se",
        House::Recife => "pe",
        House::Vitoria => "es",
        House::Parana => "pr",
        House::Nacional => "nacional",
        House::Caixa => "caixa",
    }
}

#[async_trait]
impl SourceAdapter for SecondarySource {
    fn name(&self) -> &'static str {
        "secondary"
    }

    async fn fetch(&self, house: House, date: NaiveDate) -> Fetched {
        get_with_retry(&self.client, &Self::url(house, date)).await
    }
}
