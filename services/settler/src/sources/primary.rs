use async_trait::async_trait;
use banca_protocol::drawing::House;
use chrono::NaiveDate;

use super::{get_with_retry, Fetched, SourceAdapter};

/// Direct fetch against the primary public results site, one page per house
/// per day.
pub struct PrimarySource {
    client: reqwest::Client,
}

impl PrimarySource {
    pub fn new(client: reqwest::Client) -> Self {
        PrimarySource { client }
    }

    pub fn url(house: House, date: NaiveDate) -> String {
        format!(
            "https://www.resultadofacil.com.br/resultado-do-jogo-do-bicho/{}/do-dia/{}",
            slug(house),
            date.format("%Y-%m-%d")
        )
    }
}

fn slug(house: House) -> &'static str {
    match house {
        House::RioFederal => "rio-de-janeiro",
        House::Bahia => "bahia",
        House::Lotece => "lotece-ceara",
        House::Lotep => "lotep-paraiba",
        House::SaoPaulo => "sao-paulo",
        House::Goias => "look-goias",
        House::Minas => "alvorada-minas",
        House::Brasilia => "lbr-brasilia",
        House::Natal => "natal-rn",
        House::Aracaju => "aracaju-se",
        House::Recife => "recife-pe",
        House::Vitoria => "vitoria-es",
        House::Parana => "parana",
        House::Nacional => "nacional",
        House::Caixa => "loterias-caixa",
    }
}

#[async_trait]
impl SourceAdapter for PrimarySource {
    fn name(&self) -> &'static str {
        "primary"
    }

    async fn fetch(&self, house: House, date: NaiveDate) -> Fetched {
        get_with_retry(&self.client, &Self::url(house, date)).await
    }
}
