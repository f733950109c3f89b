use banca_protocol::drawing::{Drawing, House, Lottery, Prize};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::debug;

/// Shape of the CAIXA results API that matters here. The endpoint always
/// returns the latest draw of its game.
#[derive(Deserialize)]
struct CaixaResponse {
    #[serde(rename = "tipoJogo", default)]
    tipo_jogo: String,
    #[serde(rename = "dataApuracao", default)]
    data_apuracao: String,
    #[serde(rename = "listaDezenas", default)]
    lista_dezenas: Vec<String>,
}

/// Parses the CAIXA API body into the single-prize CSV drawing the evaluator
/// consumes, provided the draw happened on the target date.
pub fn parse(date: NaiveDate, raw: &str) -> Option<Drawing> {
    let response: CaixaResponse = match serde_json::from_str(raw) {
        Ok(response) => response,
        Err(error) => {
            debug!(%error, "unparseable CAIXA body");
            return None;
        }
    };
    if response.lista_dezenas.is_empty() {
        return None;
    }
    let drawn_on = NaiveDate::parse_from_str(&response.data_apuracao, "%d/%m/%Y").ok()?;
    if drawn_on != date {
        debug!(%drawn_on, target = %date, "CAIXA draw is for another day");
        return None;
    }
    let lottery = match response.tipo_jogo.to_uppercase().as_str() {
        "LOTOFACIL" | "LOTO_FACIL" => Lottery::LotoFacil,
        "QUINA" => Lottery::Quina,
        "MEGA_SENA" | "MEGASENA" => Lottery::MegaSena,
        other => {
            debug!(game = other, "unexpected CAIXA game");
            return None;
        }
    };
    Some(Drawing {
        date,
        time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        house: House::Caixa,
        lottery,
        prizes: vec![Prize::new(response.lista_dezenas.join(","))],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_the_api_body_to_a_csv_drawing() {
        let body = r#"{
            "tipoJogo": "LOTOFACIL",
            "dataApuracao": "15/01/2026",
            "listaDezenas": ["02","05","06","08","09","11","14","16","17","18","19","20","22","23","25"]
        }"#;
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let drawing = parse(date, body).unwrap();
        assert_eq!(drawing.lottery, Lottery::LotoFacil);
        assert_eq!(drawing.house, House::Caixa);
        assert_eq!(drawing.prizes.len(), 1);
        assert_eq!(drawing.dezenas().len(), 15);
    }

    #[test]
    fn stale_draws_are_ignored() {
        let body = r#"{
            "tipoJogo": "QUINA",
            "dataApuracao": "14/01/2026",
            "listaDezenas": ["01","02","03","04","05"]
        }"#;
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert!(parse(date, body).is_none());
    }
}
