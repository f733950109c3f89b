use banca_protocol::drawing::{normalize_time, reconcile, Drawing, House};
use chrono::NaiveDate;
use tracing::debug;

pub mod caixa;
pub mod federal;
pub mod html;
pub mod markdown;

/// Parses whatever a source adapter fetched into drawings for the target
/// `(house, date)`. Bespoke sources get bespoke parsers; everything else goes
/// through the progressive HTML strategies with the Markdown fallback.
pub fn parse_source(source: &str, house: House, date: NaiveDate, raw: &str) -> Vec<Drawing> {
    let parsed = match source {
        "federal_listing" => federal::parse(date, raw),
        "caixa_api" => caixa::parse(date, raw).into_iter().collect(),
        _ => parse_page(house, date, raw),
    };
    finish(house, parsed)
}

/// The generic page pipeline: three HTML strategies, first one to yield a
/// drawing wins, then the Markdown fallback for rendered-text bodies.
pub fn parse_page(house: House, date: NaiveDate, raw: &str) -> Vec<Drawing> {
    let mut parsed = html::parse(house, date, raw);
    if parsed.is_empty() {
        parsed = markdown::parse(house, date, raw);
    }
    parsed
}

fn finish(house: House, mut parsed: Vec<Drawing>) -> Vec<Drawing> {
    for drawing in &mut parsed {
        drawing.time = normalize_time(house, drawing.time);
    }
    let before = parsed.len();
    let valid: Vec<Drawing> = parsed
        .into_iter()
        .filter(|drawing| match drawing.validate() {
            Ok(()) => true,
            Err(error) => {
                debug!(house = %drawing.house, time = %drawing.time, %error, "discarding drawing");
                false
            }
        })
        .collect();
    if valid.len() < before {
        debug!(house = %house, discarded = before - valid.len(), "incomplete drawings dropped");
    }
    reconcile(valid)
}
