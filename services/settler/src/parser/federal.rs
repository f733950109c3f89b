use banca_protocol::drawing::{Drawing, House, Lottery, Prize};
use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"\b\d{4,6}\b").unwrap();
    static ref DATE_FRAGMENT_RE: Regex = Regex::new(r"\d{1,2}/\d{1,2}/\d{2,4}").unwrap();
}

/// How much listing text after the date heading belongs to one draw. The
/// page stacks draws chronologically, so a bounded window avoids bleeding
/// into the next date's prizes.
const DATE_WINDOW: usize = 600;

/// The federal listing stacks many dates on one page; only the section for
/// the target date yields a drawing. Federal prizes are five digits wide.
pub fn parse(date: NaiveDate, raw: &str) -> Vec<Drawing> {
    let text = if raw.contains('<') {
        let document = Html::parse_document(raw);
        document.root_element().text().collect::<Vec<_>>().join(" ")
    } else {
        raw.to_string()
    };

    let needle = date.format("%d/%m/%Y").to_string();
    let Some(position) = text.find(&needle) else {
        return vec![];
    };
    let window_start = position + needle.len();
    let mut window_end = (window_start + DATE_WINDOW).min(text.len());
    while !text.is_char_boundary(window_end) {
        window_end -= 1;
    }
    // Later dates fall inside the window; their fragments must not read as
    // prize numbers.
    let window = DATE_FRAGMENT_RE.replace_all(&text[window_start..window_end], " ");

    let numbers: Vec<String> = NUMBER_RE
        .find_iter(&window)
        .map(|m| m.as_str().to_string())
        .take(5)
        .collect();
    if numbers.len() < 5 {
        return vec![];
    }

    vec![Drawing {
        date,
        time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        house: House::RioFederal,
        lottery: Lottery::Federal,
        prizes: numbers.into_iter().map(Prize::new).collect(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_the_listing_to_the_target_date() {
        let page = "Extração 14/01/2026: 11111 22222 33333 44444 55555 \
                    Extração 15/01/2026: 54321 12345 67890 09876 13579 \
                    Extração 16/01/2026: 99999 88888 77777 66666 55555";
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let drawings = parse(date, page);
        assert_eq!(drawings.len(), 1);
        assert_eq!(drawings[0].lottery, Lottery::Federal);
        assert_eq!(drawings[0].prizes[0].number, "54321");
        assert_eq!(drawings[0].prizes[4].number, "13579");
    }

    #[test]
    fn absent_date_yields_nothing() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(parse(date, "Extração 15/01/2026: 11111 22222").is_empty());
    }
}
