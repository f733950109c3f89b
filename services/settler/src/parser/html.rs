use banca_protocol::drawing::{Drawing, House, Lottery, Prize};
use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref HEADERS: Selector = Selector::parse("h1, h2, h3, h4").unwrap();
    static ref TABLES: Selector = Selector::parse("table").unwrap();
    static ref ROWS: Selector = Selector::parse("tr").unwrap();
    static ref CELLS: Selector = Selector::parse("td, th").unwrap();
    static ref TIME_RE: Regex = Regex::new(r"(\d{1,2})[hH:](\d{2})").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"\d{4}").unwrap();
}

/// How many preceding block elements the table-scan strategy inspects while
/// looking for the time and lottery hint of an orphan table.
const SCAN_BACK_LIMIT: usize = 15;

pub fn parse(house: House, date: NaiveDate, raw: &str) -> Vec<Drawing> {
    let document = Html::parse_document(raw);
    let structured = headers_strategy(&document, house, date, true);
    if !structured.is_empty() {
        return structured;
    }
    let loose = headers_strategy(&document, house, date, false);
    if !loose.is_empty() {
        return loose;
    }
    table_scan_strategy(&document, house, date)
}

/// Walks the page headers; each header carrying a time stamp (and, in strict
/// mode, a recognizable lottery hint) owns the next table of prize rows.
fn headers_strategy(
    document: &Html,
    house: House,
    date: NaiveDate,
    require_hint: bool,
) -> Vec<Drawing> {
    let mut drawings = Vec::new();
    for header in document.select(&HEADERS) {
        let text = element_text(header);
        let Some(time) = extract_time(&text) else {
            continue;
        };
        if require_hint && !has_lottery_hint(&text) {
            continue;
        }
        let Some(table) = following_table(header) else {
            continue;
        };
        let prizes = prize_rows(table);
        if prizes.is_empty() {
            continue;
        }
        drawings.push(Drawing {
            date,
            time,
            house,
            lottery: classify_for(house, &text),
            prizes,
        });
    }
    drawings
}

/// Last resort: every table with at least five prize rows is a candidate;
/// the time and lottery are recovered from the preceding block elements.
fn table_scan_strategy(document: &Html, house: House, date: NaiveDate) -> Vec<Drawing> {
    let mut drawings = Vec::new();
    for table in document.select(&TABLES) {
        let prizes = prize_rows(table);
        if prizes.len() < 5 {
            continue;
        }
        let mut context = String::new();
        let mut time = None;
        for node in table.prev_siblings().filter_map(ElementRef::wrap).take(SCAN_BACK_LIMIT) {
            let text = element_text(node);
            if time.is_none() {
                time = extract_time(&text);
            }
            context.push(' ');
            context.push_str(&text);
            if time.is_some() && has_lottery_hint(&context) {
                break;
            }
        }
        let Some(time) = time else {
            continue;
        };
        drawings.push(Drawing {
            date,
            time,
            house,
            lottery: classify_for(house, &context),
            prizes,
        });
    }
    drawings
}

fn prize_rows(table: ElementRef) -> Vec<Prize> {
    let mut prizes = Vec::new();
    for row in table.select(&ROWS) {
        let text = element_text(row);
        let lower = text.to_lowercase();
        // Sum and multiplication annotations are not prizes.
        if lower.contains("soma") || lower.contains("mult") {
            continue;
        }
        let Some(number) = NUMBER_RE.find(&text) else {
            continue;
        };
        let cells: Vec<String> = row
            .select(&CELLS)
            .map(|cell| element_text(cell).trim().to_string())
            .collect();
        let animal = cells
            .last()
            .filter(|cell| {
                !cell.is_empty() && cell.len() < 20 && !cell.chars().any(|c| c.is_ascii_digit())
            })
            .cloned();
        prizes.push(Prize {
            number: number.as_str().to_string(),
            animal,
        });
        if prizes.len() == 7 {
            break;
        }
    }
    prizes
}

fn following_table(header: ElementRef) -> Option<ElementRef> {
    for element in header.next_siblings().filter_map(ElementRef::wrap) {
        match element.value().name() {
            // Another section began before any table: this header owns none.
            "h1" | "h2" | "h3" | "h4" => return None,
            "table" => return Some(element),
            // Sites often wrap the results table in a div right after the
            // header.
            _ => {
                if let Some(table) = element.select(&TABLES).next() {
                    return Some(table);
                }
            }
        }
    }
    None
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

pub(super) fn extract_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn has_lottery_hint(text: &str) -> bool {
    let upper = text.to_uppercase();
    Lottery::classify(&upper) != Lottery::Geral
        || upper.contains("RESULTADO")
        || upper.contains("GERAL")
}

/// BAHIA publishes its MALUCA draws under headers of their own; classifying
/// through the shared priority list keeps them as independent drawings.
fn classify_for(_house: House, text: &str) -> Lottery {
    Lottery::classify(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <h2>PT Rio 14:20</h2>
        <table>
          <tr><td>1º</td><td>1234</td><td>cavalo</td></tr>
          <tr><td>2º</td><td>5678</td><td>vaca</td></tr>
          <tr><td>3º</td><td>9012</td><td>burro</td></tr>
          <tr><td>4º</td><td>3456</td><td>leao</td></tr>
          <tr><td>5º</td><td>7890</td><td>touro</td></tr>
          <tr><td>soma</td><td>27270</td></tr>
        </table>
        <h2>CORUJA 21h20</h2>
        <table>
          <tr><td>1º</td><td>1111</td><td>aguia</td></tr>
          <tr><td>2º</td><td>2222</td><td>galo</td></tr>
          <tr><td>3º</td><td>3333</td><td>gato</td></tr>
          <tr><td>4º</td><td>4444</td><td>cobra</td></tr>
          <tr><td>5º</td><td>5555</td><td>macaco</td></tr>
        </table>
        </body></html>"#;

    #[test]
    fn structured_headers_yield_one_drawing_per_table() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let drawings = parse(House::RioFederal, date, PAGE);
        assert_eq!(drawings.len(), 2);

        assert_eq!(drawings[0].lottery, Lottery::Pt);
        assert_eq!(drawings[0].time, NaiveTime::from_hms_opt(14, 20, 0).unwrap());
        assert_eq!(drawings[0].prizes.len(), 5);
        assert_eq!(drawings[0].prizes[0].number, "1234");
        assert_eq!(drawings[0].prizes[0].animal.as_deref(), Some("cavalo"));

        assert_eq!(drawings[1].lottery, Lottery::Coruja);
        assert_eq!(drawings[1].time, NaiveTime::from_hms_opt(21, 20, 0).unwrap());
    }

    #[test]
    fn sum_rows_are_skipped() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let drawings = parse(House::RioFederal, date, PAGE);
        assert!(drawings[0]
            .prizes
            .iter()
            .all(|prize| prize.number != "27270"));
    }

    #[test]
    fn orphan_tables_recover_context_from_preceding_blocks() {
        let page = r#"
            <html><body>
            <div>Deu no poste</div>
            <p>LOOK GOIAS</p>
            <p>11h00</p>
            <table>
              <tr><td>1º</td><td>1111</td></tr>
              <tr><td>2º</td><td>2222</td></tr>
              <tr><td>3º</td><td>3333</td></tr>
              <tr><td>4º</td><td>4444</td></tr>
              <tr><td>5º</td><td>5555</td></tr>
            </table>
            </body></html>"#;
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let drawings = parse(House::Goias, date, page);
        assert_eq!(drawings.len(), 1);
        assert_eq!(drawings[0].lottery, Lottery::Look);
        assert_eq!(drawings[0].time, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
    }
}
