use banca_protocol::drawing::{Drawing, House, Lottery, Prize};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use super::html::extract_time;

lazy_static! {
    static ref SECTION_RE: Regex = Regex::new(r"(?m)^(?:#{1,4}\s|-{3,}\s*$)").unwrap();
    static ref RANK_ROW_RE: Regex = Regex::new(r"(?m)^\s*\d{1,2}\s*[ºo°]").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"\d{4}").unwrap();
    static ref DATE_FRAGMENT_RE: Regex = Regex::new(r"\d{1,2}/\d{1,2}/\d{2,4}").unwrap();
    static ref TIME_FRAGMENT_RE: Regex = Regex::new(r"\d{1,2}[hH:]\d{2}").unwrap();
}

/// Fallback for sources that only deliver a rendered-Markdown body. Sections
/// are delimited by headings or rules; within a section the prize numbers are
/// looked for in table cells first, then ranked "1º …" rows, then bare
/// 4-digit runs once the date and time fragments are stripped out.
pub fn parse(house: House, date: NaiveDate, raw: &str) -> Vec<Drawing> {
    let mut drawings = Vec::new();
    for section in split_sections(raw) {
        let Some(time) = extract_time(section) else {
            continue;
        };
        let numbers = table_cell_numbers(section)
            .or_else(|| rank_row_numbers(section))
            .or_else(|| bare_numbers(section))
            .unwrap_or_default();
        if numbers.is_empty() {
            continue;
        }
        let lottery = Lottery::classify(section.lines().next().unwrap_or(section));
        drawings.push(Drawing {
            date,
            time,
            house,
            lottery,
            prizes: numbers.into_iter().take(7).map(Prize::new).collect(),
        });
    }
    drawings
}

fn split_sections(raw: &str) -> Vec<&str> {
    let mut bounds: Vec<usize> = SECTION_RE.find_iter(raw).map(|m| m.start()).collect();
    if bounds.first() != Some(&0) {
        bounds.insert(0, 0);
    }
    bounds.push(raw.len());
    bounds
        .windows(2)
        .map(|pair| &raw[pair[0]..pair[1]])
        .filter(|section| !section.trim().is_empty())
        .collect()
}

fn table_cell_numbers(section: &str) -> Option<Vec<String>> {
    let mut numbers = Vec::new();
    for line in section.lines().filter(|line| line.contains('|')) {
        // Alignment rows of Markdown tables carry no digits.
        for cell in line.split('|') {
            if let Some(m) = NUMBER_RE.find(cell) {
                numbers.push(m.as_str().to_string());
            }
        }
    }
    (!numbers.is_empty()).then_some(numbers)
}

fn rank_row_numbers(section: &str) -> Option<Vec<String>> {
    let mut numbers = Vec::new();
    for line in section.lines() {
        if !RANK_ROW_RE.is_match(line) {
            continue;
        }
        let rest = RANK_ROW_RE.replace(line, "");
        if let Some(m) = NUMBER_RE.find(&rest) {
            numbers.push(m.as_str().to_string());
        }
    }
    (!numbers.is_empty()).then_some(numbers)
}

fn bare_numbers(section: &str) -> Option<Vec<String>> {
    let stripped = DATE_FRAGMENT_RE.replace_all(section, " ");
    let stripped = TIME_FRAGMENT_RE.replace_all(&stripped, " ");
    let numbers: Vec<String> = NUMBER_RE
        .find_iter(&stripped)
        .map(|m| m.as_str().to_string())
        .collect();
    (!numbers.is_empty()).then_some(numbers)
}
