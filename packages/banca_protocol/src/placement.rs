use lazy_static::lazy_static;
use regex::Regex;

use crate::drawing::MAX_PRIZES;

lazy_static! {
    static ref SINGLE: Regex = Regex::new(r"^(\d+)_premio$").unwrap();
    static ref RANGE: Regex = Regex::new(r"^(\d+)_(?:ao_)?(\d+)(?:_premio)?$").unwrap();
}

/// Parses a placement code into the prize positions the bet may land on.
///
/// First match wins: `geral` covers every rank, `_e_` unions both sides,
/// `N_premio` selects one rank, the range forms (`1_ao_5`, `1_5_premio`,
/// `1_ao_7`, `1_10_premio`) cover a prefix capped at the seventh prize, and
/// anything unrecognized falls back to the first prize alone.
pub fn parse_placements(raw: &str) -> Vec<u8> {
    let code = raw.trim().to_lowercase();
    if code == "geral" {
        return (1..=MAX_PRIZES as u8).collect();
    }
    if code.contains("_e_") {
        let mut positions: Vec<u8> = code.split("_e_").flat_map(parse_placements).collect();
        positions.sort_unstable();
        positions.dedup();
        return positions;
    }
    if let Some(caps) = SINGLE.captures(&code) {
        if let Ok(position) = caps[1].parse::<u8>() {
            if (1..=MAX_PRIZES as u8).contains(&position) {
                return vec![position];
            }
        }
        return vec![1];
    }
    if let Some(caps) = RANGE.captures(&code) {
        let lo = caps[1].parse::<u8>().unwrap_or(1).max(1);
        let hi = caps[2].parse::<u8>().unwrap_or(1).min(MAX_PRIZES as u8);
        if lo <= hi {
            return (lo..=hi).collect();
        }
    }
    vec![1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_codes() {
        let table: &[(&str, &[u8])] = &[
            ("geral", &[1, 2, 3, 4, 5, 6, 7]),
            ("1_premio", &[1]),
            ("5_premio", &[5]),
            ("1_ao_5", &[1, 2, 3, 4, 5]),
            ("1_5_premio", &[1, 2, 3, 4, 5]),
            ("1_ao_7", &[1, 2, 3, 4, 5, 6, 7]),
            ("1_10_premio", &[1, 2, 3, 4, 5, 6, 7]),
            ("2_ao_4", &[2, 3, 4]),
            ("1_premio_e_2_premio", &[1, 2]),
            ("1_ao_3_e_5_premio", &[1, 2, 3, 5]),
            ("", &[1]),
            ("quinto", &[1]),
            ("9_premio", &[1]),
        ];
        for (code, expected) in table {
            assert_eq!(&parse_placements(code), expected, "code {code:?}");
        }
    }

    #[test]
    fn output_is_always_within_the_prize_ranks() {
        for code in ["geral", "1_10_premio", "3_ao_9", "7_premio", "junk"] {
            for position in parse_placements(code) {
                assert!((1..=7).contains(&position), "code {code:?}");
            }
        }
    }
}
