use std::collections::HashSet;

use crate::drawing::Drawing;
use crate::modality::{centena, dezena, grupo, milhar, unidade, FederalGame, Modality, Slice};

/// A winning evaluation. `odds_code` overrides the modality code used for the
/// payout lookup: `None` pays at the bet's own modality, `Some("centena")`
/// marks the milhar-ct consolation which pays at the centena rate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    pub odds_code: Option<&'static str>,
}

impl Hit {
    fn full() -> Self {
        Hit { odds_code: None }
    }
}

/// Decides whether a bet's guesses land on a drawing. Pure over its inputs:
/// the same modality, guesses, placements and drawing always produce the same
/// verdict.
pub fn evaluate(
    modality: &Modality,
    guesses: &[String],
    placements: &[u8],
    drawing: &Drawing,
) -> Option<Hit> {
    match modality {
        Modality::Milhar { inverted } => {
            any_prize_match(drawing, placements, guesses, 4, *inverted, milhar).map(|_| Hit::full())
        }
        Modality::MilharCentena { inverted } => {
            if any_prize_match(drawing, placements, guesses, 4, *inverted, milhar).is_some() {
                return Some(Hit::full());
            }
            any_prize_match(drawing, placements, guesses, 3, *inverted, |p| {
                centena(p, false)
            })
            .map(|_| Hit {
                odds_code: Some(if *inverted { "centena_inv" } else { "centena" }),
            })
        }
        Modality::Centena { left, inverted } => {
            any_prize_match(drawing, placements, guesses, 3, *inverted, |p| {
                centena(p, *left)
            })
            .map(|_| Hit::full())
        }
        Modality::CentenaTripla => {
            for position in placements {
                if let Some(padded) = padded_at(drawing, *position) {
                    for window in windows(&padded, 3) {
                        if guesses
                            .iter()
                            .any(|g| normalize_guess(g, 3).as_deref() == Some(window))
                        {
                            return Some(Hit::full());
                        }
                    }
                }
            }
            None
        }
        Modality::Dezena { slice } => {
            any_prize_match(drawing, placements, guesses, 2, false, |p| dezena(p, *slice))
                .map(|_| Hit::full())
        }
        Modality::Unidade => {
            any_prize_match(drawing, placements, guesses, 1, false, unidade).map(|_| Hit::full())
        }
        Modality::Grupo { slice } => {
            let drawn: HashSet<u8> = group_set(drawing, placements, *slice);
            guesses
                .iter()
                .filter_map(|g| parse_group(g))
                .any(|g| drawn.contains(&g))
                .then(Hit::full)
        }
        Modality::DuqueDezena { slice } => {
            let drawn = dezena_set(drawing, placements, *slice);
            all_guessed_dezenas_present(guesses, &drawn, 2).then(Hit::full)
        }
        Modality::DuqueGrupo => {
            let drawn = group_set(drawing, placements, Slice::Right);
            all_guessed_groups_present(guesses, &drawn, 2).then(Hit::full)
        }
        Modality::TernoDezena { seco } => {
            let positions: Vec<u8> = if *seco {
                vec![1, 2, 3]
            } else {
                placements.to_vec()
            };
            let drawn = dezena_set(drawing, &positions, Slice::Right);
            all_guessed_dezenas_present(guesses, &drawn, 3).then(Hit::full)
        }
        Modality::TernoGrupo { seco } => {
            let positions: Vec<u8> = if *seco {
                vec![1, 2, 3]
            } else {
                placements.to_vec()
            };
            let drawn = group_set(drawing, &positions, Slice::Right);
            all_guessed_groups_present(guesses, &drawn, 3).then(Hit::full)
        }
        Modality::QuadraGrupo => {
            let drawn = group_set(drawing, placements, Slice::Right);
            all_guessed_groups_present(guesses, &drawn, 4).then(Hit::full)
        }
        Modality::QuinaGrupo => {
            let drawn = group_set(drawing, &[1, 2, 3, 4, 5], Slice::Right);
            (present_group_count(guesses, &drawn) >= 5).then(Hit::full)
        }
        Modality::SenaGrupo => {
            let drawn = group_set(drawing, &[1, 2, 3, 4, 5, 6], Slice::Right);
            (present_group_count(guesses, &drawn) >= 6).then(Hit::full)
        }
        Modality::Passe { vai_e_vem } => {
            let first = padded_at(drawing, 1).and_then(|p| grupo(&p, Slice::Right));
            let second = padded_at(drawing, 2).and_then(|p| grupo(&p, Slice::Right));
            let (Some(first), Some(second)) = (first, second) else {
                return None;
            };
            let (Some(a), Some(b)) = (
                guesses.first().and_then(|g| parse_group(g)),
                guesses.get(1).and_then(|g| parse_group(g)),
            ) else {
                return None;
            };
            let forward = first == a && second == b;
            let backward = first == b && second == a;
            (forward || (*vai_e_vem && backward)).then(Hit::full)
        }
        Modality::Federal(game) => evaluate_federal(*game, guesses, drawing),
    }
}

fn evaluate_federal(game: FederalGame, guesses: &[String], drawing: &Drawing) -> Option<Hit> {
    let drawn: HashSet<u8> = drawing.dezenas().into_iter().collect();
    if drawn.is_empty() {
        return None;
    }
    let guessed: HashSet<u8> = guesses
        .first()
        .map(|g| {
            g.split(['-', ',', ' '])
                .filter_map(|part| part.trim().parse::<u8>().ok())
                .collect()
        })
        .unwrap_or_default();
    let matches = guessed.intersection(&drawn).count();
    (matches >= game.required_matches()).then(Hit::full)
}

/// Runs a slice extractor over every playable prize and reports the first
/// position where a guess matches. `inverted` compares digit multisets
/// instead of exact strings.
fn any_prize_match(
    drawing: &Drawing,
    placements: &[u8],
    guesses: &[String],
    width: usize,
    inverted: bool,
    extract: impl for<'a> Fn(&'a str) -> &'a str,
) -> Option<u8> {
    let normalized: Vec<String> = guesses
        .iter()
        .filter_map(|g| normalize_guess(g, width))
        .collect();
    if normalized.is_empty() {
        return None;
    }
    for position in placements {
        let Some(padded) = padded_at(drawing, *position) else {
            continue;
        };
        let drawn = extract(&padded);
        for guess in &normalized {
            let hit = if inverted {
                same_digit_multiset(guess, drawn)
            } else {
                guess == drawn
            };
            if hit {
                return Some(*position);
            }
        }
    }
    None
}

fn padded_at(drawing: &Drawing, position: u8) -> Option<String> {
    drawing
        .prizes
        .get(position.saturating_sub(1) as usize)
        .map(|p| p.padded())
}

/// Keeps only digits and left-pads to the modality's width. Guesses wider
/// than the slice cannot match and are dropped.
fn normalize_guess(raw: &str, width: usize) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > width {
        return None;
    }
    Some(format!("{digits:0>width$}"))
}

fn same_digit_multiset(a: &str, b: &str) -> bool {
    let mut a: Vec<u8> = a.bytes().collect();
    let mut b: Vec<u8> = b.bytes().collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

fn windows(padded: &str, width: usize) -> impl Iterator<Item = &str> {
    (0..=padded.len().saturating_sub(width)).map(move |start| &padded[start..start + width])
}

fn dezena_set(drawing: &Drawing, placements: &[u8], slice: Slice) -> HashSet<String> {
    placements
        .iter()
        .filter_map(|pos| padded_at(drawing, *pos))
        .map(|p| dezena(&p, slice).to_string())
        .collect()
}

fn group_set(drawing: &Drawing, placements: &[u8], slice: Slice) -> HashSet<u8> {
    placements
        .iter()
        .filter_map(|pos| padded_at(drawing, *pos))
        .filter_map(|p| grupo(&p, slice))
        .collect()
}

fn parse_group(raw: &str) -> Option<u8> {
    let group = raw.trim().parse::<u8>().ok()?;
    (1..=25).contains(&group).then_some(group)
}

fn all_guessed_dezenas_present(guesses: &[String], drawn: &HashSet<String>, need: usize) -> bool {
    let guessed: HashSet<String> = guesses
        .iter()
        .filter_map(|g| normalize_guess(g, 2))
        .collect();
    guessed.len() >= need && guessed.iter().all(|dz| drawn.contains(dz))
}

fn all_guessed_groups_present(guesses: &[String], drawn: &HashSet<u8>, need: usize) -> bool {
    let guessed: HashSet<u8> = guesses.iter().filter_map(|g| parse_group(g)).collect();
    guessed.len() >= need && guessed.iter().all(|g| drawn.contains(g))
}

fn present_group_count(guesses: &[String], drawn: &HashSet<u8>) -> usize {
    let guessed: HashSet<u8> = guesses.iter().filter_map(|g| parse_group(g)).collect();
    guessed.iter().filter(|g| drawn.contains(g)).count()
}
