use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Regional drawings publish between 5 and 7 ranked prizes.
pub const MIN_PRIZES: usize = 5;
pub const MAX_PRIZES: usize = 7;

/// A lottery-issuing authority ("banca").
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum House {
    #[serde(rename = "RIO/FEDERAL")]
    RioFederal,
    #[serde(rename = "BAHIA")]
    Bahia,
    #[serde(rename = "LOTECE")]
    Lotece,
    #[serde(rename = "LOTEP")]
    Lotep,
    #[serde(rename = "SAO-PAULO")]
    SaoPaulo,
    #[serde(rename = "GOIAS")]
    Goias,
    #[serde(rename = "MINAS")]
    Minas,
    #[serde(rename = "BRASILIA")]
    Brasilia,
    #[serde(rename = "NATAL")]
    Natal,
    #[serde(rename = "ARACAJU")]
    Aracaju,
    #[serde(rename = "RECIFE")]
    Recife,
    #[serde(rename = "VITORIA")]
    Vitoria,
    #[serde(rename = "PARANA")]
    Parana,
    #[serde(rename = "NACIONAL")]
    Nacional,
    #[serde(rename = "CAIXA")]
    Caixa,
}

impl House {
    pub fn as_str(&self) -> &'static str {
        match self {
            House::RioFederal => "RIO/FEDERAL",
            House::Bahia => "BAHIA",
            House::Lotece => "LOTECE",
            House::Lotep => "LOTEP",
            House::SaoPaulo => "SAO-PAULO",
            House::Goias => "GOIAS",
            House::Minas => "MINAS",
            House::Brasilia => "BRASILIA",
            House::Natal => "NATAL",
            House::Aracaju => "ARACAJU",
            House::Recife => "RECIFE",
            House::Vitoria => "VITORIA",
            House::Parana => "PARANA",
            House::Nacional => "NACIONAL",
            House::Caixa => "CAIXA",
        }
    }

    pub fn all() -> &'static [House] {
        &[
            House::RioFederal,
            House::Bahia,
            House::Lotece,
            House::Lotep,
            House::SaoPaulo,
            House::Goias,
            House::Minas,
            House::Brasilia,
            House::Natal,
            House::Aracaju,
            House::Recife,
            House::Vitoria,
            House::Parana,
            House::Nacional,
            House::Caixa,
        ]
    }
}

impl std::fmt::Display for House {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named draw series within a house.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lottery {
    Geral,
    Pt,
    Ptm,
    Ptv,
    Ptn,
    Coruja,
    Corujinha,
    Maluca,
    Federal,
    Lbr,
    Look,
    Alvorada,
    Bandeirante,
    Popular,
    Matutina,
    Vespertina,
    Noturna,
    LotoFacil,
    Quina,
    MegaSena,
}

impl Lottery {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lottery::Geral => "GERAL",
            Lottery::Pt => "PT",
            Lottery::Ptm => "PTM",
            Lottery::Ptv => "PTV",
            Lottery::Ptn => "PTN",
            Lottery::Coruja => "CORUJA",
            Lottery::Corujinha => "CORUJINHA",
            Lottery::Maluca => "MALUCA",
            Lottery::Federal => "FEDERAL",
            Lottery::Lbr => "LBR",
            Lottery::Look => "LOOK",
            Lottery::Alvorada => "ALVORADA",
            Lottery::Bandeirante => "BANDEIRANTE",
            Lottery::Popular => "POPULAR",
            Lottery::Matutina => "MATUTINA",
            Lottery::Vespertina => "VESPERTINA",
            Lottery::Noturna => "NOTURNA",
            Lottery::LotoFacil => "LOTO_FACIL",
            Lottery::Quina => "QUINA",
            Lottery::MegaSena => "MEGA_SENA",
        }
    }

    /// Priority-ordered classification of a header text. More specific names
    /// must win over the generic ones (CORUJINHA before CORUJA before PT,
    /// MALUCA before the house default), so the order of this list matters.
    pub fn classify(header: &str) -> Lottery {
        let text = header.to_uppercase();
        const PRIORITY: &[(&str, Lottery)] = &[
            ("CORUJINHA", Lottery::Corujinha),
            ("CORUJA", Lottery::Coruja),
            ("MALUCA", Lottery::Maluca),
            ("FEDERAL", Lottery::Federal),
            ("LBR", Lottery::Lbr),
            ("LOOK", Lottery::Look),
            ("ALVORADA", Lottery::Alvorada),
            ("BANDEIRANTE", Lottery::Bandeirante),
            ("POPULAR", Lottery::Popular),
            ("MATUTINA", Lottery::Matutina),
            ("VESPERTINA", Lottery::Vespertina),
            ("NOTURNA", Lottery::Noturna),
            ("PTM", Lottery::Ptm),
            ("PTV", Lottery::Ptv),
            ("PTN", Lottery::Ptn),
            ("PT", Lottery::Pt),
        ];
        for (needle, lottery) in PRIORITY {
            if text.contains(needle) {
                return *lottery;
            }
        }
        Lottery::Geral
    }

    /// The CAIXA accumulated-dezena family stores a single CSV prize instead
    /// of ranked 4-digit numbers.
    pub fn is_caixa_game(&self) -> bool {
        matches!(self, Lottery::LotoFacil | Lottery::Quina | Lottery::MegaSena)
    }
}

impl std::fmt::Display for Lottery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked prize within a drawing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Prize {
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "bicho", skip_serializing_if = "Option::is_none", default)]
    pub animal: Option<String>,
}

impl Prize {
    pub fn new(number: impl Into<String>) -> Self {
        Prize {
            number: number.into(),
            animal: None,
        }
    }

    /// The prize number left-padded to at least 4 digits.
    pub fn padded(&self) -> String {
        pad_number(&self.number)
    }
}

pub fn pad_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 4 {
        digits
    } else {
        format!("{:0>4}", digits)
    }
}

/// Natural key of a drawing in the result store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DrawingKey {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub house: House,
    pub lottery: Lottery,
}

/// One lottery's single draw at one time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Drawing {
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "hora", with = "hhmm")]
    pub time: NaiveTime,
    #[serde(rename = "banca")]
    pub house: House,
    #[serde(rename = "loteria")]
    pub lottery: Lottery,
    #[serde(rename = "premios")]
    pub prizes: Vec<Prize>,
}

/// `HH:MM` wire format for drawing times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use crate::error::ProtocolError;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| serde::de::Error::custom(ProtocolError::InvalidTime(raw.clone())))
    }
}

impl Drawing {
    pub fn key(&self) -> DrawingKey {
        DrawingKey {
            date: self.date,
            time: self.time,
            house: self.house,
            lottery: self.lottery,
        }
    }

    /// Slot within a single day, used to group parse output for
    /// reconciliation and to index the in-memory map during settlement.
    pub fn slot(&self) -> (NaiveTime, House, Lottery) {
        (self.time, self.house, self.lottery)
    }

    /// Rejects records that cannot settle anything: fewer than 5 prizes for
    /// regional draws, anything but the single CSV prize for CAIXA games.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.lottery.is_caixa_game() {
            if self.prizes.len() != 1 {
                return Err(ProtocolError::MalformedFederalDrawing(self.prizes.len()));
            }
            return Ok(());
        }
        if self.prizes.len() < MIN_PRIZES {
            return Err(ProtocolError::TooFewPrizes {
                lottery: self.lottery.to_string(),
                found: self.prizes.len(),
                min: MIN_PRIZES,
            });
        }
        for prize in &self.prizes {
            if prize.number.is_empty() || !prize.number.chars().all(|c| c.is_ascii_digit()) {
                return Err(ProtocolError::InvalidPrizeNumber(prize.number.clone()));
            }
        }
        Ok(())
    }

    /// The two-digit dezenas of a CAIXA-family drawing, parsed from the CSV
    /// held by its single prize cell.
    pub fn dezenas(&self) -> Vec<u8> {
        match self.prizes.first() {
            Some(prize) => prize
                .number
                .split(',')
                .filter_map(|part| part.trim().parse::<u8>().ok())
                .collect(),
            None => vec![],
        }
    }

    /// The drawing a MALUCA bettor plays against: the standard draw with the
    /// milhar of each prize reversed. LOTECE publishes reversed prizes for
    /// all seven ranks; every other house only for ranks 1..5, since the
    /// source pattern fills ranks 6..7 from prizes 8..9 which are never
    /// persisted.
    pub fn maluca_view(&self) -> Drawing {
        let mut view = self.clone();
        let keep = if self.house == House::Lotece {
            view.prizes.len()
        } else {
            view.prizes.len().min(5)
        };
        view.prizes.truncate(keep);
        for prize in &mut view.prizes {
            prize.number = prize.padded().chars().rev().collect();
        }
        view
    }
}

/// Source-specific time quirks, adjusted before anything is keyed on the
/// drawing time. LOTECE advertises its late-morning draw as 10:00 or 12:00
/// depending on the page; the store knows it as 11:00.
pub fn normalize_time(house: House, time: NaiveTime) -> NaiveTime {
    match house {
        House::Lotece => {
            let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
            let twelve = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
            if time == ten || time == twelve {
                NaiveTime::from_hms_opt(11, 0, 0).unwrap()
            } else {
                time
            }
        }
        _ => time,
    }
}

/// Reconciles the drawings produced by a single parse. Pages often publish
/// the same draw twice (first with ranks 1..5, later with 1..7): when the
/// overlapping prefix agrees on the prize numbers the longer record wins.
/// Divergent prefixes under the same slot are distinct draws that happen to
/// share a minute, and both survive.
pub fn reconcile(parsed: Vec<Drawing>) -> Vec<Drawing> {
    let mut merged: Vec<Drawing> = Vec::with_capacity(parsed.len());
    'next: for candidate in parsed {
        for existing in &mut merged {
            if existing.slot() != candidate.slot() {
                continue;
            }
            if prefix_matches(existing, &candidate) {
                if candidate.prizes.len() > existing.prizes.len() {
                    *existing = candidate;
                }
                continue 'next;
            }
        }
        merged.push(candidate);
    }
    merged
}

fn prefix_matches(a: &Drawing, b: &Drawing) -> bool {
    let overlap = a.prizes.len().min(b.prizes.len());
    if overlap == 0 {
        return false;
    }
    a.prizes[..overlap]
        .iter()
        .zip(&b.prizes[..overlap])
        .all(|(x, y)| x.padded() == y.padded())
}
