use crate::drawing::Lottery;

/// Which slice of the 4-digit milhar a dezena/centena/grupo reading uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Slice {
    Right,
    Left,
    Middle,
}

/// CAIXA accumulated-dezena games, settled against the federal results
/// instead of the regional drawings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FederalGame {
    Lotinha,
    Quininha,
    Seninha,
}

impl FederalGame {
    /// Minimum set-intersection size between the guessed dezenas and the
    /// published dezenas for the bet to win.
    pub fn required_matches(&self) -> usize {
        match self {
            FederalGame::Lotinha => 4,
            FederalGame::Quininha => 5,
            FederalGame::Seninha => 6,
        }
    }

    /// The CAIXA result series this game is verified against.
    pub fn lottery(&self) -> Lottery {
        match self {
            FederalGame::Lotinha => Lottery::LotoFacil,
            FederalGame::Quininha => Lottery::Quina,
            FederalGame::Seninha => Lottery::MegaSena,
        }
    }
}

/// The closed set of wager rules. Codes arrive lowercased from the platform;
/// unknown codes degrade to plain milhar so a mistyped modality can still
/// settle rather than pinning the bet forever.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Modality {
    Milhar { inverted: bool },
    MilharCentena { inverted: bool },
    Centena { left: bool, inverted: bool },
    CentenaTripla,
    Dezena { slice: Slice },
    Grupo { slice: Slice },
    Unidade,
    DuqueDezena { slice: Slice },
    DuqueGrupo,
    TernoDezena { seco: bool },
    TernoGrupo { seco: bool },
    QuadraGrupo,
    QuinaGrupo,
    SenaGrupo,
    Passe { vai_e_vem: bool },
    Federal(FederalGame),
}

impl Modality {
    /// Maps a modality code to its rule. The boolean reports whether the code
    /// was recognized; the caller logs a warning on the milhar fallback.
    pub fn parse(code: &str) -> (Modality, bool) {
        let code = code.trim().to_lowercase();

        if code.starts_with("lotinha") {
            return (Modality::Federal(FederalGame::Lotinha), true);
        }
        if code.starts_with("quininha") {
            return (Modality::Federal(FederalGame::Quininha), true);
        }
        if code.starts_with("seninha") {
            return (Modality::Federal(FederalGame::Seninha), true);
        }

        let known = match code.as_str() {
            "milhar" | "palpitao" => Modality::Milhar { inverted: false },
            "milhar_ct" => Modality::MilharCentena { inverted: false },
            "milhar_ct_inv" | "milhar_inv_ct" => Modality::MilharCentena { inverted: true },
            "centena" => Modality::Centena {
                left: false,
                inverted: false,
            },
            "centena_esq" => Modality::Centena {
                left: true,
                inverted: false,
            },
            "centena_3x" => Modality::CentenaTripla,
            "centena_inv" => Modality::Centena {
                left: false,
                inverted: true,
            },
            "centena_inv_esq" | "centena_esq_inv" => Modality::Centena {
                left: true,
                inverted: true,
            },
            "dezena" => Modality::Dezena {
                slice: Slice::Right,
            },
            "dezena_esq" => Modality::Dezena { slice: Slice::Left },
            "dezena_meio" => Modality::Dezena {
                slice: Slice::Middle,
            },
            "grupo" => Modality::Grupo {
                slice: Slice::Right,
            },
            "grupo_esq" => Modality::Grupo { slice: Slice::Left },
            "grupo_meio" => Modality::Grupo {
                slice: Slice::Middle,
            },
            "unidade" => Modality::Unidade,
            "passe_vai" => Modality::Passe { vai_e_vem: false },
            "passe_vai_vem" | "passe_vai_e_vem" => Modality::Passe { vai_e_vem: true },
            _ => {
                // Families with spelling variants share a prefix.
                if code.starts_with("milhar_inv") {
                    Modality::Milhar { inverted: true }
                } else if code.starts_with("duque_dez") {
                    let slice = if code.ends_with("_esq") {
                        Slice::Left
                    } else {
                        Slice::Right
                    };
                    Modality::DuqueDezena { slice }
                } else if code.starts_with("duque_gp") || code.starts_with("duque_grupo") {
                    Modality::DuqueGrupo
                } else if code.starts_with("terno_dez") {
                    Modality::TernoDezena {
                        seco: code.contains("_seco"),
                    }
                } else if code.starts_with("terno_gp") || code.starts_with("terno_grupo") {
                    Modality::TernoGrupo {
                        seco: code.contains("_seco"),
                    }
                } else if code.starts_with("quadra_gp") || code.starts_with("quadra_grupo") {
                    Modality::QuadraGrupo
                } else if code.starts_with("quina_gp") || code.starts_with("quina_grupo") {
                    Modality::QuinaGrupo
                } else if code.starts_with("sena_gp") || code.starts_with("sena_grupo") {
                    Modality::SenaGrupo
                } else {
                    return (Modality::Milhar { inverted: false }, false);
                }
            }
        };
        (known, true)
    }
}

/// The 4-digit milhar of a (possibly longer) padded prize number.
pub fn milhar(padded: &str) -> &str {
    &padded[padded.len() - 4..]
}

pub fn centena(padded: &str, left: bool) -> &str {
    let m = milhar(padded);
    if left {
        &m[..3]
    } else {
        &m[1..]
    }
}

pub fn dezena(padded: &str, slice: Slice) -> &str {
    let m = milhar(padded);
    match slice {
        Slice::Right => &m[2..],
        Slice::Left => &m[..2],
        Slice::Middle => &m[1..3],
    }
}

pub fn unidade(padded: &str) -> &str {
    let m = milhar(padded);
    &m[3..]
}

/// Group 1..25 derived from a two-digit dezena; 00 wraps to group 25.
pub fn grupo_of_dezena(dezena: u8) -> u8 {
    if dezena == 0 {
        25
    } else {
        (dezena - 1) / 4 + 1
    }
}

/// Group read at a slice of the prize number.
pub fn grupo(padded: &str, slice: Slice) -> Option<u8> {
    dezena(padded, slice).parse::<u8>().ok().map(grupo_of_dezena)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_covers_the_families() {
        assert_eq!(
            Modality::parse("milhar"),
            (Modality::Milhar { inverted: false }, true)
        );
        assert_eq!(
            Modality::parse("MILHAR_INVERTIDA"),
            (Modality::Milhar { inverted: true }, true)
        );
        assert_eq!(
            Modality::parse("milhar_ct"),
            (Modality::MilharCentena { inverted: false }, true)
        );
        assert_eq!(
            Modality::parse("centena_inv_esq"),
            (
                Modality::Centena {
                    left: true,
                    inverted: true
                },
                true
            )
        );
        assert_eq!(
            Modality::parse("terno_dez_seco"),
            (Modality::TernoDezena { seco: true }, true)
        );
        assert_eq!(
            Modality::parse("lotinha_15"),
            (Modality::Federal(FederalGame::Lotinha), true)
        );
        assert_eq!(
            Modality::parse("passe_vai_vem"),
            (Modality::Passe { vai_e_vem: true }, true)
        );
    }

    #[test]
    fn unknown_codes_degrade_to_milhar() {
        let (modality, known) = Modality::parse("jogo_do_futuro");
        assert_eq!(modality, Modality::Milhar { inverted: false });
        assert!(!known);
    }

    #[test]
    fn extractors_slice_the_padded_number() {
        assert_eq!(milhar("5234"), "5234");
        assert_eq!(centena("5234", false), "234");
        assert_eq!(centena("5234", true), "523");
        assert_eq!(dezena("5234", Slice::Right), "34");
        assert_eq!(dezena("5234", Slice::Left), "52");
        assert_eq!(dezena("5234", Slice::Middle), "23");
        assert_eq!(unidade("5234"), "4");
        assert_eq!(milhar("15234"), "5234");
    }

    #[test]
    fn grupo_derivation_covers_every_group_four_times() {
        assert_eq!(grupo_of_dezena(0), 25);
        assert_eq!(grupo_of_dezena(1), 1);
        assert_eq!(grupo_of_dezena(4), 1);
        assert_eq!(grupo_of_dezena(5), 2);
        assert_eq!(grupo_of_dezena(99), 25);

        let mut counts = [0u8; 26];
        for n in 1..=100u8 {
            counts[grupo_of_dezena(n % 100) as usize] += 1;
        }
        for group in 1..=25 {
            assert_eq!(counts[group], 4, "group {group}");
        }
    }
}
