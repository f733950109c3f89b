use banca_protocol::drawing::{House, Lottery};
use chrono::NaiveTime;

use crate::error::SettleError;

/// A bet token resolved to the drawing it settles against. `maluca` asks the
/// evaluator to run over the reversed-milhar view of that drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedToken {
    pub house: House,
    pub time: NaiveTime,
    pub lottery: Lottery,
    pub maluca: bool,
}

/// The canonical token table. Every identifier the platform issues must be
/// registered here; there is deliberately no fuzzy matching.
static TOKENS: &[(&str, House, (u32, u32), Lottery)] = &[
    // Rio / Federal
    ("rj_pt_09", House::RioFederal, (9, 20), Lottery::Pt),
    ("rj_ptm_11", House::RioFederal, (11, 20), Lottery::Ptm),
    ("rj_pt_14", House::RioFederal, (14, 20), Lottery::Pt),
    ("rj_ptv_16", House::RioFederal, (16, 20), Lottery::Ptv),
    ("rj_ptn_18", House::RioFederal, (18, 20), Lottery::Ptn),
    ("rj_coruja_21", House::RioFederal, (21, 20), Lottery::Coruja),
    ("rj_federal_19", House::RioFederal, (19, 0), Lottery::Federal),
    // Bahia
    ("bs_10", House::Bahia, (10, 0), Lottery::Geral),
    ("bs_12", House::Bahia, (12, 0), Lottery::Geral),
    ("bs_14", House::Bahia, (14, 0), Lottery::Geral),
    ("bs_19", House::Bahia, (19, 0), Lottery::Geral),
    ("bs_21", House::Bahia, (21, 0), Lottery::Geral),
    ("bs_federal_19", House::Bahia, (19, 0), Lottery::Federal),
    // Lotece (Ceará)
    ("ce_11", House::Lotece, (11, 0), Lottery::Geral),
    ("ce_14", House::Lotece, (14, 0), Lottery::Geral),
    ("ce_15", House::Lotece, (15, 45), Lottery::Geral),
    ("ce_19", House::Lotece, (19, 0), Lottery::Geral),
    // Lotep (Paraíba)
    ("pb_10", House::Lotep, (10, 45), Lottery::Geral),
    ("pb_12", House::Lotep, (12, 45), Lottery::Geral),
    ("pb_15", House::Lotep, (15, 45), Lottery::Geral),
    ("pb_18", House::Lotep, (18, 0), Lottery::Geral),
    ("pb_21", House::Lotep, (21, 0), Lottery::Geral),
    // São Paulo
    ("sp_08", House::SaoPaulo, (8, 20), Lottery::Bandeirante),
    ("sp_10", House::SaoPaulo, (10, 20), Lottery::Bandeirante),
    ("sp_12", House::SaoPaulo, (12, 20), Lottery::Bandeirante),
    ("sp_13", House::SaoPaulo, (13, 20), Lottery::Bandeirante),
    ("sp_15", House::SaoPaulo, (15, 20), Lottery::Bandeirante),
    ("sp_17", House::SaoPaulo, (17, 20), Lottery::Bandeirante),
    ("sp_19", House::SaoPaulo, (19, 20), Lottery::Bandeirante),
    ("sp_20", House::SaoPaulo, (20, 20), Lottery::Bandeirante),
    // Goiás (Look)
    ("go_07", House::Goias, (7, 0), Lottery::Look),
    ("go_09", House::Goias, (9, 0), Lottery::Look),
    ("go_11", House::Goias, (11, 0), Lottery::Look),
    ("go_14", House::Goias, (14, 0), Lottery::Look),
    ("go_16", House::Goias, (16, 0), Lottery::Look),
    ("go_18", House::Goias, (18, 0), Lottery::Look),
    ("go_21", House::Goias, (21, 0), Lottery::Look),
    ("go_23", House::Goias, (23, 0), Lottery::Look),
    // Minas (Alvorada)
    ("mg_12", House::Minas, (12, 0), Lottery::Alvorada),
    ("mg_15", House::Minas, (15, 0), Lottery::Alvorada),
    ("mg_19", House::Minas, (19, 0), Lottery::Alvorada),
    // Brasília (LBR)
    ("df_10", House::Brasilia, (10, 30), Lottery::Lbr),
    ("df_12", House::Brasilia, (12, 30), Lottery::Lbr),
    ("df_15", House::Brasilia, (15, 30), Lottery::Lbr),
    ("df_18", House::Brasilia, (18, 30), Lottery::Lbr),
    ("df_21", House::Brasilia, (21, 30), Lottery::Lbr),
    // Natal (RN)
    ("rn_08", House::Natal, (8, 30), Lottery::Geral),
    ("rn_10", House::Natal, (10, 30), Lottery::Geral),
    ("rn_12", House::Natal, (12, 30), Lottery::Geral),
    ("rn_14", House::Natal, (14, 30), Lottery::Geral),
    ("rn_16", House::Natal, (16, 30), Lottery::Geral),
    ("rn_18", House::Natal, (18, 30), Lottery::Geral),
    // Aracaju (SE)
    ("se_09", House::Aracaju, (9, 0), Lottery::Geral),
    ("se_12", House::Aracaju, (12, 0), Lottery::Geral),
    ("se_15", House::Aracaju, (15, 0), Lottery::Geral),
    ("se_18", House::Aracaju, (18, 0), Lottery::Geral),
    // Recife (PE)
    ("pe_10", House::Recife, (10, 0), Lottery::Geral),
    ("pe_13", House::Recife, (13, 0), Lottery::Geral),
    ("pe_16", House::Recife, (16, 0), Lottery::Geral),
    ("pe_19", House::Recife, (19, 0), Lottery::Geral),
    // Vitória (ES)
    ("es_09", House::Vitoria, (9, 30), Lottery::Geral),
    ("es_12", House::Vitoria, (12, 30), Lottery::Geral),
    ("es_15", House::Vitoria, (15, 30), Lottery::Geral),
    ("es_18", House::Vitoria, (18, 30), Lottery::Geral),
    // Paraná
    ("pr_11", House::Parana, (11, 0), Lottery::Geral),
    ("pr_14", House::Parana, (14, 0), Lottery::Geral),
    ("pr_17", House::Parana, (17, 0), Lottery::Geral),
    ("pr_21", House::Parana, (21, 0), Lottery::Geral),
    // Nacional
    ("nac_10", House::Nacional, (10, 0), Lottery::Geral),
    ("nac_13", House::Nacional, (13, 0), Lottery::Geral),
    ("nac_16", House::Nacional, (16, 0), Lottery::Geral),
    ("nac_19", House::Nacional, (19, 0), Lottery::Geral),
    ("nac_22", House::Nacional, (22, 0), Lottery::Geral),
    // CAIXA result series
    ("cx_loto_facil_20", House::Caixa, (20, 0), Lottery::LotoFacil),
    ("cx_quina_20", House::Caixa, (20, 0), Lottery::Quina),
    ("cx_mega_20", House::Caixa, (20, 0), Lottery::MegaSena),
];

/// Resolves one bet token. A `_maluca` suffix resolves to the same key as
/// its base token; for BAHIA that key is the independently published MALUCA
/// drawing, for every other house it is the standard drawing plus the
/// reversed-milhar transform flag.
pub fn resolve(token: &str) -> Result<ResolvedToken, SettleError> {
    let normalized = token.trim().to_lowercase();
    if let Some(found) = lookup(&normalized) {
        return Ok(found);
    }
    if let Some(base) = normalized.strip_suffix("_maluca") {
        if let Some(mut resolved) = lookup(base) {
            if resolved.house == House::Bahia {
                resolved.lottery = Lottery::Maluca;
            } else {
                resolved.maluca = true;
            }
            return Ok(resolved);
        }
    }
    Err(SettleError::UnknownToken(token.to_string()))
}

fn lookup(token: &str) -> Option<ResolvedToken> {
    TOKENS
        .iter()
        .find(|(name, _, _, _)| *name == token)
        .map(|(_, house, (hour, minute), lottery)| ResolvedToken {
            house: *house,
            time: NaiveTime::from_hms_opt(*hour, *minute, 0).unwrap(),
            lottery: *lottery,
            maluca: false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tokens_resolve() {
        let resolved = resolve("rj_pt_14").unwrap();
        assert_eq!(resolved.house, House::RioFederal);
        assert_eq!(resolved.time, NaiveTime::from_hms_opt(14, 20, 0).unwrap());
        assert_eq!(resolved.lottery, Lottery::Pt);
        assert!(!resolved.maluca);
    }

    #[test]
    fn bahia_maluca_is_an_independent_drawing() {
        let resolved = resolve("bs_14_maluca").unwrap();
        assert_eq!(resolved.house, House::Bahia);
        assert_eq!(resolved.lottery, Lottery::Maluca);
        assert!(!resolved.maluca);
    }

    #[test]
    fn other_houses_maluca_flags_the_transform() {
        let resolved = resolve("ce_14_maluca").unwrap();
        assert_eq!(resolved.house, House::Lotece);
        assert_eq!(resolved.lottery, Lottery::Geral);
        assert!(resolved.maluca);
    }

    #[test]
    fn unregistered_tokens_do_not_resolve() {
        assert!(matches!(
            resolve("zz_99"),
            Err(SettleError::UnknownToken(token)) if token == "zz_99"
        ));
        assert!(resolve("zz_99_maluca").is_err());
    }

    #[test]
    fn every_token_has_a_valid_time() {
        for (name, _, (hour, minute), _) in TOKENS {
            assert!(
                NaiveTime::from_hms_opt(*hour, *minute, 0).is_some(),
                "token {name}"
            );
        }
    }
}
