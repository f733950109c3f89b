use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-platform multiplier override for one modality code.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlatformOdds {
    pub platform_id: String,
    #[serde(rename = "modalidade")]
    pub code: String,
    #[serde(rename = "multiplicador")]
    pub multiplier: Decimal,
    #[serde(rename = "ativo", default)]
    pub active: bool,
}

/// Global default multiplier for one modality code.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GlobalOdds {
    #[serde(rename = "modalidade")]
    pub code: String,
    #[serde(rename = "multiplicador")]
    pub multiplier: Decimal,
}

/// The pure layers of the payout-rate lookup, indexed per run. The chain also
/// has a server-side RPC layer between these two; the orchestrator owns that
/// call and the final fallback to zero.
#[derive(Clone, Debug, Default)]
pub struct OddsTables {
    platform: HashMap<(String, String), Decimal>,
    global: HashMap<String, Decimal>,
}

impl OddsTables {
    pub fn new(platform: Vec<PlatformOdds>, global: Vec<GlobalOdds>) -> Self {
        let platform = platform
            .into_iter()
            .filter(|row| row.active && row.multiplier > Decimal::ZERO)
            .map(|row| ((row.platform_id, row.code), row.multiplier))
            .collect();
        let global = global
            .into_iter()
            .filter(|row| row.multiplier > Decimal::ZERO)
            .map(|row| (row.code, row.multiplier))
            .collect();
        OddsTables { platform, global }
    }

    pub fn platform_multiplier(&self, platform_id: &str, code: &str) -> Option<Decimal> {
        self.platform
            .get(&(platform_id.to_string(), code.to_string()))
            .copied()
    }

    pub fn global_multiplier(&self, code: &str) -> Option<Decimal> {
        self.global.get(code).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn inactive_and_zero_rows_are_ignored() {
        let tables = OddsTables::new(
            vec![
                PlatformOdds {
                    platform_id: "p1".into(),
                    code: "milhar".into(),
                    multiplier: dec!(4000),
                    active: true,
                },
                PlatformOdds {
                    platform_id: "p1".into(),
                    code: "centena".into(),
                    multiplier: dec!(600),
                    active: false,
                },
            ],
            vec![
                GlobalOdds {
                    code: "centena".into(),
                    multiplier: dec!(500),
                },
                GlobalOdds {
                    code: "dezena".into(),
                    multiplier: dec!(0),
                },
            ],
        );
        assert_eq!(tables.platform_multiplier("p1", "milhar"), Some(dec!(4000)));
        assert_eq!(tables.platform_multiplier("p1", "centena"), None);
        assert_eq!(tables.global_multiplier("centena"), Some(dec!(500)));
        assert_eq!(tables.global_multiplier("dezena"), None);
    }
}
