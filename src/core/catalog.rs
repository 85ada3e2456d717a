//! Static reference data: the instrument list and the risk-profile table.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{PlanError, Result};
use super::formulas::MIN_ANNUAL_RETURN;
use super::types::{Instrument, RiskLevel, RiskProfile};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub instruments: Vec<Instrument>,
    pub risk_profiles: BTreeMap<RiskLevel, RiskProfile>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        let instruments = vec![
            instrument(
                "stocks",
                "Equity Stocks",
                15.0,
                RiskLevel::High,
                25.0,
                "Direct investment in company shares with high growth potential",
            ),
            instrument(
                "mutual_funds",
                "Mutual Funds",
                12.0,
                RiskLevel::Medium,
                18.0,
                "Professionally managed diversified investment portfolio",
            ),
            instrument(
                "bonds",
                "Government Bonds",
                8.0,
                RiskLevel::Low,
                5.0,
                "Fixed-income securities with stable returns",
            ),
            instrument(
                "fixed_deposits",
                "Fixed Deposits",
                6.0,
                RiskLevel::Low,
                0.0,
                "Bank deposits with guaranteed returns",
            ),
            instrument(
                "gold",
                "Gold Investment",
                9.0,
                RiskLevel::Medium,
                15.0,
                "Precious metal investment as inflation hedge",
            ),
        ];

        let risk_profiles = BTreeMap::from([
            (
                RiskLevel::Low,
                profile("Conservative", "Prefer stable returns with minimal risk", 7.0),
            ),
            (
                RiskLevel::Medium,
                profile("Moderate", "Balance between growth and stability", 10.0),
            ),
            (
                RiskLevel::High,
                profile(
                    "Aggressive",
                    "Willing to take higher risks for better returns",
                    15.0,
                ),
            ),
        ]);

        Self {
            instruments,
            risk_profiles,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| PlanError::catalog(format!("invalid catalog JSON: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PlanError::catalog(format!("cannot read {}: {e}", path.display())))?;
        let catalog = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            instruments = catalog.instruments.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(PlanError::catalog("at least one instrument is required"));
        }

        let mut seen = HashSet::with_capacity(self.instruments.len());
        for inst in &self.instruments {
            if inst.id.is_empty() {
                return Err(PlanError::catalog("instrument id must not be empty"));
            }
            if !seen.insert(inst.id.as_str()) {
                return Err(PlanError::catalog(format!(
                    "duplicate instrument id {}",
                    inst.id
                )));
            }
            if !is_usable_return(inst.expected_return) {
                return Err(PlanError::catalog(format!(
                    "instrument {} expected return must be finite and above {MIN_ANNUAL_RETURN}%",
                    inst.id
                )));
            }
            if !inst.volatility.is_finite() || inst.volatility < 0.0 {
                return Err(PlanError::catalog(format!(
                    "instrument {} volatility must be >= 0",
                    inst.id
                )));
            }
        }

        for level in RiskLevel::ALL {
            let Some(p) = self.risk_profiles.get(&level) else {
                return Err(PlanError::catalog(format!(
                    "missing risk profile for {}",
                    level.as_str()
                )));
            };
            if !is_usable_return(p.expected_return) {
                return Err(PlanError::catalog(format!(
                    "risk profile {} expected return must be finite and above {MIN_ANNUAL_RETURN}%",
                    level.as_str()
                )));
            }
        }

        debug!("catalog validated");
        Ok(())
    }

    pub fn instrument(&self, id: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|inst| inst.id == id)
    }

    pub fn risk_profile(&self, level: RiskLevel) -> Result<&RiskProfile> {
        self.risk_profiles.get(&level).ok_or_else(|| {
            PlanError::catalog(format!("missing risk profile for {}", level.as_str()))
        })
    }
}

fn is_usable_return(annual_percent: f64) -> bool {
    annual_percent.is_finite() && annual_percent > MIN_ANNUAL_RETURN
}

fn instrument(
    id: &str,
    name: &str,
    expected_return: f64,
    risk_level: RiskLevel,
    volatility: f64,
    description: &str,
) -> Instrument {
    Instrument {
        id: id.to_string(),
        name: name.to_string(),
        expected_return,
        risk_level,
        volatility,
        description: description.to_string(),
    }
}

fn profile(label: &str, description: &str, expected_return: f64) -> RiskProfile {
    RiskProfile {
        label: label.to_string(),
        description: description.to_string(),
        expected_return,
    }
}
