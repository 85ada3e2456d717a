use tracing::warn;

use super::catalog::Catalog;
use super::error::{PlanError, Result};
use super::types::{Allocation, RiskLevel};

/// Weighted expected annual return of `allocation`, in percent.
///
/// Unknown instrument ids are skipped and weights are not required to sum to
/// 100, so a partial allocation yields a partial return. Use
/// [`checked_blended_return`] before running a simulation.
pub fn blended_return(catalog: &Catalog, allocation: &Allocation) -> f64 {
    let mut weighted = 0.0;
    for (id, pct) in allocation.iter() {
        if pct <= 0.0 {
            continue;
        }
        match catalog.instrument(id) {
            Some(inst) => weighted += inst.expected_return * pct / 100.0,
            None => warn!(instrument = id, "skipping unknown instrument in allocation"),
        }
    }
    weighted
}

pub fn checked_blended_return(catalog: &Catalog, allocation: &Allocation) -> Result<f64> {
    for (id, pct) in allocation.iter() {
        if !pct.is_finite() || pct < 0.0 {
            return Err(PlanError::InvalidAllocation(format!(
                "weight for {id} must be a non-negative number, got {pct}"
            )));
        }
        if pct > 0.0 && catalog.instrument(id).is_none() {
            return Err(PlanError::UnknownInstrument(id.to_string()));
        }
    }

    if !allocation.is_complete() {
        return Err(PlanError::IncompleteAllocation {
            total: allocation.total(),
        });
    }

    Ok(blended_return(catalog, allocation))
}

/// Starting allocation offered for a goal's risk tolerance.
pub fn suggested_allocation(risk: RiskLevel) -> Allocation {
    let weights: [(&str, f64); 5] = match risk {
        RiskLevel::Low => [
            ("fixed_deposits", 40.0),
            ("bonds", 35.0),
            ("mutual_funds", 20.0),
            ("gold", 5.0),
            ("stocks", 0.0),
        ],
        RiskLevel::Medium => [
            ("mutual_funds", 50.0),
            ("bonds", 25.0),
            ("stocks", 15.0),
            ("gold", 10.0),
            ("fixed_deposits", 0.0),
        ],
        RiskLevel::High => [
            ("stocks", 60.0),
            ("mutual_funds", 30.0),
            ("gold", 10.0),
            ("bonds", 0.0),
            ("fixed_deposits", 0.0),
        ],
    };
    weights.into_iter().collect()
}
