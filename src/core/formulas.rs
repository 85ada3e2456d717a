//! Closed-form compounding formulas.
//!
//! The raw functions never fail: invalid inputs propagate as IEEE `NaN` or
//! infinity. Boundary checks live in the `checked_*` variants and in the
//! simulation entry point.

use super::error::{PlanError, Result};

/// Annual returns at or below this make the monthly growth factor `1 + r`
/// non-positive.
pub const MIN_ANNUAL_RETURN: f64 = -1200.0;

fn monthly_rate(annual_return_percent: f64) -> f64 {
    annual_return_percent / 12.0 / 100.0
}

/// Future value of a fixed contribution paid at the start of each month.
pub fn sip_future_value(monthly_amount: f64, annual_return_percent: f64, years: f64) -> f64 {
    let r = monthly_rate(annual_return_percent);
    let n = years * 12.0;

    if r == 0.0 {
        return monthly_amount * n;
    }

    monthly_amount * (((1.0 + r).powf(n) - 1.0) / r) * (1.0 + r)
}

pub fn lump_sum_future_value(amount: f64, annual_return_percent: f64, years: f64) -> f64 {
    amount * (1.0 + annual_return_percent / 100.0).powf(years)
}

/// Monthly contribution that grows to `remaining_target` in `horizon_months`.
/// Inverse of [`sip_future_value`].
pub fn required_monthly_sip(
    remaining_target: f64,
    horizon_months: u32,
    annual_return_percent: f64,
) -> f64 {
    let r = monthly_rate(annual_return_percent);
    let n = f64::from(horizon_months);

    if r == 0.0 {
        return remaining_target / n;
    }

    remaining_target * r / (((1.0 + r).powf(n) - 1.0) * (1.0 + r))
}

pub fn checked_required_monthly_sip(
    remaining_target: f64,
    horizon_months: u32,
    annual_return_percent: f64,
) -> Result<f64> {
    if horizon_months == 0 {
        return Err(PlanError::invalid_goal("time horizon must be > 0 months"));
    }
    if !remaining_target.is_finite() || remaining_target < 0.0 {
        return Err(PlanError::invalid_amount("remaining target must be >= 0"));
    }
    if !annual_return_percent.is_finite() || annual_return_percent <= MIN_ANNUAL_RETURN {
        return Err(PlanError::invalid_amount(
            "annual return must be finite and above -1200%",
        ));
    }
    Ok(required_monthly_sip(
        remaining_target,
        horizon_months,
        annual_return_percent,
    ))
}

/// Percentage of `target` already saved, clamped at 100.
pub fn checked_goal_progress(current: f64, target: f64) -> Result<f64> {
    if !target.is_finite() || target <= 0.0 {
        return Err(PlanError::invalid_goal("target amount must be > 0"));
    }
    if !current.is_finite() {
        return Err(PlanError::invalid_amount("current amount must be finite"));
    }
    Ok(((current / target) * 100.0).min(100.0))
}

/// Display variant of [`checked_goal_progress`]: a degenerate target reads
/// as no progress.
pub fn goal_progress(current: f64, target: f64) -> f64 {
    checked_goal_progress(current, target).unwrap_or(0.0)
}
