use rand::Rng;
use tracing::{debug, info};

use super::catalog::Catalog;
use super::error::{PlanError, Result};
use super::formulas::sip_future_value;
use super::market::{CHART_VOLATILITY, market_path};
use super::portfolio::checked_blended_return;
use super::types::{Allocation, Goal, SimulationResult};

const SUCCESS_SCORE_BASE: f64 = 60.0;
const SUCCESS_SCORE_PER_RETURN_POINT: f64 = 2.0;
const SUCCESS_SCORE_CAP: f64 = 95.0;

/// Projects a monthly SIP into `allocation` over the goal's horizon.
///
/// The allocation must reference known instruments and sum to 100. `rng`
/// only drives the decorative `chart_data` path; every other field is a
/// pure function of the inputs.
pub fn run_simulation<R>(
    catalog: &Catalog,
    goal: &Goal,
    allocation: &Allocation,
    monthly_contribution: f64,
    rng: &mut R,
) -> Result<SimulationResult>
where
    R: Rng + ?Sized,
{
    goal.validate()?;
    if !monthly_contribution.is_finite() || monthly_contribution < 0.0 {
        return Err(PlanError::invalid_amount("monthly contribution must be >= 0"));
    }

    let blended = checked_blended_return(catalog, allocation)?;
    debug!(goal = %goal.id, blended, "resolved blended return");

    let chart_data: Vec<f64> =
        market_path(blended, CHART_VOLATILITY, goal.time_horizon, rng).collect();
    let result = project(goal, blended, monthly_contribution, chart_data);

    info!(
        goal = %goal.id,
        months = goal.time_horizon,
        monthly = monthly_contribution,
        final_amount = result.final_amount,
        achieved = result.goal_achieved,
        "simulation complete"
    );
    Ok(result)
}

fn project(
    goal: &Goal,
    blended_return: f64,
    monthly_contribution: f64,
    chart_data: Vec<f64>,
) -> SimulationResult {
    let months = goal.time_horizon;
    let final_amount =
        sip_future_value(monthly_contribution, blended_return, f64::from(months) / 12.0);
    let total_invested = monthly_contribution * f64::from(months);
    let returns = final_amount - total_invested;
    let return_percentage = if total_invested > 0.0 {
        returns / total_invested * 100.0
    } else {
        0.0
    };

    SimulationResult {
        final_amount,
        total_invested,
        returns,
        return_percentage,
        goal_achieved: final_amount >= goal.target_amount,
        success_probability: success_score(blended_return),
        blended_return,
        monthly_amount: monthly_contribution,
        time_horizon: months,
        chart_data,
    }
}

/// Ad hoc confidence score that rises with the blended return. Not derived
/// from the simulated path.
pub fn success_score(blended_return: f64) -> f64 {
    (SUCCESS_SCORE_BASE + blended_return * SUCCESS_SCORE_PER_RETURN_POINT).min(SUCCESS_SCORE_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::seeded_rng;
    use crate::core::portfolio::suggested_allocation;
    use crate::core::types::{Instrument, MAX_HORIZON_MONTHS, RiskLevel};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn catalog_with_twelve_percent_fund() -> Catalog {
        let mut catalog = Catalog::builtin();
        catalog.instruments.push(Instrument {
            id: "index_fund".to_string(),
            name: "Index Fund".to_string(),
            expected_return: 12.0,
            risk_level: RiskLevel::Medium,
            volatility: 16.0,
            description: String::new(),
        });
        catalog
    }

    fn sample_goal() -> Goal {
        let mut goal = Goal::new(100_000.0, 12, RiskLevel::Medium);
        goal.id = "goal-1".to_string();
        goal
    }

    #[test]
    fn one_year_twelve_percent_scenario() {
        let catalog = catalog_with_twelve_percent_fund();
        let allocation: Allocation = [("index_fund", 100.0)].into_iter().collect();
        let mut rng = seeded_rng(Some(7));

        let result = run_simulation(&catalog, &sample_goal(), &allocation, 5_000.0, &mut rng)
            .expect("valid simulation");

        let expected_final = 5_000.0 * ((1.01_f64.powi(12) - 1.0) / 0.01) * 1.01;
        assert_approx(result.final_amount, expected_final);
        assert_approx_tol(result.final_amount, 64_046.64, 0.01);
        assert_approx(result.total_invested, 60_000.0);
        assert_approx(result.returns, expected_final - 60_000.0);
        assert_approx(result.return_percentage, (expected_final - 60_000.0) / 600.0);
        assert!(!result.goal_achieved);
        assert_approx(result.blended_return, 12.0);
        assert_approx(result.success_probability, 84.0);
        assert_eq!(result.time_horizon, 12);
        assert_approx(result.monthly_amount, 5_000.0);
        assert_eq!(result.chart_data.len(), 12);
    }

    #[test]
    fn goal_achieved_when_projection_meets_target() {
        let catalog = Catalog::builtin();
        let mut goal = sample_goal();
        goal.target_amount = 60_000.0;
        let allocation: Allocation = [("fixed_deposits", 100.0)].into_iter().collect();
        let mut rng = seeded_rng(Some(1));

        let result =
            run_simulation(&catalog, &goal, &allocation, 5_000.0, &mut rng).expect("valid");
        assert!(result.goal_achieved);
        assert!(result.returns > 0.0);
    }

    #[test]
    fn zero_contribution_reports_zero_gain_percentage() {
        let catalog = Catalog::builtin();
        let allocation = suggested_allocation(RiskLevel::Low);
        let mut rng = seeded_rng(Some(3));

        let result =
            run_simulation(&catalog, &sample_goal(), &allocation, 0.0, &mut rng).expect("valid");
        assert_approx(result.final_amount, 0.0);
        assert_approx(result.total_invested, 0.0);
        assert_approx(result.return_percentage, 0.0);
        assert!(!result.goal_achieved);
    }

    #[test]
    fn numeric_fields_ignore_the_random_source() {
        let catalog = Catalog::builtin();
        let allocation = suggested_allocation(RiskLevel::High);
        let goal = sample_goal();

        let a = run_simulation(&catalog, &goal, &allocation, 2_500.0, &mut seeded_rng(Some(1)))
            .expect("valid");
        let b = run_simulation(&catalog, &goal, &allocation, 2_500.0, &mut seeded_rng(Some(2)))
            .expect("valid");
        assert_eq!(a.final_amount, b.final_amount);
        assert_eq!(a.success_probability, b.success_probability);
        assert_ne!(a.chart_data, b.chart_data);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let catalog = Catalog::builtin();
        let allocation = suggested_allocation(RiskLevel::Medium);
        let goal = sample_goal();

        let a = run_simulation(&catalog, &goal, &allocation, 1_000.0, &mut seeded_rng(Some(9)))
            .expect("valid");
        let b = run_simulation(&catalog, &goal, &allocation, 1_000.0, &mut seeded_rng(Some(9)))
            .expect("valid");
        assert_eq!(a.chart_data, b.chart_data);
    }

    #[test]
    fn rejects_incomplete_allocation() {
        let catalog = Catalog::builtin();
        let allocation: Allocation = [("stocks", 40.0)].into_iter().collect();
        let err = run_simulation(
            &catalog,
            &sample_goal(),
            &allocation,
            1_000.0,
            &mut seeded_rng(Some(1)),
        )
        .expect_err("40% is not a full allocation");
        assert_eq!(err, PlanError::IncompleteAllocation { total: 40.0 });
    }

    #[test]
    fn rejects_zero_horizon_and_zero_target() {
        let catalog = Catalog::builtin();
        let allocation = suggested_allocation(RiskLevel::Medium);

        let mut goal = sample_goal();
        goal.time_horizon = 0;
        let err = run_simulation(&catalog, &goal, &allocation, 1_000.0, &mut seeded_rng(Some(1)))
            .expect_err("zero horizon");
        assert!(matches!(err, PlanError::InvalidGoal(_)));

        let mut goal = sample_goal();
        goal.target_amount = 0.0;
        let err = run_simulation(&catalog, &goal, &allocation, 1_000.0, &mut seeded_rng(Some(1)))
            .expect_err("zero target");
        assert!(matches!(err, PlanError::InvalidGoal(_)));
    }

    #[test]
    fn rejects_horizon_beyond_cap_before_building_the_path() {
        let catalog = Catalog::builtin();
        let allocation = suggested_allocation(RiskLevel::Medium);

        let mut goal = sample_goal();
        goal.time_horizon = 4_000_000_000;
        let err = run_simulation(&catalog, &goal, &allocation, 1_000.0, &mut seeded_rng(Some(1)))
            .expect_err("horizon far beyond the cap");
        assert!(matches!(err, PlanError::InvalidGoal(_)));

        goal.time_horizon = MAX_HORIZON_MONTHS + 1;
        assert!(
            run_simulation(&catalog, &goal, &allocation, 1_000.0, &mut seeded_rng(Some(1)))
                .is_err()
        );

        goal.time_horizon = MAX_HORIZON_MONTHS;
        let result =
            run_simulation(&catalog, &goal, &allocation, 1_000.0, &mut seeded_rng(Some(1)))
                .expect("horizon at the cap");
        assert_eq!(result.chart_data.len(), MAX_HORIZON_MONTHS as usize);
    }

    #[test]
    fn rejects_negative_contribution() {
        let catalog = Catalog::builtin();
        let allocation = suggested_allocation(RiskLevel::Medium);
        let err = run_simulation(
            &catalog,
            &sample_goal(),
            &allocation,
            -1.0,
            &mut seeded_rng(Some(1)),
        )
        .expect_err("negative contribution");
        assert!(matches!(err, PlanError::InvalidAmount(_)));
    }

    #[test]
    fn success_score_is_capped() {
        assert_approx(success_score(0.0), 60.0);
        assert_approx(success_score(11.5), 83.0);
        assert_approx(success_score(17.5), 95.0);
        assert_approx(success_score(40.0), 95.0);
    }
}
