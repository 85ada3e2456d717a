//! Per-goal savings plans and goal-list views.
//!
//! Plans price the remaining amount at the goal's risk-profile return, not
//! at the blended return of whatever allocation the user later simulates.

use std::cmp::Ordering;

use super::catalog::Catalog;
use super::error::Result;
use super::formulas::{checked_goal_progress, checked_required_monthly_sip, lump_sum_future_value};
use super::types::{Goal, GoalPlan, GoalStatus, GoalSummary};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GoalOrder {
    /// High priority first.
    #[default]
    Priority,
    /// Largest target first.
    Amount,
    /// Shortest horizon first.
    Deadline,
}

pub fn plan_goal(catalog: &Catalog, goal: &Goal) -> Result<GoalPlan> {
    goal.validate()?;
    let profile = catalog.risk_profile(goal.risk_tolerance)?;

    let remaining = goal.remaining_amount();
    let required =
        checked_required_monthly_sip(remaining, goal.time_horizon, profile.expected_return)?;

    Ok(GoalPlan {
        goal_id: goal.id.clone(),
        category_label: goal.category.label().to_string(),
        progress: checked_goal_progress(goal.current_amount, goal.target_amount)?,
        remaining_amount: remaining,
        required_monthly_sip: required,
        profile_label: profile.label.clone(),
        profile_return: profile.expected_return,
        projected_current_amount: lump_sum_future_value(
            goal.current_amount,
            profile.expected_return,
            f64::from(goal.time_horizon) / 12.0,
        ),
    })
}

pub fn summarize_goals(goals: &[Goal]) -> GoalSummary {
    let total_target: f64 = goals.iter().map(|g| g.target_amount).sum();
    let total_current: f64 = goals.iter().map(|g| g.current_amount).sum();
    let overall_progress = if total_target > 0.0 {
        total_current / total_target * 100.0
    } else {
        0.0
    };

    let average_horizon_months = if goals.is_empty() {
        0
    } else {
        let total: u64 = goals.iter().map(|g| u64::from(g.time_horizon)).sum();
        (total as f64 / goals.len() as f64).round() as u32
    };

    GoalSummary {
        total_target,
        total_current,
        overall_progress,
        active_goals: goals
            .iter()
            .filter(|g| g.status == GoalStatus::Active)
            .count(),
        average_horizon_months,
    }
}

/// Stable sort; goals that tie keep their input order.
pub fn sort_goals(goals: &mut [Goal], order: GoalOrder) {
    match order {
        GoalOrder::Priority => goals.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        GoalOrder::Amount => goals.sort_by(|a, b| {
            b.target_amount
                .partial_cmp(&a.target_amount)
                .unwrap_or(Ordering::Equal)
        }),
        GoalOrder::Deadline => goals.sort_by_key(|g| g.time_horizon),
    }
}

/// `None` keeps every goal.
pub fn filter_goals(goals: &[Goal], status: Option<GoalStatus>) -> Vec<Goal> {
    goals
        .iter()
        .filter(|g| status.is_none_or(|s| g.status == s))
        .cloned()
        .collect()
}
