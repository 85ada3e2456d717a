mod catalog;
mod engine;
mod error;
mod formulas;
mod market;
mod planner;
mod portfolio;
mod types;

pub use catalog::Catalog;
pub use engine::{run_simulation, success_score};
pub use error::{PlanError, Result};
pub use formulas::{
    MIN_ANNUAL_RETURN, checked_goal_progress, checked_required_monthly_sip, goal_progress,
    lump_sum_future_value, required_monthly_sip, sip_future_value,
};
pub use market::{
    CHART_VOLATILITY, INDEX_START, MarketPath, market_path, market_path_from_factors, seeded_rng,
};
pub use planner::{GoalOrder, filter_goals, plan_goal, sort_goals, summarize_goals};
pub use portfolio::{blended_return, checked_blended_return, suggested_allocation};
pub use types::{
    ALLOCATION_TOLERANCE, Allocation, Goal, GoalCategory, GoalPlan, GoalPriority, GoalStatus,
    GoalSummary, Instrument, MAX_HORIZON_MONTHS, RiskLevel, RiskProfile, SimulationResult,
};
