use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{PlanError, Result};

/// Weights are compared against 100 with this slack so that decimal inputs
/// such as `33.3 + 33.3 + 33.4` are accepted.
pub const ALLOCATION_TOLERANCE: f64 = 1e-9;

/// Longest accepted goal horizon, 100 years. Bounds the chart path length.
pub const MAX_HORIZON_MONTHS: u32 = 1200;

#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Vehicle,
    Vacation,
    Retirement,
    Emergency,
    Education,
    #[default]
    Other,
}

impl GoalCategory {
    pub fn label(self) -> &'static str {
        match self {
            GoalCategory::Vehicle => "Vehicle Purchase",
            GoalCategory::Vacation => "Dream Vacation",
            GoalCategory::Retirement => "Retirement Fund",
            GoalCategory::Emergency => "Emergency Fund",
            GoalCategory::Education => "Education",
            GoalCategory::Other => "Other Goal",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl GoalPriority {
    /// Higher rank sorts first.
    pub fn rank(self) -> u8 {
        match self {
            GoalPriority::High => 3,
            GoalPriority::Medium => 2,
            GoalPriority::Low => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    /// Months.
    pub time_horizon: u32,
    pub risk_tolerance: RiskLevel,
    #[serde(default)]
    pub category: GoalCategory,
    #[serde(default)]
    pub priority: GoalPriority,
    #[serde(default)]
    pub status: GoalStatus,
}

impl Goal {
    pub fn new(target_amount: f64, time_horizon: u32, risk_tolerance: RiskLevel) -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            target_amount,
            current_amount: 0.0,
            time_horizon,
            risk_tolerance,
            category: GoalCategory::default(),
            priority: GoalPriority::default(),
            status: GoalStatus::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_amount.is_finite() || self.target_amount <= 0.0 {
            return Err(PlanError::invalid_goal("target amount must be > 0"));
        }
        if self.time_horizon == 0 {
            return Err(PlanError::invalid_goal("time horizon must be > 0 months"));
        }
        if self.time_horizon > MAX_HORIZON_MONTHS {
            return Err(PlanError::invalid_goal(format!(
                "time horizon must be at most {MAX_HORIZON_MONTHS} months"
            )));
        }
        if !self.current_amount.is_finite() || self.current_amount < 0.0 {
            return Err(PlanError::invalid_goal("current amount must be >= 0"));
        }
        Ok(())
    }

    pub fn remaining_amount(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: String,
    pub name: String,
    /// Annual, in percent.
    pub expected_return: f64,
    pub risk_level: RiskLevel,
    /// Annual, in percent.
    pub volatility: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub expected_return: f64,
}

/// Percentage weight per instrument id. Never normalized.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Allocation(BTreeMap<String, f64>);

impl Allocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> f64 {
        self.0.get(id).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, id: impl Into<String>, pct: f64) {
        self.0.insert(id.into(), pct);
    }

    /// Applies a single weight edit, refusing it when the resulting total
    /// would go over 100. The allocation is left untouched on refusal.
    pub fn try_set(&mut self, id: &str, pct: f64) -> Result<()> {
        if !pct.is_finite() || pct < 0.0 {
            return Err(PlanError::InvalidAllocation(format!(
                "weight for {id} must be >= 0"
            )));
        }
        let total = self.total() - self.get(id) + pct;
        if total > 100.0 + ALLOCATION_TOLERANCE {
            return Err(PlanError::InvalidAllocation(format!(
                "setting {id} to {pct}% would bring the total to {total}%"
            )));
        }
        self.set(id, pct);
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_complete(&self) -> bool {
        (self.total() - 100.0).abs() <= ALLOCATION_TOLERANCE
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(id, pct)| (id.as_str(), *pct))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Allocation {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(id, pct)| (id.into(), pct)).collect())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub final_amount: f64,
    pub total_invested: f64,
    pub returns: f64,
    pub return_percentage: f64,
    pub goal_achieved: bool,
    /// Heuristic confidence score in percent, not a probability estimate.
    pub success_probability: f64,
    pub blended_return: f64,
    pub monthly_amount: f64,
    pub time_horizon: u32,
    pub chart_data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    pub goal_id: String,
    pub category_label: String,
    pub progress: f64,
    pub remaining_amount: f64,
    pub required_monthly_sip: f64,
    pub profile_label: String,
    pub profile_return: f64,
    /// Current savings left to compound over the horizon at the profile return.
    pub projected_current_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub total_target: f64,
    pub total_current: f64,
    pub overall_progress: f64,
    pub active_goals: usize,
    pub average_horizon_months: u32,
}
