use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("invalid goal parameters: {0}")]
    InvalidGoal(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("invalid allocation: {0}")]
    InvalidAllocation(String),

    /// Weights must sum to exactly 100 before a simulation runs.
    #[error("incomplete allocation: weights sum to {total}%, expected 100%")]
    IncompleteAllocation { total: f64 },

    #[error("catalog error: {0}")]
    Catalog(String),
}

impl PlanError {
    pub fn invalid_goal(msg: impl Into<String>) -> Self {
        Self::InvalidGoal(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }
}
