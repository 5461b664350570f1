use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Cannot differentiate {0} with respect to {1}")]
    UnsupportedDerivative(String, String),
    #[error("Cannot integrate {0} with respect to {1}")]
    UnsupportedIntegral(String, String),
    #[error("Cannot determine limit of {0} as {1} -> {2}")]
    UnresolvedLimit(String, String, String),
    #[error("Division by zero in {0}")]
    DivisionByZero(String),
    #[error("Rewrite budget exceeded ({0} steps)")]
    BudgetExceeded(u64),
}
