use calc_engine::EngineError;
use calc_parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotationError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Engine(EngineError),
    #[error("Unsupported notation: {0}")]
    UnsupportedNotation(String),
    #[error("Rewrite budget exceeded")]
    RewriteBudget,
}

impl From<EngineError> for NotationError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::BudgetExceeded(_) => NotationError::RewriteBudget,
            other => NotationError::Engine(other),
        }
    }
}

/// Failed evaluation, carrying the best-known canonical form for diagnosis.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct EvalFailure {
    pub error: NotationError,
    pub parsed: Option<String>,
}
