//! Anti-explosion budget.
//!
//! Every rewriting loop in the engine and the notation resolver charges this
//! counter. Exceeding it turns a potential hang into a clean
//! [`EngineError::BudgetExceeded`].

use crate::error::EngineError;

const DEFAULT_LIMIT: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct Budget {
    limit: u64,
    used: u64,
}

impl Default for Budget {
    fn default() -> Self {
        Self::new()
    }
}

impl Budget {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }

    pub fn with_limit(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// Charge `amount` rewrite steps against the budget.
    pub fn charge(&mut self, amount: u64) -> Result<(), EngineError> {
        self.used = self.used.saturating_add(amount);
        if self.used > self.limit {
            return Err(EngineError::BudgetExceeded(self.limit));
        }
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}
