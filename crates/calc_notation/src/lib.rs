//! Calculus notation translator and evaluator.
//!
//! Takes shorthand like `d/dx(x^2)`, `∫_0^1 x^2 dx` or `lim_{x->0}(sin(x)/x)`,
//! parses it into a typed operator tree, resolves nested compositions via
//! calculus identities, and drives the symbolic engine to a simplified
//! result with a human-readable step trace.
//!
//! ```
//! let result = calc_notation::evaluate("d/dx(x^2)").unwrap();
//! assert_eq!(result.rendered, "2 * x");
//! assert_eq!(result.parsed, "diff(x^2, x)");
//! ```

pub mod ast;
pub mod error;
pub mod parser;
pub mod preprocess;
pub mod resolve;
pub mod steps;

pub use ast::CalcNode;
pub use error::{EvalFailure, NotationError};
pub use preprocess::preprocess;

use calc_ast::{Context, DisplayExpr, ExprId, LatexExpr};
use calc_engine::{simplify, Budget};
use steps::Trace;

/// Successful evaluation. Owns the expression arena so the value can be
/// rendered again (plain text or LaTeX) by the caller.
#[derive(Debug)]
pub struct Evaluation {
    pub context: Context,
    pub value: ExprId,
    /// Canonical call form of the recognized notation, e.g. `diff(x^2, x)`.
    pub parsed: String,
    /// Plain-text rendering of the simplified value.
    pub rendered: String,
    pub steps: Vec<String>,
}

impl Evaluation {
    pub fn latex(&self) -> String {
        format!(
            "{}",
            LatexExpr {
                context: &self.context,
                id: self.value,
            }
        )
    }
}

/// Evaluator with a configurable rewrite budget.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    budget_limit: Option<u64>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of rewrite steps one evaluation may spend.
    pub fn with_budget(limit: u64) -> Self {
        Self {
            budget_limit: Some(limit),
        }
    }

    /// Evaluate one expression. Stateless: each call owns a fresh arena and
    /// budget, so concurrent calls are independent.
    pub fn evaluate(&self, input: &str) -> Result<Evaluation, EvalFailure> {
        let processed = preprocess(input);
        tracing::debug!(input, %processed, "evaluate");
        let node = parser::parse(&processed).map_err(|error| EvalFailure {
            error,
            parsed: None,
        })?;
        let parsed = node.canonical();

        let mut ctx = Context::new();
        let mut budget = match self.budget_limit {
            Some(limit) => Budget::with_limit(limit),
            None => Budget::new(),
        };
        let mut trace = Trace::new();
        trace.push("input", format!("Evaluating: {}", input.trim()));

        let outcome = resolve::resolve(&mut ctx, &node, &mut budget, &mut trace)
            .and_then(|value| simplify(&mut ctx, value, &mut budget).map_err(NotationError::from));

        match outcome {
            Ok(value) => {
                let rendered = format!(
                    "{}",
                    DisplayExpr {
                        context: &ctx,
                        id: value,
                    }
                );
                trace.push("result", format!("Result: {rendered}"));
                Ok(Evaluation {
                    context: ctx,
                    value,
                    parsed,
                    rendered,
                    steps: trace.into_lines(),
                })
            }
            Err(error) => {
                tracing::warn!(%error, %parsed, "evaluation failed");
                Err(EvalFailure {
                    error,
                    parsed: Some(parsed),
                })
            }
        }
    }
}

/// Evaluate with the default budget.
pub fn evaluate(input: &str) -> Result<Evaluation, EvalFailure> {
    Evaluator::new().evaluate(input)
}
