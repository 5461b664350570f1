//! Structural resolution of the operator tree.
//!
//! The tree is reduced outermost-first. Four two-level compositions are
//! intercepted and resolved by calculus identities before generic reduction,
//! because generic reduction cannot decide which variable a limit closes
//! over versus which remains free:
//!
//! 1. integral of a derivative in the same variable (Fundamental Theorem of
//!    Calculus cancels both);
//! 2. derivative of an indefinite integral over a different variable (the
//!    integrand, re-expressed in the outer variable);
//! 3. derivative of a limit that is constant in the outer variable (zero);
//! 4. integral of a limit whose target is the integration variable (the
//!    integrand with the bound variable substituted).
//!
//! Everything else evaluates the operand recursively and calls the matching
//! engine primitive. Every reduction charges the shared budget.

use crate::ast::CalcNode;
use crate::error::NotationError;
use crate::preprocess::insert_multiplication;
use crate::steps::Trace;
use calc_ast::{Context, DisplayExpr, ExprId};
use calc_engine::helpers::rename_var;
use calc_engine::{
    contains_var, differentiate, integrate, integrate_definite, limit, simplify, Budget,
};

fn display(ctx: &Context, id: ExprId) -> String {
    format!("{}", DisplayExpr { context: ctx, id })
}

/// Reduce a notation tree to an engine expression.
pub fn resolve(
    ctx: &mut Context,
    node: &CalcNode,
    budget: &mut Budget,
    trace: &mut Trace,
) -> Result<ExprId, NotationError> {
    budget.charge(1)?;
    match node {
        CalcNode::Algebraic(text) => parse_algebraic(ctx, text, trace),

        CalcNode::Derivative { order: 1, var, expr } => match expr.as_ref() {
            CalcNode::Integral {
                var: ivar,
                bounds: None,
                expr: inner,
            } if ivar != var => {
                let value = resolve(ctx, inner, budget, trace)?;
                let renamed = rename_var(ctx, value, ivar, var);
                trace.push(
                    "ftc",
                    format!(
                        "By the Fundamental Theorem of Calculus: d/d{var}(∫f({ivar}) d{ivar}) = f({var})"
                    ),
                );
                simplify(ctx, renamed, budget).map_err(NotationError::from)
            }
            CalcNode::Limit {
                var: lvar,
                target,
                expr: inner,
            } if lvar != var => {
                let value = resolve(ctx, inner, budget, trace)?;
                if !contains_var(ctx, value, var) {
                    trace.push(
                        "constant-limit",
                        format!(
                            "lim_{{{lvar}->{target}}} does not depend on {var}, so its derivative is 0"
                        ),
                    );
                    Ok(ctx.num(0))
                } else {
                    let limit_value = reduce_limit(ctx, value, lvar, target, budget, trace)?;
                    reduce_derivative(ctx, limit_value, var, 1, budget, trace)
                }
            }
            _ => {
                let value = resolve(ctx, expr, budget, trace)?;
                reduce_derivative(ctx, value, var, 1, budget, trace)
            }
        },

        CalcNode::Derivative { order, var, expr } => {
            let value = resolve(ctx, expr, budget, trace)?;
            reduce_derivative(ctx, value, var, *order, budget, trace)
        }

        CalcNode::Partial { vars, expr } => {
            let mut value = resolve(ctx, expr, budget, trace)?;
            for v in vars {
                let next = differentiate(ctx, value, v, 1, budget)?;
                trace.push(
                    "partial",
                    format!("∂/∂{v} {} = {}", display(ctx, value), display(ctx, next)),
                );
                value = next;
            }
            Ok(value)
        }

        CalcNode::Integral {
            var,
            bounds: None,
            expr,
        } => match expr.as_ref() {
            CalcNode::Derivative {
                order: 1,
                var: dvar,
                expr: inner,
            } if dvar == var => {
                let value = resolve(ctx, inner, budget, trace)?;
                trace.push(
                    "ftc",
                    format!(
                        "By the Fundamental Theorem of Calculus: ∫(d/d{var} f({var})) d{var} = f({var}) + C"
                    ),
                );
                simplify(ctx, value, budget).map_err(NotationError::from)
            }
            CalcNode::Limit {
                var: lvar,
                target,
                expr: inner,
            } if target == var => {
                let value = resolve(ctx, inner, budget, trace)?;
                let renamed = rename_var(ctx, value, lvar, var);
                trace.push(
                    "limit-substitution",
                    format!(
                        "As {lvar} approaches {var}, the limit is the integrand with {lvar} = {var}"
                    ),
                );
                reduce_integral(ctx, renamed, var, budget, trace)
            }
            _ => {
                let value = resolve(ctx, expr, budget, trace)?;
                reduce_integral(ctx, value, var, budget, trace)
            }
        },

        CalcNode::Integral {
            var,
            bounds: Some((lower, upper)),
            expr,
        } => {
            let value = resolve(ctx, expr, budget, trace)?;
            let lo = parse_algebraic(ctx, lower, trace)?;
            let hi = parse_algebraic(ctx, upper, trace)?;
            let result = integrate_definite(ctx, value, var, lo, hi, budget)?;
            trace.push(
                "definite-integral",
                format!(
                    "Integrate {} with respect to {var} from {lower} to {upper}: {}",
                    display(ctx, value),
                    display(ctx, result)
                ),
            );
            Ok(result)
        }

        CalcNode::Limit { var, target, expr } => {
            let value = resolve(ctx, expr, budget, trace)?;
            reduce_limit(ctx, value, var, target, budget, trace)
        }
    }
}

fn reduce_derivative(
    ctx: &mut Context,
    value: ExprId,
    var: &str,
    order: u32,
    budget: &mut Budget,
    trace: &mut Trace,
) -> Result<ExprId, NotationError> {
    let result = differentiate(ctx, value, var, order, budget)?;
    let description = if order == 1 {
        format!(
            "Differentiate {} with respect to {var}: {}",
            display(ctx, value),
            display(ctx, result)
        )
    } else {
        format!(
            "Differentiate {} {order} times with respect to {var}: {}",
            display(ctx, value),
            display(ctx, result)
        )
    };
    trace.push("differentiate", description);
    Ok(result)
}

fn reduce_integral(
    ctx: &mut Context,
    value: ExprId,
    var: &str,
    budget: &mut Budget,
    trace: &mut Trace,
) -> Result<ExprId, NotationError> {
    let result = integrate(ctx, value, var, budget)?;
    trace.push(
        "integrate",
        format!(
            "Integrate {} with respect to {var}: {} + C",
            display(ctx, value),
            display(ctx, result)
        ),
    );
    Ok(result)
}

fn reduce_limit(
    ctx: &mut Context,
    value: ExprId,
    var: &str,
    target_text: &str,
    budget: &mut Budget,
    trace: &mut Trace,
) -> Result<ExprId, NotationError> {
    let target = parse_algebraic(ctx, target_text, trace)?;
    let result = limit(ctx, value, var, target, budget)?;
    trace.push(
        "limit",
        format!(
            "Limit of {} as {var} -> {target_text}: {}",
            display(ctx, value),
            display(ctx, result)
        ),
    );
    Ok(result)
}

/// Parse operand text with the engine parser. On failure, retry once with
/// implicit multiplication re-inserted before surfacing the original error.
fn parse_algebraic(
    ctx: &mut Context,
    text: &str,
    trace: &mut Trace,
) -> Result<ExprId, NotationError> {
    match calc_parser::parse(text, ctx) {
        Ok(id) => Ok(id),
        Err(first) => {
            let retried = insert_multiplication(text);
            if retried != text {
                if let Ok(id) = calc_parser::parse(&retried, ctx) {
                    trace.push(
                        "implicit-multiplication",
                        format!("Reread {text} as {retried}"),
                    );
                    return Ok(id);
                }
            }
            Err(first.into())
        }
    }
}
