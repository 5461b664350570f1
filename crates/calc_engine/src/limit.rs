//! Limit evaluation.
//!
//! Finite targets go through direct substitution, with a depth-bounded
//! L'Hopital fallback for 0/0 quotients. Infinite targets use the leading
//! term of the expression viewed as a rational function of the variable.

use crate::budget::Budget;
use crate::calculus::differentiate;
use crate::error::EngineError;
use crate::helpers::{as_number, substitute};
use crate::simplify::simplify;
use calc_ast::{Constant, Context, DisplayExpr, Expr, ExprId};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

const LHOPITAL_MAX_DEPTH: u32 = 4;

fn display(ctx: &Context, id: ExprId) -> String {
    format!("{}", DisplayExpr { context: ctx, id })
}

/// Limit of `expr` as `var` approaches `target`.
pub fn limit(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    target: ExprId,
    budget: &mut Budget,
) -> Result<ExprId, EngineError> {
    tracing::debug!(
        expr = %DisplayExpr { context: ctx, id: expr },
        var,
        target = %DisplayExpr { context: ctx, id: target },
        "limit"
    );
    match infinity_sign(ctx, target) {
        Some(negative) => limit_at_infinity(ctx, expr, var, negative, budget),
        None => limit_finite(ctx, expr, var, target, budget, 0),
    }
}

/// `Some(true)` for -oo, `Some(false)` for +oo, `None` for finite targets.
fn infinity_sign(ctx: &Context, target: ExprId) -> Option<bool> {
    match ctx.get(target) {
        Expr::Constant(Constant::Infinity) => Some(false),
        Expr::Neg(inner) => match ctx.get(*inner) {
            Expr::Constant(Constant::Infinity) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn limit_finite(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    target: ExprId,
    budget: &mut Budget,
    depth: u32,
) -> Result<ExprId, EngineError> {
    budget.charge(1)?;

    if let Expr::Div(num, den) = ctx.get(expr).clone() {
        let num_sub = substitute(ctx, num, var, target);
        let den_sub = substitute(ctx, den, var, target);
        let num_val = simplify(ctx, num_sub, budget)?;
        let den_val = simplify(ctx, den_sub, budget)?;

        let num_zero = as_number(ctx, num_val).is_some_and(|n| n.is_zero());
        let den_zero = as_number(ctx, den_val).is_some_and(|n| n.is_zero());

        if num_zero && den_zero {
            // 0/0 indeterminate form: L'Hopital.
            if depth >= LHOPITAL_MAX_DEPTH {
                return Err(unresolved(ctx, expr, var, target));
            }
            let dn = differentiate(ctx, num, var, 1, budget)?;
            let dd = differentiate(ctx, den, var, 1, budget)?;
            let ratio = ctx.add(Expr::Div(dn, dd));
            return limit_finite(ctx, ratio, var, target, budget, depth + 1);
        }
        if den_zero {
            return Err(unresolved(ctx, expr, var, target));
        }
        let quotient = ctx.add(Expr::Div(num_val, den_val));
        return simplify(ctx, quotient, budget);
    }

    let substituted = substitute(ctx, expr, var, target);
    let value = simplify(ctx, substituted, budget)?;
    if has_zero_denominator(ctx, value) {
        return Err(EngineError::DivisionByZero(display(ctx, value)));
    }
    Ok(value)
}

fn has_zero_denominator(ctx: &Context, expr: ExprId) -> bool {
    match ctx.get(expr) {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => false,
        Expr::Div(l, r) => {
            ctx.is_zero(*r) || has_zero_denominator(ctx, *l) || has_zero_denominator(ctx, *r)
        }
        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Pow(l, r) => {
            has_zero_denominator(ctx, *l) || has_zero_denominator(ctx, *r)
        }
        Expr::Neg(e) => has_zero_denominator(ctx, *e),
        Expr::Function(_, args) => args.iter().any(|a| has_zero_denominator(ctx, *a)),
    }
}

fn limit_at_infinity(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    negative: bool,
    budget: &mut Budget,
) -> Result<ExprId, EngineError> {
    budget.charge(1)?;

    let target_name = if negative { "-oo" } else { "oo" };
    let (degree, lead) = leading_term(ctx, expr, var).ok_or_else(|| {
        EngineError::UnresolvedLimit(display(ctx, expr), var.to_string(), target_name.to_string())
    })?;

    if degree < 0 {
        return Ok(ctx.num(0));
    }
    if degree == 0 {
        return Ok(ctx.num_rational(lead));
    }

    // x^d at -oo flips sign for odd d.
    let mut positive = lead.is_positive();
    if negative && degree % 2 == 1 {
        positive = !positive;
    }
    let inf = ctx.constant(Constant::Infinity);
    if positive {
        Ok(inf)
    } else {
        Ok(ctx.add(Expr::Neg(inf)))
    }
}

/// Degree and leading coefficient of `expr` as a rational function of `var`.
///
/// Negative degrees come from quotients like `1/x`. `None` means the
/// expression is not a rational function of the variable (trig, logs, ...).
fn leading_term(ctx: &Context, expr: ExprId, var: &str) -> Option<(i64, BigRational)> {
    match ctx.get(expr) {
        Expr::Number(n) => Some((0, n.clone())),
        Expr::Variable(v) => {
            if v == var {
                Some((1, BigRational::from_integer(1.into())))
            } else {
                None
            }
        }
        Expr::Constant(_) => None,
        Expr::Add(l, r) | Expr::Sub(l, r) => {
            let is_sub = matches!(ctx.get(expr), Expr::Sub(_, _));
            let (dl, cl) = leading_term(ctx, *l, var)?;
            let (dr, cr) = leading_term(ctx, *r, var)?;
            let cr = if is_sub { -cr } else { cr };
            match dl.cmp(&dr) {
                std::cmp::Ordering::Greater => Some((dl, cl)),
                std::cmp::Ordering::Less => Some((dr, cr)),
                std::cmp::Ordering::Equal => {
                    let sum = cl + cr;
                    if sum.is_zero() {
                        // leading terms cancel; lower-order terms are not tracked
                        None
                    } else {
                        Some((dl, sum))
                    }
                }
            }
        }
        Expr::Mul(l, r) => {
            let (dl, cl) = leading_term(ctx, *l, var)?;
            let (dr, cr) = leading_term(ctx, *r, var)?;
            Some((dl + dr, cl * cr))
        }
        Expr::Div(l, r) => {
            let (dl, cl) = leading_term(ctx, *l, var)?;
            let (dr, cr) = leading_term(ctx, *r, var)?;
            if cr.is_zero() {
                return None;
            }
            Some((dl - dr, cl / cr))
        }
        Expr::Pow(b, e) => {
            let (db, cb) = leading_term(ctx, *b, var)?;
            let n = match ctx.get(*e) {
                Expr::Number(n) if n.is_integer() => i64::try_from(n.numer().clone()).ok()?,
                _ => return None,
            };
            let degree = db.checked_mul(n)?;
            Some((degree, pow_coeff(&cb, n)?))
        }
        Expr::Neg(inner) => {
            let (d, c) = leading_term(ctx, *inner, var)?;
            Some((d, -c))
        }
        Expr::Function(_, _) => None,
    }
}

/// Leading coefficient raised to an integer exponent. A unit base skips the
/// loop, so plain `x^n` resolves for any `n`; other bases are capped the same
/// way simplify's constant folding caps exponents.
fn pow_coeff(base: &BigRational, n: i64) -> Option<BigRational> {
    if base.is_one() {
        return Some(BigRational::one());
    }
    if n < 0 && base.is_zero() {
        return None;
    }
    if n.unsigned_abs() > 64 {
        return None;
    }
    let mut acc = BigRational::one();
    for _ in 0..n.unsigned_abs() {
        acc *= base;
    }
    if n < 0 {
        acc = acc.recip();
    }
    Some(acc)
}

fn unresolved(ctx: &Context, expr: ExprId, var: &str, target: ExprId) -> EngineError {
    EngineError::UnresolvedLimit(
        display(ctx, expr),
        var.to_string(),
        display(ctx, target),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_parser::parse;

    fn lim_str(input: &str, var: &str, target: &str) -> Result<String, EngineError> {
        let mut ctx = Context::new();
        let e = parse(input, &mut ctx).unwrap();
        let t = parse(target, &mut ctx).unwrap();
        let mut budget = Budget::new();
        limit(&mut ctx, e, var, t, &mut budget).map(|r| display(&ctx, r))
    }

    #[test]
    fn test_direct_substitution() {
        assert_eq!(lim_str("x^2 + 1", "x", "2").unwrap(), "5");
        assert_eq!(lim_str("sin(x)", "x", "0").unwrap(), "0");
    }

    #[test]
    fn test_lhopital_sin_over_x() {
        assert_eq!(lim_str("sin(x) / x", "x", "0").unwrap(), "1");
    }

    #[test]
    fn test_lhopital_polynomial_quotient() {
        // (x^2 - 1)/(x - 1) -> 2 as x -> 1
        assert_eq!(lim_str("(x^2 - 1) / (x - 1)", "x", "1").unwrap(), "2");
    }

    #[test]
    fn test_one_over_x_at_infinity() {
        assert_eq!(lim_str("1 / x", "x", "oo").unwrap(), "0");
    }

    #[test]
    fn test_polynomial_at_infinity() {
        assert_eq!(lim_str("x^2", "x", "oo").unwrap(), "oo");
        assert_eq!(lim_str("x^3", "x", "-oo").unwrap(), "-oo");
        assert_eq!(lim_str("x^2", "x", "-oo").unwrap(), "oo");
    }

    #[test]
    fn test_rational_function_at_infinity() {
        // degrees match: ratio of leading coefficients
        assert_eq!(lim_str("(2 * x^2 + 1) / x^2", "x", "oo").unwrap(), "2");
    }

    #[test]
    fn test_huge_exponent_at_infinity() {
        // unit leading coefficient: no folding needed, any exponent resolves
        assert_eq!(
            lim_str("x^1000000000000000000", "x", "oo").unwrap(),
            "oo"
        );
        // non-unit coefficient would need 2^100: declined, not computed
        assert!(matches!(
            lim_str("(2 * x)^100", "x", "oo"),
            Err(EngineError::UnresolvedLimit(_, _, _))
        ));
    }

    #[test]
    fn test_unresolved_at_infinity() {
        assert!(matches!(
            lim_str("sin(x)", "x", "oo"),
            Err(EngineError::UnresolvedLimit(_, _, _))
        ));
    }

    #[test]
    fn test_nonzero_over_zero_unresolved() {
        assert!(matches!(
            lim_str("1 / x", "x", "0"),
            Err(EngineError::UnresolvedLimit(_, _, _))
        ));
    }
}
