//! Bottom-up simplification to a fixed point.
//!
//! Each pass rewrites every node once, children first. Passes repeat until
//! the tree stops changing; the budget bounds the loop so adversarial input
//! fails cleanly instead of spinning.

use crate::budget::Budget;
use crate::error::EngineError;
use crate::helpers::{as_integer, as_number};
use calc_ast::{Context, Expr, ExprId};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Simplify `expr` until no rule applies.
pub fn simplify(
    ctx: &mut Context,
    expr: ExprId,
    budget: &mut Budget,
) -> Result<ExprId, EngineError> {
    let mut current = expr;
    loop {
        budget.charge(1)?;
        let next = simplify_pass(ctx, current);
        if ctx.eq(next, current) {
            return Ok(next);
        }
        current = next;
    }
}

fn simplify_pass(ctx: &mut Context, id: ExprId) -> ExprId {
    let node = ctx.get(id).clone();
    match node {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => id,
        Expr::Add(l, r) => {
            let l = simplify_pass(ctx, l);
            let r = simplify_pass(ctx, r);
            simplify_add(ctx, l, r)
        }
        Expr::Sub(l, r) => {
            let l = simplify_pass(ctx, l);
            let r = simplify_pass(ctx, r);
            simplify_sub(ctx, l, r)
        }
        Expr::Mul(l, r) => {
            let l = simplify_pass(ctx, l);
            let r = simplify_pass(ctx, r);
            simplify_mul(ctx, l, r)
        }
        Expr::Div(l, r) => {
            let l = simplify_pass(ctx, l);
            let r = simplify_pass(ctx, r);
            simplify_div(ctx, l, r)
        }
        Expr::Pow(b, e) => {
            let b = simplify_pass(ctx, b);
            let e = simplify_pass(ctx, e);
            simplify_pow(ctx, b, e)
        }
        Expr::Neg(e) => {
            let e = simplify_pass(ctx, e);
            simplify_neg(ctx, e)
        }
        Expr::Function(name, args) => {
            let args: Vec<ExprId> = args.into_iter().map(|a| simplify_pass(ctx, a)).collect();
            simplify_function(ctx, &name, args)
        }
    }
}

fn simplify_add(ctx: &mut Context, l: ExprId, r: ExprId) -> ExprId {
    if let (Some(a), Some(b)) = (as_number(ctx, l), as_number(ctx, r)) {
        return ctx.num_rational(a + b);
    }
    if ctx.is_zero(l) {
        return r;
    }
    if ctx.is_zero(r) {
        return l;
    }
    ctx.add(Expr::Add(l, r))
}

fn simplify_sub(ctx: &mut Context, l: ExprId, r: ExprId) -> ExprId {
    if let (Some(a), Some(b)) = (as_number(ctx, l), as_number(ctx, r)) {
        return ctx.num_rational(a - b);
    }
    if ctx.is_zero(r) {
        return l;
    }
    if ctx.is_zero(l) {
        return ctx.add(Expr::Neg(r));
    }
    if ctx.eq(l, r) {
        return ctx.num(0);
    }
    ctx.add(Expr::Sub(l, r))
}

fn simplify_mul(ctx: &mut Context, l: ExprId, r: ExprId) -> ExprId {
    if let (Some(a), Some(b)) = (as_number(ctx, l), as_number(ctx, r)) {
        return ctx.num_rational(a * b);
    }
    if ctx.is_zero(l) || ctx.is_zero(r) {
        return ctx.num(0);
    }
    if ctx.is_one(l) {
        return r;
    }
    if ctx.is_one(r) {
        return l;
    }
    if is_minus_one(ctx, l) {
        return ctx.add(Expr::Neg(r));
    }
    if is_minus_one(ctx, r) {
        return ctx.add(Expr::Neg(l));
    }

    // Numeric coefficient collapsing: n * (p / m) -> (n/m) * p, and
    // n * (m * p) -> (n*m) * p. Keeps derivative/integral outputs tidy.
    if let Some(n) = as_number(ctx, l) {
        match ctx.get(r).clone() {
            Expr::Div(p, q) => {
                if let Some(m) = as_number(ctx, q) {
                    if !m.is_zero() {
                        let coeff = ctx.num_rational(n / m);
                        return simplify_mul_coeff(ctx, coeff, p);
                    }
                }
            }
            Expr::Mul(p, q) => {
                if let Some(m) = as_number(ctx, p) {
                    let coeff = ctx.num_rational(n * m);
                    return simplify_mul_coeff(ctx, coeff, q);
                }
            }
            _ => {}
        }
    }
    if let Some(n) = as_number(ctx, r) {
        if let Expr::Div(p, q) = ctx.get(l).clone() {
            if let Some(m) = as_number(ctx, q) {
                if !m.is_zero() {
                    let coeff = ctx.num_rational(n / m);
                    return simplify_mul_coeff(ctx, coeff, p);
                }
            }
        }
        // Canonical ordering: numeric factor on the left.
        return ctx.add(Expr::Mul(r, l));
    }

    ctx.add(Expr::Mul(l, r))
}

fn simplify_mul_coeff(ctx: &mut Context, coeff: ExprId, rest: ExprId) -> ExprId {
    if ctx.is_one(coeff) {
        return rest;
    }
    if ctx.is_zero(coeff) {
        return ctx.num(0);
    }
    if is_minus_one(ctx, coeff) {
        return ctx.add(Expr::Neg(rest));
    }
    ctx.add(Expr::Mul(coeff, rest))
}

fn simplify_div(ctx: &mut Context, l: ExprId, r: ExprId) -> ExprId {
    if let (Some(a), Some(b)) = (as_number(ctx, l), as_number(ctx, r)) {
        if !b.is_zero() {
            return ctx.num_rational(a / b);
        }
    }
    if ctx.is_one(r) {
        return l;
    }
    if ctx.is_zero(l) && !ctx.is_zero(r) {
        return ctx.num(0);
    }
    if ctx.eq(l, r) && !matches!(ctx.get(r), Expr::Number(_)) {
        // x / x -> 1; a literal 0/0 is left for the limit engine to inspect
        return ctx.num(1);
    }
    // (n * p) / m -> (n/m) * p; the numeric factor sits on the left after
    // canonical ordering in simplify_mul.
    if let Some(m) = as_number(ctx, r) {
        if !m.is_zero() {
            if let Expr::Mul(p, q) = ctx.get(l).clone() {
                if let Some(n) = as_number(ctx, p) {
                    let coeff = ctx.num_rational(n / m);
                    return simplify_mul_coeff(ctx, coeff, q);
                }
            }
        }
    }
    ctx.add(Expr::Div(l, r))
}

fn simplify_pow(ctx: &mut Context, b: ExprId, e: ExprId) -> ExprId {
    if let Some(exp) = as_number(ctx, e) {
        if exp.is_zero() {
            return ctx.num(1);
        }
        if exp.is_one() {
            return b;
        }
        if let Some(base) = as_number(ctx, b) {
            if let Some(folded) = rational_pow(&base, &exp) {
                return ctx.num_rational(folded);
            }
        }
    }
    if ctx.is_one(b) {
        return ctx.num(1);
    }
    if ctx.is_zero(b) {
        if let Some(exp) = as_number(ctx, e) {
            if exp.is_positive() {
                return ctx.num(0);
            }
        }
    }
    ctx.add(Expr::Pow(b, e))
}

fn simplify_neg(ctx: &mut Context, e: ExprId) -> ExprId {
    match ctx.get(e) {
        Expr::Neg(inner) => *inner,
        // Neg(Number) folds in Context::add
        _ => ctx.add(Expr::Neg(e)),
    }
}

fn simplify_function(ctx: &mut Context, name: &str, args: Vec<ExprId>) -> ExprId {
    if args.len() == 1 {
        let arg = args[0];
        if let Some(n) = as_number(ctx, arg) {
            // Known exact values keep limit substitution honest.
            match (name, n.is_zero(), n.is_one()) {
                ("sin", true, _) | ("tan", true, _) => return ctx.num(0),
                ("cos", true, _) | ("exp", true, _) => return ctx.num(1),
                ("ln", _, true) | ("log", _, true) => return ctx.num(0),
                ("abs", _, _) => return ctx.num_rational(n.abs()),
                ("sqrt", _, _) => {
                    if let Some(root) = exact_sqrt(ctx, arg) {
                        return root;
                    }
                }
                _ => {}
            }
        }
    }
    ctx.add(Expr::Function(name.to_string(), args))
}

fn is_minus_one(ctx: &Context, id: ExprId) -> bool {
    matches!(ctx.get(id), Expr::Number(n) if *n == -BigRational::one())
}

/// Integer square root of small non-negative integer literals.
fn exact_sqrt(ctx: &mut Context, arg: ExprId) -> Option<ExprId> {
    let n = as_integer(ctx, arg)?;
    if n < 0 {
        return None;
    }
    let root = (n as f64).sqrt().round() as i64;
    if root * root == n {
        Some(ctx.num(root))
    } else {
        None
    }
}

/// `base^exp` for rational base and integer exponent of reasonable size.
fn rational_pow(base: &BigRational, exp: &BigRational) -> Option<BigRational> {
    if !exp.is_integer() {
        return None;
    }
    let e: i64 = exp.numer().try_into().ok()?;
    if e.unsigned_abs() > 64 {
        return None;
    }
    if e < 0 && base.is_zero() {
        return None;
    }
    let mut acc = BigRational::one();
    for _ in 0..e.unsigned_abs() {
        acc *= base;
    }
    if e < 0 {
        acc = acc.recip();
    }
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_ast::DisplayExpr;
    use calc_parser::parse;

    fn simp(input: &str) -> String {
        let mut ctx = Context::new();
        let e = parse(input, &mut ctx).unwrap();
        let mut budget = Budget::new();
        let s = simplify(&mut ctx, e, &mut budget).unwrap();
        format!("{}", DisplayExpr { context: &ctx, id: s })
    }

    #[test]
    fn test_fold_constants() {
        assert_eq!(simp("2 + 3"), "5");
        assert_eq!(simp("2 * 3 + 1"), "7");
        assert_eq!(simp("2^10"), "1024");
        assert_eq!(simp("1/3 + 1/6"), "1/2");
    }

    #[test]
    fn test_identities() {
        assert_eq!(simp("x + 0"), "x");
        assert_eq!(simp("x * 1"), "x");
        assert_eq!(simp("x * 0"), "0");
        assert_eq!(simp("x / 1"), "x");
        assert_eq!(simp("x^1"), "x");
        assert_eq!(simp("x^0"), "1");
        assert_eq!(simp("x - x"), "0");
    }

    #[test]
    fn test_coefficient_collapsing() {
        // 2 * (x^2 / 2) -> x^2
        assert_eq!(simp("2 * (x^2 / 2)"), "x^2");
        // 3 * (2 * x) -> 6 * x
        assert_eq!(simp("3 * (2 * x)"), "6 * x");
    }

    #[test]
    fn test_numeric_factor_cancels_into_denominator() {
        // shape produced by the quotient rule: (9 * x^2) / 9
        assert_eq!(simp("(9 * x^2) / 9"), "x^2");
        assert_eq!(simp("(3 * x) / 6"), "1/2 * x");
        assert_eq!(simp("(x * 9) / 9"), "x");
    }

    #[test]
    fn test_known_function_values() {
        assert_eq!(simp("sin(0)"), "0");
        assert_eq!(simp("cos(0)"), "1");
        assert_eq!(simp("ln(1)"), "0");
        assert_eq!(simp("exp(0)"), "1");
        assert_eq!(simp("sqrt(9)"), "3");
    }

    #[test]
    fn test_double_negation() {
        assert_eq!(simp("--x"), "x");
        assert_eq!(simp("-(-(3))"), "3");
    }

    #[test]
    fn test_division_by_zero_left_alone() {
        // the limit engine inspects unfolded zero denominators
        assert_eq!(simp("x / 0"), "x / 0");
    }

    #[test]
    fn test_budget_exhaustion_reported() {
        let mut ctx = Context::new();
        let e = parse("1 + 2 + 3 + 4", &mut ctx).unwrap();
        let mut budget = Budget::with_limit(0);
        assert!(matches!(
            simplify(&mut ctx, e, &mut budget),
            Err(EngineError::BudgetExceeded(_))
        ));
    }
}
