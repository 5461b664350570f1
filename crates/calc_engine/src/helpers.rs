//! Shared structural helpers: variable occurrence, substitution and linear
//! coefficient extraction.

use calc_ast::{Context, Expr, ExprId};
use num_rational::BigRational;

/// True if `var` occurs free anywhere in `expr`.
pub fn contains_var(ctx: &Context, expr: ExprId, var: &str) -> bool {
    match ctx.get(expr) {
        Expr::Variable(v) => v == var,
        Expr::Number(_) | Expr::Constant(_) => false,
        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) | Expr::Pow(l, r) => {
            contains_var(ctx, *l, var) || contains_var(ctx, *r, var)
        }
        Expr::Neg(e) => contains_var(ctx, *e, var),
        Expr::Function(_, args) => args.iter().any(|a| contains_var(ctx, *a, var)),
    }
}

/// Replace every free occurrence of `var` with `value`.
pub fn substitute(ctx: &mut Context, expr: ExprId, var: &str, value: ExprId) -> ExprId {
    let expr_data = ctx.get(expr).clone();

    match expr_data {
        Expr::Variable(v) if v == var => value,
        Expr::Variable(_) | Expr::Number(_) | Expr::Constant(_) => expr,
        Expr::Add(l, r) => {
            let new_l = substitute(ctx, l, var, value);
            let new_r = substitute(ctx, r, var, value);
            ctx.add(Expr::Add(new_l, new_r))
        }
        Expr::Sub(l, r) => {
            let new_l = substitute(ctx, l, var, value);
            let new_r = substitute(ctx, r, var, value);
            ctx.add(Expr::Sub(new_l, new_r))
        }
        Expr::Mul(l, r) => {
            let new_l = substitute(ctx, l, var, value);
            let new_r = substitute(ctx, r, var, value);
            ctx.add(Expr::Mul(new_l, new_r))
        }
        Expr::Div(l, r) => {
            let new_l = substitute(ctx, l, var, value);
            let new_r = substitute(ctx, r, var, value);
            ctx.add(Expr::Div(new_l, new_r))
        }
        Expr::Pow(l, r) => {
            let new_l = substitute(ctx, l, var, value);
            let new_r = substitute(ctx, r, var, value);
            ctx.add(Expr::Pow(new_l, new_r))
        }
        Expr::Neg(e) => {
            let new_e = substitute(ctx, e, var, value);
            ctx.add(Expr::Neg(new_e))
        }
        Expr::Function(name, args) => {
            let new_args: Vec<ExprId> = args
                .iter()
                .map(|a| substitute(ctx, *a, var, value))
                .collect();
            ctx.add(Expr::Function(name, new_args))
        }
    }
}

/// Rename a variable everywhere: `rename(ctx, e, "t", "x")`.
pub fn rename_var(ctx: &mut Context, expr: ExprId, from: &str, to: &str) -> ExprId {
    let replacement = ctx.var(to);
    substitute(ctx, expr, from, replacement)
}

/// The numeric value of the node, if it is a literal number.
pub fn as_number(ctx: &Context, expr: ExprId) -> Option<BigRational> {
    match ctx.get(expr) {
        Expr::Number(n) => Some(n.clone()),
        _ => None,
    }
}

/// The integer value of the node, if it is an integer literal.
pub fn as_integer(ctx: &Context, expr: ExprId) -> Option<i64> {
    let n = as_number(ctx, expr)?;
    if n.is_integer() {
        n.numer().try_into().ok()
    } else {
        None
    }
}

/// Decompose `expr` as `a*var + b`. Returns `(a, b)` when the expression is
/// linear in `var`, used by the integrator's linear-substitution rules.
pub fn linear_coeffs(ctx: &mut Context, expr: ExprId, var: &str) -> Option<(ExprId, ExprId)> {
    let expr_data = ctx.get(expr).clone();

    if !contains_var(ctx, expr, var) {
        return Some((ctx.num(0), expr));
    }

    match expr_data {
        Expr::Variable(v) if v == var => Some((ctx.num(1), ctx.num(0))),
        Expr::Mul(l, r) => {
            if !contains_var(ctx, l, var) && is_var(ctx, r, var) {
                return Some((l, ctx.num(0)));
            }
            if is_var(ctx, l, var) && !contains_var(ctx, r, var) {
                return Some((r, ctx.num(0)));
            }
            None
        }
        Expr::Add(l, r) => {
            let (a1, b1) = linear_coeffs(ctx, l, var)?;
            let (a2, b2) = linear_coeffs(ctx, r, var)?;
            let a = ctx.add(Expr::Add(a1, a2));
            let b = ctx.add(Expr::Add(b1, b2));
            Some((a, b))
        }
        Expr::Sub(l, r) => {
            let (a1, b1) = linear_coeffs(ctx, l, var)?;
            let (a2, b2) = linear_coeffs(ctx, r, var)?;
            let a = ctx.add(Expr::Sub(a1, a2));
            let b = ctx.add(Expr::Sub(b1, b2));
            Some((a, b))
        }
        Expr::Neg(e) => {
            let (a, b) = linear_coeffs(ctx, e, var)?;
            let na = ctx.add(Expr::Neg(a));
            let nb = ctx.add(Expr::Neg(b));
            Some((na, nb))
        }
        _ => None,
    }
}

pub fn is_var(ctx: &Context, expr: ExprId, var: &str) -> bool {
    matches!(ctx.get(expr), Expr::Variable(v) if v == var)
}
