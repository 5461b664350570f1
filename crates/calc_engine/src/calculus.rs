//! Symbolic differentiation and integration.

use crate::budget::Budget;
use crate::error::EngineError;
use crate::helpers::{as_number, contains_var, is_var, linear_coeffs, substitute};
use crate::simplify::simplify;
use calc_ast::{Constant, Context, DisplayExpr, Expr, ExprId};
use num_rational::BigRational;
use num_traits::One;

fn display(ctx: &Context, id: ExprId) -> String {
    format!("{}", DisplayExpr { context: ctx, id })
}

/// Differentiate `expr` with respect to `var`, `order` times.
///
/// Each round is simplified before the next so higher orders stay small.
pub fn differentiate(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    order: u32,
    budget: &mut Budget,
) -> Result<ExprId, EngineError> {
    tracing::debug!(expr = %DisplayExpr { context: ctx, id: expr }, var, order, "differentiate");
    let mut current = expr;
    for _ in 0..order {
        budget.charge(1)?;
        let raw = try_differentiate(ctx, current, var).ok_or_else(|| {
            EngineError::UnsupportedDerivative(display(ctx, current), var.to_string())
        })?;
        current = simplify(ctx, raw, budget)?;
    }
    Ok(current)
}

fn try_differentiate(ctx: &mut Context, expr: ExprId, var: &str) -> Option<ExprId> {
    // Constant rule: anything free of `var` has derivative 0.
    if !contains_var(ctx, expr, var) {
        return Some(ctx.num(0));
    }

    let expr_data = ctx.get(expr).clone();
    match expr_data {
        Expr::Variable(v) => {
            if v == var {
                Some(ctx.num(1))
            } else {
                Some(ctx.num(0))
            }
        }
        Expr::Add(l, r) => {
            let dl = try_differentiate(ctx, l, var)?;
            let dr = try_differentiate(ctx, r, var)?;
            Some(ctx.add(Expr::Add(dl, dr)))
        }
        Expr::Sub(l, r) => {
            let dl = try_differentiate(ctx, l, var)?;
            let dr = try_differentiate(ctx, r, var)?;
            Some(ctx.add(Expr::Sub(dl, dr)))
        }
        Expr::Neg(e) => {
            let de = try_differentiate(ctx, e, var)?;
            Some(ctx.add(Expr::Neg(de)))
        }
        Expr::Mul(l, r) => {
            // Product rule: (uv)' = u'v + uv'
            let dl = try_differentiate(ctx, l, var)?;
            let dr = try_differentiate(ctx, r, var)?;
            let term1 = ctx.add(Expr::Mul(dl, r));
            let term2 = ctx.add(Expr::Mul(l, dr));
            Some(ctx.add(Expr::Add(term1, term2)))
        }
        Expr::Div(l, r) => {
            // Quotient rule: (u/v)' = (u'v - uv') / v^2
            let dl = try_differentiate(ctx, l, var)?;
            let dr = try_differentiate(ctx, r, var)?;
            let term1 = ctx.add(Expr::Mul(dl, r));
            let term2 = ctx.add(Expr::Mul(l, dr));
            let num = ctx.add(Expr::Sub(term1, term2));
            let two = ctx.num(2);
            let den = ctx.add(Expr::Pow(r, two));
            Some(ctx.add(Expr::Div(num, den)))
        }
        Expr::Pow(base, exp) => {
            let db = try_differentiate(ctx, base, var)?;
            let de = try_differentiate(ctx, exp, var)?;

            if !contains_var(ctx, exp, var) {
                // (u^n)' = n * u^(n-1) * u'
                let one = ctx.num(1);
                let n_minus_one = ctx.add(Expr::Sub(exp, one));
                let pow_term = ctx.add(Expr::Pow(base, n_minus_one));
                let term = ctx.add(Expr::Mul(exp, pow_term));
                Some(ctx.add(Expr::Mul(term, db)))
            } else if !contains_var(ctx, base, var) {
                // (a^u)' = a^u * ln(a) * u'
                let ln_a = ctx.func("ln", vec![base]);
                let term = ctx.add(Expr::Mul(expr, ln_a));
                Some(ctx.add(Expr::Mul(term, de)))
            } else {
                // (u^v)' = u^v * (v'*ln(u) + v*u'/u)
                let ln_base = ctx.func("ln", vec![base]);
                let term1 = ctx.add(Expr::Mul(de, ln_base));
                let term2_num = ctx.add(Expr::Mul(exp, db));
                let term2 = ctx.add(Expr::Div(term2_num, base));
                let inner = ctx.add(Expr::Add(term1, term2));
                Some(ctx.add(Expr::Mul(expr, inner)))
            }
        }
        Expr::Function(name, args) => {
            if args.len() != 1 {
                return None;
            }
            let arg = args[0];
            let da = try_differentiate(ctx, arg, var)?;

            let outer = match name.as_str() {
                "sin" => {
                    // cos(u)
                    ctx.func("cos", vec![arg])
                }
                "cos" => {
                    // -sin(u)
                    let sin_u = ctx.func("sin", vec![arg]);
                    ctx.add(Expr::Neg(sin_u))
                }
                "tan" => {
                    // 1/cos^2(u)
                    let cos_u = ctx.func("cos", vec![arg]);
                    let two = ctx.num(2);
                    let cos_sq = ctx.add(Expr::Pow(cos_u, two));
                    let one = ctx.num(1);
                    ctx.add(Expr::Div(one, cos_sq))
                }
                "exp" => expr,
                "ln" | "log" => {
                    // 1/u
                    let one = ctx.num(1);
                    ctx.add(Expr::Div(one, arg))
                }
                "sqrt" => {
                    // 1/(2*sqrt(u))
                    let root = ctx.func("sqrt", vec![arg]);
                    let two = ctx.num(2);
                    let den = ctx.add(Expr::Mul(two, root));
                    let one = ctx.num(1);
                    ctx.add(Expr::Div(one, den))
                }
                "abs" => {
                    // u/abs(u)
                    ctx.add(Expr::Div(arg, expr))
                }
                _ => return None,
            };
            Some(ctx.add(Expr::Mul(outer, da)))
        }
        Expr::Number(_) | Expr::Constant(_) => Some(ctx.num(0)),
    }
}

/// Antiderivative of `expr` with respect to `var` (no constant term).
pub fn integrate(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    budget: &mut Budget,
) -> Result<ExprId, EngineError> {
    tracing::debug!(expr = %DisplayExpr { context: ctx, id: expr }, var, "integrate");
    budget.charge(1)?;
    let raw = try_integrate(ctx, expr, var)
        .ok_or_else(|| EngineError::UnsupportedIntegral(display(ctx, expr), var.to_string()))?;
    simplify(ctx, raw, budget)
}

/// Definite integral: antiderivative evaluated as `F(upper) - F(lower)`.
pub fn integrate_definite(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    lower: ExprId,
    upper: ExprId,
    budget: &mut Budget,
) -> Result<ExprId, EngineError> {
    budget.charge(1)?;
    let anti = try_integrate(ctx, expr, var)
        .ok_or_else(|| EngineError::UnsupportedIntegral(display(ctx, expr), var.to_string()))?;
    let at_upper = substitute(ctx, anti, var, upper);
    let at_lower = substitute(ctx, anti, var, lower);
    let diff = ctx.add(Expr::Sub(at_upper, at_lower));
    simplify(ctx, diff, budget)
}

fn try_integrate(ctx: &mut Context, expr: ExprId, var: &str) -> Option<ExprId> {
    let expr_data = ctx.get(expr).clone();

    // Linearity.
    if let Expr::Add(l, r) = expr_data {
        let int_l = try_integrate(ctx, l, var)?;
        let int_r = try_integrate(ctx, r, var)?;
        return Some(ctx.add(Expr::Add(int_l, int_r)));
    }
    if let Expr::Sub(l, r) = expr_data {
        let int_l = try_integrate(ctx, l, var)?;
        let int_r = try_integrate(ctx, r, var)?;
        return Some(ctx.add(Expr::Sub(int_l, int_r)));
    }
    if let Expr::Neg(e) = expr_data {
        let int_e = try_integrate(ctx, e, var)?;
        return Some(ctx.add(Expr::Neg(int_e)));
    }

    // Constant multiple.
    if let Expr::Mul(l, r) = expr_data {
        if !contains_var(ctx, l, var) {
            if let Some(int_r) = try_integrate(ctx, r, var) {
                return Some(ctx.add(Expr::Mul(l, int_r)));
            }
        }
        if !contains_var(ctx, r, var) {
            if let Some(int_l) = try_integrate(ctx, l, var) {
                return Some(ctx.add(Expr::Mul(r, int_l)));
            }
        }
    }

    // Constant: c -> c*x.
    if !contains_var(ctx, expr, var) {
        let var_expr = ctx.var(var);
        return Some(ctx.add(Expr::Mul(expr, var_expr)));
    }

    // Variable itself: x -> x^2/2.
    if is_var(ctx, expr, var) {
        let var_expr = ctx.var(var);
        let two = ctx.num(2);
        let pow_expr = ctx.add(Expr::Pow(var_expr, two));
        return Some(ctx.add(Expr::Div(pow_expr, two)));
    }

    if let Expr::Pow(base, exp) = expr_data {
        // (ax+b)^n with constant n: (ax+b)^(n+1) / (a*(n+1)); n = -1 -> ln.
        if let Some((a, _)) = linear_coeffs(ctx, base, var) {
            if !contains_var(ctx, exp, var) {
                if let Some(n) = as_number(ctx, exp) {
                    if n == -BigRational::one() {
                        let ln_u = ctx.func("ln", vec![base]);
                        return Some(ctx.add(Expr::Div(ln_u, a)));
                    }
                }

                let one = ctx.num(1);
                let new_exp = ctx.add(Expr::Add(exp, one));
                let new_denom = if coeff_is_one(ctx, a) {
                    new_exp
                } else {
                    ctx.add(Expr::Mul(a, new_exp))
                };
                let pow_expr = ctx.add(Expr::Pow(base, new_exp));
                return Some(ctx.add(Expr::Div(pow_expr, new_denom)));
            }
        }

        // c^(ax+b): c^(ax+b) / (a*ln(c)); base e drops the ln factor.
        if !contains_var(ctx, base, var) {
            if let Some((a, _)) = linear_coeffs(ctx, exp, var) {
                let is_e = matches!(ctx.get(base), Expr::Constant(Constant::E));
                if is_e {
                    if coeff_is_one(ctx, a) {
                        return Some(expr);
                    }
                    return Some(ctx.add(Expr::Div(expr, a)));
                }
                let ln_c = ctx.func("ln", vec![base]);
                let denom = if coeff_is_one(ctx, a) {
                    ln_c
                } else {
                    ctx.add(Expr::Mul(a, ln_c))
                };
                return Some(ctx.add(Expr::Div(expr, denom)));
            }
        }
    }

    // 1/(ax+b) -> ln(ax+b)/a.
    if let Expr::Div(num, den) = expr_data {
        if !contains_var(ctx, num, var) {
            if let Some((a, _)) = linear_coeffs(ctx, den, var) {
                let ln_den = ctx.func("ln", vec![den]);
                let scaled = ctx.add(Expr::Div(ln_den, a));
                if ctx.is_one(num) {
                    return Some(scaled);
                }
                return Some(ctx.add(Expr::Mul(num, scaled)));
            }
        }
    }

    // sin/cos/exp of a linear argument.
    if let Expr::Function(name, args) = expr_data {
        if args.len() == 1 {
            let arg = args[0];
            if let Some((a, _)) = linear_coeffs(ctx, arg, var) {
                let a_is_one = coeff_is_one(ctx, a);
                match name.as_str() {
                    "sin" => {
                        let cos_arg = ctx.func("cos", vec![arg]);
                        let integral = ctx.add(Expr::Neg(cos_arg));
                        if a_is_one {
                            return Some(integral);
                        }
                        return Some(ctx.add(Expr::Div(integral, a)));
                    }
                    "cos" => {
                        let integral = ctx.func("sin", vec![arg]);
                        if a_is_one {
                            return Some(integral);
                        }
                        return Some(ctx.add(Expr::Div(integral, a)));
                    }
                    "exp" => {
                        if a_is_one {
                            return Some(expr);
                        }
                        return Some(ctx.add(Expr::Div(expr, a)));
                    }
                    _ => {}
                }
            }
        }
    }

    None
}

// `linear_coeffs` can return sums like `2 + 0`; fold before the one-check.
fn coeff_is_one(ctx: &mut Context, a: ExprId) -> bool {
    let mut scratch = Budget::new();
    match simplify(ctx, a, &mut scratch) {
        Ok(folded) => ctx.is_one(folded),
        Err(_) => false,
    }
}
