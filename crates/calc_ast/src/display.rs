use crate::context::Context;
use crate::expression::{Expr, ExprId};
use std::fmt;

/// Precedence-aware plain-text printer.
///
/// ```
/// use calc_ast::{Context, DisplayExpr, Expr};
/// let mut ctx = Context::new();
/// let x = ctx.var("x");
/// let two = ctx.num(2);
/// let e = ctx.add(Expr::Pow(x, two));
/// assert_eq!(format!("{}", DisplayExpr { context: &ctx, id: e }), "x^2");
/// ```
pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.context, self.id)
    }
}

fn write_child(
    f: &mut fmt::Formatter<'_>,
    ctx: &Context,
    child: ExprId,
    parent_prec: u8,
    parens_on_equal: bool,
) -> fmt::Result {
    let child_prec = ctx.get(child).precedence();
    let needs_parens = if parens_on_equal {
        child_prec <= parent_prec
    } else {
        child_prec < parent_prec
    };
    if needs_parens {
        write!(f, "(")?;
        write_expr(f, ctx, child)?;
        write!(f, ")")
    } else {
        write_expr(f, ctx, child)
    }
}

fn write_expr(f: &mut fmt::Formatter<'_>, ctx: &Context, id: ExprId) -> fmt::Result {
    let node = ctx.get(id);
    let prec = node.precedence();
    match node {
        Expr::Number(n) => write!(f, "{}", n),
        Expr::Constant(c) => write!(f, "{}", c),
        Expr::Variable(s) => write!(f, "{}", s),
        Expr::Add(l, r) => {
            write_child(f, ctx, *l, prec, false)?;
            write!(f, " + ")?;
            write_child(f, ctx, *r, prec, false)
        }
        Expr::Sub(l, r) => {
            write_child(f, ctx, *l, prec, false)?;
            write!(f, " - ")?;
            // Subtraction is left-associative: a - (b - c) keeps its parens.
            write_child(f, ctx, *r, prec, true)
        }
        Expr::Mul(l, r) => {
            write_child(f, ctx, *l, prec, false)?;
            write!(f, " * ")?;
            write_child(f, ctx, *r, prec, false)
        }
        Expr::Div(l, r) => {
            write_child(f, ctx, *l, prec, false)?;
            write!(f, " / ")?;
            write_child(f, ctx, *r, prec, true)
        }
        Expr::Pow(b, e) => {
            write_child(f, ctx, *b, prec, false)?;
            write!(f, "^")?;
            write_child(f, ctx, *e, prec, false)
        }
        Expr::Neg(e) => {
            write!(f, "-")?;
            write_child(f, ctx, *e, prec, false)
        }
        Expr::Function(name, args) => {
            write!(f, "{}(", name)?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_expr(f, ctx, *arg)?;
            }
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disp(ctx: &Context, id: ExprId) -> String {
        format!("{}", DisplayExpr { context: ctx, id })
    }

    #[test]
    fn test_display_mul() {
        let mut ctx = Context::new();
        let one = ctx.num(1);
        let x = ctx.var("x");
        let two = ctx.num(2);
        let m = ctx.add(Expr::Mul(x, two));
        let e = ctx.add(Expr::Add(one, m));
        assert_eq!(disp(&ctx, e), "1 + x * 2");
    }

    #[test]
    fn test_display_pow_of_sum_needs_parens() {
        let mut ctx = Context::new();
        let a = ctx.var("a");
        let b = ctx.var("b");
        let sum = ctx.add(Expr::Add(a, b));
        let two = ctx.num(2);
        let e = ctx.add(Expr::Pow(sum, two));
        assert_eq!(disp(&ctx, e), "(a + b)^2");
    }

    #[test]
    fn test_display_quotient_of_power() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let three = ctx.num(3);
        let p = ctx.add(Expr::Pow(x, three));
        let three2 = ctx.num(3);
        let e = ctx.add(Expr::Div(p, three2));
        assert_eq!(disp(&ctx, e), "x^3 / 3");
    }

    #[test]
    fn test_display_neg_function() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let s = ctx.func("sin", vec![x]);
        let e = ctx.add(Expr::Neg(s));
        assert_eq!(disp(&ctx, e), "-sin(x)");
    }

    #[test]
    fn test_display_rational() {
        let mut ctx = Context::new();
        use num_bigint::BigInt;
        use num_rational::BigRational;
        let e = ctx.num_rational(BigRational::new(BigInt::from(1), BigInt::from(3)));
        assert_eq!(disp(&ctx, e), "1/3");
    }
}
