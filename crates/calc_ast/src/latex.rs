use crate::context::Context;
use crate::expression::{Constant, Expr, ExprId};
use std::fmt;

/// LaTeX renderer for presentation layers (`render` capability).
pub struct LatexExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

impl fmt::Display for LatexExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_latex(f, self.context, self.id, 0)
    }
}

fn latex_function_name(name: &str) -> String {
    match name {
        "sin" | "cos" | "tan" | "ln" | "log" | "exp" | "min" | "max" => format!("\\{}", name),
        other => format!("\\operatorname{{{}}}", other),
    }
}

fn write_latex(f: &mut fmt::Formatter<'_>, ctx: &Context, id: ExprId, parent_prec: u8) -> fmt::Result {
    let node = ctx.get(id);
    let prec = node.precedence();
    let needs_parens = prec < parent_prec && !matches!(node, Expr::Div(_, _));
    if needs_parens {
        write!(f, "\\left(")?;
    }
    match node {
        Expr::Number(n) => {
            if n.is_integer() {
                write!(f, "{}", n.numer())?;
            } else {
                write!(f, "\\frac{{{}}}{{{}}}", n.numer(), n.denom())?;
            }
        }
        Expr::Constant(Constant::Pi) => write!(f, "\\pi")?,
        Expr::Constant(Constant::E) => write!(f, "e")?,
        Expr::Constant(Constant::Infinity) => write!(f, "\\infty")?,
        Expr::Variable(s) => write!(f, "{}", s)?,
        Expr::Add(l, r) => {
            write_latex(f, ctx, *l, prec)?;
            write!(f, " + ")?;
            write_latex(f, ctx, *r, prec)?;
        }
        Expr::Sub(l, r) => {
            write_latex(f, ctx, *l, prec)?;
            write!(f, " - ")?;
            write_latex(f, ctx, *r, prec + 1)?;
        }
        Expr::Mul(l, r) => {
            write_latex(f, ctx, *l, prec)?;
            write!(f, " \\cdot ")?;
            write_latex(f, ctx, *r, prec)?;
        }
        Expr::Div(l, r) => {
            write!(f, "\\frac{{")?;
            write_latex(f, ctx, *l, 0)?;
            write!(f, "}}{{")?;
            write_latex(f, ctx, *r, 0)?;
            write!(f, "}}")?;
        }
        Expr::Pow(b, e) => {
            write_latex(f, ctx, *b, prec + 1)?;
            write!(f, "^{{")?;
            write_latex(f, ctx, *e, 0)?;
            write!(f, "}}")?;
        }
        Expr::Neg(e) => {
            write!(f, "-")?;
            write_latex(f, ctx, *e, prec)?;
        }
        Expr::Function(name, args) => {
            if name == "sqrt" && args.len() == 1 {
                write!(f, "\\sqrt{{")?;
                write_latex(f, ctx, args[0], 0)?;
                write!(f, "}}")?;
            } else {
                write!(f, "{}\\left(", latex_function_name(name))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_latex(f, ctx, *arg, 0)?;
                }
                write!(f, "\\right)")?;
            }
        }
    }
    if needs_parens {
        write!(f, "\\right)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latex(ctx: &Context, id: ExprId) -> String {
        format!("{}", LatexExpr { context: ctx, id })
    }

    #[test]
    fn test_latex_fraction() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let three = ctx.num(3);
        let p = ctx.add(Expr::Pow(x, three));
        let d = ctx.num(3);
        let e = ctx.add(Expr::Div(p, d));
        assert_eq!(latex(&ctx, e), "\\frac{x^{3}}{3}");
    }

    #[test]
    fn test_latex_trig() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let s = ctx.func("sin", vec![x]);
        assert_eq!(latex(&ctx, s), "\\sin\\left(x\\right)");
    }

    #[test]
    fn test_latex_rational_number() {
        let mut ctx = Context::new();
        use num_bigint::BigInt;
        use num_rational::BigRational;
        let e = ctx.num_rational(BigRational::new(BigInt::from(1), BigInt::from(3)));
        assert_eq!(latex(&ctx, e), "\\frac{1}{3}");
    }
}
