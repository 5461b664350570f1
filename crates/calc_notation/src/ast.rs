//! Typed operator tree for calculus notation.
//!
//! The notation parser produces a `CalcNode`; the resolver walks it
//! outermost-first. Rendering a node gives the canonical call form used for
//! diagnostics (`diff(x^2, x)`, `integrate(x^2, (x, 0, 1))`, ...).

/// One recognized notation construct, with its operand parsed recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcNode {
    /// `d/dv(E)`, `d²/dv²(E)`.
    Derivative {
        order: u32,
        var: String,
        expr: Box<CalcNode>,
    },
    /// `∂/∂v(E)`, `∂²/∂v²(E)`, `∂²/∂v∂w(E)`; one entry per differentiation.
    Partial {
        vars: Vec<String>,
        expr: Box<CalcNode>,
    },
    /// `∫E dv`, `∫_a^b E dv`. Bounds stay textual until resolution.
    Integral {
        var: String,
        bounds: Option<(String, String)>,
        expr: Box<CalcNode>,
    },
    /// `lim_{v->a}(E)`; the approach target stays textual until resolution.
    Limit {
        var: String,
        target: String,
        expr: Box<CalcNode>,
    },
    /// Plain expression text for the engine parser.
    Algebraic(String),
}

impl CalcNode {
    /// Render the canonical call form. Contains no notation glyphs.
    pub fn canonical(&self) -> String {
        match self {
            CalcNode::Derivative { order, var, expr } => {
                let inner = expr.canonical();
                if *order == 1 {
                    format!("diff({inner}, {var})")
                } else {
                    format!("diff({inner}, {var}, {order})")
                }
            }
            CalcNode::Partial { vars, expr } => {
                // repeated variables collapse to an order argument, distinct
                // ones nest: diff(diff(E, x), y)
                let mut out = expr.canonical();
                let mut i = 0;
                while i < vars.len() {
                    let var = &vars[i];
                    let mut run = 1;
                    while i + run < vars.len() && vars[i + run] == *var {
                        run += 1;
                    }
                    if run == 1 {
                        out = format!("diff({out}, {var})");
                    } else {
                        out = format!("diff({out}, {var}, {run})");
                    }
                    i += run;
                }
                out
            }
            CalcNode::Integral { var, bounds, expr } => {
                let inner = expr.canonical();
                match bounds {
                    Some((lower, upper)) => {
                        format!("integrate({inner}, ({var}, {lower}, {upper}))")
                    }
                    None => format!("integrate({inner}, {var})"),
                }
            }
            CalcNode::Limit { var, target, expr } => {
                format!("limit({}, {var}, {target})", expr.canonical())
            }
            CalcNode::Algebraic(text) => text.clone(),
        }
    }

    /// Count of operator nodes above the algebraic leaves.
    pub fn depth(&self) -> usize {
        match self {
            CalcNode::Derivative { expr, .. }
            | CalcNode::Partial { expr, .. }
            | CalcNode::Integral { expr, .. }
            | CalcNode::Limit { expr, .. } => 1 + expr.depth(),
            CalcNode::Algebraic(_) => 0,
        }
    }
}
