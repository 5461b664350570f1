use crate::expression::{Constant, Expr, ExprId};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

/// Arena owning every expression node created during one evaluation.
///
/// Each evaluation call builds its own `Context`; nothing is shared across
/// calls, so concurrent evaluations need no locking.
#[derive(Debug, Clone, Default)]
pub struct Context {
    nodes: Vec<Expr>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a node and return its handle.
    ///
    /// Canonicalizes `Neg(Number(n))` to `Number(-n)` so that negative
    /// literals have a single representation.
    pub fn add(&mut self, expr: Expr) -> ExprId {
        let expr = match expr {
            Expr::Neg(inner) => match self.get(inner) {
                Expr::Number(n) => Expr::Number(-n.clone()),
                _ => Expr::Neg(inner),
            },
            other => other,
        };
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr);
        id
    }

    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn num(&mut self, n: i64) -> ExprId {
        self.add(Expr::Number(BigRational::from_integer(BigInt::from(n))))
    }

    pub fn num_rational(&mut self, n: BigRational) -> ExprId {
        self.add(Expr::Number(n))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        self.add(Expr::Variable(name.to_string()))
    }

    pub fn constant(&mut self, c: Constant) -> ExprId {
        self.add(Expr::Constant(c))
    }

    pub fn func(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        self.add(Expr::Function(name.to_string(), args))
    }

    /// Structural equality of two subtrees. Handles are arena positions, not
    /// canonical identities, so comparison has to recurse.
    pub fn eq(&self, a: ExprId, b: ExprId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Expr::Number(x), Expr::Number(y)) => x == y,
            (Expr::Constant(x), Expr::Constant(y)) => x == y,
            (Expr::Variable(x), Expr::Variable(y)) => x == y,
            (Expr::Add(a1, a2), Expr::Add(b1, b2))
            | (Expr::Sub(a1, a2), Expr::Sub(b1, b2))
            | (Expr::Mul(a1, a2), Expr::Mul(b1, b2))
            | (Expr::Div(a1, a2), Expr::Div(b1, b2))
            | (Expr::Pow(a1, a2), Expr::Pow(b1, b2)) => self.eq(*a1, *b1) && self.eq(*a2, *b2),
            (Expr::Neg(x), Expr::Neg(y)) => self.eq(*x, *y),
            (Expr::Function(n1, args1), Expr::Function(n2, args2)) => {
                n1 == n2
                    && args1.len() == args2.len()
                    && args1
                        .iter()
                        .zip(args2.iter())
                        .all(|(x, y)| self.eq(*x, *y))
            }
            _ => false,
        }
    }

    /// True if the node is the literal number zero.
    pub fn is_zero(&self, id: ExprId) -> bool {
        matches!(self.get(id), Expr::Number(n) if n.is_zero())
    }

    /// True if the node is the literal number one.
    pub fn is_one(&self, id: ExprId) -> bool {
        matches!(self.get(id), Expr::Number(n) if num_traits::One::is_one(n))
    }
}
