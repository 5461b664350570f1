pub mod context;
pub mod display;
pub mod expression;
pub mod latex;

pub use context::Context;
pub use display::DisplayExpr;
pub use expression::{Constant, Expr, ExprId};
pub use latex::LatexExpr;
