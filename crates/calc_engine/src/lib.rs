pub mod budget;
pub mod calculus;
pub mod error;
pub mod helpers;
pub mod limit;
pub mod simplify;

pub use budget::Budget;
pub use calculus::{differentiate, integrate, integrate_definite};
pub use error::EngineError;
pub use helpers::{contains_var, substitute};
pub use limit::limit;
pub use simplify::simplify;
