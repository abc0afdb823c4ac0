pub mod error;
pub mod grouping;
pub mod guillotine;
pub mod metrics;
pub mod oracle;
pub mod render;
pub mod solver;
pub mod types;

pub use error::{PlanError, Result};
pub use solver::{Solution, Solver};
