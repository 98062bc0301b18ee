mod backend;
mod error;
mod problem;
mod simplex;
mod solution;

pub use backend::{LpBackend, SimplexBackend, SolveOutcome};
pub use error::SolverError;
pub use problem::{Column, LpModel, Row, Sense};
pub use simplex::Solver;
pub use solution::{Diagnostics, Solution, SolutionStatus, SOLVER_NAME, SOLVER_VERSION};
