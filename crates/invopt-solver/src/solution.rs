use std::fmt;

pub const SOLVER_NAME: &str = "invopt-simplex";
pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The result of solving an LP problem
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Values for each column (empty when no primal point is known)
    pub values: Vec<f64>,
    /// Objective value of `values`
    pub objective_value: f64,
    /// Simplex iterations spent across both phases
    pub iterations: usize,
    /// Whether `values` satisfies every row and column bound
    pub primal_feasible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Nothing has been solved yet
    NotSolved,
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The wall-clock budget ran out before optimality was proven
    TimeLimit,
    /// The iteration budget ran out before optimality was proven
    IterationLimit,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolutionStatus::NotSolved => "Not Set",
            SolutionStatus::Optimal => "Optimal",
            SolutionStatus::Infeasible => "Infeasible",
            SolutionStatus::Unbounded => "Unbounded",
            SolutionStatus::TimeLimit => "Time limit reached",
            SolutionStatus::IterationLimit => "Iteration limit reached",
        };
        f.write_str(s)
    }
}

/// Read-only snapshot of the backend after (or before) a solve
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub num_rows: usize,
    pub num_columns: usize,
    pub num_nonzeros: usize,
    pub status: String,
    pub iteration_count: usize,
    pub primal_status: String,
    pub dual_status: String,
    pub basis_validity: String,
    pub objective_value: Option<f64>,
    pub solver_name: String,
    pub solver_version: String,
}

impl Solution {
    pub fn not_solved() -> Self {
        Self::without_point(SolutionStatus::NotSolved, 0)
    }

    pub fn infeasible(iterations: usize) -> Self {
        Self::without_point(SolutionStatus::Infeasible, iterations)
    }

    pub fn unbounded(iterations: usize) -> Self {
        Self::without_point(SolutionStatus::Unbounded, iterations)
    }

    /// A solve that produced a point: optimal, or the last point before a limit
    pub fn with_point(
        status: SolutionStatus,
        values: Vec<f64>,
        objective_value: f64,
        iterations: usize,
        primal_feasible: bool,
    ) -> Self {
        Self {
            status,
            values,
            objective_value,
            iterations,
            primal_feasible,
        }
    }

    fn without_point(status: SolutionStatus, iterations: usize) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: f64::NAN,
            iterations,
            primal_feasible: false,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn primal_status(&self) -> &'static str {
        match self.status {
            SolutionStatus::NotSolved => "None",
            SolutionStatus::Infeasible => "Infeasible",
            _ if self.primal_feasible => "Feasible",
            _ if self.values.is_empty() => "None",
            _ => "Infeasible",
        }
    }

    pub fn dual_status(&self) -> &'static str {
        match self.status {
            SolutionStatus::Optimal => "Feasible",
            SolutionStatus::Unbounded => "Infeasible",
            _ => "None",
        }
    }

    pub fn basis_validity(&self) -> &'static str {
        match self.status {
            SolutionStatus::Optimal | SolutionStatus::TimeLimit | SolutionStatus::IterationLimit => {
                "Valid"
            }
            _ => "Invalid",
        }
    }
}
