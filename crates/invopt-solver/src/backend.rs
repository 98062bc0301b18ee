use std::time::Duration;

use crate::error::SolverError;
use crate::problem::{LpModel, Sense};
use crate::simplex::Solver;
use crate::solution::{Diagnostics, Solution, SOLVER_NAME, SOLVER_VERSION};

/// What a backend hands back from `solve`
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// True only when an optimal solution was proven
    pub valid: bool,
    /// One value per declared column (may be empty when no point is known)
    pub values: Vec<f64>,
}

/// The narrow surface a model builder needs from an LP engine.
///
/// Columns are addressed by declaration order. A backend instance holds one
/// model; it is not meant to be shared between threads or reused.
pub trait LpBackend {
    /// Declare `lower.len()` new columns with the given bounds
    fn add_variables(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), SolverError>;

    /// Add the row `lower <= sum(coefficients[k] * x[indices[k]]) <= upper`
    fn add_row(
        &mut self,
        lower: f64,
        upper: f64,
        indices: &[usize],
        coefficients: &[f64],
    ) -> Result<(), SolverError>;

    fn set_objective_sense(&mut self, sense: Sense);

    /// One objective coefficient per declared column
    fn set_costs(&mut self, costs: &[f64]) -> Result<(), SolverError>;

    fn solve(&mut self, time_limit: Duration) -> Result<SolveOutcome, SolverError>;

    fn diagnostics(&self) -> Diagnostics;

    fn num_columns(&self) -> usize;
}

/// In-process backend running the bounded-variable simplex
pub struct SimplexBackend {
    model: LpModel,
    solution: Solution,
    max_iterations: Option<usize>,
}

impl Default for SimplexBackend {
    fn default() -> Self {
        Self {
            model: LpModel::new(),
            solution: Solution::not_solved(),
            max_iterations: None,
        }
    }
}

impl SimplexBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn model(&self) -> &LpModel {
        &self.model
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }
}

impl LpBackend for SimplexBackend {
    fn add_variables(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), SolverError> {
        if lower.len() != upper.len() {
            return Err(SolverError::LengthMismatch {
                what: "column bounds",
                expected: lower.len(),
                found: upper.len(),
            });
        }
        let first = self.model.num_columns();
        if let Some(pos) = lower.iter().position(|l| !l.is_finite()) {
            return Err(SolverError::NonFiniteLowerBound(first + pos));
        }
        for (&l, &u) in lower.iter().zip(upper) {
            self.model.add_column(l, u);
        }
        Ok(())
    }

    fn add_row(
        &mut self,
        lower: f64,
        upper: f64,
        indices: &[usize],
        coefficients: &[f64],
    ) -> Result<(), SolverError> {
        if indices.len() != coefficients.len() {
            return Err(SolverError::LengthMismatch {
                what: "row entries",
                expected: indices.len(),
                found: coefficients.len(),
            });
        }
        let columns = self.model.num_columns();
        if let Some(&index) = indices.iter().find(|&&j| j >= columns) {
            return Err(SolverError::ColumnOutOfRange { index, columns });
        }
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SolverError::NonFiniteValue("row coefficient"));
        }
        let entries = indices.iter().copied().zip(coefficients.iter().copied()).collect();
        self.model.add_row(lower, upper, entries);
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: Sense) {
        self.model.set_sense(sense);
    }

    fn set_costs(&mut self, costs: &[f64]) -> Result<(), SolverError> {
        if costs.len() != self.model.num_columns() {
            return Err(SolverError::LengthMismatch {
                what: "objective costs",
                expected: self.model.num_columns(),
                found: costs.len(),
            });
        }
        if costs.iter().any(|c| !c.is_finite()) {
            return Err(SolverError::NonFiniteValue("objective cost"));
        }
        for (column, &cost) in self.model.columns.iter_mut().zip(costs) {
            column.cost = cost;
        }
        Ok(())
    }

    fn solve(&mut self, time_limit: Duration) -> Result<SolveOutcome, SolverError> {
        let mut solver = Solver::new().with_time_limit(time_limit);
        if let Some(max) = self.max_iterations {
            solver = solver.with_max_iterations(max);
        }
        self.solution = solver.solve(&self.model)?;
        Ok(SolveOutcome {
            valid: self.solution.is_optimal(),
            values: self.solution.values.clone(),
        })
    }

    fn diagnostics(&self) -> Diagnostics {
        let objective_value =
            (!self.solution.values.is_empty()).then_some(self.solution.objective_value);
        Diagnostics {
            num_rows: self.model.num_rows(),
            num_columns: self.model.num_columns(),
            num_nonzeros: self.model.num_nonzeros(),
            status: self.solution.status.to_string(),
            iteration_count: self.solution.iterations,
            primal_status: self.solution.primal_status().to_string(),
            dual_status: self.solution.dual_status().to_string(),
            basis_validity: self.solution.basis_validity().to_string(),
            objective_value,
            solver_name: SOLVER_NAME.to_string(),
            solver_version: SOLVER_VERSION.to_string(),
        }
    }

    fn num_columns(&self) -> usize {
        self.model.num_columns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_before_and_after_solve() {
        let mut backend = SimplexBackend::new();
        backend.add_variables(&[0.0, 0.0], &[4.0, 4.0]).unwrap();
        backend.add_row(0.0, 5.0, &[0, 1], &[1.0, 1.0]).unwrap();
        backend.set_objective_sense(Sense::Maximize);
        backend.set_costs(&[1.0, 2.0]).unwrap();

        let before = backend.diagnostics();
        assert_eq!(before.status, "Not Set");
        assert_eq!(before.num_columns, 2);
        assert_eq!(before.num_rows, 1);
        assert_eq!(before.num_nonzeros, 2);
        assert_eq!(before.objective_value, None);

        let outcome = backend.solve(Duration::from_secs(5)).unwrap();
        assert!(outcome.valid);
        assert!((outcome.values[0] - 1.0).abs() < 1e-6);
        assert!((outcome.values[1] - 4.0).abs() < 1e-6);

        let after = backend.diagnostics();
        assert_eq!(after.status, "Optimal");
        assert_eq!(after.primal_status, "Feasible");
        assert_eq!(after.dual_status, "Feasible");
        assert_eq!(after.basis_validity, "Valid");
        assert!(after.iteration_count > 0);
        assert!((after.objective_value.unwrap() - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_outcome_is_not_valid() {
        let mut backend = SimplexBackend::new();
        backend.add_variables(&[0.0], &[1.0]).unwrap();
        backend.add_row(2.0, 3.0, &[0], &[1.0]).unwrap();

        let outcome = backend.solve(Duration::from_secs(5)).unwrap();
        assert!(!outcome.valid);
        assert_eq!(backend.diagnostics().status, "Infeasible");
        assert_eq!(backend.diagnostics().primal_status, "Infeasible");
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut backend = SimplexBackend::new();
        assert!(matches!(
            backend.add_variables(&[0.0, 0.0], &[1.0]),
            Err(SolverError::LengthMismatch { .. })
        ));
        assert_eq!(
            backend.add_variables(&[0.0, f64::NEG_INFINITY], &[1.0, 1.0]),
            Err(SolverError::NonFiniteLowerBound(1))
        );
        assert_eq!(backend.num_columns(), 0);

        backend.add_variables(&[0.0], &[1.0]).unwrap();
        assert_eq!(
            backend.add_row(0.0, 1.0, &[3], &[1.0]),
            Err(SolverError::ColumnOutOfRange { index: 3, columns: 1 })
        );
        assert!(matches!(
            backend.set_costs(&[1.0, 2.0]),
            Err(SolverError::LengthMismatch { .. })
        ));
    }
}
