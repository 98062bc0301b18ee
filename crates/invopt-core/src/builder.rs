use std::fmt;
use std::time::Duration;

use invopt_solver::{Diagnostics, LpBackend, SimplexBackend};
use tracing::{debug, info};

use crate::bounds::{ScaleFactors, VariableBounds};
use crate::config::ObjectiveSense;
use crate::constraints::Constraint;
use crate::error::{Error, Result};
use crate::records::RecordTable;
use crate::scope;

/// Lifecycle of a [`ModelBuilder`]; stages only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Created,
    VariablesDeclared,
    ModelBuilt,
    Solved,
    /// A stage failed part-way; the backend content is unusable
    Failed,
}

impl fmt::Display for BuilderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuilderState::Created => "created",
            BuilderState::VariablesDeclared => "holding declared variables",
            BuilderState::ModelBuilt => "holding a built model",
            BuilderState::Solved => "solved",
            BuilderState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Assembles one LP into an exclusively owned backend and solves it once.
///
/// Variable `i` is record `i`. Each constraint becomes one ranged row with
/// unit coefficients over its scope; the objective takes each record's reward.
pub struct ModelBuilder<B: LpBackend = SimplexBackend> {
    backend: B,
    state: BuilderState,
    bounds: Option<VariableBounds>,
}

impl ModelBuilder<SimplexBackend> {
    pub fn new() -> Self {
        Self::with_backend(SimplexBackend::new())
    }
}

impl Default for ModelBuilder<SimplexBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: LpBackend> ModelBuilder<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            state: BuilderState::Created,
            bounds: None,
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Bounds registered by [`create_variables`](Self::create_variables)
    pub fn bounds(&self) -> Option<&VariableBounds> {
        self.bounds.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Register one column per record, bounded by the scaled reference value
    pub fn create_variables(
        &mut self,
        records: &RecordTable,
        factors: ScaleFactors,
        reference_field: &str,
    ) -> Result<&VariableBounds> {
        self.require_state(BuilderState::Created, "create variables")?;

        let bounds = match self.declare_columns(records, factors, reference_field) {
            Ok(bounds) => bounds,
            Err(e) => {
                self.state = BuilderState::Failed;
                return Err(e);
            }
        };
        debug!(columns = bounds.len(), reference = reference_field, "declared variables");
        self.state = BuilderState::VariablesDeclared;
        Ok(self.bounds.insert(bounds))
    }

    fn declare_columns(
        &mut self,
        records: &RecordTable,
        factors: ScaleFactors,
        reference_field: &str,
    ) -> Result<VariableBounds> {
        let bounds = VariableBounds::compute(records, factors, reference_field)?;
        self.backend.add_variables(&bounds.lower, &bounds.upper)?;
        Ok(bounds)
    }

    /// Add one row per constraint, then the objective
    pub fn build_model(
        &mut self,
        records: &RecordTable,
        constraints: &[Constraint],
        objective_field: &str,
        sense: ObjectiveSense,
    ) -> Result<()> {
        self.require_state(BuilderState::VariablesDeclared, "build the model")?;

        if let Err(e) = self.add_rows_and_objective(records, constraints, objective_field, sense) {
            self.state = BuilderState::Failed;
            return Err(e);
        }
        self.state = BuilderState::ModelBuilt;
        Ok(())
    }

    fn add_rows_and_objective(
        &mut self,
        records: &RecordTable,
        constraints: &[Constraint],
        objective_field: &str,
        sense: ObjectiveSense,
    ) -> Result<()> {
        let columns = self.backend.num_columns();
        if records.len() != columns {
            return Err(Error::Schema(format!(
                "{} records for {} declared variables",
                records.len(),
                columns
            )));
        }

        for (i, constraint) in constraints.iter().enumerate() {
            let scope = scope::resolve(records, &constraint.filters)?;
            if scope.is_empty() {
                debug!(constraint = i, "constraint scope is empty");
            }
            let coefficients = vec![1.0; scope.len()];
            self.backend
                .add_row(constraint.lb, constraint.ub, &scope, &coefficients)?;
        }

        let reward = records.numeric_column_or_zero(objective_field)?;
        self.backend.set_objective_sense(sense.into());
        self.backend.set_costs(&reward)?;

        info!(
            rows = constraints.len(),
            columns,
            objective = objective_field,
            %sense,
            "built model"
        );
        Ok(())
    }

    /// Run the backend once within `time_limit`.
    ///
    /// Returns `(feasible, values)`; `feasible` is false for infeasible,
    /// unbounded and interrupted runs alike.
    pub fn solve(&mut self, time_limit: Duration) -> Result<(bool, Vec<f64>)> {
        self.require_state(BuilderState::ModelBuilt, "solve")?;

        let outcome = match self.backend.solve(time_limit) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = BuilderState::Failed;
                return Err(e.into());
            }
        };
        self.state = BuilderState::Solved;
        info!(
            valid = outcome.valid,
            status = %self.backend.diagnostics().status,
            "solve finished"
        );
        Ok((outcome.valid, outcome.values))
    }

    /// Like [`solve`](Self::solve), but anything short of optimal is a `SolveFailure`
    pub fn solve_or_fail(&mut self, time_limit: Duration) -> Result<Vec<f64>> {
        let (valid, values) = self.solve(time_limit)?;
        if !valid {
            return Err(Error::SolveFailure {
                status: self.backend.diagnostics().status,
            });
        }
        Ok(values)
    }

    /// Snapshot of the backend; never changes its state
    pub fn statistics(&self) -> Diagnostics {
        self.backend.diagnostics()
    }

    fn require_state(&self, expected: BuilderState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::FeatureFilter;
    use crate::records::sample_table;

    fn category(value: &str, lb: f64, ub: f64) -> Constraint {
        Constraint::new(lb, ub, vec![FeatureFilter::new("CATEGORY", vec![value.into()])])
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "got {:?}, expected {:?}", actual, expected);
        }
    }

    #[test]
    fn test_model_builder_end_to_end() {
        let table = sample_table();
        let mut mb = ModelBuilder::new();

        mb.create_variables(&table, ScaleFactors::new(0.0, 1.0), "QUANTITY")
            .unwrap();
        assert_eq!(mb.statistics().num_columns, table.len());

        let constraints = vec![
            category("A", 0.0, 10.0),
            category("B", 0.0, 10.0),
            Constraint::new(0.0, 10.0, vec![]),
        ];
        mb.build_model(&table, &constraints, "CONTRIB", ObjectiveSense::Max)
            .unwrap();

        let (is_ok, values) = mb.solve(Duration::from_secs(60)).unwrap();
        assert!(is_ok);
        assert_close(&values, &[10.0, 0.0, 0.0]);
        assert!((values.iter().sum::<f64>() - 10.0).abs() < 1e-6);

        let stats = mb.statistics();
        assert_eq!(stats.num_rows, 3);
        assert_eq!(stats.num_nonzeros, 6);
        assert_eq!(stats.status, "Optimal");
        assert_eq!(mb.state(), BuilderState::Solved);
    }

    #[test]
    fn test_minimize_prefers_lower_bounds() {
        let table = sample_table();
        let mut mb = ModelBuilder::new();
        mb.create_variables(&table, ScaleFactors::new(0.5, 1.0), "QUANTITY")
            .unwrap();
        mb.build_model(&table, &[Constraint::new(0.0, 100.0, vec![])], "CONTRIB", ObjectiveSense::Min)
            .unwrap();

        let values = mb.solve_or_fail(Duration::from_secs(60)).unwrap();
        assert_close(&values, &[5.0, 10.0, 15.0]);
    }

    #[test]
    fn test_missing_reward_counts_as_zero() {
        let table = RecordTable::from_columns(vec![
            ("QUANTITY", vec![Some(10.0.into()), Some(10.0.into())]),
            ("CONTRIB", vec![None, Some(1.0.into())]),
        ])
        .unwrap();
        let mut mb = ModelBuilder::new();
        mb.create_variables(&table, ScaleFactors::new(0.0, 1.0), "QUANTITY")
            .unwrap();
        mb.build_model(&table, &[Constraint::new(0.0, 10.0, vec![])], "CONTRIB", ObjectiveSense::Max)
            .unwrap();

        let values = mb.solve_or_fail(Duration::from_secs(60)).unwrap();
        assert_close(&values, &[0.0, 10.0]);
    }

    #[test]
    fn test_empty_scope_row_is_registered() {
        let table = sample_table();
        let mut mb = ModelBuilder::new();
        mb.create_variables(&table, ScaleFactors::new(0.0, 1.0), "QUANTITY")
            .unwrap();
        mb.build_model(&table, &[category("Z", 0.0, 5.0)], "CONTRIB", ObjectiveSense::Max)
            .unwrap();

        let stats = mb.statistics();
        assert_eq!(stats.num_rows, 1);
        assert_eq!(stats.num_nonzeros, 0);
        let (is_ok, values) = mb.solve(Duration::from_secs(60)).unwrap();
        assert!(is_ok);
        assert_close(&values, &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_infeasible_model_reports_failure() {
        // A needs at least 50 but can reach only 40
        let table = sample_table();
        let mut mb = ModelBuilder::new();
        mb.create_variables(&table, ScaleFactors::new(0.0, 1.0), "QUANTITY")
            .unwrap();
        mb.build_model(&table, &[category("A", 50.0, 60.0)], "CONTRIB", ObjectiveSense::Max)
            .unwrap();

        let err = mb.solve_or_fail(Duration::from_secs(60)).unwrap_err();
        assert!(matches!(err, Error::SolveFailure { ref status } if status == "Infeasible"));
    }

    #[test]
    fn test_stages_out_of_order() {
        let table = sample_table();
        let mut mb = ModelBuilder::new();

        assert!(matches!(
            mb.build_model(&table, &[], "CONTRIB", ObjectiveSense::Max),
            Err(Error::InvalidState { state: BuilderState::Created, .. })
        ));
        assert!(matches!(
            mb.solve(Duration::from_secs(1)),
            Err(Error::InvalidState { .. })
        ));

        mb.create_variables(&table, ScaleFactors::default(), "QUANTITY")
            .unwrap();
        assert!(matches!(
            mb.create_variables(&table, ScaleFactors::default(), "QUANTITY"),
            Err(Error::InvalidState { .. })
        ));
        assert!(matches!(
            mb.solve(Duration::from_secs(1)),
            Err(Error::InvalidState { state: BuilderState::VariablesDeclared, .. })
        ));

        mb.build_model(&table, &[], "CONTRIB", ObjectiveSense::Max).unwrap();
        mb.solve(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            mb.solve(Duration::from_secs(1)),
            Err(Error::InvalidState { state: BuilderState::Solved, .. })
        ));
    }

    #[test]
    fn test_failed_stage_poisons_builder() {
        let table = sample_table();
        let mut mb = ModelBuilder::new();
        mb.create_variables(&table, ScaleFactors::default(), "QUANTITY")
            .unwrap();

        let unknown = Constraint::new(0.0, 1.0, vec![FeatureFilter::new("REGION", vec!["R1".into()])]);
        assert!(matches!(
            mb.build_model(&table, &[unknown], "CONTRIB", ObjectiveSense::Max),
            Err(Error::UnknownField(_))
        ));
        assert_eq!(mb.state(), BuilderState::Failed);
        assert!(matches!(
            mb.build_model(&table, &[], "CONTRIB", ObjectiveSense::Max),
            Err(Error::InvalidState { state: BuilderState::Failed, .. })
        ));
    }

    #[test]
    fn test_record_count_must_match_variables() {
        let table = sample_table();
        let other = RecordTable::from_columns(vec![("CONTRIB", vec![Some(1.0.into())])]).unwrap();
        let mut mb = ModelBuilder::new();
        mb.create_variables(&table, ScaleFactors::default(), "QUANTITY")
            .unwrap();

        assert!(matches!(
            mb.build_model(&other, &[], "CONTRIB", ObjectiveSense::Max),
            Err(Error::Schema(_))
        ));
    }
}
