//! Per-constraint feasibility pre-check.
//!
//! Given fixed variable bounds, the sum over a constraint's scope can only
//! land in `[sum of lower, sum of upper]`. A constraint whose `[lb, ub]`
//! misses that range cannot be satisfied by any solver. Interactions between
//! overlapping constraints are not examined; the solver has the last word.

use std::fmt;

use tracing::{debug, warn};

use crate::bounds::VariableBounds;
use crate::constraints::Constraint;
use crate::error::{Error, Result};
use crate::records::RecordTable;
use crate::scope;

/// A constraint whose declared bounds miss its achievable range
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Position of the constraint in the problem
    pub index: usize,
    pub constraint: Constraint,
    pub min_achievable: f64,
    pub max_achievable: f64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} (achievable range [{}, {}])",
            self.index, self.constraint, self.min_achievable, self.max_achievable
        )
    }
}

/// Fail on the first constraint that cannot be satisfied
pub fn check_constraints(
    records: &RecordTable,
    bounds: &VariableBounds,
    constraints: &[Constraint],
) -> Result<()> {
    ensure_aligned(records, bounds)?;
    for (index, constraint) in constraints.iter().enumerate() {
        if let Some(violation) = evaluate(records, bounds, index, constraint)? {
            warn!(%violation, "constraint cannot be satisfied");
            return Err(Error::ConstraintInfeasible(Box::new(violation)));
        }
    }
    debug!(constraints = constraints.len(), "all constraints compatible with variable bounds");
    Ok(())
}

/// Every constraint that cannot be satisfied, in problem order
pub fn collect_violations(
    records: &RecordTable,
    bounds: &VariableBounds,
    constraints: &[Constraint],
) -> Result<Vec<Violation>> {
    ensure_aligned(records, bounds)?;
    let mut violations = Vec::new();
    for (index, constraint) in constraints.iter().enumerate() {
        if let Some(violation) = evaluate(records, bounds, index, constraint)? {
            violations.push(violation);
        }
    }
    Ok(violations)
}

fn ensure_aligned(records: &RecordTable, bounds: &VariableBounds) -> Result<()> {
    if records.len() != bounds.len() {
        return Err(Error::Schema(format!(
            "{} variable bounds for {} records",
            bounds.len(),
            records.len()
        )));
    }
    Ok(())
}

fn evaluate(
    records: &RecordTable,
    bounds: &VariableBounds,
    index: usize,
    constraint: &Constraint,
) -> Result<Option<Violation>> {
    let scope = scope::resolve(records, &constraint.filters)?;
    let (min_achievable, max_achievable) = bounds.achievable_range(&scope);

    if constraint.ub < min_achievable || constraint.lb > max_achievable {
        return Ok(Some(Violation {
            index,
            constraint: constraint.clone(),
            min_achievable,
            max_achievable,
        }));
    }
    Ok(None)
}
