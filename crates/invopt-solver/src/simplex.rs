use std::time::{Duration, Instant};

use crate::error::SolverError;
use crate::problem::{LpModel, Sense};
use crate::solution::{Solution, SolutionStatus};

/// Consecutive degenerate pivots tolerated before pricing falls back to Bland's rule
const DEGENERATE_SWITCH: usize = 50;

/// Bounded-variable two-phase simplex over a dense tableau
pub struct Solver {
    /// Maximum pivots (both phases together) before giving up
    max_iterations: usize,
    /// Tolerance for pivot and reduced-cost comparisons
    tolerance: f64,
    /// Tolerance for residual artificial mass after phase 1
    feasibility_tolerance: f64,
    /// Wall-clock budget for a single solve
    time_limit: Option<Duration>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
            time_limit: None,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Solve the model: phase 1 drives artificials out, phase 2 optimizes
    pub fn solve(&self, model: &LpModel) -> Result<Solution, SolverError> {
        let clock = Clock::start(self.time_limit);
        let Some(mut tableau) = self.build_tableau(model)? else {
            // A column with upper < lower can never be satisfied
            return Ok(Solution::infeasible(0));
        };
        let mut iterations = 0;

        if tableau.n_artificial > 0 {
            tableau.load_phase1_objective();
            let price_limit = tableau.n_cols;
            match self.iterate(&mut tableau, price_limit, &clock, &mut iterations) {
                SimplexResult::Optimal => {}
                SimplexResult::Unbounded => return Ok(Solution::infeasible(iterations)),
                SimplexResult::TimeLimit => {
                    return Ok(self.interrupted(SolutionStatus::TimeLimit, &tableau, model, iterations, false));
                }
                SimplexResult::IterationLimit => {
                    return Ok(self.interrupted(
                        SolutionStatus::IterationLimit,
                        &tableau,
                        model,
                        iterations,
                        false,
                    ));
                }
            }
            if tableau.artificial_mass() > self.feasibility_tolerance {
                return Ok(Solution::infeasible(iterations));
            }
            tableau.pin_artificials();
        }

        tableau.load_phase2_objective(model, self.tolerance);
        let price_limit = tableau.artificial_start;
        let status = match self.iterate(&mut tableau, price_limit, &clock, &mut iterations) {
            SimplexResult::Optimal => SolutionStatus::Optimal,
            SimplexResult::Unbounded => return Ok(Solution::unbounded(iterations)),
            SimplexResult::TimeLimit => SolutionStatus::TimeLimit,
            SimplexResult::IterationLimit => SolutionStatus::IterationLimit,
        };

        let values = tableau.column_values(model);
        let objective_value = model.objective_value(&values);
        Ok(Solution::with_point(status, values, objective_value, iterations, true))
    }

    fn interrupted(
        &self,
        status: SolutionStatus,
        tableau: &Tableau,
        model: &LpModel,
        iterations: usize,
        primal_feasible: bool,
    ) -> Solution {
        let values = tableau.column_values(model);
        let objective_value = model.objective_value(&values);
        Solution::with_point(status, values, objective_value, iterations, primal_feasible)
    }

    /// Shift columns to `0 <= y <= upper - lower`, split ranged rows and
    /// normalise every row to a non-negative right-hand side.
    ///
    /// Returns `None` when some column has `upper < lower`.
    fn build_tableau(&self, model: &LpModel) -> Result<Option<Tableau>, SolverError> {
        let n_vars = model.num_columns();
        let mut caps = Vec::with_capacity(n_vars);
        for (j, c) in model.columns.iter().enumerate() {
            if !c.lower.is_finite() {
                return Err(SolverError::NonFiniteLowerBound(j));
            }
            if c.upper.is_nan() || !c.cost.is_finite() {
                return Err(SolverError::NonFiniteValue("column"));
            }
            let cap = c.upper - c.lower;
            if cap < 0.0 {
                return Ok(None);
            }
            caps.push(cap);
        }

        let mut std_rows = Vec::new();
        for row in &model.rows {
            if row.lower.is_nan() || row.upper.is_nan() {
                return Err(SolverError::NonFiniteValue("row bound"));
            }
            let shift: f64 = row
                .entries
                .iter()
                .map(|&(j, coef)| coef * model.columns[j].lower)
                .sum();
            let lo = row.lower - shift;
            let hi = row.upper - shift;

            if row.lower == row.upper && lo.is_finite() {
                std_rows.push(StdRow::normalised(&row.entries, RowOp::Eq, lo));
                continue;
            }
            if lo.is_finite() {
                std_rows.push(StdRow::normalised(&row.entries, RowOp::Ge, lo));
            }
            if hi.is_finite() {
                std_rows.push(StdRow::normalised(&row.entries, RowOp::Le, hi));
            }
        }

        let n_slack = std_rows.iter().filter(|r| r.op != RowOp::Eq).count();
        let n_artificial = std_rows.iter().filter(|r| r.op != RowOp::Le).count();
        let n_cols = n_vars + n_slack + n_artificial;
        let n_constraints = std_rows.len();

        let mut upper = caps;
        upper.resize(n_cols, f64::INFINITY);

        let mut tableau = Tableau {
            data: vec![vec![0.0; n_cols + 1]; n_constraints + 1],
            basic_vars: vec![0; n_constraints],
            upper,
            flipped: vec![false; n_cols],
            n_vars,
            n_cols,
            n_artificial,
            artificial_start: n_vars + n_slack,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = tableau.artificial_start;
        for (i, r) in std_rows.iter().enumerate() {
            for &(j, coef) in &r.entries {
                tableau.data[i][j] += coef;
            }
            tableau.data[i][n_cols] = r.rhs;

            match r.op {
                RowOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                RowOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                RowOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        Ok(Some(tableau))
    }

    fn iterate(
        &self,
        tableau: &mut Tableau,
        price_limit: usize,
        clock: &Clock,
        iterations: &mut usize,
    ) -> SimplexResult {
        let mut degenerate_run = 0;

        loop {
            let bland = degenerate_run > DEGENERATE_SWITCH;
            let Some(entering) = self.find_entering(tableau, price_limit, bland) else {
                return SimplexResult::Optimal;
            };
            if *iterations >= self.max_iterations {
                return SimplexResult::IterationLimit;
            }
            if clock.expired() {
                return SimplexResult::TimeLimit;
            }
            let Some((step, leaving)) = self.ratio_test(tableau, entering) else {
                return SimplexResult::Unbounded;
            };

            match leaving {
                Leaving::BoundFlip => tableau.flip_column(entering),
                Leaving::AtLower(row) => tableau.pivot(row, entering),
                Leaving::AtUpper(row) => {
                    tableau.flip_basic(row);
                    tableau.pivot(row, entering);
                }
            }

            *iterations += 1;
            if step <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
        }
    }

    /// Dantzig pricing (most positive reduced cost) or Bland's first-improving column
    fn find_entering(&self, tableau: &Tableau, price_limit: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        let mut max_val = self.tolerance;
        let mut max_col = None;

        for j in 0..price_limit {
            if tableau.upper[j] <= self.tolerance {
                continue;
            }
            let reduced = tableau.data[obj_row][j];
            if reduced > max_val {
                if bland {
                    return Some(j);
                }
                max_val = reduced;
                max_col = Some(j);
            }
        }

        max_col
    }

    /// Longest step the entering column can take before a basic variable
    /// reaches one of its bounds, or the entering column its own upper bound.
    fn ratio_test(&self, tableau: &Tableau, col: usize) -> Option<(f64, Leaving)> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.n_cols;

        let mut best = tableau.upper[col];
        let mut leaving = Leaving::BoundFlip;

        for i in 0..n_constraints {
            let d = tableau.data[i][col];
            let rhs = tableau.data[i][rhs_col].max(0.0);
            let basic = tableau.basic_vars[i];

            let (ratio, candidate) = if d > self.tolerance {
                (rhs / d, Leaving::AtLower(i))
            } else if d < -self.tolerance && tableau.upper[basic].is_finite() {
                ((tableau.upper[basic] - rhs).max(0.0) / -d, Leaving::AtUpper(i))
            } else {
                continue;
            };

            let better = if ratio < best - self.tolerance {
                true
            } else if ratio <= best + self.tolerance {
                // ties go to the row with the lowest basic index
                match leaving {
                    Leaving::BoundFlip => false,
                    Leaving::AtLower(r) | Leaving::AtUpper(r) => basic < tableau.basic_vars[r],
                }
            } else {
                false
            };

            if better {
                best = ratio;
                leaving = candidate;
            }
        }

        best.is_finite().then_some((best, leaving))
    }
}

struct Clock {
    started: Instant,
    limit: Option<Duration>,
}

impl Clock {
    fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    fn expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.started.elapsed() >= limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOp {
    Le,
    Ge,
    Eq,
}

struct StdRow {
    entries: Vec<(usize, f64)>,
    op: RowOp,
    rhs: f64,
}

impl StdRow {
    /// Build a row whose right-hand side is non-negative. A `>=` row with a
    /// non-positive rhs becomes a `<=` row so its slack can start basic.
    fn normalised(entries: &[(usize, f64)], op: RowOp, rhs: f64) -> Self {
        let negate = match op {
            RowOp::Le | RowOp::Eq => rhs < 0.0,
            RowOp::Ge => rhs <= 0.0,
        };
        if !negate {
            return Self {
                entries: entries.to_vec(),
                op,
                rhs,
            };
        }
        let op = match op {
            RowOp::Le => RowOp::Ge,
            RowOp::Ge => RowOp::Le,
            RowOp::Eq => RowOp::Eq,
        };
        Self {
            entries: entries.iter().map(|&(j, c)| (j, -c)).collect(),
            op,
            rhs: -rhs,
        }
    }
}

struct Tableau {
    /// Constraint rows followed by the objective row; last column is the rhs
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    /// Upper bound of every (shifted) column; lower bounds are all zero
    upper: Vec<f64>,
    /// Columns currently expressed as `upper - y`
    flipped: Vec<bool>,
    n_vars: usize,
    n_cols: usize,
    n_artificial: usize,
    artificial_start: usize,
}

impl Tableau {
    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    /// Maximize the negated sum of artificials
    fn load_phase1_objective(&mut self) {
        let obj = self.obj_row();
        let art_end = self.artificial_start + self.n_artificial;

        self.data[obj].iter_mut().for_each(|v| *v = 0.0);
        for j in self.artificial_start..art_end {
            self.data[obj][j] = -1.0;
        }
        // Cancel the coefficients of the basic artificials
        for i in 0..obj {
            if self.basic_vars[i] >= self.artificial_start {
                for j in 0..=self.n_cols {
                    self.data[obj][j] += self.data[i][j];
                }
            }
        }
    }

    fn artificial_mass(&self) -> f64 {
        (0..self.obj_row())
            .filter(|&i| self.basic_vars[i] >= self.artificial_start)
            .map(|i| self.data[i][self.n_cols].abs())
            .sum()
    }

    /// Artificials left in the basis sit at zero and must stay there
    fn pin_artificials(&mut self) {
        for j in self.artificial_start..self.n_cols {
            self.upper[j] = 0.0;
        }
    }

    /// Load the model objective in the current (flipped) coordinates and
    /// price out the basic columns
    fn load_phase2_objective(&mut self, model: &LpModel, tolerance: f64) {
        let obj = self.obj_row();
        let sign = match model.sense {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
        };

        self.data[obj].iter_mut().for_each(|v| *v = 0.0);
        for (j, column) in model.columns.iter().enumerate() {
            let cost = sign * column.cost;
            self.data[obj][j] = if self.flipped[j] { -cost } else { cost };
        }

        for i in 0..obj {
            let basic = self.basic_vars[i];
            let ratio = self.data[obj][basic];
            if ratio.abs() > tolerance {
                for j in 0..=self.n_cols {
                    self.data[obj][j] -= ratio * self.data[i][j];
                }
            }
            self.data[obj][basic] = 0.0;
        }
    }

    /// Substitute `y = upper - y'` for a non-basic column
    fn flip_column(&mut self, col: usize) {
        let cap = self.upper[col];
        let rhs = self.n_cols;
        for row in self.data.iter_mut() {
            let coef = row[col];
            if coef != 0.0 {
                row[rhs] -= coef * cap;
                row[col] = -coef;
            }
        }
        self.flipped[col] = !self.flipped[col];
    }

    /// Substitute `y = upper - y'` for the basic column of `row`
    fn flip_basic(&mut self, row: usize) {
        let basic = self.basic_vars[row];
        let rhs = self.n_cols;
        for j in 0..self.n_cols {
            if j != basic {
                self.data[row][j] = -self.data[row][j];
            }
        }
        self.data[row][rhs] = self.upper[basic] - self.data[row][rhs];
        self.flipped[basic] = !self.flipped[basic];
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let n_rows = self.data.len();
        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for v in self.data[row].iter_mut() {
            *v /= pivot_val;
        }
        self.data[row][col] = 1.0;

        let pivot_row = self.data[row].clone();
        for i in 0..n_rows {
            if i == row {
                continue;
            }
            let factor = self.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in self.data[i].iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
            self.data[i][col] = 0.0;
        }
    }

    /// Map the tableau point back to the model's column space
    fn column_values(&self, model: &LpModel) -> Vec<f64> {
        let mut shifted = vec![0.0; self.n_vars];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < self.n_vars {
                shifted[basic] = self.data[i][self.n_cols];
            }
        }
        shifted
            .iter()
            .enumerate()
            .map(|(j, &y)| {
                let y = if self.flipped[j] { self.upper[j] - y } else { y };
                model.columns[j].lower + y
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Leaving {
    BoundFlip,
    AtLower(usize),
    AtUpper(usize),
}

enum SimplexResult {
    Optimal,
    Unbounded,
    TimeLimit,
    IterationLimit,
}
