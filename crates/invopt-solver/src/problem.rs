/// Optimization direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

/// A decision variable with box bounds and an objective coefficient
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub lower: f64,
    pub upper: f64,
    pub cost: f64,
}

/// A ranged linear row: `lower <= sum(coef * x[index]) <= upper`
///
/// Either side may be infinite. Entries are sparse `(column, coefficient)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub lower: f64,
    pub upper: f64,
    pub entries: Vec<(usize, f64)>,
}

/// Represents a linear programming problem with bounded columns and ranged rows
#[derive(Debug, Clone, Default)]
pub struct LpModel {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub sense: Sense,
}

impl LpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, lower: f64, upper: f64) -> usize {
        self.columns.push(Column {
            lower,
            upper,
            cost: 0.0,
        });
        self.columns.len() - 1
    }

    pub fn add_row(&mut self, lower: f64, upper: f64, entries: Vec<(usize, f64)>) -> usize {
        self.rows.push(Row {
            lower,
            upper,
            entries,
        });
        self.rows.len() - 1
    }

    pub fn set_sense(&mut self, sense: Sense) {
        self.sense = sense;
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of stored row entries with a non-zero coefficient
    pub fn num_nonzeros(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.entries.iter())
            .filter(|(_, coef)| *coef != 0.0)
            .count()
    }

    /// Objective value of a full assignment of column values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(values)
            .map(|(c, v)| c.cost * v)
            .sum()
    }

    /// Row activity `sum(coef * x)` of a full assignment
    pub fn row_activity(&self, row: usize, values: &[f64]) -> f64 {
        self.rows[row]
            .entries
            .iter()
            .map(|&(j, coef)| coef * values[j])
            .sum()
    }
}
