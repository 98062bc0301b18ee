use crate::error::{Error, Result};
use crate::records::RecordTable;

/// Problem-wide multipliers applied to the reference column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub decrease: f64,
    pub increase: f64,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self {
            decrease: 0.8,
            increase: 1.5,
        }
    }
}

impl ScaleFactors {
    pub fn new(decrease: f64, increase: f64) -> Self {
        Self { decrease, increase }
    }

    /// Both factors finite and `decrease <= increase`
    pub fn validate(&self) -> Result<()> {
        if !self.decrease.is_finite() || !self.increase.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "scale factors must be finite (decrease {}, increase {})",
                self.decrease, self.increase
            )));
        }
        if self.decrease > self.increase {
            return Err(Error::InvalidConfig(format!(
                "decrease factor {} exceeds increase factor {}",
                self.decrease, self.increase
            )));
        }
        Ok(())
    }
}

/// Per-variable bounds, index-aligned with the record table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl VariableBounds {
    /// `lower[i] = decrease * reference[i]`, `upper[i] = increase * reference[i]`.
    /// No clamping: negative references give negative (and possibly inverted) bounds.
    pub fn from_reference(reference: &[f64], factors: ScaleFactors) -> Self {
        Self {
            lower: reference.iter().map(|r| factors.decrease * r).collect(),
            upper: reference.iter().map(|r| factors.increase * r).collect(),
        }
    }

    /// Bounds from a numeric column of the record table
    pub fn compute(records: &RecordTable, factors: ScaleFactors, reference_field: &str) -> Result<Self> {
        let reference = records.numeric_column(reference_field)?;
        Ok(Self::from_reference(&reference, factors))
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// `(sum of lower, sum of upper)` over the given indices
    pub fn achievable_range(&self, scope: &[usize]) -> (f64, f64) {
        scope.iter().fold((0.0, 0.0), |(min, max), &i| {
            (min + self.lower[i], max + self.upper[i])
        })
    }
}
