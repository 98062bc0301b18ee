use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::records::Scalar;

/// Categorical membership predicate: `name in values`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFilter {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl FeatureFilter {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A missing cell never matches
    pub fn accepts(&self, cell: Option<&Scalar>) -> bool {
        cell.is_some_and(|value| self.values.contains(value))
    }
}

impl fmt::Display for FeatureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {{", self.name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("}")
    }
}

/// Aggregate bound `lb <= sum over scope <= ub`. An empty filter list
/// applies to every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub lb: f64,
    pub ub: f64,
    #[serde(rename = "features")]
    pub filters: Vec<FeatureFilter>,
}

impl Constraint {
    pub fn new(lb: f64, ub: f64, filters: Vec<FeatureFilter>) -> Self {
        Self { lb, ub, filters }
    }

    pub fn applies_to_all(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] over ", self.lb, self.ub)?;
        if self.filters.is_empty() {
            return f.write_str("all records");
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{}", filter)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub constraints: Vec<Constraint>,
}

impl Problem {
    /// Malformed JSON is a parse error; a well-formed document of the wrong
    /// shape (missing `constraints`, `lb`, ...) is a schema error.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(source).map_err(Error::Parse)?;
        let problem: Problem =
            serde_json::from_value(value).map_err(|e| Error::Schema(e.to_string()))?;

        for (i, c) in problem.constraints.iter().enumerate() {
            if c.lb > c.ub {
                warn!(constraint = i, lb = c.lb, ub = c.ub, "constraint has lb > ub");
            }
        }
        Ok(problem)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::Serialize)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Read the constraint file into a Problem
pub fn read_constraints_file(path: impl AsRef<Path>) -> Result<Problem> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Problem::from_json_str(&source)
}

pub fn write_constraints_file(problem: &Problem, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, problem.to_json_string()?).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONSTRAINTS_JSON: &str = r#"{
        "constraints": [
            {"lb": 0, "ub": 10, "features": [
                {"name": "feature1", "values": ["value1"]},
                {"name": "feature2", "values": ["value2", 3]}
            ]},
            {"lb": 5, "ub": 15, "features": [{"name": "feature3", "values": [true]}]},
            {"lb": 0, "ub": 20, "features": []}
        ]
    }"#;

    #[test]
    fn test_read_constraints_valid() {
        let problem = Problem::from_json_str(CONSTRAINTS_JSON).unwrap();

        assert_eq!(problem.len(), 3);
        let first = &problem.constraints[0];
        assert_eq!(first.lb, 0.0);
        assert_eq!(first.ub, 10.0);
        assert_eq!(first.filters.len(), 2);
        assert_eq!(first.filters[1].name, "feature2");
        assert_eq!(
            first.filters[1].values,
            vec![Scalar::Text("value2".to_string()), Scalar::Number(3.0)]
        );
        assert_eq!(problem.constraints[1].filters[0].values, vec![Scalar::Bool(true)]);
        assert!(problem.constraints[2].applies_to_all());
    }

    #[test]
    fn test_read_constraints_invalid_json() {
        let err = Problem::from_json_str("invalid JSON").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_inverted_constraint_still_loads() {
        let problem = Problem::from_json_str(
            r#"{"constraints": [{"lb": 20, "ub": 5, "features": [{"name": "CATEGORY", "values": ["A"]}]}]}"#,
        )
        .unwrap();

        assert_eq!(problem.len(), 1);
        assert_eq!(problem.constraints[0].lb, 20.0);
        assert_eq!(problem.constraints[0].ub, 5.0);
    }

    #[test]
    fn test_read_constraints_missing_keys() {
        let err = Problem::from_json_str(r#"{"invalid_key": []}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(ref msg) if msg.contains("constraints")));

        let err = Problem::from_json_str(r#"{"constraints": [{"lb": 1, "features": []}]}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(ref msg) if msg.contains("ub")));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("constraints.json");
        let problem = Problem::from_json_str(CONSTRAINTS_JSON).unwrap();

        write_constraints_file(&problem, &path).unwrap();
        let reread = read_constraints_file(&path).unwrap();

        assert_eq!(reread, problem);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_constraints_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_display() {
        let constraint = Constraint::new(
            0.0,
            10.0,
            vec![FeatureFilter::new("CATEGORY", vec!["A".into(), "B".into()])],
        );
        assert_eq!(constraint.to_string(), "[0, 10] over CATEGORY in {A, B}");
        assert_eq!(Constraint::new(1.0, 2.5, vec![]).to_string(), "[1, 2.5] over all records");
    }

    #[test]
    fn test_filter_accepts() {
        let filter = FeatureFilter::new("store", vec![1.0.into(), 2.0.into()]);
        assert!(filter.accepts(Some(&Scalar::Number(2.0))));
        assert!(!filter.accepts(Some(&Scalar::Number(3.0))));
        assert!(!filter.accepts(Some(&Scalar::Text("1".to_string()))));
        assert!(!filter.accepts(None));
    }
}
