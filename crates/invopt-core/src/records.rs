use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// A single cell or filter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Interpret a raw CSV field after trimming surrounding whitespace.
    ///
    /// Empty and `NaN` fields are missing. Only finite numbers parse as
    /// numbers, so `inf` or `Infinity` stay text.
    pub fn parse_cell(raw: &str) -> Option<Scalar> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return None;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Some(Scalar::Number(n));
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Some(Scalar::Bool(true));
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Some(Scalar::Bool(false));
        }
        Some(Scalar::Text(trimmed.to_string()))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Column-oriented table of records. Row `i` of every column is record `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    names: Vec<String>,
    columns: Vec<Vec<Option<Scalar>>>,
    index: HashMap<String, usize>,
    len: usize,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns of equal length
    pub fn from_columns<N: Into<String>>(columns: Vec<(N, Vec<Option<Scalar>>)>) -> Result<Self> {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Option<Scalar>>) -> Result<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::Schema(format!("duplicate column '{}'", name)));
        }
        if !self.names.is_empty() && values.len() != self.len {
            return Err(Error::Schema(format!(
                "column '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.len
            )));
        }
        self.len = values.len();
        self.index.insert(name.clone(), self.names.len());
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Result<&[Option<Scalar>]> {
        self.index
            .get(name)
            .map(|&i| self.columns[i].as_slice())
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Numeric view of a column where every cell must be a number
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                Some(Scalar::Number(n)) => Ok(*n),
                Some(other) => Err(Error::Schema(format!(
                    "non-numeric value '{}' in column '{}' at row {}",
                    other, name, row
                ))),
                None => Err(Error::Schema(format!(
                    "missing value in column '{}' at row {}",
                    name, row
                ))),
            })
            .collect()
    }

    /// Numeric view of a column with missing cells read as zero
    pub fn numeric_column_or_zero(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                Some(Scalar::Number(n)) => Ok(*n),
                None => Ok(0.0),
                Some(other) => Err(Error::Schema(format!(
                    "non-numeric value '{}' in column '{}' at row {}",
                    other, name, row
                ))),
            })
            .collect()
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();
        let mut columns: Vec<Vec<Option<Scalar>>> = vec![Vec::new(); headers.len()];

        for record in rdr.records() {
            let record = record?;
            for (column, field) in columns.iter_mut().zip(record.iter()) {
                column.push(Scalar::parse_cell(field));
            }
        }

        let table = Self::from_columns(headers.iter().zip(columns).collect())?;
        debug!(rows = table.len(), columns = table.names.len(), "read record table");
        Ok(table)
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_reader(file)
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.names)?;
        for row in 0..self.len {
            wtr.write_record(self.columns.iter().map(|column| match &column[row] {
                Some(value) => value.to_string(),
                None => String::new(),
            }))?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        self.write_csv(file)
    }
}

/// QUANTITY / CATEGORY / CONTRIB table shared by the unit tests
#[cfg(test)]
pub(crate) fn sample_table() -> RecordTable {
    RecordTable::from_columns(vec![
        ("QUANTITY", vec![Some(10.0.into()), Some(20.0.into()), Some(30.0.into())]),
        ("CATEGORY", vec![Some("A".into()), Some("B".into()), Some("A".into())]),
        ("CONTRIB", vec![Some(11.0.into()), Some(10.0.into()), Some(10.0.into())]),
    ])
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(Scalar::parse_cell(""), None);
        assert_eq!(Scalar::parse_cell("NaN"), None);
        assert_eq!(Scalar::parse_cell("12.5"), Some(Scalar::Number(12.5)));
        assert_eq!(Scalar::parse_cell(" 3 "), Some(Scalar::Number(3.0)));
        assert_eq!(Scalar::parse_cell("True"), Some(Scalar::Bool(true)));
        assert_eq!(Scalar::parse_cell("R1"), Some(Scalar::Text("R1".to_string())));
    }

    #[test]
    fn test_parse_cell_trims_text_and_keeps_infinity_as_text() {
        assert_eq!(Scalar::parse_cell(" A "), Some(Scalar::Text("A".to_string())));
        assert_eq!(Scalar::parse_cell("Inf"), Some(Scalar::Text("Inf".to_string())));
        assert_eq!(Scalar::parse_cell("-infinity"), Some(Scalar::Text("-infinity".to_string())));
        assert_eq!(Scalar::parse_cell(" nan "), None);

        let table = RecordTable::from_reader("F,V
 A,1
Inf,2
".as_bytes()).unwrap();
        assert_eq!(
            table.column("F").unwrap(),
            &[Some(Scalar::from("A")), Some(Scalar::from("Inf"))]
        );
    }

    #[test]
    fn test_read_csv_with_missing_cells() {
        let data = "F,V,CONTRIB\nA,10,1.5\nB,20,\n";
        let table = RecordTable::from_reader(data.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names(), &["F", "V", "CONTRIB"]);
        assert_eq!(table.numeric_column("V").unwrap(), vec![10.0, 20.0]);
        assert_eq!(table.numeric_column_or_zero("CONTRIB").unwrap(), vec![1.5, 0.0]);
        assert!(matches!(table.numeric_column("CONTRIB"), Err(Error::Schema(_))));
        assert!(matches!(table.numeric_column("F"), Err(Error::Schema(_))));
        assert!(matches!(table.column("MISSING"), Err(Error::UnknownField(name)) if name == "MISSING"));
    }

    #[test]
    fn test_ragged_csv_is_rejected() {
        let data = "A,B\n1,2\n3\n";
        assert!(matches!(RecordTable::from_reader(data.as_bytes()), Err(Error::Csv(_))));
    }

    #[test]
    fn test_push_column_checks_shape() {
        let mut table = sample_table();
        assert!(matches!(
            table.push_column("opt", vec![Some(1.0.into())]),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            table.push_column("CATEGORY", vec![None, None, None]),
            Err(Error::Schema(_))
        ));
        table.push_column("opt", vec![None, None, None]).unwrap();
        assert_eq!(table.column_names().len(), 4);
    }

    #[test]
    fn test_write_then_read() {
        let table = sample_table();
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text, "QUANTITY,CATEGORY,CONTRIB\n10,A,11\n20,B,10\n30,A,10\n");
        assert_eq!(RecordTable::from_reader(buf.as_slice()).unwrap(), table);
    }
}
