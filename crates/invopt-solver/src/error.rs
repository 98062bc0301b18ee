use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Length mismatch in {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Column index {index} out of range ({columns} columns declared)")]
    ColumnOutOfRange { index: usize, columns: usize },
    #[error("Column {0} has a non-finite lower bound")]
    NonFiniteLowerBound(usize),
    #[error("Non-finite value in {0}")]
    NonFiniteValue(&'static str),
}
