use std::path::PathBuf;

use invopt_solver::SolverError;
use thiserror::Error;

use crate::builder::BuilderState;
use crate::checker::Violation;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Variable boundaries incompatible with constraint {0}")]
    ConstraintInfeasible(Box<Violation>),
    #[error("No valid solution found (status: {status})")]
    SolveFailure { status: String },
    #[error("Cannot {operation} while the model builder is {state}")]
    InvalidState {
        operation: &'static str,
        state: BuilderState,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Solver error: {0}")]
    Backend(#[from] SolverError),
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
