pub mod bounds;
pub mod builder;
pub mod checker;
pub mod config;
pub mod constraints;
pub mod error;
pub mod export;
pub mod records;
pub mod scope;
pub mod stats;
pub mod synthetic;

pub use bounds::{ScaleFactors, VariableBounds};
pub use builder::{BuilderState, ModelBuilder};
pub use checker::{check_constraints, collect_violations, Violation};
pub use config::{ObjectiveSense, Settings};
pub use constraints::{read_constraints_file, write_constraints_file, Constraint, FeatureFilter, Problem};
pub use error::{Error, Result};
pub use records::{RecordTable, Scalar};
pub use scope::resolve;
pub use stats::{RunStatistics, Stopwatch};

pub use invopt_solver::{Diagnostics, LpBackend, SimplexBackend};
