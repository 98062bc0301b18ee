use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use invopt_solver::Sense;
use serde::{Deserialize, Serialize};

use crate::bounds::ScaleFactors;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveSense {
    #[default]
    Max,
    Min,
}

impl FromStr for ObjectiveSense {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "max" => Ok(ObjectiveSense::Max),
            "min" => Ok(ObjectiveSense::Min),
            other => Err(Error::InvalidConfig(format!(
                "unknown objective sense '{}' (expected 'max' or 'min')",
                other
            ))),
        }
    }
}

impl fmt::Display for ObjectiveSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveSense::Max => f.write_str("max"),
            ObjectiveSense::Min => f.write_str("min"),
        }
    }
}

impl From<ObjectiveSense> for Sense {
    fn from(sense: ObjectiveSense) -> Self {
        match sense {
            ObjectiveSense::Max => Sense::Maximize,
            ObjectiveSense::Min => Sense::Minimize,
        }
    }
}

/// Knobs the core consumes; parsing them is the front end's job
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub factors: ScaleFactors,
    pub sense: ObjectiveSense,
    pub time_limit: Duration,
    /// Run the per-constraint feasibility check before solving
    pub check: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            factors: ScaleFactors::default(),
            sense: ObjectiveSense::Max,
            time_limit: Duration::from_secs(60),
            check: true,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.factors.validate()?;
        if self.time_limit.is_zero() {
            return Err(Error::InvalidConfig("time limit must be positive".to_string()));
        }
        Ok(())
    }
}
