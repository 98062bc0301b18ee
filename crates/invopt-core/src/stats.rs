use std::collections::BTreeMap;
use std::time::Instant;

use invopt_solver::Diagnostics;
use serde::Serialize;
use tracing::info;

/// Everything a run reports besides the solution itself
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    pub date: String,
    pub args: serde_json::Value,
    /// Seconds spent per stage, keyed like `build_model(s)`
    pub timings: BTreeMap<String, f64>,
    #[serde(rename = "global_time(s)", skip_serializing_if = "Option::is_none")]
    pub global_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lp: Option<LpSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solving: Option<SolvingStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpSize {
    pub num_column: usize,
    pub num_row: usize,
    pub nonzero: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvingStats {
    pub status: String,
    pub iteration_count: usize,
    pub primal_solution_status: String,
    pub dual_solution_status: String,
    pub basis_validity: String,
    pub objective_value: Option<f64>,
    pub solver: SolverInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolverInfo {
    pub name: String,
    pub version: String,
}

impl RunStatistics {
    pub fn new(args: serde_json::Value) -> Self {
        Self {
            date: chrono::Local::now().format("%Y%m%dT%H:%M").to_string(),
            args,
            ..Self::default()
        }
    }

    /// Copy LP size and solver status out of a diagnostics snapshot
    pub fn record_diagnostics(&mut self, diagnostics: &Diagnostics) {
        self.lp = Some(LpSize {
            num_column: diagnostics.num_columns,
            num_row: diagnostics.num_rows,
            nonzero: diagnostics.num_nonzeros,
        });
        self.solving = Some(SolvingStats {
            status: diagnostics.status.clone(),
            iteration_count: diagnostics.iteration_count,
            primal_solution_status: diagnostics.primal_status.clone(),
            dual_solution_status: diagnostics.dual_status.clone(),
            basis_validity: diagnostics.basis_validity.clone(),
            objective_value: diagnostics.objective_value,
            solver: SolverInfo {
                name: diagnostics.solver_name.clone(),
                version: diagnostics.solver_version.clone(),
            },
        });
    }

    /// Run `f`, log around it and store its wall time under `key`
    pub fn timed<T>(&mut self, key: &str, label: &str, f: impl FnOnce() -> T) -> T {
        info!("{}", label);
        let watch = Stopwatch::start();
        let result = f();
        let elapsed = watch.elapsed_secs();
        info!("elapsed time {:.6}s in {}", elapsed, label);
        self.timings.insert(key.to_string(), elapsed);
        result
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Stopwatch(Instant);

impl Stopwatch {
    pub fn start() -> Self {
        Stopwatch(Instant::now())
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.0.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_records_elapsed_time() {
        let mut stats = RunStatistics::new(serde_json::json!({"data": "data.csv"}));
        let result = stats.timed("test_stat(s)", "adding", || 1 + 2 + 3);

        assert_eq!(result, 6);
        assert!(stats.timings["test_stat(s)"] >= 0.0);
        assert_eq!(stats.date.len(), "20240101T00:00".len());
    }

    #[test]
    fn test_stopwatch_is_monotonic() {
        let watch = Stopwatch::start();
        let first = watch.elapsed_secs();
        assert!(first >= 0.0);
        assert!(watch.elapsed_secs() >= first);
    }

    #[test]
    fn test_serialized_layout() {
        let mut stats = RunStatistics::new(serde_json::Value::Null);
        stats.global_time = Some(1.5);
        stats.record_diagnostics(&Diagnostics {
            num_rows: 3,
            num_columns: 4,
            num_nonzeros: 6,
            status: "Optimal".to_string(),
            iteration_count: 2,
            primal_status: "Feasible".to_string(),
            dual_status: "Feasible".to_string(),
            basis_validity: "Valid".to_string(),
            objective_value: Some(110.0),
            solver_name: "invopt-simplex".to_string(),
            solver_version: "0.1.0".to_string(),
        });

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["global_time(s)"], 1.5);
        assert_eq!(json["lp"]["num_row"], 3);
        assert_eq!(json["lp"]["nonzero"], 6);
        assert_eq!(json["solving"]["status"], "Optimal");
        assert_eq!(json["solving"]["solver"]["name"], "invopt-simplex");
    }
}
