//! `invopt` - bounded inventory allocation with linear programming
//!
//! ```bash
//! # Generate a demo inventory
//! invopt generate --output data/inventory.csv
//!
//! # Allocate quantities under the constraints, maximizing gross profit
//! invopt solve --constraints data/constraints.json --data data/inventory.csv \
//!     --var-col quantity --optim-col gross_profit
//!
//! # List every constraint that the variable bounds can never satisfy
//! invopt check --constraints data/constraints.json --data data/inventory.csv --var-col quantity
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use invopt_core::export::{export_solution, export_statistics, export_table, DEFAULT_SOLUTION_COLUMN};
use invopt_core::{
    check_constraints, collect_violations, read_constraints_file, synthetic, ModelBuilder, ObjectiveSense,
    RecordTable, RunStatistics, ScaleFactors, Settings, Stopwatch, VariableBounds, Violation,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "invopt")]
#[command(version, about = "Bounded inventory allocation with linear programming", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the LP from data and constraints, solve it and export the result
    Solve(SolveArgs),
    /// Report every constraint incompatible with the variable bounds
    Check(CheckArgs),
    /// Write a synthetic inventory table
    Generate(GenerateArgs),
}

#[derive(Args, Serialize)]
struct InputArgs {
    /// Path to the JSON constraints file
    #[arg(long)]
    constraints: PathBuf,
    /// Path to the CSV containing all the data
    #[arg(long)]
    data: PathBuf,
    /// Column used as reference for the variable bounds
    #[arg(long)]
    var_col: String,
}

#[derive(Args, Serialize)]
struct BoundArgs {
    /// Factor of allowed increase over the reference value
    #[arg(long, default_value_t = 1.5)]
    var_incr: f64,
    /// Factor of allowed decrease below the reference value
    #[arg(long, default_value_t = 0.8)]
    var_decr: f64,
}

impl BoundArgs {
    fn factors(&self) -> ScaleFactors {
        ScaleFactors::new(self.var_decr, self.var_incr)
    }
}

#[derive(Args, Serialize)]
struct SolveArgs {
    #[command(flatten)]
    #[serde(flatten)]
    input: InputArgs,
    #[command(flatten)]
    #[serde(flatten)]
    bounds: BoundArgs,
    /// Column used as objective coefficients
    #[arg(long)]
    optim_col: String,
    /// Optimization objective (max or min)
    #[arg(long, default_value = "max")]
    optim_obj: ObjectiveSense,
    /// Time limit in seconds
    #[arg(long, default_value_t = 60)]
    time_limit: u64,
    /// File to export the solution to
    #[arg(long, default_value = "data/res_solution.csv")]
    export_solution: PathBuf,
    /// File to export statistics to
    #[arg(long, default_value = "data/res_stats.json")]
    export_statistics: PathBuf,
    /// Skip the constraint feasibility pre-check
    #[arg(long)]
    no_check: bool,
}

impl SolveArgs {
    fn settings(&self) -> Settings {
        Settings {
            factors: self.bounds.factors(),
            sense: self.optim_obj,
            time_limit: Duration::from_secs(self.time_limit),
            check: !self.no_check,
        }
    }
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    bounds: BoundArgs,
}

#[derive(Args)]
struct GenerateArgs {
    /// Number of items
    #[arg(long, default_value_t = synthetic::DEFAULT_ROWS)]
    rows: usize,
    /// Random seed
    #[arg(long, default_value_t = synthetic::DEFAULT_SEED)]
    seed: u64,
    /// Output CSV file
    #[arg(short, long)]
    output: PathBuf,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("invopt=debug,invopt_core=debug,invopt_solver=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("invopt=info,invopt_core=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve(args) => solve(args),
        Commands::Check(args) => check(args),
        Commands::Generate(args) => generate(args),
    }
}

fn solve(args: SolveArgs) -> Result<()> {
    let global = Stopwatch::start();
    let settings = args.settings();
    settings.validate()?;

    let mut stats = RunStatistics::new(serde_json::to_value(&args)?);
    let mut mb = ModelBuilder::new();

    let data = stats
        .timed("reading_data(s)", "reading data", || RecordTable::read_csv(&args.input.data))
        .with_context(|| format!("reading {}", args.input.data.display()))?;
    let problem = stats
        .timed("read_constraint_file(s)", "reading constraint file", || {
            read_constraints_file(&args.input.constraints)
        })
        .with_context(|| format!("reading {}", args.input.constraints.display()))?;

    let bounds = stats.timed("create_variables(s)", "creating opt variables", || {
        mb.create_variables(&data, settings.factors, &args.input.var_col)
            .cloned()
    })?;

    if settings.check {
        stats.timed(
            "check_constraints(s)",
            "checking constraints and variable boundaries",
            || check_constraints(&data, &bounds, &problem.constraints),
        )?;
    }

    stats.timed("build_model(s)", "building opt model", || {
        mb.build_model(&data, &problem.constraints, &args.optim_col, settings.sense)
    })?;

    let values = stats.timed("solving_time(s)", "solving the opt problem", || {
        mb.solve_or_fail(settings.time_limit)
    })?;
    stats.global_time = Some(global.elapsed_secs());

    export_solution(&args.export_solution, &data, &values, DEFAULT_SOLUTION_COLUMN)?;
    stats.record_diagnostics(&mb.statistics());
    export_statistics(&stats, &args.export_statistics)?;

    info!(
        status = stats.solving.as_ref().map(|s| s.status.as_str()).unwrap_or_default(),
        seconds = global.elapsed_secs(),
        "done"
    );
    Ok(())
}

fn check(args: CheckArgs) -> Result<()> {
    let factors = args.bounds.factors();
    factors.validate()?;

    let data = RecordTable::read_csv(&args.input.data)
        .with_context(|| format!("reading {}", args.input.data.display()))?;
    let problem = read_constraints_file(&args.input.constraints)
        .with_context(|| format!("reading {}", args.input.constraints.display()))?;
    let bounds = VariableBounds::compute(&data, factors, &args.input.var_col)?;
    let violations = collect_violations(&data, &bounds, &problem.constraints)?;

    let report = check_report(problem.len(), &violations);
    if violations.is_empty() {
        println!("{}", report);
        return Ok(());
    }

    eprintln!("{}", report);
    bail!("{} infeasible constraint(s)", violations.len())
}

fn check_report(total: usize, violations: &[Violation]) -> String {
    if violations.is_empty() {
        return format!("All {} constraints compatible with the variable bounds", total);
    }
    let mut report = format!("{} of {} constraints cannot be satisfied:", violations.len(), total);
    for violation in violations {
        report.push_str(&format!("\n  {}", violation));
    }
    report
}

fn generate(args: GenerateArgs) -> Result<()> {
    let table = synthetic::generate(args.rows, args.seed)?;
    export_table(&args.output, &table)?;
    info!(rows = table.len(), path = %args.output.display(), "generated synthetic inventory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use invopt_core::{Constraint, FeatureFilter};

    #[test]
    fn test_check_report_is_plain_text() {
        assert_eq!(
            check_report(3, &[]),
            "All 3 constraints compatible with the variable bounds"
        );

        let violation = Violation {
            index: 1,
            constraint: Constraint::new(0.0, 10.0, vec![FeatureFilter::new("CATEGORY", vec!["B".into()])]),
            min_achievable: 16.0,
            max_achievable: 30.0,
        };
        let report = check_report(3, &[violation]);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "1 of 3 constraints cannot be satisfied:");
        assert!(lines[1].starts_with("  #1 "));
        assert!(lines[1].contains("CATEGORY in {B}"));
        assert!(report.is_ascii());
    }
}
