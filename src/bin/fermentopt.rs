use anyhow::{Context, Result, bail};
use clap::Parser;
use fermentopt::{
    Engine, Method, OptimizationReport, RunSpec, best_report, multi_start, optimize,
    random_guesses,
};
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fermentopt")]
#[command(about = "Find the profit-maximizing operating point of a fermentation process")]
#[command(version)]
struct CliArgs {
    /// JSON run file (parameters, bounds, initial_guess, optimizer).
    /// Missing sections use the baseline model.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Search method: "penalty+unconstrained" or "bounded"
    #[arg(long)]
    method: Option<Method>,

    /// Quasi-Newton engine: "native-bfgs" or "argmin-lbfgs"
    #[arg(long)]
    engine: Option<Engine>,

    #[arg(long)]
    max_iterations: Option<u32>,

    /// Convergence tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Bound penalty coefficient
    #[arg(long)]
    penalty: Option<f64>,

    /// Extra random starting guesses; the best completed run is reported
    #[arg(long, default_value = "0")]
    starts: usize,

    /// Seed for the random starting guesses
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl CliArgs {
    fn run_spec(&self) -> Result<RunSpec> {
        let mut spec = match &self.config {
            Some(path) => RunSpec::from_path(path)
                .with_context(|| format!("loading run file {}", path.display()))?,
            None => RunSpec::default(),
        };

        let optimizer = &mut spec.optimizer;
        if let Some(method) = self.method {
            optimizer.method = method;
        }
        if let Some(engine) = self.engine {
            optimizer.engine = engine;
        }
        if let Some(max_iterations) = self.max_iterations {
            optimizer.max_iterations = max_iterations;
        }
        if let Some(tolerance) = self.tolerance {
            optimizer.tolerance = tolerance;
        }
        if let Some(penalty) = self.penalty {
            optimizer.penalty_coefficient = penalty;
        }

        spec.validate().context("invalid run configuration")?;
        Ok(spec)
    }
}

fn run(args: &CliArgs, spec: &RunSpec) -> Result<OptimizationReport> {
    if args.starts == 0 {
        return Ok(optimize(
            &spec.parameters,
            &spec.bounds,
            spec.initial_guess,
            &spec.optimizer,
        )?);
    }

    let mut guesses = vec![spec.initial_guess];
    guesses.extend(random_guesses(&spec.bounds, args.starts, args.seed)?);

    let results = multi_start(&spec.parameters, &spec.bounds, &guesses, &spec.optimizer);
    let completed = results
        .iter()
        .filter(|r| matches!(r, Ok(report) if report.state.is_completed()))
        .count();
    info!(starts = guesses.len(), completed, "multi-start finished");

    match best_report(&results) {
        Some(report) => Ok(report.clone()),
        None => match results.into_iter().next() {
            Some(first) => Ok(first?),
            None => bail!("no optimizer runs were executed"),
        },
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let spec = args.run_spec()?;
    let report = run(&args, &spec)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}
