use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{ArgEnum, Parser};
use container_transport::{
    solve, ContainerType, DemandRelation, MicrolpSolver, Problem, ShipmentPlan, SolverAdapter,
    TransportConfig, TransportError,
};
use log::{error, info};

#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SolverKind {
    Microlp,
    Gurobi,
}

/// Finds the cheapest way to ship containers from origin ports to destination ports.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// JSON configuration. Without it the built-in NML network is solved.
    #[clap(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    #[clap(long, arg_enum, default_value = "microlp")]
    solver: SolverKind,

    /// Require demand to be met exactly instead of at least
    #[clap(long)]
    exact_demand: bool,

    /// Container type to leave out of this run (20ft, 40ft, 40ft-hc)
    #[clap(long = "disable")]
    disabled: Vec<ContainerType>,

    /// Only ship from these origin ports
    #[clap(long = "origin")]
    origins: Vec<String>,

    /// Only ship to these destination ports
    #[clap(long = "destination")]
    destinations: Vec<String>,

    /// Give up after this many seconds
    #[clap(long)]
    time_limit: Option<f64>,

    /// Print the plan as JSON
    #[clap(long)]
    json: bool,

    #[clap(short, long)]
    verbose: bool,
}

fn solver(args: &Args) -> Result<Box<dyn SolverAdapter>, TransportError> {
    let limit = match args.time_limit {
        Some(secs) if !secs.is_finite() || secs <= 0.0 => {
            return Err(TransportError::invalid(
                "time_limit",
                format!("must be a positive number of seconds, got {}", secs),
            ))
        }
        Some(secs) => Some(Duration::from_secs_f64(secs)),
        None => None,
    };
    match args.solver {
        SolverKind::Microlp => {
            let mut solver = MicrolpSolver::new();
            if let Some(limit) = limit {
                solver = solver.with_time_limit(limit);
            }
            Ok(Box::new(solver))
        }
        #[cfg(feature = "gurobi")]
        SolverKind::Gurobi => {
            let mut solver = container_transport::solver::GurobiSolver::new();
            if let Some(limit) = limit {
                solver = solver.with_time_limit(limit);
            }
            Ok(Box::new(solver))
        }
        #[cfg(not(feature = "gurobi"))]
        SolverKind::Gurobi => Err(TransportError::SolverError(
            "this build does not include gurobi, rebuild with `--features gurobi`".to_string(),
        )),
    }
}

fn config(args: &Args) -> Result<TransportConfig, TransportError> {
    let mut config = match &args.config {
        Some(path) => TransportConfig::load(path)?,
        None => TransportConfig::nml_default(),
    };

    if args.exact_demand {
        config.demand_relation = DemandRelation::Exact;
    }
    for t in &args.disabled {
        config.disable(*t);
    }
    if !args.origins.is_empty() {
        config.origin_filter = Some(args.origins.clone());
    }
    if !args.destinations.is_empty() {
        config.destination_filter = Some(args.destinations.clone());
    }

    Ok(config)
}

fn print_plan(plan: &ShipmentPlan) {
    println!(
        "{:<16} {:<16} {:<8} {:>6} {:>12} {:>18}",
        "Origin", "Destination", "Type", "Units", "Weight (t)", "Cost"
    );
    for e in plan.sorted_entries() {
        let weight = e.weight_tons.map(|w| format!("{:.0}", w)).unwrap_or_default();
        println!(
            "{:<16} {:<16} {:<8} {:>6} {:>12} {:>18.0}",
            e.origin,
            e.destination,
            e.container_type.to_string(),
            e.quantity,
            weight,
            e.cost
        );
    }
    println!();
    for (t, cost) in plan.subtotals() {
        println!("Subtotal {:<8} {:>18.0}", t.to_string(), cost);
    }
    println!("Total cost        {:>18.0}", plan.total_cost());
}

fn run(args: &Args) -> Result<(), TransportError> {
    let config = config(args)?;
    let problem = Problem::new(&config)?;
    let mut solver = solver(args)?;

    let plan = solve(&problem, &mut solver)?;
    info!("Plan {} ships {} containers", plan.run_id(), plan.total_units());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

pub fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
