use clap::Parser;
use modsim_rs::demo::build_from_spec;
use modsim_rs::mgr::{Manager, ManagerOpts, SimSpec};
use modsim_rs::module::ModuleState;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "graph-run",
    about = "Run a simulation graph described by sim.json on the modsim-rs orchestrator"
)]
struct Args {
    /// Path to sim.json
    #[arg(long)]
    spec: PathBuf,

    /// Override number of steps
    #[arg(short = 's', long)]
    steps: Option<u64>,

    /// Write the built routing table into this debug directory
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Base port for unspecified endpoint requests
    #[arg(long)]
    port_base: Option<u16>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let raw = fs::read_to_string(&args.spec).expect("read sim.json");
    let spec = SimSpec::from_json(&raw).expect("parse sim.json");
    let steps = args.steps.or(spec.steps).unwrap_or(0);

    let mut opts = ManagerOpts::default();
    if let Some(base) = args.port_base {
        opts.port_base = base;
    }
    opts.debug_dir = args.debug_dir;

    let mut man = Manager::with_opts(opts);
    let ids = build_from_spec(&mut man, &spec).expect("build graph from spec");

    man.spawn().expect("spawn workers");
    man.start(steps).expect("start run");
    match man.wait() {
        Ok(()) => {
            let completed = ids
                .iter()
                .filter(|id| man.module_state(**id) == Some(ModuleState::Completed))
                .count();
            println!(
                "run_done steps={} modules={} completed={}",
                man.current_step(),
                man.num_modules(),
                completed
            );
        }
        Err(e) => {
            eprintln!("run failed at step {}: {e}", man.current_step());
            std::process::exit(2);
        }
    }
}
