use clap::Parser;
use modsim_rs::demo::{CounterModule, RelayModule};
use modsim_rs::mgr::{Manager, ManagerOpts};
use modsim_rs::module::{Device, ModuleSpec};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// 与原始客户端脚本一致的缺省步数：dt = 1e-4, dur = 1.0。
const DT: f64 = 1e-4;
const DUR: f64 = 1.0;

#[derive(Debug, Parser)]
#[command(
    name = "chain-run",
    about = "Run a built-in two-module chain on the modsim-rs orchestrator"
)]
struct Args {
    /// Write connectivity structures into a debug folder
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Log output target [file, screen, both, or none]
    #[arg(short = 'l', long, default_value = "none")]
    log: String,

    /// Number of steps
    #[arg(short = 's', long)]
    steps: Option<u64>,

    /// Explicit data port [default: lowest free]
    #[arg(short = 'd', long)]
    port_data: Option<u16>,

    /// Explicit control port [default: lowest free]
    #[arg(short = 'c', long)]
    port_ctrl: Option<u16>,

    /// GPU index for the relay stage [default: no device binding]
    #[arg(short = 'a', long)]
    device: Option<u32>,

    /// Chain element count per stage
    #[arg(long, default_value_t = 8)]
    width: usize,
}

/// 按 --log 选项初始化日志输出（file/screen/both/none）。
fn setup_logger(target: &str) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    match target.to_lowercase().as_str() {
        "screen" => {
            tracing_subscriber::fmt().with_env_filter(filter()).init();
        }
        "file" => {
            let file = std::fs::File::create("modsim.log").expect("create modsim.log");
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        "both" => {
            let file = std::fs::File::create("modsim.log").expect("create modsim.log");
            tracing_subscriber::registry()
                .with(filter())
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file)),
                )
                .init();
        }
        _ => {}
    }
}

fn main() {
    let args = Args::parse();
    setup_logger(&args.log);

    let steps = args.steps.unwrap_or((DUR / DT) as u64);
    let device = args.device.map(Device::Gpu).unwrap_or(Device::None);

    let mut opts = ManagerOpts::default();
    if args.debug {
        opts.debug_dir = Some(PathBuf::from("debug"));
    }
    let mut man = Manager::with_opts(opts);

    let stim = man
        .add(ModuleSpec::new(
            "stim",
            CounterModule::default(),
            0,
            args.width,
        ))
        .expect("add stim");
    let al = man
        .add(
            ModuleSpec::new("al", RelayModule::default(), args.width, args.width)
                .with_device(device)
                .with_ports(args.port_ctrl, args.port_data),
        )
        .expect("add al");
    let links: Vec<(usize, usize)> = (0..args.width).map(|i| (i, i)).collect();
    man.connect(stim, al, links).expect("connect stim -> al");

    man.spawn().expect("spawn workers");
    man.start(steps).expect("start run");
    match man.wait() {
        Ok(()) => {
            println!("run_done steps={} modules={}", man.current_step(), man.num_modules());
        }
        Err(e) => {
            eprintln!("run failed at step {}: {e}", man.current_step());
            std::process::exit(2);
        }
    }
}
