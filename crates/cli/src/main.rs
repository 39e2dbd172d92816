//! Multicore cache-coherence simulator CLI.

use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use cohesim::config::Config;
use cohesim::core::Hierarchy;
use cohesim::sim::{self, RunReport, Trace};
use cohesim::stats::{CacheStats, HierarchyStats, SystemStats};
use cohesim::{SimResult, System};

#[derive(Parser, Debug)]
#[command(
    name = "cohesim",
    author,
    version,
    about = "Multicore cache-coherence simulator",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log bus transactions and state changes (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print statistics as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay traces against the coherent multicore system.
    Run(RunArgs),
    /// Replay a trace through the single-core L1/L2 hierarchy.
    Hierarchy {
        /// TOML configuration with an [l2] section.
        config: PathBuf,

        /// Trace file.
        #[arg(short = 's', long)]
        trace: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML configuration file.
    config: PathBuf,

    /// One trace for all cores, replayed sequentially.
    #[arg(short = 's', long, conflicts_with = "parallel")]
    trace: Option<PathBuf>,

    /// One trace per core, replayed on parallel threads. Fewer traces than
    /// cores is an error.
    #[arg(short = 'p', long, num_args = 1.., required_unless_present = "trace")]
    parallel: Vec<PathBuf>,
}

#[derive(Serialize)]
struct RunOutput<'a, S: Serialize> {
    run: &'a RunReport,
    stats: &'a S,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Run(args) => cmd_run(args, cli.json),
        Command::Hierarchy { config, trace } => cmd_hierarchy(config, trace, cli.json),
    };

    if let Err(e) = result {
        eprintln!("\n\x1b[1;31merror:\x1b[0m {e}");
        process::exit(1);
    }
    std::io::stdout().flush().ok();
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn cmd_run(args: RunArgs, json: bool) -> SimResult<()> {
    let config = Config::load(&args.config)?;
    info!("config: {}", args.config.display());
    let system = System::new(&config)?;

    let report = match args.trace {
        Some(path) => sim::run_sequential(&system, &Trace::load(path)?)?,
        None => {
            let traces = args
                .parallel
                .iter()
                .map(Trace::load)
                .collect::<SimResult<Vec<_>>>()?;
            info!("replaying {} traces in parallel", traces.len());
            sim::run_parallel(&system, &traces)?
        }
    };

    let stats = system.stats()?;
    if json {
        print_json(&report, &stats);
    } else {
        print_system(&stats);
        print_run(&report);
    }
    println!("Simulation completed");
    Ok(())
}

fn cmd_hierarchy(config: PathBuf, trace: PathBuf, json: bool) -> SimResult<()> {
    let config = Config::load(&config)?;
    let mut hierarchy = Hierarchy::new(&config)?;
    let report = sim::run_hierarchy(&mut hierarchy, &Trace::load(trace)?)?;

    let stats = hierarchy.stats();
    if json {
        print_json(&report, &stats);
    } else {
        print_hierarchy(&stats);
        print_run(&report);
    }
    println!("Simulation completed");
    Ok(())
}

fn print_json<S: Serialize>(run: &RunReport, stats: &S) {
    match serde_json::to_string_pretty(&RunOutput { run, stats }) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("\x1b[1;31merror:\x1b[0m cannot serialize stats: {e}"),
    }
}

fn pct(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".into(), |r| format!("{:.4}%", r * 100.0))
}

fn print_cache(stats: &CacheStats) {
    let c = &stats.counters;
    println!("===================== {} =====================", stats.name);
    println!(
        "{}-byte {}-way set associative cache with {}-byte lines",
        stats.cache_size, stats.associativity, stats.block_size
    );
    println!("Hit time: {} cycles", stats.hit_time);
    println!("Miss penalty: {} cycles", stats.miss_penalty);
    println!("----------------------------------------------------");
    println!("Accesses: {}", c.accesses);
    println!("Hits: {}", c.hits);
    println!("Misses: {}", c.misses);
    println!("Miss rate: {}", pct(stats.miss_rate));
    println!("    Instruction miss rate: {}", pct(stats.instr_miss_rate));
    println!("    Data miss rate: {}", pct(stats.data_miss_rate));
    match stats.amat {
        Some(amat) => println!("AMAT: {amat:.4} cycles"),
        None => println!("AMAT: n/a"),
    }
    println!("Writebacks: {}\n", c.writebacks);
}

fn print_system(stats: &SystemStats) {
    for cache in &stats.caches {
        print_cache(cache);
    }
    println!("======================== System ({}) ========================", stats.protocol);
    println!("Memory writes: {}", stats.memory.writes);
    println!("Data requests from memory: {}", stats.memory.reads);
    println!("Invalidations: {}", stats.invalidations);
    println!(
        "Total data transactions through bus: {} ({} beats)",
        stats.bus_data_transactions, stats.bus_beats
    );
}

fn print_hierarchy(stats: &HierarchyStats) {
    let g = &stats.global;
    println!("================== Multilevel Cache Stats ==================");
    println!("Accesses: {}", g.accesses);
    println!("Global hits: {}", g.hits);
    println!("Global misses: {}", g.misses);
    println!("Global miss rate: {}", pct(stats.miss_rate));
    println!("    Instruction miss rate: {}", pct(stats.instr_miss_rate));
    println!("    Data miss rate: {}", pct(stats.data_miss_rate));
    match stats.amat {
        Some(amat) => println!("AMAT: {amat:.4} cycles"),
        None => println!("AMAT: n/a"),
    }
    println!("Writebacks: {}", g.writebacks);
    println!("Traffic between L1 and L2: {}", stats.traffic);
    println!("    L1 D-cache: {}", stats.l1_data_traffic);
    println!("    L1 I-cache: {}\n", stats.l1_instr_traffic);
    for level in [&stats.l1_instr, &stats.l1_data, &stats.l2] {
        print_cache(level);
    }
}

fn print_run(report: &RunReport) {
    println!("Requests: {}", report.requests);
    if report.mismatches > 0 {
        println!("\x1b[1;31mMismatches: {}\x1b[0m", report.mismatches);
    } else {
        println!("Mismatches: 0");
    }
}
