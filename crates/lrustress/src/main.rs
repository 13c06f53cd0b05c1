//! lrustress - multi-threaded stress harness for lrucache

mod report;
mod target;
mod workload;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

use crate::report::Report;
use crate::target::Target;
use crate::workload::Workload;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 10000)]
    capacity: usize,

    /// Worker threads
    #[arg(short, long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..))]
    threads: u16,

    /// Operations per worker thread
    #[arg(short, long, default_value_t = 100_000)]
    ops: usize,

    /// Distinct keys shared by all workers
    #[arg(short, long, default_value_t = 20000)]
    keys: usize,

    /// Lock shards (1 = single global lock)
    #[arg(short, long, default_value_t = 1)]
    shards: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting lrustress v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {} ({} shards)", args.capacity, args.shards);
    info!("Workers: {} x {} ops over {} keys", args.threads, args.ops, args.keys);

    let target = Target::build(args.capacity, args.shards).context("invalid cache configuration")?;
    let workload = Workload {
        threads: usize::from(args.threads),
        ops_per_thread: args.ops,
        keys: args.keys,
    };

    let outcome = workload.run(&target)?;
    info!("Workload finished in {:?}", outcome.elapsed);

    if let Err(e) = target.check_invariants() {
        error!("Invariant check failed: {}", e);
        return Err(e).context("cache corrupted under concurrent load");
    }

    let resident = target.cache().count();
    if resident > target.capacity() {
        bail!("{} resident entries exceed capacity {}", resident, target.capacity());
    }

    let report = Report::new(&target, &workload, &outcome);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_text();
    }

    Ok(())
}
