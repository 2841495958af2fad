use partcore::*;

/// Compares fit policies over equivalent random workloads
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Policies to compare (all of them if omitted)
    #[arg(value_enum)]
    algorithms: Vec<Algorithm>,

    /// Size of the simulated address space
    #[arg(short, long, default_value_t = 1024)]
    #[arg(value_parser = clap::value_parser!(Units))]
    memory:     Units,

    /// Maximum process size
    #[arg(short = 'p', long, default_value_t = 100)]
    #[arg(value_parser = clap::value_parser!(Units))]
    max_size:   Units,

    /// Maximum process lifetime, in ticks
    #[arg(short = 'l', long, default_value_t = 2)]
    #[arg(value_parser = clap::value_parser!(Tick))]
    max_life:   Tick,

    /// Number of ticks to simulate per run
    #[arg(short, long, default_value_t = 10)]
    #[arg(value_parser = clap::value_parser!(Tick))]
    ticks:      Tick,

    /// A process arrives with probability 1/N on each tick
    #[arg(short = 'n', long, default_value_t = 1)]
    #[arg(value_parser = clap::value_parser!(usize))]
    arrival:    usize,

    /// Seed shared by every policy, for identical workloads
    #[arg(short, long)]
    #[arg(value_parser = clap::value_parser!(u64))]
    seed:       Option<u64>,

    /// Log to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose:    u8,

    /// Average over this many consecutive seeds instead of a single run
    #[arg(short = 'r', long)]
    #[arg(value_parser = clap::value_parser!(usize))]
    trials:     Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Args::parse();
    init_logging(cli.verbose).map_err(|e| anyhow::anyhow!(e))?;
    let algorithms = if cli.algorithms.is_empty() {
        Algorithm::ALL.to_vec()
    } else { cli.algorithms };
    let bench = Benchmark::new(SimConfig {
        memory_size:                        cli.memory,
        max_process_size:                   cli.max_size,
        max_process_life_time:              cli.max_life,
        simulation_ticks:                   cli.ticks,
        arrival_probability_denominator:    cli.arrival,
        random_seed:                        cli.seed,
        ..SimConfig::default()
    })?;

    let total = Instant::now();
    match cli.trials {
        Some(trials)    => {
            for stats in bench.sweep(&algorithms, trials)?.values() {
                println!("{stats}");
            }
        },
        None    => {
            let results = bench.run(&algorithms)?;
            for stats in results.values() {
                println!("{stats}");
            }
            if let Some((best, _)) = results
                .iter()
                .sorted_by(|(_, a), (_, b)| {
                    a.failed_allocations
                        .cmp(&b.failed_allocations)
                        .then(b.average_utilization.total_cmp(&a.average_utilization))
                })
                .next() {
                    println!("Fewest failures: {best}");
            }
        },
    }

    println!(
        "Total benchmark time: {} μs",
        total.elapsed().as_micros()
    );

    Ok(())
}
