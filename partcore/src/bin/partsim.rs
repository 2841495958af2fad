use partcore::*;

/// A dynamic memory partitioning simulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Placement policy
    #[arg(value_enum, default_value_t = Algorithm::FirstFit)]
    algorithm:  Algorithm,

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

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 10)]
    #[arg(value_parser = clap::value_parser!(Tick))]
    ticks:      Tick,

    /// A process arrives with probability 1/N on each tick
    #[arg(short = 'n', long, default_value_t = 1)]
    #[arg(value_parser = clap::value_parser!(usize))]
    arrival:    usize,

    /// Pause between ticks, in seconds
    #[arg(short, long, default_value_t = 0.0)]
    #[arg(value_parser = clap::value_parser!(f64))]
    delay:      f64,

    /// Seed for the workload generator
    #[arg(short, long)]
    #[arg(value_parser = clap::value_parser!(u64))]
    seed:       Option<u64>,

    /// Log to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose:    u8,

    /// Only print the final summary
    #[arg(short, long, default_value_t = false)]
    quiet:      bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Args::parse();
    init_logging(cli.verbose).map_err(|e| anyhow::anyhow!(e))?;
    let config = SimConfig {
        memory_size:                        cli.memory,
        algorithm:                          cli.algorithm,
        max_process_size:                   cli.max_size,
        max_process_life_time:              cli.max_life,
        simulation_ticks:                   cli.ticks,
        arrival_probability_denominator:    cli.arrival,
        tick_delay_secs:                    cli.delay,
        random_seed:                        cli.seed,
    };
    config.validate()?;

    let mut sim = Simulation::from_config(&config)?;
    let pause = config.tick_delay()?;
    while !sim.is_done() {
        if !cli.quiet {
            print!("{}", sim.allocator());
        }
        if let Some(report) = sim.step() {
            if !cli.quiet {
                print!("{report}");
            }
        }
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }

    println!("{}", sim.stats());

    Ok(())
}
