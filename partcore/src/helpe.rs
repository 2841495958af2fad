pub use std::{
    fmt,
    str::FromStr,
    collections::BTreeMap,
    time::{Duration, Instant},
};
pub use thiserror::Error;
pub use itertools::Itertools;
pub use rayon::prelude::*;
pub use indexmap::IndexMap;
pub use clap::{Parser, ValueEnum};
pub use rand::{Rng, SeedableRng, rngs::StdRng};
pub use tracing::{debug, info, trace, Level};

pub use crate::{Allocator, Partition, Process,
    sim::*,
    bench::*,
};

/// The unit of the simulated address space. Offsets and sizes share it.
pub type Units = usize;

/// The unit of logical time. One tick is one round of
/// arrival, placement, bookkeeping and eviction.
pub type Tick = usize;

/// Opaque process label. The simulation uses the arrival tick.
pub type ProcessId = usize;

/// The ordered list of partitions. Order is address order; it defines
/// adjacency and is the scan order of first-fit and next-fit.
pub type PartitionTable = Vec<Partition>;

/// The rule used to pick which free partition receives a process.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug)]
pub enum Algorithm {
    /// Lowest-address free partition that fits
    FirstFit,
    /// Smallest free partition that fits
    BestFit,
    /// Largest free partition that fits
    WorstFit,
    /// First fit, scanning circularly from the last placement
    NextFit,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::FirstFit,
        Algorithm::BestFit,
        Algorithm::WorstFit,
        Algorithm::NextFit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::FirstFit => "first-fit",
            Algorithm::BestFit  => "best-fit",
            Algorithm::WorstFit => "worst-fit",
            Algorithm::NextFit  => "next-fit",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps a repeated `-v` count to the most verbose level worth showing.
/// Zero means no log output at all.
pub fn log_level(verbose: u8) -> Option<Level> {
    match verbose {
        0   => None,
        1   => Some(Level::INFO),
        2   => Some(Level::DEBUG),
        _   => Some(Level::TRACE),
    }
}

/// Sends log events at `verbose` (see [log_level]) and above to stderr,
/// so that they never interleave with the reports on stdout.
pub fn init_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(level) = log_level(verbose) else {
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| ConfigError::UnknownAlgorithm(s.to_string()))
    }
}

/// Everything that can be wrong with a simulation before it starts.
/// Nothing can go wrong *during* a run: a failed allocation is an
/// outcome to be counted, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("memory size must be positive")]
    ZeroMemorySize,
    #[error("maximum process size must be positive")]
    ZeroMaxProcessSize,
    #[error("maximum process lifetime must be positive")]
    ZeroMaxLifetime,
    #[error("simulation must last at least one tick")]
    ZeroSimulationTicks,
    #[error("arrival probability denominator must be positive")]
    ZeroArrivalDenominator,
    #[error("tick delay must be a finite, non-negative number of seconds (got {0})")]
    BadTickDelay(f64),
    #[error("a sweep needs at least one trial")]
    ZeroTrials,
    #[error("unknown algorithm `{0}` (expected first-fit, best-fit, worst-fit or next-fit)")]
    UnknownAlgorithm(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (id: {id}, size: {size}, lifetime: {lifetime})")]
/// Appears while constructing a [Process] out of raw values.
pub struct ProcessError {
    pub message:    String,
    pub id:         ProcessId,
    pub size:       Units,
    pub lifetime:   Tick,
}

/// A read-only copy of one table entry, handed out by
/// [`Allocator::snapshot`] to whoever wants to display or check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionView {
    pub start:      Units,
    pub size:       Units,
    pub occupant:   Option<ProcessId>,
    pub expiry:     Option<Tick>,
}

impl PartitionView {
    #[inline(always)]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    #[inline(always)]
    pub fn end(&self) -> Units {
        self.start + self.size
    }
}

//---START ARRIVAL SOURCES
// Where processes come from. The simulation does not care, as long
// as the source satisfies `ArrivalSource`.

/// Defines the interface for feeding processes into a simulation.
///
/// A source is polled exactly once per tick. Implementors that draw
/// random numbers should draw the same amount of them no matter what
/// happens to the returned process, so that two runs with the same seed
/// see the same workload whatever the placement policy.
pub trait ArrivalSource {
    /// Returns the process arriving at `clock`, if any.
    fn next_arrival(&mut self, clock: Tick) -> Option<Process>;
}

/// Bernoulli arrivals with uniformly distributed sizes and lifetimes,
/// driven by an injected generator.
pub struct RandomArrivals<R: Rng> {
    rng:            R,
    max_size:       Units,
    max_lifetime:   Tick,
    denominator:    usize,
}

impl<R: Rng> RandomArrivals<R> {
    /// A process arrives with probability `1 / denominator`. Its size
    /// is drawn from `[1, max_size]`, its lifetime from `[1, max_lifetime]`.
    pub fn new(
        rng:            R,
        max_size:       Units,
        max_lifetime:   Tick,
        denominator:    usize,
    ) -> Result<Self, ConfigError> {
        if max_size == 0 {
            return Err(ConfigError::ZeroMaxProcessSize);
        }
        if max_lifetime == 0 {
            return Err(ConfigError::ZeroMaxLifetime);
        }
        if denominator == 0 {
            return Err(ConfigError::ZeroArrivalDenominator);
        }

        Ok(Self {
            rng,
            max_size,
            max_lifetime,
            denominator,
        })
    }
}

impl<R: Rng> ArrivalSource for RandomArrivals<R> {
    fn next_arrival(&mut self, clock: Tick) -> Option<Process> {
        if self.rng.gen_range(1..=self.denominator) != 1 {
            return None;
        }
        let size = self.rng.gen_range(1..=self.max_size);
        let lifetime = self.rng.gen_range(1..=self.max_lifetime);

        // Both draws are positive, so this cannot fail.
        Process::new(clock, size, lifetime).ok()
    }
}

/// Replays a fixed arrival schedule. Ticks missing from the schedule
/// see no arrival.
#[derive(Debug, Clone, Default)]
pub struct ScriptedArrivals {
    schedule: BTreeMap<Tick, Process>,
}

impl ScriptedArrivals {
    pub fn new(schedule: impl IntoIterator<Item = (Tick, Process)>) -> Self {
        Self {
            schedule: schedule.into_iter().collect(),
        }
    }
}

impl ArrivalSource for ScriptedArrivals {
    fn next_arrival(&mut self, clock: Tick) -> Option<Process> {
        self.schedule.remove(&clock)
    }
}
//---END ARRIVAL SOURCES

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_round_trip_through_from_str() {
        for a in Algorithm::ALL {
            assert_eq!(a.to_string().parse::<Algorithm>(), Ok(a));
        }
    }

    #[test]
    fn verbosity_counts_map_to_levels() {
        assert_eq!(log_level(0), None);
        assert_eq!(log_level(1), Some(Level::INFO));
        assert_eq!(log_level(2), Some(Level::DEBUG));
        assert_eq!(log_level(3), Some(Level::TRACE));
        assert_eq!(log_level(u8::MAX), Some(Level::TRACE));
        // Silent mode installs nothing, so it can be called repeatedly.
        assert!(init_logging(0).is_ok());
        assert!(init_logging(0).is_ok());
    }

    #[test]
    fn unknown_algorithm_is_a_config_error() {
        assert_eq!(
            "buddy".parse::<Algorithm>(),
            Err(ConfigError::UnknownAlgorithm("buddy".into()))
        );
        assert!("First-Fit".parse::<Algorithm>().is_err());
    }

    #[test]
    fn random_arrivals_reject_degenerate_parameters() {
        let rng = || StdRng::seed_from_u64(7);
        assert_eq!(RandomArrivals::new(rng(), 0, 1, 1).err(), Some(ConfigError::ZeroMaxProcessSize));
        assert_eq!(RandomArrivals::new(rng(), 1, 0, 1).err(), Some(ConfigError::ZeroMaxLifetime));
        assert_eq!(RandomArrivals::new(rng(), 1, 1, 0).err(), Some(ConfigError::ZeroArrivalDenominator));
    }

    #[test]
    fn random_arrivals_stay_within_bounds() {
        let mut src = RandomArrivals::new(StdRng::seed_from_u64(42), 16, 5, 1).unwrap();
        for clock in 0..500 {
            // Denominator 1 means an arrival on every tick.
            let p = src.next_arrival(clock).unwrap();
            assert_eq!(p.get_id(), clock);
            assert!((1..=16).contains(&p.get_size()));
            assert!((1..=5).contains(&p.get_lifetime()));
        }
    }

    #[test]
    fn same_seed_same_arrivals() {
        let mut a = RandomArrivals::new(StdRng::seed_from_u64(3), 100, 10, 4).unwrap();
        let mut b = RandomArrivals::new(StdRng::seed_from_u64(3), 100, 10, 4).unwrap();
        for clock in 0..200 {
            assert_eq!(a.next_arrival(clock), b.next_arrival(clock));
        }
    }

    #[test]
    fn scripted_arrivals_fire_once_at_their_tick() {
        let p = Process::new(9, 4, 2).unwrap();
        let mut src = ScriptedArrivals::new([(3, p.clone())]);
        assert_eq!(src.next_arrival(2), None);
        assert_eq!(src.next_arrival(3), Some(p));
        assert_eq!(src.next_arrival(3), None);
    }
}
