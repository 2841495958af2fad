//! Drives an [Allocator] through simulated time.
//!
//! Every tick follows the same protocol:
//!
//! 1. poll the [ArrivalSource] for a new process,
//! 2. if one arrived, try to allocate it (failures are counted),
//! 3. add the occupied bytes to the utilization tally,
//! 4. evict whatever expired by the current clock,
//! 5. advance the clock.
//!
//! Nothing here sleeps or prints. Pacing and output belong to
//! whoever calls [Simulation::step].

use crate::helpe::*;

/// Every knob of a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub memory_size:                        Units,
    pub algorithm:                          Algorithm,
    pub max_process_size:                   Units,
    pub max_process_life_time:              Tick,
    pub simulation_ticks:                   Tick,
    /// A process arrives with probability `1 / arrival_probability_denominator`.
    pub arrival_probability_denominator:    usize,
    /// Display pacing only, never consumed by the simulation itself.
    pub tick_delay_secs:                    f64,
    /// Fixes the workload. `None` draws a fresh seed from the OS.
    pub random_seed:                        Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            memory_size:                        1024,
            algorithm:                          Algorithm::FirstFit,
            max_process_size:                   100,
            max_process_life_time:              2,
            simulation_ticks:                   10,
            arrival_probability_denominator:    1,
            tick_delay_secs:                    0.0,
            random_seed:                        None,
        }
    }
}

impl SimConfig {
    /// Full check, as required before a standalone run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_workload()?;
        if self.simulation_ticks == 0 {
            return Err(ConfigError::ZeroSimulationTicks);
        }

        Ok(())
    }

    /// Everything but the run length. A zero-tick run is degenerate
    /// but well defined (no arrivals, zero utilization), which is what
    /// [Benchmark] relies on.
    pub fn validate_workload(&self) -> Result<(), ConfigError> {
        if self.memory_size == 0 {
            return Err(ConfigError::ZeroMemorySize);
        }
        if self.max_process_size == 0 {
            return Err(ConfigError::ZeroMaxProcessSize);
        }
        if self.max_process_life_time == 0 {
            return Err(ConfigError::ZeroMaxLifetime);
        }
        if self.arrival_probability_denominator == 0 {
            return Err(ConfigError::ZeroArrivalDenominator);
        }
        if !self.tick_delay_secs.is_finite() || self.tick_delay_secs < 0.0 {
            return Err(ConfigError::BadTickDelay(self.tick_delay_secs));
        }

        Ok(())
    }

    /// Only meaningful on a configuration that passed
    /// [SimConfig::validate_workload].
    pub fn tick_delay(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.tick_delay_secs)
            .map_err(|_| ConfigError::BadTickDelay(self.tick_delay_secs))
    }

    pub fn with_algorithm(&self, algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..self.clone()
        }
    }

    /// The generator the configured workload is drawn from.
    pub fn make_rng(&self) -> StdRng {
        match self.random_seed {
            Some(s) => StdRng::seed_from_u64(s),
            None    => StdRng::from_entropy(),
        }
    }
}

/// What happened to this tick's arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// Nobody showed up.
    Idle,
    Allocated { id: ProcessId, size: Units },
    Failed { id: ProcessId, size: Units },
}

/// Everything that happened during one call to [Simulation::step].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub clock:      Tick,
    pub arrival:    ArrivalOutcome,
    /// Units occupied after placement, before eviction.
    pub occupied:   Units,
    pub released:   Vec<ProcessId>,
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arrival {
            ArrivalOutcome::Idle    => {},
            ArrivalOutcome::Allocated { id, size } => {
                writeln!(f, "Allocated Process P{id} of size {size} at clock {}", self.clock)?;
            },
            ArrivalOutcome::Failed { id, size } => {
                writeln!(f, "Failed to allocate Process P{id} of size {size} at clock {}", self.clock)?;
            },
        }
        for id in &self.released {
            writeln!(f, "Released Process P{id} at clock {}", self.clock)?;
        }

        Ok(())
    }
}

/// The outcome of a (possibly partial) run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub algorithm:              Algorithm,
    pub ticks:                  Tick,
    /// Occupied units over total units, averaged over all ticks. In `[0, 1]`.
    pub average_utilization:    f64,
    pub peak_utilization:       f64,
    pub arrivals:               usize,
    pub successful_allocations: usize,
    pub failed_allocations:     usize,
    pub final_partitions:       usize,
    pub final_fragmentation:    f64,
    /// Wall-clock time spent inside [Simulation::step].
    pub elapsed_secs:           f64,
}

impl RunStats {
    /// Share of arrivals that could not be placed.
    pub fn failure_rate(&self) -> f64 {
        if self.arrivals == 0 {
            0.0
        } else {
            self.failed_allocations as f64 / self.arrivals as f64
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Algorithm: {}, Utilization: {:.4}, Failed Allocations: {}/{}, \
            Partitions: {}, Fragmentation: {:.2}%, Execution Time: {:.6} s",
            self.algorithm,
            self.average_utilization,
            self.failed_allocations,
            self.arrivals,
            self.final_partitions,
            self.final_fragmentation * 100.0,
            self.elapsed_secs,
        )
    }
}

/// An [Allocator] paired with the [ArrivalSource] feeding it.
pub struct Simulation<A: ArrivalSource> {
    allocator:      Allocator,
    arrivals:       A,
    ticks:          Tick,
    start_clock:    Tick,
    occupied_sum:   u128,
    peak_occupied:  Units,
    arrived:        usize,
    allocated:      usize,
    failed:         usize,
    busy:           Duration,
}

impl Simulation<RandomArrivals<StdRng>> {
    /// Sets up a run of random arrivals as described by `config`.
    ///
    /// Zero ticks are accepted here: such a run is over before it
    /// starts. Use [SimConfig::validate] to refuse them.
    pub fn from_config(config: &SimConfig) -> Result<Self, ConfigError> {
        config.validate_workload()?;
        let allocator = Allocator::new(config.memory_size, config.algorithm)?;
        let arrivals = RandomArrivals::new(
            config.make_rng(),
            config.max_process_size,
            config.max_process_life_time,
            config.arrival_probability_denominator,
        )?;

        Ok(Self::new(allocator, arrivals, config.simulation_ticks))
    }
}

impl<A: ArrivalSource> Simulation<A> {
    /// Runs `allocator` from its current clock until `ticks`.
    /// Statistics only cover the ticks played from here on.
    pub fn new(allocator: Allocator, arrivals: A, ticks: Tick) -> Self {
        let start_clock = allocator.clock();

        Self {
            allocator,
            arrivals,
            ticks,
            start_clock,
            occupied_sum:   0,
            peak_occupied:  0,
            arrived:        0,
            allocated:      0,
            failed:         0,
            busy:           Duration::ZERO,
        }
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn is_done(&self) -> bool {
        self.allocator.clock() >= self.ticks
    }

    /// Plays one tick. Returns `None` once the run is over.
    pub fn step(&mut self) -> Option<TickReport> {
        if self.is_done() {
            return None;
        }
        let step_start = Instant::now();
        let clock = self.allocator.clock();

        let arrival = match self.arrivals.next_arrival(clock) {
            Some(process) => {
                self.arrived += 1;
                let (id, size) = (process.get_id(), process.get_size());
                if self.allocator.allocate(process) {
                    self.allocated += 1;
                    ArrivalOutcome::Allocated { id, size }
                } else {
                    self.failed += 1;
                    ArrivalOutcome::Failed { id, size }
                }
            },
            None    => ArrivalOutcome::Idle,
        };

        let occupied = self.allocator.occupied_bytes();
        self.occupied_sum += occupied as u128;
        self.peak_occupied = self.peak_occupied.max(occupied);

        let released = self.allocator
            .release_expired(clock)
            .iter()
            .map(|p| p.get_id())
            .collect();
        self.allocator.tick();
        self.busy += step_start.elapsed();

        Some(TickReport {
            clock,
            arrival,
            occupied,
            released,
        })
    }

    /// Plays every remaining tick and returns the final statistics.
    pub fn run(&mut self) -> RunStats {
        while self.step().is_some() {}
        let stats = self.stats();
        info!(
            algorithm = %stats.algorithm,
            ticks = stats.ticks,
            utilization = stats.average_utilization,
            failed = stats.failed_allocations,
            arrivals = stats.arrivals,
            "simulation finished"
        );

        stats
    }

    /// Statistics over the ticks played so far.
    pub fn stats(&self) -> RunStats {
        let played = self.allocator.clock().saturating_sub(self.start_clock);
        let memory = self.allocator.memory_size();
        // Guard the division: an empty run has zero utilization.
        let capacity = memory as u128 * played as u128;
        let average_utilization = if capacity == 0 {
            0.0
        } else {
            self.occupied_sum as f64 / capacity as f64
        };

        RunStats {
            algorithm:              self.allocator.algorithm(),
            ticks:                  played,
            average_utilization,
            peak_utilization:       self.peak_occupied as f64 / memory as f64,
            arrivals:               self.arrived,
            successful_allocations: self.allocated,
            failed_allocations:     self.failed,
            final_partitions:       self.allocator.partitions().len(),
            final_fragmentation:    self.allocator.external_fragmentation(),
            elapsed_secs:           self.busy.as_secs_f64(),
        }
    }
}

/// Validates `config` and runs it to completion in one go.
pub fn run_simulation(config: &SimConfig) -> Result<RunStats, ConfigError> {
    config.validate()?;
    let mut sim = Simulation::from_config(config)?;

    Ok(sim.run())
}
