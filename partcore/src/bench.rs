//! Pits the fit policies against each other on equivalent workloads.

use crate::helpe::*;

/// Runs the same workload description once per policy.
///
/// Every policy gets its own [Allocator] and its own generator. If the
/// configuration carries a seed, all generators start from it and every
/// policy faces bit-identical arrivals. Without one, each policy draws
/// an independent workload from the same distribution.
#[derive(Debug, Clone)]
pub struct Benchmark {
    config: SimConfig,
}

/// Per-policy averages over several seeded trials.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepStats {
    pub algorithm:                  Algorithm,
    pub trials:                     usize,
    pub mean_utilization:           f64,
    pub mean_failed_allocations:    f64,
    pub mean_failure_rate:          f64,
    pub mean_elapsed_secs:          f64,
}

impl fmt::Display for SweepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Algorithm: {}, Trials: {}, Mean Utilization: {:.4}, \
            Mean Failed Allocations: {:.2} ({:.2}%), Mean Execution Time: {:.6} s",
            self.algorithm,
            self.trials,
            self.mean_utilization,
            self.mean_failed_allocations,
            self.mean_failure_rate * 100.0,
            self.mean_elapsed_secs,
        )
    }
}

impl Benchmark {
    /// The configured algorithm is ignored; policies are picked
    /// per call. A zero-tick configuration is allowed.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate_workload()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs one full simulation per entry of `algorithms`, in order.
    /// Results are keyed (and ordered) by policy.
    pub fn run(&self, algorithms: &[Algorithm]) -> Result<IndexMap<Algorithm, RunStats>, ConfigError> {
        algorithms.iter()
            .map(|&a| -> Result<_, ConfigError> {
                let mut sim = Simulation::from_config(&self.config.with_algorithm(a))?;
                Ok((a, sim.run()))
            })
            .collect()
    }

    /// Repeats [Benchmark::run] over `trials` consecutive seeds, starting
    /// at the configured one (or a random one), and averages per policy.
    ///
    /// Trials run in parallel. Each trial owns all of its allocators,
    /// so nothing is shared but the configuration.
    pub fn sweep(
        &self,
        algorithms: &[Algorithm],
        trials:     usize,
    ) -> Result<IndexMap<Algorithm, SweepStats>, ConfigError> {
        if trials == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        let base_seed = self.config.random_seed.unwrap_or_else(rand::random);
        let per_trial: Vec<IndexMap<Algorithm, RunStats>> = (0..trials)
            .into_par_iter()
            .map(|i| {
                let trial = Benchmark {
                    config: SimConfig {
                        random_seed: Some(base_seed.wrapping_add(i as u64)),
                        ..self.config.clone()
                    },
                };
                trial.run(algorithms)
            })
            .collect::<Result<_, _>>()?;
        debug!(trials, base_seed, "sweep finished");

        let n = trials as f64;
        Ok(algorithms.iter()
            .unique()
            .map(|&a| {
                let runs = per_trial.iter().filter_map(|r| r.get(&a));
                let (util, failed, rate, secs) = runs.fold(
                    (0.0, 0.0, 0.0, 0.0),
                    |(u, f, r, s), st| (
                        u + st.average_utilization,
                        f + st.failed_allocations as f64,
                        r + st.failure_rate(),
                        s + st.elapsed_secs,
                    ),
                );
                (a, SweepStats {
                    algorithm:                  a,
                    trials,
                    mean_utilization:           util / n,
                    mean_failed_allocations:    failed / n,
                    mean_failure_rate:          rate / n,
                    mean_elapsed_secs:          secs / n,
                })
            })
            .collect())
    }
}
