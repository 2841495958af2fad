pub mod placement;

use crate::{
    helpe::*,
    table::{
        get_fragmentation,
        get_free_bytes,
        get_largest_free,
        get_occupied_bytes,
        tiles_exactly,
    },
};

impl Allocator {
    /// Creates an [Allocator] whose table is a single free partition
    /// spanning `[0, memory_size)`.
    pub fn new(memory_size: Units, algorithm: Algorithm) -> Result<Self, ConfigError> {
        if memory_size == 0 {
            return Err(ConfigError::ZeroMemorySize);
        }

        Ok(Self {
            partitions:         vec![Partition::free(0, memory_size)],
            memory_size,
            algorithm,
            clock:              0,
            next_fit_cursor:    0,
        })
    }

    /// Tries to place `process` according to the allocator's policy.
    ///
    /// On success the chosen partition is trimmed to the process' size
    /// (the rest becomes a new free partition right after it), and the
    /// occupant is due at `clock + lifetime`.
    ///
    /// Returns `false` if no free partition is big enough. Nothing
    /// changes in that case, the process is simply dropped.
    pub fn allocate(&mut self, process: Process) -> bool {
        let size = process.get_size();
        let chosen = placement::select(
            self.algorithm,
            &self.partitions,
            size,
            self.next_fit_cursor,
        );
        let Some(idx) = chosen else {
            debug!(
                process = process.get_id(),
                size,
                clock = self.clock,
                algorithm = %self.algorithm,
                "allocation failed"
            );
            return false;
        };

        if let Some(rest) = self.partitions[idx].trim_to(size) {
            self.partitions.insert(idx + 1, rest);
        }
        let expiry = self.clock + process.get_lifetime();
        debug!(
            process = process.get_id(),
            size,
            start = self.partitions[idx].get_start(),
            expiry,
            clock = self.clock,
            "allocated"
        );
        self.partitions[idx].occupy(process, expiry);
        if let Algorithm::NextFit = self.algorithm {
            self.next_fit_cursor = idx;
        }
        debug_assert!(self.check_tiling(), "Allocation broke the partition table");

        true
    }

    /// Evicts every occupant due at or before `current_clock`. The freed
    /// partitions keep their start and size, and are *not* merged with
    /// free neighbours.
    ///
    /// Returns the evicted processes in address order. Calling this twice
    /// with the same clock evicts nothing the second time.
    pub fn release_expired(&mut self, current_clock: Tick) -> Vec<Process> {
        let released: Vec<Process> = self.partitions
            .iter_mut()
            .filter(|p| p.has_expired_by(current_clock))
            .filter_map(|p| p.release())
            .collect();
        for p in &released {
            trace!(process = p.get_id(), clock = current_clock, "released");
        }

        released
    }

    /// Advances the logical clock by one.
    #[inline(always)]
    pub fn tick(&mut self) {
        self.clock += 1;
    }

    /// A read-only copy of the table, in address order.
    pub fn snapshot(&self) -> Vec<PartitionView> {
        self.partitions
            .iter()
            .map(|p| p.view())
            .collect()
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn memory_size(&self) -> Units {
        self.memory_size
    }

    pub fn next_fit_cursor(&self) -> usize {
        self.next_fit_cursor
    }

    pub fn occupied_bytes(&self) -> Units {
        get_occupied_bytes(&self.partitions)
    }

    pub fn free_bytes(&self) -> Units {
        get_free_bytes(&self.partitions)
    }

    pub fn largest_free_block(&self) -> Units {
        get_largest_free(&self.partitions)
    }

    pub fn external_fragmentation(&self) -> f64 {
        get_fragmentation(&self.partitions)
    }

    /// Number of processes currently holding memory.
    pub fn live_processes(&self) -> usize {
        self.partitions
            .iter()
            .filter(|p| !p.is_free())
            .count()
    }

    /// Returns `true` if the table tiles the address space exactly.
    pub fn check_tiling(&self) -> bool {
        tiles_exactly(
            self.partitions.iter().map(|p| (p.get_start(), p.get_size())),
            self.memory_size,
        )
    }
}

/// The memory-state report: one line per partition, in address order.
impl fmt::Display for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Clock: {}", self.clock)?;
        for (idx, p) in self.partitions.iter().enumerate() {
            write!(f, "Partition {idx}: Start = {}, Size = {}, ", p.get_start(), p.get_size())?;
            match (p.get_occupant(), p.get_expiry()) {
                (Some(occupant), Some(expiry))  => {
                    writeln!(f, "Status = Occupied by Process {occupant}, Ends at {expiry}")?;
                },
                _   => { writeln!(f, "Status = Free")?; }
            }
        }
        writeln!(f, "{}", "-".repeat(50))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(id: ProcessId, size: Units, lifetime: Tick) -> Process {
        Process::new(id, size, lifetime).unwrap()
    }

    /// Builds an allocator over an arbitrary layout of
    /// `(size, Some(expiry) if occupied)` entries.
    fn with_layout(algorithm: Algorithm, entries: &[(Units, Option<Tick>)]) -> Allocator {
        let mut start = 0;
        let partitions: PartitionTable = entries.iter()
            .enumerate()
            .map(|(id, &(size, expiry))| {
                let mut p = Partition::free(start, size);
                if let Some(e) = expiry {
                    p.occupy(spawn(1000 + id, size, 1), e);
                }
                start += size;
                p
            })
            .collect();
        let alloc = Allocator {
            partitions,
            memory_size:        start,
            algorithm,
            clock:              0,
            next_fit_cursor:    0,
        };
        assert!(alloc.check_tiling());

        alloc
    }

    fn spans(alloc: &Allocator) -> Vec<(Units, Units, bool)> {
        alloc.snapshot()
            .iter()
            .map(|v| (v.start, v.size, v.is_free()))
            .collect()
    }

    #[test]
    fn zero_memory_is_rejected() {
        assert_eq!(Allocator::new(0, Algorithm::FirstFit).err(), Some(ConfigError::ZeroMemorySize));
    }

    #[test]
    fn first_allocation_splits_the_whole_space() {
        let mut alloc = Allocator::new(100, Algorithm::FirstFit).unwrap();
        assert!(alloc.allocate(spawn(1, 30, 4)));
        assert_eq!(spans(&alloc), vec![(0, 30, false), (30, 70, true)]);
        let view = alloc.snapshot()[0];
        assert_eq!(view.occupant, Some(1));
        assert_eq!(view.expiry, Some(4));
    }

    #[test]
    fn exact_fit_consumes_the_partition() {
        let mut alloc = Allocator::new(64, Algorithm::BestFit).unwrap();
        assert!(alloc.allocate(spawn(1, 64, 1)));
        assert_eq!(spans(&alloc), vec![(0, 64, false)]);
        assert_eq!(alloc.free_bytes(), 0);
    }

    #[test]
    fn expiry_counts_from_allocation_clock() {
        let mut alloc = Allocator::new(100, Algorithm::FirstFit).unwrap();
        for _ in 0..7 { alloc.tick(); }
        assert!(alloc.allocate(spawn(7, 10, 3)));
        assert_eq!(alloc.snapshot()[0].expiry, Some(10));
    }

    #[test]
    fn oversize_request_fails_without_side_effects() {
        let mut alloc = with_layout(Algorithm::WorstFit, &[(10, None), (20, Some(3)), (15, None)]);
        let before = alloc.snapshot();
        assert!(!alloc.allocate(spawn(1, 16, 1)));
        assert_eq!(alloc.snapshot(), before);
    }

    #[test]
    fn best_fit_prefers_the_tight_partition() {
        let mut alloc = with_layout(Algorithm::BestFit, &[(10, None), (50, None)]);
        assert!(alloc.allocate(spawn(1, 5, 2)));
        assert_eq!(spans(&alloc), vec![(0, 5, false), (5, 5, true), (10, 50, true)]);
    }

    #[test]
    fn worst_fit_prefers_the_roomy_partition() {
        let mut alloc = with_layout(Algorithm::WorstFit, &[(10, None), (50, None)]);
        assert!(alloc.allocate(spawn(1, 5, 2)));
        assert_eq!(spans(&alloc), vec![(0, 10, true), (10, 5, false), (15, 45, true)]);
    }

    #[test]
    fn release_is_inclusive_and_idempotent() {
        let mut alloc = with_layout(Algorithm::FirstFit, &[(10, Some(5)), (10, None)]);
        assert!(alloc.release_expired(4).is_empty());
        assert!(!alloc.snapshot()[0].is_free());

        let gone = alloc.release_expired(5);
        assert_eq!(gone.len(), 1);
        let once = alloc.snapshot();
        assert!(once[0].is_free() && once[0].expiry.is_none());

        assert!(alloc.release_expired(5).is_empty());
        assert_eq!(alloc.snapshot(), once);
    }

    #[test]
    fn freed_neighbours_are_not_merged() {
        let mut alloc = Allocator::new(60, Algorithm::FirstFit).unwrap();
        assert!(alloc.allocate(spawn(1, 10, 1)));
        assert!(alloc.allocate(spawn(2, 50, 1)));
        alloc.release_expired(1);
        assert_eq!(spans(&alloc), vec![(0, 10, true), (10, 50, true)]);
        // Sixty units are free, but not in one piece.
        assert!(!alloc.allocate(spawn(3, 55, 1)));
        assert_eq!(alloc.largest_free_block(), 50);
        assert!((alloc.external_fragmentation() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn next_fit_resumes_from_last_placement() {
        // Free: 10 @ 0, 10 @ 20, 10 @ 40
        let mut alloc = with_layout(
            Algorithm::NextFit,
            &[(10, None), (10, Some(9)), (10, None), (10, Some(9)), (10, None)],
        );
        assert!(alloc.allocate(spawn(1, 4, 9)));
        assert_eq!(alloc.next_fit_cursor(), 0);
        // The remainder of partition 0 is index 1 now; next-fit
        // continues from the cursor and finds it first.
        assert!(alloc.allocate(spawn(2, 6, 9)));
        assert_eq!(alloc.next_fit_cursor(), 1);
        assert!(alloc.allocate(spawn(3, 10, 9)));
        assert_eq!(alloc.next_fit_cursor(), 3);
        assert_eq!(alloc.snapshot()[3].occupant, Some(3));
    }

    #[test]
    fn next_fit_wraps_and_keeps_cursor_on_failure() {
        let mut alloc = with_layout(
            Algorithm::NextFit,
            &[(10, None), (10, Some(9)), (30, None)],
        );
        assert!(alloc.allocate(spawn(1, 30, 9)));
        assert_eq!(alloc.next_fit_cursor(), 2);
        // Only partition 0 is free: the scan wraps from 2 to 0.
        assert!(!alloc.allocate(spawn(2, 11, 9)));
        assert_eq!(alloc.next_fit_cursor(), 2);
        assert!(alloc.allocate(spawn(3, 10, 9)));
        assert_eq!(alloc.next_fit_cursor(), 0);
    }

    #[test]
    fn cursor_stays_put_for_other_policies() {
        let mut alloc = with_layout(Algorithm::WorstFit, &[(10, None), (50, None)]);
        assert!(alloc.allocate(spawn(1, 5, 2)));
        assert_eq!(alloc.next_fit_cursor(), 0);
    }

    #[test]
    fn report_lists_every_partition() {
        let mut alloc = Allocator::new(100, Algorithm::FirstFit).unwrap();
        alloc.allocate(spawn(3, 30, 2));
        let report = alloc.to_string();
        assert!(report.starts_with("Clock: 0\n"));
        assert!(report.contains("Partition 0: Start = 0, Size = 30, Status = Occupied by Process P3, Ends at 2"));
        assert!(report.contains("Partition 1: Start = 30, Size = 70, Status = Free"));
    }
}
