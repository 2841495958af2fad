//! The four fit policies. Each one only *picks* a partition; splitting
//! and bookkeeping are the [Allocator]'s business.

use crate::helpe::*;

/// Returns the index of the partition `algorithm` would place a
/// process of `size` units into, or `None` if nothing fits.
///
/// `cursor` is only consulted by next-fit.
#[inline(always)]
pub fn select(
    algorithm:  Algorithm,
    table:      &PartitionTable,
    size:       Units,
    cursor:     usize,
) -> Option<usize> {
    match algorithm {
        Algorithm::FirstFit => first_fit(table, size),
        Algorithm::BestFit  => best_fit(table, size),
        Algorithm::WorstFit => worst_fit(table, size),
        Algorithm::NextFit  => next_fit(table, size, cursor),
    }
}

/// Lowest-address free partition that fits.
pub fn first_fit(table: &PartitionTable, size: Units) -> Option<usize> {
    table.iter().position(|p| p.fits(size))
}

/// Smallest free partition that fits. On ties, the lowest address wins.
pub fn best_fit(table: &PartitionTable, size: Units) -> Option<usize> {
    let mut best: Option<(usize, Units)> = None;
    for (idx, p) in table.iter().enumerate() {
        if p.fits(size) {
            match best {
                // Strict comparison keeps the first one met.
                Some((_, best_size)) if p.get_size() >= best_size => {},
                _   => { best = Some((idx, p.get_size())); }
            }
        }
    }

    best.map(|(idx, _)| idx)
}

/// Largest free partition that fits. On ties, the lowest address wins.
pub fn worst_fit(table: &PartitionTable, size: Units) -> Option<usize> {
    let mut worst: Option<(usize, Units)> = None;
    for (idx, p) in table.iter().enumerate() {
        if p.fits(size) {
            match worst {
                Some((_, worst_size)) if p.get_size() <= worst_size => {},
                _   => { worst = Some((idx, p.get_size())); }
            }
        }
    }

    worst.map(|(idx, _)| idx)
}

/// First fit, but the scan starts at `cursor` and wraps around the
/// table exactly once.
pub fn next_fit(table: &PartitionTable, size: Units, cursor: usize) -> Option<usize> {
    let total = table.len();
    if total == 0 {
        return None;
    }

    (cursor..cursor + total)
        .map(|i| i % total)
        .find(|&i| table[i].fits(size))
}
