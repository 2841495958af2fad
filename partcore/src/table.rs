use crate::helpe::*;

/// Returns `true` if the `(start, size)` spans, taken in the given
/// order, cover `[0, memory_size)` exactly: the first starts at 0, each
/// one begins where its predecessor ends, the last ends at `memory_size`,
/// and none is empty.
///
/// This is the invariant every [PartitionTable] must hold after any
/// sequence of allocations and releases.
pub fn tiles_exactly<I>(spans: I, memory_size: Units) -> bool
where I: IntoIterator<Item = (Units, Units)> {
    let spans: Vec<(Units, Units)> = spans.into_iter().collect();
    match (spans.first(), spans.last()) {
        (Some(&(first_start, _)), Some(&(last_start, last_size))) => {
            first_start == 0
                && last_start + last_size == memory_size
                && spans.iter().all(|&(_, size)| size > 0)
                && spans.iter()
                    .tuple_windows()
                    .all(|(&(s0, l0), &(s1, _))| s0 + l0 == s1)
        },
        _   => false,
    }
}

#[inline(always)]
pub fn get_occupied_bytes(table: &PartitionTable) -> Units {
    table.iter()
        .filter(|p| !p.is_free())
        .map(|p| p.get_size())
        .sum()
}

#[inline(always)]
pub fn get_free_bytes(table: &PartitionTable) -> Units {
    table.iter()
        .filter(|p| p.is_free())
        .map(|p| p.get_size())
        .sum()
}

/// Size of the biggest single free partition, i.e., the biggest
/// request that could succeed right now under any policy.
#[inline(always)]
pub fn get_largest_free(table: &PartitionTable) -> Units {
    table.iter()
        .filter(|p| p.is_free())
        .map(|p| p.get_size())
        .max()
        .unwrap_or(0)
}

/// External fragmentation: the share of free memory that lies
/// outside the largest free partition. Zero when nothing is free.
pub fn get_fragmentation(table: &PartitionTable) -> f64 {
    let free = get_free_bytes(table);
    if free == 0 {
        0.0
    } else {
        1.0 - get_largest_free(table) as f64 / free as f64
    }
}
