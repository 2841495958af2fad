//! Welcome to `partcore`!
//!
//! A simulator of dynamic memory partitioning. Processes of some size and
//! lifetime arrive on a discrete clock, get placed into the free partitions
//! of a fixed-size address space by one of four classic fit policies, and
//! are evicted once their lifetime runs out.

mod process;
mod partition;

pub mod algo;
pub mod table;
pub mod sim;
pub mod bench;
pub mod helpe;

pub use crate::helpe::*;

/// Something that needs memory. A [`Process`] asks for
/// [`size`](Process::get_size) units of address space and, once placed,
/// keeps them for [`lifetime`](Process::get_lifetime) ticks.
///
/// > ***ATTENTION:*** the lifetime is *relative*. It starts counting at the
/// > clock of the successful allocation, not at the clock of arrival, so a
/// > process placed at tick `t` with lifetime `l` expires at `t + l`.
///
/// Instances can only be built through [`Process::new`], which refuses
/// zero sizes and zero lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    id:         ProcessId,
    size:       Units,
    lifetime:   Tick,
}

/// A contiguous run of the address space, either free or owned by
/// exactly one [`Process`].
///
/// `expiry` is the absolute tick at which the occupant must go. It is
/// `Some` iff `occupant` is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    start:      Units,
    size:       Units,
    occupant:   Option<Process>,
    expiry:     Option<Tick>,
}

/// Owns the [`PartitionTable`] and places incoming processes into it
/// according to its [`Algorithm`].
///
/// The table always tiles `[0, memory_size)`: entries are sorted by start
/// address, each one begins where the previous one ends, and no two free
/// neighbours are ever merged back together.
#[derive(Debug, Clone)]
pub struct Allocator {
    partitions:         PartitionTable,
    memory_size:        Units,
    algorithm:          Algorithm,
    clock:              Tick,
    // Index of the last partition handed out by next-fit. Meaningless
    // for the other policies.
    next_fit_cursor:    usize,
}
