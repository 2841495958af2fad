use crate::helpe::*;

impl Partition {
    /// Creates an unoccupied [Partition].
    #[inline(always)]
    pub(crate) fn free(start: Units, size: Units) -> Self {
        debug_assert!(size > 0, "Empty partition requested");
        Self {
            start,
            size,
            occupant:   None,
            expiry:     None,
        }
    }

    pub fn get_start(&self) -> Units {
        self.start
    }

    pub fn get_size(&self) -> Units {
        self.size
    }

    pub fn get_occupant(&self) -> Option<&Process> {
        self.occupant.as_ref()
    }

    pub fn get_expiry(&self) -> Option<Tick> {
        self.expiry
    }

    /// First address past the partition.
    #[inline(always)]
    pub fn end(&self) -> Units {
        self.start + self.size
    }

    #[inline(always)]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    /// Returns `true` if a process of `size` units may be placed here.
    #[inline(always)]
    pub fn fits(&self, size: Units) -> bool {
        self.is_free() && self.size >= size
    }

    /// Returns `true` if the partition is occupied and its occupant
    /// is due at or before `clock`.
    #[inline(always)]
    pub fn has_expired_by(&self, clock: Tick) -> bool {
        match self.expiry {
            Some(e) => e <= clock,
            None    => false,
        }
    }

    /// Shrinks the partition to its first `keep` units and returns
    /// the remainder as a new free partition. Nothing is returned
    /// (and nothing changes) on an exact fit.
    pub(crate) fn trim_to(&mut self, keep: Units) -> Option<Partition> {
        debug_assert!(keep > 0 && keep <= self.size, "Bad trim requested");
        if self.size > keep {
            let rest = Partition::free(self.start + keep, self.size - keep);
            self.size = keep;
            Some(rest)
        } else { None }
    }

    pub(crate) fn occupy(&mut self, process: Process, expiry: Tick) {
        debug_assert!(self.is_free(), "Partition double-booked");
        debug_assert!(process.get_size() == self.size, "Untrimmed partition occupied");
        self.occupant = Some(process);
        self.expiry = Some(expiry);
    }

    /// Frees the partition in place: start and size stay put.
    pub(crate) fn release(&mut self) -> Option<Process> {
        self.expiry = None;
        self.occupant.take()
    }

    pub fn view(&self) -> PartitionView {
        PartitionView {
            start:      self.start,
            size:       self.size,
            occupant:   self.occupant.as_ref().map(|p| p.get_id()),
            expiry:     self.expiry,
        }
    }
}
