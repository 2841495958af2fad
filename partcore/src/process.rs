use crate::helpe::*;

impl Process {
    /// Creates a [Process], refusing values the allocator
    /// cannot reason about:
    /// - a zero size would make an empty partition
    /// - a zero lifetime would expire before it ever occupies memory
    pub fn new(id: ProcessId, size: Units, lifetime: Tick) -> Result<Self, ProcessError> {
        let culprit = |message: &str| ProcessError {
            message:    message.to_string(),
            id,
            size,
            lifetime,
        };
        if size == 0 {
            return Err(culprit("Process with 0 size found!"));
        }
        if lifetime == 0 {
            return Err(culprit("Process with 0 lifetime found!"));
        }

        Ok(Self {
            id,
            size,
            lifetime,
        })
    }

    pub fn get_id(&self) -> ProcessId {
        self.id
    }

    pub fn get_size(&self) -> Units {
        self.size
    }

    /// Number of ticks the process keeps its memory once placed.
    pub fn get_lifetime(&self) -> Tick {
        self.lifetime
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.id)
    }
}
