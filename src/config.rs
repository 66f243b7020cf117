/// Sizing parameters for an autodiff [`Context`](crate::context::Context).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContextConfig {
    /// Size of the first block of each arena, in bytes (default: 64 KiB).
    /// Later blocks double in size.
    pub initial_block_bytes: usize,
    /// Number of tape entries to reserve up front (default: 0).
    pub tape_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            initial_block_bytes: 1 << 16,
            tape_capacity: 0,
        }
    }
}

impl ContextConfig {
    /// Number of `T` items that fit in the first arena block (at least one).
    pub(crate) fn initial_block_len<T>(&self) -> usize {
        let size = std::mem::size_of::<T>().max(1);
        (self.initial_block_bytes / size).max(1)
    }
}
