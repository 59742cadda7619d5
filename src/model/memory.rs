//! System memory counters from `/proc/meminfo`.

use serde::{Deserialize, Serialize};

use crate::collector::CollectError;
use crate::util::narrow::narrow_u32;

/// Memory counters scaled to the caller's unit.
///
/// Source: `/proc/meminfo`, natively in kB. Each value is
/// `(kb << 10) >> unit_shift`, so `unit_shift = 0` gives bytes,
/// `10` gives kB and `20` gives MB.
///
/// Counters a kernel does not report are 0, except the legacy low-memory
/// pair which falls back to the main-memory figures.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct MemoryStats {
    /// Shift that was applied to every counter.
    pub unit_shift: u32,

    /// Source: `Buffers`
    pub main_buffers: u64,
    /// Source: `Cached`
    pub main_cached: u64,
    /// Source: `MemFree`
    pub main_free: u64,
    /// Source: `MemTotal`
    pub main_total: u64,
    /// Source: `SwapFree`
    pub swap_free: u64,
    /// Source: `SwapTotal`
    pub swap_total: u64,

    // Highmem split, 32-bit kernels only.
    pub high_free: u64,
    pub high_total: u64,
    pub low_free: u64,
    pub low_total: u64,

    // 2.4-era VM accounting.
    pub active: u64,
    pub inact_laundry: u64,
    pub inact_dirty: u64,
    pub inact_clean: u64,
    pub inact_target: u64,
    pub swap_cached: u64,

    /// `swap_total - swap_free`, computed at collection time.
    pub swap_used: u64,
    /// `main_total - main_free`, computed at collection time.
    pub main_used: u64,

    pub writeback: u64,
    pub slab: u64,
    /// Source: `ReverseMaps` (a count, scaled like everything else)
    pub reverse_maps: u64,
    /// Source: `Committed_AS`
    pub committed_as: u64,
    pub dirty: u64,
    pub inactive: u64,
    pub mapped: u64,
    /// Source: `PageTables`
    pub page_tables: u64,
}

impl MemoryStats {
    /// Number of counters in [`MemoryStats::to_positional`].
    pub const POSITIONAL_LEN: usize = 26;

    /// Counters in the historical positional order consumed by legacy
    /// callers that index by position rather than name.
    pub fn to_positional(&self) -> [u64; Self::POSITIONAL_LEN] {
        [
            self.main_buffers,
            self.main_cached,
            self.main_free,
            self.main_total,
            self.swap_free,
            self.swap_total,
            self.high_free,
            self.high_total,
            self.low_free,
            self.low_total,
            self.active,
            self.inact_laundry,
            self.inact_dirty,
            self.inact_clean,
            self.inact_target,
            self.swap_cached,
            self.swap_used,
            self.main_used,
            self.writeback,
            self.slab,
            self.reverse_maps,
            self.committed_as,
            self.dirty,
            self.inactive,
            self.mapped,
            self.page_tables,
        ]
    }

    /// Positional counters narrowed for a 32-bit transport.
    ///
    /// Fails with `CapacityExceeded` on the first counter that does not fit
    /// instead of truncating it.
    pub fn to_positional_u32(&self) -> Result<[u32; Self::POSITIONAL_LEN], CollectError> {
        let wide = self.to_positional();
        let mut narrow = [0u32; Self::POSITIONAL_LEN];
        for (slot, value) in narrow.iter_mut().zip(wide) {
            *slot = narrow_u32(value)?;
        }
        Ok(narrow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_order() {
        let stats = MemoryStats {
            main_buffers: 1,
            main_total: 4,
            swap_used: 17,
            main_used: 18,
            page_tables: 26,
            ..Default::default()
        };
        let pos = stats.to_positional();
        assert_eq!(pos[0], 1);
        assert_eq!(pos[3], 4);
        assert_eq!(pos[16], 17);
        assert_eq!(pos[17], 18);
        assert_eq!(pos[25], 26);
    }

    #[test]
    fn test_positional_u32_overflow_is_reported() {
        let stats = MemoryStats {
            main_total: u64::from(u32::MAX) + 1,
            ..Default::default()
        };
        assert!(matches!(
            stats.to_positional_u32(),
            Err(CollectError::CapacityExceeded { .. })
        ));

        let small = MemoryStats {
            main_total: 42,
            ..Default::default()
        };
        assert_eq!(small.to_positional_u32().unwrap()[3], 42);
    }
}
