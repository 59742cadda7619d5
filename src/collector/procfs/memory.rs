//! System memory collector for `/proc/meminfo`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::CollectError;
use crate::collector::procfs::parser::parse_meminfo;
use crate::collector::traits::FileSystem;
use crate::model::MemoryStats;

/// Largest accepted unit shift (MB granularity).
pub const MAX_UNIT_SHIFT: u32 = 20;

/// Converts a kB figure to the unit selected by `unit_shift`:
/// `(kb << 10) >> unit_shift`.
///
/// Computed in `u128`, so it is exact for every input; `None` when the
/// result does not fit `u64` (only possible for shifts below 10).
pub fn scale_kb(kb: u64, unit_shift: u32) -> Option<u64> {
    let bytes = u128::from(kb) << 10;
    u64::try_from(bytes >> unit_shift).ok()
}

/// Collects system memory counters from `/proc/meminfo`.
pub struct MemoryStatsCollector<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
}

impl<F: FileSystem> MemoryStatsCollector<F> {
    /// Creates a new memory collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Reads `/proc/meminfo` once and scales every counter by `unit_shift`.
    ///
    /// `unit_shift` must be in `0..=20`: 0 for bytes, 10 for kB, 20 for MB.
    pub fn collect(&self, unit_shift: u32) -> Result<MemoryStats, CollectError> {
        if unit_shift > MAX_UNIT_SHIFT {
            return Err(CollectError::InvalidArgument(format!(
                "unit shift {} is outside 0..={}",
                unit_shift, MAX_UNIT_SHIFT
            )));
        }

        let path = self.proc_path.join("meminfo");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CollectError::unavailable(&path, e))?;
        let info = parse_meminfo(&content).map_err(|e| CollectError::malformed(&path, e.message))?;

        let raw = RawMemInfo::from_map(&info).ok_or_else(|| {
            CollectError::malformed(&path, "missing MemTotal")
        })?;
        raw.scale(&path, unit_shift)
    }
}

/// `/proc/meminfo` figures in kB after the kernel-compat fallbacks.
struct RawMemInfo {
    main_buffers: u64,
    main_cached: u64,
    main_free: u64,
    main_total: u64,
    swap_free: u64,
    swap_total: u64,
    high_free: u64,
    high_total: u64,
    low_free: u64,
    low_total: u64,
    active: u64,
    inact_laundry: u64,
    inact_dirty: u64,
    inact_clean: u64,
    inact_target: u64,
    swap_cached: u64,
    writeback: u64,
    slab: u64,
    reverse_maps: u64,
    committed_as: u64,
    dirty: u64,
    inactive: u64,
    mapped: u64,
    page_tables: u64,
}

impl RawMemInfo {
    /// Returns `None` when `MemTotal` is absent.
    fn from_map(info: &HashMap<String, u64>) -> Option<Self> {
        let kb = |key: &str| info.get(key).copied().unwrap_or(0);

        let main_total = info.get("MemTotal").copied()?;
        let main_free = kb("MemFree");

        // Kernels without a highmem split report no Low* lines; all memory is low.
        let (low_total, low_free) = match info.get("LowTotal") {
            Some(total) => (*total, kb("LowFree")),
            None => (main_total, main_free),
        };

        let inact_dirty = kb("Inact_dirty");
        let inact_clean = kb("Inact_clean");
        let inact_laundry = kb("Inact_laundry");
        let inactive = match info.get("Inactive") {
            Some(inactive) => *inactive,
            None => {
                debug!("meminfo has no Inactive line, summing the 2.4 inactive lists");
                inact_dirty
                    .saturating_add(inact_clean)
                    .saturating_add(inact_laundry)
            }
        };

        Some(Self {
            main_buffers: kb("Buffers"),
            main_cached: kb("Cached"),
            main_free,
            main_total,
            swap_free: kb("SwapFree"),
            swap_total: kb("SwapTotal"),
            high_free: kb("HighFree"),
            high_total: kb("HighTotal"),
            low_free,
            low_total,
            active: kb("Active"),
            inact_laundry,
            inact_dirty,
            inact_clean,
            inact_target: kb("Inact_target"),
            swap_cached: kb("SwapCached"),
            writeback: kb("Writeback"),
            slab: kb("Slab"),
            reverse_maps: kb("ReverseMaps"),
            committed_as: kb("Committed_AS"),
            dirty: kb("Dirty"),
            inactive,
            mapped: kb("Mapped"),
            page_tables: kb("PageTables"),
        })
    }

    fn scale(&self, path: &Path, unit_shift: u32) -> Result<MemoryStats, CollectError> {
        let scale = |name: &str, kb: u64| {
            scale_kb(kb, unit_shift).ok_or_else(|| {
                CollectError::malformed(
                    path,
                    format!("{} = {} kB does not fit 64 bits at shift {}", name, kb, unit_shift),
                )
            })
        };

        Ok(MemoryStats {
            unit_shift,
            main_buffers: scale("Buffers", self.main_buffers)?,
            main_cached: scale("Cached", self.main_cached)?,
            main_free: scale("MemFree", self.main_free)?,
            main_total: scale("MemTotal", self.main_total)?,
            swap_free: scale("SwapFree", self.swap_free)?,
            swap_total: scale("SwapTotal", self.swap_total)?,
            high_free: scale("HighFree", self.high_free)?,
            high_total: scale("HighTotal", self.high_total)?,
            low_free: scale("LowFree", self.low_free)?,
            low_total: scale("LowTotal", self.low_total)?,
            active: scale("Active", self.active)?,
            inact_laundry: scale("Inact_laundry", self.inact_laundry)?,
            inact_dirty: scale("Inact_dirty", self.inact_dirty)?,
            inact_clean: scale("Inact_clean", self.inact_clean)?,
            inact_target: scale("Inact_target", self.inact_target)?,
            swap_cached: scale("SwapCached", self.swap_cached)?,
            swap_used: scale(
                "swap used",
                self.swap_total.saturating_sub(self.swap_free),
            )?,
            main_used: scale(
                "main used",
                self.main_total.saturating_sub(self.main_free),
            )?,
            writeback: scale("Writeback", self.writeback)?,
            slab: scale("Slab", self.slab)?,
            reverse_maps: scale("ReverseMaps", self.reverse_maps)?,
            committed_as: scale("Committed_AS", self.committed_as)?,
            dirty: scale("Dirty", self.dirty)?,
            inactive: scale("Inactive", self.inactive)?,
            mapped: scale("Mapped", self.mapped)?,
            page_tables: scale("PageTables", self.page_tables)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    fn meminfo_fs(content: &str) -> MockFs {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", content);
        fs
    }

    #[test]
    fn test_collect_sixteen_gib_in_each_unit() {
        let fs = meminfo_fs("MemTotal: 16777216 kB\nMemFree: 8388608 kB\n");
        let collector = MemoryStatsCollector::new(fs, "/proc");

        let mb = collector.collect(20).unwrap();
        assert_eq!(mb.main_total, 16384);
        assert_eq!(mb.main_free, 8192);
        assert_eq!(mb.main_used, 8192);
        assert_eq!(mb.unit_shift, 20);

        let kb = collector.collect(10).unwrap();
        assert_eq!(kb.main_total, 16777216);
        assert_eq!(kb.main_free, 8388608);

        let bytes = collector.collect(0).unwrap();
        assert_eq!(bytes.main_total, 17179869184);
        assert_eq!(bytes.main_free, 8589934592);
    }

    #[test]
    fn test_collect_typical_system() {
        let collector = MemoryStatsCollector::new(MockFs::typical_system(), "/proc");

        let mem = collector.collect(10).unwrap();

        assert_eq!(mem.main_total, 16384000);
        assert_eq!(mem.main_free, 8192000);
        assert_eq!(mem.main_used, 8192000);
        assert_eq!(mem.main_buffers, 512000);
        assert_eq!(mem.main_cached, 2048000);
        assert_eq!(mem.active, 4096000);
        assert_eq!(mem.inactive, 2048000);
        assert_eq!(mem.dirty, 1024);
        assert_eq!(mem.mapped, 300000);
        assert_eq!(mem.slab, 512000);
        assert_eq!(mem.page_tables, 40000);
        assert_eq!(mem.committed_as, 6000000);
        assert_eq!(mem.swap_used, 0);
        // No highmem split: low memory mirrors main memory.
        assert_eq!(mem.low_total, mem.main_total);
        assert_eq!(mem.low_free, mem.main_free);
        assert_eq!(mem.high_total, 0);
    }

    #[test]
    fn test_collect_memory_pressure() {
        let collector = MemoryStatsCollector::new(MockFs::memory_pressure(), "/proc");

        let mem = collector.collect(10).unwrap();

        assert_eq!(mem.swap_used, 3072000);
        assert_eq!(mem.swap_cached, 128000);
        assert_eq!(mem.writeback, 10240);
    }

    #[test]
    fn test_collect_legacy_kernel() {
        let collector = MemoryStatsCollector::new(MockFs::legacy_kernel(), "/proc");

        let mem = collector.collect(10).unwrap();

        assert_eq!(mem.low_total, 903416);
        assert_eq!(mem.low_free, 118000);
        assert_eq!(mem.high_total, 131008);
        assert_eq!(mem.high_free, 2000);
        assert_eq!(mem.inact_dirty, 20000);
        assert_eq!(mem.inact_laundry, 5000);
        assert_eq!(mem.inact_clean, 30000);
        assert_eq!(mem.inact_target, 90000);
        assert_eq!(mem.inactive, 55000);
        assert_eq!(mem.reverse_maps, 70000);
    }

    #[test]
    fn test_collect_is_idempotent() {
        let collector = MemoryStatsCollector::new(MockFs::typical_system(), "/proc");

        let first = collector.collect(12).unwrap();
        let second = collector.collect(12).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_collect_rejects_large_shift_before_reading() {
        // No meminfo at all: the argument check must come first.
        let collector = MemoryStatsCollector::new(MockFs::new(), "/proc");

        assert!(matches!(
            collector.collect(21),
            Err(CollectError::InvalidArgument(_))
        ));
        assert!(matches!(
            collector.collect(20),
            Err(CollectError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_collect_requires_mem_total() {
        let collector = MemoryStatsCollector::new(meminfo_fs("MemFree: 1024 kB\n"), "/proc");

        let err = collector.collect(10).unwrap_err();

        assert!(matches!(err, CollectError::MalformedSource { .. }));
        assert!(err.to_string().contains("MemTotal"));
    }

    #[test]
    fn test_collect_garbage_value() {
        let collector = MemoryStatsCollector::new(meminfo_fs("MemTotal: lots kB\n"), "/proc");
        assert!(matches!(
            collector.collect(10),
            Err(CollectError::MalformedSource { .. })
        ));
    }

    #[test]
    fn test_collect_overflow_in_bytes() {
        let fs = meminfo_fs(&format!("MemTotal: {} kB\n", u64::MAX));
        let collector = MemoryStatsCollector::new(fs, "/proc");

        assert!(matches!(
            collector.collect(0),
            Err(CollectError::MalformedSource { .. })
        ));
        assert_eq!(collector.collect(10).unwrap().main_total, u64::MAX);
    }

    #[test]
    fn test_scale_kb_boundaries() {
        assert_eq!(scale_kb(1, 0), Some(1024));
        assert_eq!(scale_kb(1, 10), Some(1));
        assert_eq!(scale_kb(1023, 20), Some(0));
        assert_eq!(scale_kb(1024, 20), Some(1));
        assert_eq!(scale_kb(u64::MAX >> 10, 0), Some((u64::MAX >> 10) << 10));
        assert_eq!(scale_kb((u64::MAX >> 10) + 1, 0), None);
    }

    // Any kB figure a kernel can report in 54 bits converts without overflow
    // at every accepted shift.
    #[quickcheck]
    fn prop_scale_never_overflows_for_valid_shifts(kb: u64, shift: u8) -> bool {
        let kb = kb >> 10;
        let shift = u32::from(shift) % (MAX_UNIT_SHIFT + 1);
        scale_kb(kb, shift).is_some()
    }

    // Shift 10 is the identity on kB.
    #[quickcheck]
    fn prop_scale_kb_unit_is_identity(kb: u64) -> bool {
        scale_kb(kb, 10) == Some(kb)
    }

    // One more bit of shift halves the value, rounding down.
    #[quickcheck]
    fn prop_scale_each_shift_halves(kb: u64, shift: u8) -> TestResult {
        let shift = u32::from(shift) % MAX_UNIT_SHIFT;
        match (scale_kb(kb, shift), scale_kb(kb, shift + 1)) {
            (Some(wide), Some(narrow)) => TestResult::from_bool(narrow == wide >> 1),
            _ => TestResult::discard(),
        }
    }

    // Values in bytes divide back to the kB figure exactly.
    #[quickcheck]
    fn prop_scale_bytes_are_exact(kb: u32) -> bool {
        let kb = u64::from(kb);
        scale_kb(kb, 0) == Some(kb * 1024)
    }
}
