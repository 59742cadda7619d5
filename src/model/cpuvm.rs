//! Aggregate CPU time and VM counters from `/proc/stat` and `/proc/vmstat`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::CollectError;
use crate::util::narrow::narrow_u32;

/// Aggregate CPU time buckets in jiffies.
///
/// Source: the `cpu` line of `/proc/stat`. Field order is the kernel's
/// column order and is relied upon by positional consumers.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    /// Absent before Linux 2.5.41, reported as 0.
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    /// Absent before Linux 2.6.11, reported as 0.
    pub steal: u64,
}

impl CpuTimes {
    /// Buckets in canonical order: user, nice, system, idle, iowait, irq,
    /// softirq, steal.
    pub fn as_array(&self) -> [u64; 8] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
    }

    pub fn total(&self) -> u64 {
        self.as_array().iter().fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

/// Kernel-wide counters, all monotonic since boot except the
/// `procs_running` / `procs_blocked` gauges.
///
/// No deltas are computed here; rates are the caller's business.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct CpuVmStats {
    pub cpu: CpuTimes,
    /// Pages paged in. Source: `pgpgin` in `/proc/vmstat`, or `page` in `/proc/stat`
    pub pgpgin: u64,
    pub pgpgout: u64,
    /// Pages swapped in. Source: `pswpin` in `/proc/vmstat`, or `swap` in `/proc/stat`
    pub pswpin: u64,
    pub pswpout: u64,
    /// Total interrupts serviced. Source: first value of `intr`
    pub interrupts: u64,
    /// Source: `ctxt`
    pub context_switches: u64,
    /// Source: `procs_running`
    pub procs_running: u64,
    /// Source: `procs_blocked`
    pub procs_blocked: u64,
    /// Boot time, seconds since the epoch. Source: `btime`
    pub boot_time: u64,
    /// Forks since boot. Source: `processes`
    pub processes: u64,
}

impl CpuVmStats {
    pub const POSITIONAL_LEN: usize = 18;

    /// Counters in the historical positional order: the eight CPU buckets,
    /// paging, swapping, interrupts, context switches, running, blocked,
    /// boot time, processes.
    pub fn to_positional(&self) -> [u64; Self::POSITIONAL_LEN] {
        let c = self.cpu.as_array();
        [
            c[0],
            c[1],
            c[2],
            c[3],
            c[4],
            c[5],
            c[6],
            c[7],
            self.pgpgin,
            self.pgpgout,
            self.pswpin,
            self.pswpout,
            self.interrupts,
            self.context_switches,
            self.procs_running,
            self.procs_blocked,
            self.boot_time,
            self.processes,
        ]
    }

    /// Positional counters narrowed for a 32-bit transport.
    ///
    /// Long-running hosts overflow 32-bit jiffy counters; that is reported
    /// as `CapacityExceeded` rather than wrapped.
    pub fn to_positional_u32(&self) -> Result<[u32; Self::POSITIONAL_LEN], CollectError> {
        let wide = self.to_positional();
        let mut narrow = [0u32; Self::POSITIONAL_LEN];
        for (slot, value) in narrow.iter_mut().zip(wide) {
            *slot = narrow_u32(value)?;
        }
        Ok(narrow)
    }

    /// Boot time as a UTC timestamp, `None` if out of chrono's range.
    pub fn boot_time_utc(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.boot_time).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_times_order() {
        let cpu = CpuTimes {
            user: 1,
            nice: 2,
            system: 3,
            idle: 4,
            iowait: 5,
            irq: 6,
            softirq: 7,
            steal: 8,
        };
        assert_eq!(cpu.as_array(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(cpu.total(), 36);
    }

    #[test]
    fn test_positional_layout() {
        let stats = CpuVmStats {
            cpu: CpuTimes {
                user: 10,
                steal: 80,
                ..Default::default()
            },
            pgpgin: 9,
            interrupts: 13,
            context_switches: 14,
            boot_time: 17,
            processes: 18,
            ..Default::default()
        };
        let pos = stats.to_positional();
        assert_eq!(pos[0], 10);
        assert_eq!(pos[7], 80);
        assert_eq!(pos[8], 9);
        assert_eq!(pos[12], 13);
        assert_eq!(pos[13], 14);
        assert_eq!(pos[16], 17);
        assert_eq!(pos[17], 18);
    }

    #[test]
    fn test_positional_u32_rejects_wide_counter() {
        let stats = CpuVmStats {
            context_switches: 1 << 40,
            ..Default::default()
        };
        assert!(matches!(
            stats.to_positional_u32(),
            Err(CollectError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_boot_time_utc() {
        let stats = CpuVmStats {
            boot_time: 1_700_000_000,
            ..Default::default()
        };
        let ts = stats.boot_time_utc().unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }
}
