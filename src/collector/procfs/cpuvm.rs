//! Aggregate CPU and VM counters from `/proc/stat` and `/proc/vmstat`.

use std::path::PathBuf;

use tracing::debug;

use crate::collector::CollectError;
use crate::collector::procfs::parser::{VmstatPaging, parse_global_stat, parse_vmstat};
use crate::collector::traits::FileSystem;
use crate::model::{CpuTimes, CpuVmStats};

/// Collects kernel-wide CPU time and paging counters.
///
/// `/proc/stat` is required. `/proc/vmstat` only exists since Linux 2.6;
/// when it is missing the paging counters come from the `page`/`swap`
/// lines older kernels print in `/proc/stat`.
pub struct CpuVmStatsCollector<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
}

impl<F: FileSystem> CpuVmStatsCollector<F> {
    /// Creates a new CPU/VM collector.
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

    pub fn collect(&self) -> Result<CpuVmStats, CollectError> {
        let path = self.proc_path.join("stat");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CollectError::unavailable(&path, e))?;
        let stat =
            parse_global_stat(&content).map_err(|e| CollectError::malformed(&path, e.message))?;
        let cpu = stat
            .cpu
            .ok_or_else(|| CollectError::malformed(&path, "missing cpu line"))?;

        let paging = self.read_vmstat()?.unwrap_or_default();
        let (page_in, page_out) = stat.page.unzip();
        let (swap_in, swap_out) = stat.swap.unzip();

        Ok(CpuVmStats {
            cpu: CpuTimes {
                user: cpu.user,
                nice: cpu.nice,
                system: cpu.system,
                idle: cpu.idle,
                iowait: cpu.iowait,
                irq: cpu.irq,
                softirq: cpu.softirq,
                steal: cpu.steal,
            },
            pgpgin: paging.pgpgin.or(page_in).unwrap_or(0),
            pgpgout: paging.pgpgout.or(page_out).unwrap_or(0),
            pswpin: paging.pswpin.or(swap_in).unwrap_or(0),
            pswpout: paging.pswpout.or(swap_out).unwrap_or(0),
            interrupts: stat.intr.unwrap_or(0),
            context_switches: stat.ctxt.unwrap_or(0),
            procs_running: stat.procs_running.unwrap_or(0),
            procs_blocked: stat.procs_blocked.unwrap_or(0),
            boot_time: stat.btime.unwrap_or(0),
            processes: stat.processes.unwrap_or(0),
        })
    }

    /// `Ok(None)` when the kernel has no readable `/proc/vmstat`.
    fn read_vmstat(&self) -> Result<Option<VmstatPaging>, CollectError> {
        let path = self.proc_path.join("vmstat");
        let content = match self.fs.read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!(error = %e, "no /proc/vmstat, using paging lines from /proc/stat");
                return Ok(None);
            }
        };
        parse_vmstat(&content)
            .map(Some)
            .map_err(|e| CollectError::malformed(&path, e.message))
    }
}
