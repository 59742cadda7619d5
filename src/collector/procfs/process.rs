//! Process table collector for gathering per-process records from `/proc/[pid]/`.

use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::collector::procfs::parser::{
    ParseError, parse_cmdline, parse_environ, parse_proc_stat, parse_proc_status, parse_statm,
};
use crate::collector::traits::FileSystem;
use crate::collector::{CollectError, is_process_gone};
use crate::model::{
    Detail, DetailPolicy, ProcessFilter, ProcessMemory, ProcessRecord, ProcessState,
};
use crate::util::clock::page_size;

/// Collects one snapshot of the process table per [`scan`](Self::scan).
///
/// The process table changes while it is being read. A process that exits
/// between enumeration and reading its files is left out of the result;
/// one that exits between its required and optional reads keeps its record
/// with the optional fields marked [`Detail::Unavailable`].
pub struct ProcessTableCollector<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
    page_size: u64,
    capacity_limit: Option<usize>,
}

impl<F: FileSystem> ProcessTableCollector<F> {
    /// Creates a new process table collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            page_size: page_size(),
            capacity_limit: None,
        }
    }

    /// Overrides the page size used to convert `statm` pages to kB.
    ///
    /// Needed when reading a `/proc` snapshot taken on another host.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fails scans that would return more than `limit` records.
    pub fn with_capacity_limit(mut self, limit: usize) -> Result<Self, CollectError> {
        if limit == 0 {
            return Err(CollectError::InvalidArgument(
                "capacity limit must be positive".to_string(),
            ));
        }
        self.capacity_limit = Some(limit);
        Ok(self)
    }

    /// Reads every process matching `policy`.
    ///
    /// With a pid filter only the requested `/proc/[pid]` directories are
    /// visited, in ascending pid order. Otherwise records follow the order
    /// in which the proc directory lists its entries.
    ///
    /// A process whose `stat` cannot be read or parsed is left out with a
    /// warning. Only an unreadable proc directory fails the scan.
    pub fn scan(&self, policy: &DetailPolicy) -> Result<Vec<ProcessRecord>, CollectError> {
        policy.validate()?;

        let pids = match &policy.filter {
            Some(ProcessFilter::Pids(pids)) => pids.iter().copied().collect(),
            _ => self.list_pids()?,
        };

        let mut records = Vec::new();
        for pid in pids {
            let record = match self.read_process(pid, policy) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(pid, error = %e, "skipping unreadable process");
                    continue;
                }
            };
            if let Some(limit) = self.capacity_limit
                && records.len() >= limit
            {
                return Err(CollectError::CapacityExceeded { limit });
            }
            records.push(record);
        }

        debug!(count = records.len(), "process table scanned");
        Ok(records)
    }

    /// Numeric entries of the proc directory.
    fn list_pids(&self) -> Result<Vec<u32>, CollectError> {
        let entries = self
            .fs
            .read_dir(&self.proc_path)
            .map_err(|e| CollectError::unavailable(&self.proc_path, e))?;

        Ok(entries
            .iter()
            .filter_map(|entry| entry.file_name()?.to_str()?.parse::<u32>().ok())
            .filter(|pid| *pid != 0)
            .collect())
    }

    /// Reads one process. `Ok(None)` means it exited or was filtered out.
    ///
    /// Errors are scoped to this pid; `scan` logs them and moves on.
    fn read_process(
        &self,
        pid: u32,
        policy: &DetailPolicy,
    ) -> Result<Option<ProcessRecord>, CollectError> {
        let proc_dir = self.proc_path.join(pid.to_string());

        let uid = match self.fs.owner_uid(&proc_dir) {
            Ok(uid) => uid,
            Err(e) if is_process_gone(&e) => {
                trace!(pid, "process exited before it could be read");
                return Ok(None);
            }
            Err(e) => return Err(CollectError::unavailable(&proc_dir, e)),
        };

        let stat_path = proc_dir.join("stat");
        let content = match self.fs.read_to_string(&stat_path) {
            Ok(content) => content,
            Err(e) if is_process_gone(&e) => {
                trace!(pid, "process exited before stat was read");
                return Ok(None);
            }
            Err(e) => return Err(CollectError::unavailable(&stat_path, e)),
        };
        let stat = parse_proc_stat(&content)
            .map_err(|e| CollectError::malformed(&stat_path, e.message))?;
        let state = ProcessState::from_char(stat.state);

        match &policy.filter {
            Some(ProcessFilter::Uids(uids)) if !uids.contains(&uid) => return Ok(None),
            Some(ProcessFilter::States(states)) if !states.contains(&state) => {
                return Ok(None);
            }
            _ => {}
        }

        let cmdline = if policy.cmdline {
            self.read_detail(&proc_dir.join("cmdline"), |c| Ok(parse_cmdline(c)))
        } else {
            Detail::NotRequested
        };
        let environ = if policy.environ {
            self.read_detail(&proc_dir.join("environ"), |c| Ok(parse_environ(c)))
        } else {
            Detail::NotRequested
        };
        let memory = if policy.memory {
            self.read_detail(&proc_dir.join("statm"), |c| {
                let statm = parse_statm(c)?;
                Ok(ProcessMemory {
                    size_kb: self.pages_to_kb(statm.size),
                    resident_kb: self.pages_to_kb(statm.resident),
                    shared_kb: self.pages_to_kb(statm.shared),
                    text_kb: self.pages_to_kb(statm.text),
                    lib_kb: self.pages_to_kb(statm.lib),
                    data_kb: self.pages_to_kb(statm.data),
                    dirty_kb: self.pages_to_kb(statm.dirty),
                })
            })
        } else {
            Detail::NotRequested
        };
        let status = if policy.status {
            self.read_detail(&proc_dir.join("status"), parse_proc_status)
        } else {
            Detail::NotRequested
        };

        Ok(Some(ProcessRecord {
            pid,
            ppid: stat.ppid,
            pgrp: stat.pgrp,
            session: stat.session,
            uid,
            comm: stat.comm,
            state,
            priority: stat.priority,
            nice: stat.nice,
            num_threads: stat.num_threads,
            tty_nr: stat.tty_nr,
            processor: stat.processor,
            minflt: stat.minflt,
            majflt: stat.majflt,
            utime: stat.utime,
            stime: stat.stime,
            cutime: stat.cutime,
            cstime: stat.cstime,
            start_time: stat.starttime,
            cmdline,
            environ,
            memory,
            status,
        }))
    }

    /// Reads and parses an optional per-process file.
    ///
    /// Any failure is local to this record: permission denied, the process
    /// exiting mid-read, or a file the parser does not understand.
    fn read_detail<T>(
        &self,
        path: &Path,
        parse: impl FnOnce(&str) -> Result<T, ParseError>,
    ) -> Detail<T> {
        let content = match self.fs.read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                trace!(path = %path.display(), error = %e, "optional read failed");
                return Detail::Unavailable;
            }
        };
        match parse(&content) {
            Ok(value) => Detail::Collected(value),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "optional source not understood");
                Detail::Unavailable
            }
        }
    }

    fn pages_to_kb(&self, pages: u64) -> u64 {
        pages.saturating_mul(self.page_size) / 1024
    }
}
