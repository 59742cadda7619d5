//! Per-process records and the policy that controls how much is collected.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collector::CollectError;

/// Scheduler state letter from `/proc/[pid]/stat` field 3.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessState {
    /// `R`
    Running,
    /// `S`
    Sleeping,
    /// `D`, uninterruptible disk sleep.
    DiskSleep,
    /// `Z`
    Zombie,
    /// `T`
    Stopped,
    /// `t`
    TracingStop,
    /// `X` or `x`
    Dead,
    /// `K`
    Wakekill,
    /// `W`
    Waking,
    /// `P`
    Parked,
    /// `I`
    Idle,
    /// Any letter a newer kernel may introduce.
    Other(char),
}

impl ProcessState {
    pub fn from_char(c: char) -> Self {
        match c {
            'R' => ProcessState::Running,
            'S' => ProcessState::Sleeping,
            'D' => ProcessState::DiskSleep,
            'Z' => ProcessState::Zombie,
            'T' => ProcessState::Stopped,
            't' => ProcessState::TracingStop,
            'X' | 'x' => ProcessState::Dead,
            'K' => ProcessState::Wakekill,
            'W' => ProcessState::Waking,
            'P' => ProcessState::Parked,
            'I' => ProcessState::Idle,
            other => ProcessState::Other(other),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            ProcessState::Running => 'R',
            ProcessState::Sleeping => 'S',
            ProcessState::DiskSleep => 'D',
            ProcessState::Zombie => 'Z',
            ProcessState::Stopped => 'T',
            ProcessState::TracingStop => 't',
            ProcessState::Dead => 'X',
            ProcessState::Wakekill => 'K',
            ProcessState::Waking => 'W',
            ProcessState::Parked => 'P',
            ProcessState::Idle => 'I',
            ProcessState::Other(c) => *c,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A field whose collection is gated by [`DetailPolicy`].
///
/// `NotRequested` and `Unavailable` are distinct from an empty or zero
/// value: a kernel thread has `Collected(vec![])` as its command line.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(tag = "detail", content = "value", rename_all = "snake_case")]
pub enum Detail<T> {
    /// The policy did not ask for this field.
    #[default]
    NotRequested,
    /// Requested, but the source could not be read for this process
    /// (permission denied, or the process exited mid-read).
    Unavailable,
    /// Requested and read.
    Collected(T),
}

impl<T> Detail<T> {
    pub fn is_collected(&self) -> bool {
        matches!(self, Detail::Collected(_))
    }

    pub fn is_not_requested(&self) -> bool {
        matches!(self, Detail::NotRequested)
    }

    /// Returns the collected value, if any.
    pub fn as_collected(&self) -> Option<&T> {
        match self {
            Detail::Collected(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_collected(self) -> Option<T> {
        match self {
            Detail::Collected(value) => Some(value),
            _ => None,
        }
    }
}

/// Memory-map summary from `/proc/[pid]/statm`, converted from pages to kB.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct ProcessMemory {
    /// Total program size (kB). Source: statm field 1
    pub size_kb: u64,
    /// Resident set size (kB). Source: statm field 2
    pub resident_kb: u64,
    /// Resident shared pages, file-backed plus shmem (kB). Source: statm field 3
    pub shared_kb: u64,
    /// Text (code) size (kB). Source: statm field 4
    pub text_kb: u64,
    /// Library size (kB), always 0 since Linux 2.6. Source: statm field 5
    pub lib_kb: u64,
    /// Data plus stack (kB). Source: statm field 6
    pub data_kb: u64,
    /// Dirty pages (kB), always 0 since Linux 2.6. Source: statm field 7
    pub dirty_kb: u64,
}

/// Details from `/proc/[pid]/status`.
///
/// `Vm*` lines are absent for kernel threads and zombies, hence `Option`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct StatusDetails {
    pub real_uid: u32,
    pub effective_uid: u32,
    pub saved_uid: u32,
    pub fs_uid: u32,
    pub real_gid: u32,
    pub effective_gid: u32,
    pub saved_gid: u32,
    pub fs_gid: u32,
    pub vm_peak_kb: Option<u64>,
    pub vm_size_kb: Option<u64>,
    pub vm_lck_kb: Option<u64>,
    pub vm_rss_kb: Option<u64>,
    pub vm_data_kb: Option<u64>,
    pub vm_stk_kb: Option<u64>,
    pub vm_exe_kb: Option<u64>,
    pub vm_lib_kb: Option<u64>,
    pub vm_swap_kb: Option<u64>,
    pub voluntary_ctxt_switches: Option<u64>,
    pub nonvoluntary_ctxt_switches: Option<u64>,
}

/// One process observed at scan time.
///
/// Time counters are in clock ticks; see [`crate::util::clock::ticks_per_second`].
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    pub pgrp: u32,
    pub session: u32,
    /// Owner of `/proc/[pid]`, i.e. the effective uid.
    pub uid: u32,

    /// Executable name, truncated by the kernel to 15 bytes.
    pub comm: String,
    pub state: ProcessState,
    pub priority: i64,
    pub nice: i64,
    pub num_threads: u32,
    /// Controlling terminal device number, 0 if none.
    pub tty_nr: u32,
    /// CPU the process last ran on.
    pub processor: u32,
    pub minflt: u64,
    pub majflt: u64,
    pub utime: u64,
    pub stime: u64,
    pub cutime: u64,
    pub cstime: u64,
    /// Start time in ticks after boot.
    pub start_time: u64,

    pub cmdline: Detail<Vec<String>>,
    pub environ: Detail<BTreeMap<String, String>>,
    pub memory: Detail<ProcessMemory>,
    pub status: Detail<StatusDetails>,
}

impl ProcessRecord {
    /// User plus system CPU time.
    pub fn cpu_time(&self, ticks_per_second: u64) -> Duration {
        ticks_to_duration(self.utime.saturating_add(self.stime), ticks_per_second)
    }

    /// Time between boot and process start.
    pub fn start_offset(&self, ticks_per_second: u64) -> Duration {
        ticks_to_duration(self.start_time, ticks_per_second)
    }
}

fn ticks_to_duration(ticks: u64, ticks_per_second: u64) -> Duration {
    if ticks_per_second == 0 {
        return Duration::ZERO;
    }
    let secs = ticks / ticks_per_second;
    let rem = ticks % ticks_per_second;
    let nanos = rem * 1_000_000_000 / ticks_per_second;
    Duration::new(secs, nanos as u32)
}

/// Which processes a scan keeps.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum ProcessFilter {
    /// Only these process ids. Directory enumeration is skipped entirely.
    Pids(BTreeSet<u32>),
    /// Only processes owned by these (effective) uids.
    Uids(BTreeSet<u32>),
    /// Only processes in one of these states.
    States(BTreeSet<ProcessState>),
}

impl ProcessFilter {
    fn is_empty(&self) -> bool {
        match self {
            ProcessFilter::Pids(set) => set.is_empty(),
            ProcessFilter::Uids(set) => set.is_empty(),
            ProcessFilter::States(set) => set.is_empty(),
        }
    }
}

/// Optional fields to populate plus an optional filter.
///
/// The default policy collects only the base fields of every process.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct DetailPolicy {
    pub cmdline: bool,
    pub environ: bool,
    pub memory: bool,
    pub status: bool,
    pub filter: Option<ProcessFilter>,
}

impl DetailPolicy {
    /// Base fields only, all processes.
    pub fn basic() -> Self {
        Self::default()
    }

    /// Every optional field, all processes.
    pub fn full() -> Self {
        Self {
            cmdline: true,
            environ: true,
            memory: true,
            status: true,
            filter: None,
        }
    }

    pub fn with_cmdline(mut self) -> Self {
        self.cmdline = true;
        self
    }

    pub fn with_environ(mut self) -> Self {
        self.environ = true;
        self
    }

    pub fn with_memory(mut self) -> Self {
        self.memory = true;
        self
    }

    pub fn with_status(mut self) -> Self {
        self.status = true;
        self
    }

    pub fn with_filter(mut self, filter: ProcessFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Rejects filters that can never match anything.
    pub fn validate(&self) -> Result<(), CollectError> {
        let Some(filter) = &self.filter else {
            return Ok(());
        };
        if filter.is_empty() {
            return Err(CollectError::InvalidArgument(
                "process filter set is empty".to_string(),
            ));
        }
        if let ProcessFilter::Pids(pids) = filter
            && pids.contains(&0)
        {
            return Err(CollectError::InvalidArgument(
                "pid 0 is not a valid process id".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip_known_letters() {
        for c in ['R', 'S', 'D', 'Z', 'T', 't', 'X', 'K', 'W', 'P', 'I'] {
            assert_eq!(ProcessState::from_char(c).as_char(), c);
        }
        assert_eq!(ProcessState::from_char('x'), ProcessState::Dead);
        assert_eq!(ProcessState::from_char('?'), ProcessState::Other('?'));
    }

    #[test]
    fn test_detail_accessors() {
        let collected: Detail<Vec<String>> = Detail::Collected(vec![]);
        assert!(collected.is_collected());
        assert_eq!(collected.as_collected(), Some(&vec![]));

        let missing: Detail<Vec<String>> = Detail::default();
        assert!(missing.is_not_requested());
        assert_eq!(missing.into_collected(), None);
    }

    #[test]
    fn test_policy_validate_rejects_empty_filter() {
        let policy = DetailPolicy::basic().with_filter(ProcessFilter::Uids(BTreeSet::new()));
        assert!(matches!(
            policy.validate(),
            Err(CollectError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_policy_validate_rejects_pid_zero() {
        let policy =
            DetailPolicy::basic().with_filter(ProcessFilter::Pids(BTreeSet::from([0, 1])));
        assert!(matches!(
            policy.validate(),
            Err(CollectError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_policy_builders() {
        let policy = DetailPolicy::basic().with_cmdline().with_status();
        assert!(policy.cmdline && policy.status);
        assert!(!policy.environ && !policy.memory);
        assert!(policy.validate().is_ok());
        assert_eq!(DetailPolicy::full().filter, None);
    }

    #[test]
    fn test_cpu_time_conversion() {
        let record = ProcessRecord {
            pid: 1,
            ppid: 0,
            pgrp: 1,
            session: 1,
            uid: 0,
            comm: "init".to_string(),
            state: ProcessState::Sleeping,
            priority: 20,
            nice: 0,
            num_threads: 1,
            tty_nr: 0,
            processor: 0,
            minflt: 0,
            majflt: 0,
            utime: 250,
            stime: 25,
            cutime: 0,
            cstime: 0,
            start_time: 150,
            cmdline: Detail::NotRequested,
            environ: Detail::NotRequested,
            memory: Detail::NotRequested,
            status: Detail::NotRequested,
        };
        assert_eq!(record.cpu_time(100), Duration::from_millis(2750));
        assert_eq!(record.start_offset(100), Duration::from_millis(1500));
        assert_eq!(record.cpu_time(0), Duration::ZERO);
    }
}
