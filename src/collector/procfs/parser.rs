//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

use std::collections::{BTreeMap, HashMap};

use crate::model::StatusDetails;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

// ============ Per-process parsers ============

/// Parsed data from `/proc/[pid]/stat`.
#[derive(Debug, Clone, Default)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub ppid: u32,
    pub pgrp: u32,
    pub session: u32,
    pub tty_nr: u32,
    pub minflt: u64,
    pub majflt: u64,
    pub utime: u64,
    pub stime: u64,
    pub cutime: u64,
    pub cstime: u64,
    pub priority: i64,
    pub nice: i64,
    pub num_threads: u32,
    pub starttime: u64,
    pub processor: u32,
}

/// Fields up to and including `starttime`; everything after is optional
/// across kernel versions.
const STAT_REQUIRED_FIELDS: usize = 20;

/// Parses `/proc/[pid]/stat` content.
///
/// The format is tricky because the comm field can contain spaces and parentheses.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;

    let comm = content[open_paren + 1..close_paren].to_string();

    // Field indices below are relative to the first field after ')', the state.
    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();

    if fields.len() < STAT_REQUIRED_FIELDS {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected {}+, got {}",
            STAT_REQUIRED_FIELDS,
            fields.len()
        )));
    }

    fn field<T: std::str::FromStr>(fields: &[&str], idx: usize, name: &str) -> Result<T, ParseError> {
        fields
            .get(idx)
            .ok_or_else(|| ParseError::new(format!("missing field {}", name)))?
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    }

    let state = fields[0]
        .chars()
        .next()
        .ok_or_else(|| ParseError::new("empty state"))?;

    Ok(ProcStat {
        pid,
        comm,
        state,
        ppid: field(&fields, 1, "ppid")?,
        pgrp: field(&fields, 2, "pgrp")?,
        session: field(&fields, 3, "session")?,
        tty_nr: field(&fields, 4, "tty_nr")?,
        minflt: field(&fields, 7, "minflt")?,
        majflt: field(&fields, 9, "majflt")?,
        utime: field(&fields, 11, "utime")?,
        stime: field(&fields, 12, "stime")?,
        cutime: field(&fields, 13, "cutime")?,
        cstime: field(&fields, 14, "cstime")?,
        priority: field(&fields, 15, "priority")?,
        nice: field(&fields, 16, "nice")?,
        num_threads: field(&fields, 17, "num_threads")?,
        starttime: field(&fields, 19, "starttime")?,
        processor: fields.get(36).and_then(|s| s.parse().ok()).unwrap_or(0),
    })
}

/// Parses `/proc/[pid]/status` content.
///
/// Format is key:\tvalue pairs, one per line. `Uid`/`Gid` lines are
/// required; memory and context-switch lines are kept as `None` when the
/// kernel omits them (kernel threads, zombies, old kernels).
pub fn parse_proc_status(content: &str) -> Result<StatusDetails, ParseError> {
    let mut fields: HashMap<&str, &str> = HashMap::new();

    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim(), value.trim());
        }
    }

    // Uid and Gid have format: real effective saved fs
    let id_quad = |key: &str| -> Result<[u32; 4], ParseError> {
        let line = fields
            .get(key)
            .ok_or_else(|| ParseError::new(format!("missing {} line in status", key)))?;
        let ids: Vec<u32> = line
            .split_whitespace()
            .map(|s| s.parse())
            .collect::<Result<_, _>>()
            .map_err(|_| ParseError::new(format!("invalid {} line in status", key)))?;
        if ids.len() < 4 {
            return Err(ParseError::new(format!("short {} line in status", key)));
        }
        Ok([ids[0], ids[1], ids[2], ids[3]])
    };

    let uids = id_quad("Uid")?;
    let gids = id_quad("Gid")?;

    // Memory fields are in kB format: "12345 kB"
    let parse_num = |key: &str| -> Option<u64> {
        fields
            .get(key)
            .and_then(|s| s.split_whitespace().next())
            .and_then(|s| s.parse().ok())
    };

    Ok(StatusDetails {
        real_uid: uids[0],
        effective_uid: uids[1],
        saved_uid: uids[2],
        fs_uid: uids[3],
        real_gid: gids[0],
        effective_gid: gids[1],
        saved_gid: gids[2],
        fs_gid: gids[3],
        vm_peak_kb: parse_num("VmPeak"),
        vm_size_kb: parse_num("VmSize"),
        vm_lck_kb: parse_num("VmLck"),
        vm_rss_kb: parse_num("VmRSS"),
        vm_data_kb: parse_num("VmData"),
        vm_stk_kb: parse_num("VmStk"),
        vm_exe_kb: parse_num("VmExe"),
        vm_lib_kb: parse_num("VmLib"),
        vm_swap_kb: parse_num("VmSwap"),
        voluntary_ctxt_switches: parse_num("voluntary_ctxt_switches"),
        nonvoluntary_ctxt_switches: parse_num("nonvoluntary_ctxt_switches"),
    })
}

/// Parsed data from `/proc/[pid]/statm`, in pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStatm {
    pub size: u64,
    pub resident: u64,
    pub shared: u64,
    pub text: u64,
    pub lib: u64,
    pub data: u64,
    pub dirty: u64,
}

/// Parses `/proc/[pid]/statm` content.
///
/// Format: size resident shared text lib data dt (all in pages)
pub fn parse_statm(content: &str) -> Result<ProcStatm, ParseError> {
    let values: Vec<u64> = content
        .split_whitespace()
        .map(|s| s.parse())
        .collect::<Result<_, _>>()
        .map_err(|_| ParseError::new("invalid statm value"))?;

    if values.len() < 7 {
        return Err(ParseError::new(format!(
            "not enough fields in statm: expected 7, got {}",
            values.len()
        )));
    }

    Ok(ProcStatm {
        size: values[0],
        resident: values[1],
        shared: values[2],
        text: values[3],
        lib: values[4],
        data: values[5],
        dirty: values[6],
    })
}

/// Parses `/proc/[pid]/cmdline` content.
///
/// Arguments are NUL-separated. Kernel threads have an empty cmdline,
/// which yields an empty vector.
pub fn parse_cmdline(content: &str) -> Vec<String> {
    content
        .split('\0')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `/proc/[pid]/environ` content.
///
/// Entries are NUL-separated `KEY=value` pairs. Entries without `=` or
/// with an empty key are skipped; a repeated key keeps its last value.
pub fn parse_environ(content: &str) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    for entry in content.split('\0') {
        let Some((key, value)) = entry.split_once('=') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        env.insert(key.to_string(), value.to_string());
    }
    env
}

// ============ System-wide parsers ============

/// Parses `/proc/meminfo` content into a key -> value map.
///
/// Values are as printed by the kernel (kB for sizes, counts for the few
/// unitless keys). Which keys exist depends on kernel version.
pub fn parse_meminfo(content: &str) -> Result<HashMap<String, u64>, ParseError> {
    let mut info = HashMap::new();

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .ok_or_else(|| ParseError::new(format!("missing value for {}", key.trim())))?;
        let value: u64 = value
            .parse()
            .map_err(|_| ParseError::new(format!("invalid value for {}", key.trim())))?;
        info.insert(key.trim().to_string(), value);
    }

    Ok(info)
}

/// Aggregate CPU line from `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuLine {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

/// Global stats from `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalStat {
    /// The aggregate `cpu` line; per-CPU lines are ignored.
    pub cpu: Option<CpuLine>,
    /// First value of the `intr` line.
    pub intr: Option<u64>,
    pub ctxt: Option<u64>,
    pub btime: Option<u64>,
    pub processes: Option<u64>,
    pub procs_running: Option<u64>,
    pub procs_blocked: Option<u64>,
    /// `page in out` line (2.4 kernels).
    pub page: Option<(u64, u64)>,
    /// `swap in out` line (2.4 kernels).
    pub swap: Option<(u64, u64)>,
}

/// Parses `/proc/stat` content.
///
/// Lines may appear in any order; unknown lines are ignored.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();

    let number = |parts: &[&str], idx: usize| -> Result<u64, ParseError> {
        parts
            .get(idx)
            .ok_or_else(|| ParseError::new(format!("missing value on {} line", parts[0])))?
            .parse()
            .map_err(|_| ParseError::new(format!("invalid value on {} line", parts[0])))
    };

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "cpu" => {
                let values: Vec<u64> = parts[1..]
                    .iter()
                    .map(|s| s.parse())
                    .collect::<Result<_, _>>()
                    .map_err(|_| ParseError::new("invalid value on cpu line"))?;
                if values.len() < 4 {
                    return Err(ParseError::new(format!(
                        "not enough columns on cpu line: expected 4+, got {}",
                        values.len()
                    )));
                }
                let get_val = |idx: usize| -> u64 { values.get(idx).copied().unwrap_or(0) };
                stat.cpu = Some(CpuLine {
                    user: get_val(0),
                    nice: get_val(1),
                    system: get_val(2),
                    idle: get_val(3),
                    iowait: get_val(4),
                    irq: get_val(5),
                    softirq: get_val(6),
                    steal: get_val(7),
                });
            }
            "intr" => stat.intr = Some(number(&parts[..], 1)?),
            "ctxt" => stat.ctxt = Some(number(&parts[..], 1)?),
            "btime" => stat.btime = Some(number(&parts[..], 1)?),
            "processes" => stat.processes = Some(number(&parts[..], 1)?),
            "procs_running" => stat.procs_running = Some(number(&parts[..], 1)?),
            "procs_blocked" => stat.procs_blocked = Some(number(&parts[..], 1)?),
            "page" => stat.page = Some((number(&parts[..], 1)?, number(&parts[..], 2)?)),
            "swap" => stat.swap = Some((number(&parts[..], 1)?, number(&parts[..], 2)?)),
            _ => {}
        }
    }

    Ok(stat)
}

/// Paging and swapping counters from `/proc/vmstat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VmstatPaging {
    pub pgpgin: Option<u64>,
    pub pgpgout: Option<u64>,
    pub pswpin: Option<u64>,
    pub pswpout: Option<u64>,
}

/// Parses `/proc/vmstat` content.
///
/// Format: key value (one per line)
pub fn parse_vmstat(content: &str) -> Result<VmstatPaging, ParseError> {
    let mut info = VmstatPaging::default();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        let slot = match parts[0] {
            "pgpgin" => &mut info.pgpgin,
            "pgpgout" => &mut info.pgpgout,
            "pswpin" => &mut info.pswpin,
            "pswpout" => &mut info.pswpout,
            _ => continue,
        };
        let value = parts[1]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid value for {}", parts[0])))?;
        *slot = Some(value);
    }

    Ok(info)
}

// ============ Disk Stats Parser ============

/// Parsed line from `/proc/diskstats`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskStatsLine {
    pub major: u32,
    pub minor: u32,
    pub device: String,
    /// Legacy 2.6 partition line carrying only four counters.
    pub legacy_partition: bool,
    pub reads: u64,
    pub r_merged: u64,
    pub read_sectors: u64,
    pub read_time: u64,
    pub writes: u64,
    pub w_merged: u64,
    pub write_sectors: u64,
    pub write_time: u64,
    pub io_in_progress: u64,
    pub io_time: u64,
    pub io_weighted_time: u64,
}

/// Parses `/proc/diskstats` content.
///
/// Format: major minor name reads r_merged r_sectors r_time writes w_merged w_sectors w_time io_pending io_time w_io_time [discards ...]
///
/// Legacy partition format: major minor name reads r_sectors writes w_sectors
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskStatsLine>, ParseError> {
    let mut disks = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() != 7 && parts.len() < 14 {
            return Err(ParseError::new(format!(
                "line {}: unexpected column count {}",
                lineno + 1,
                parts.len()
            )));
        }

        let get_val = |idx: usize| -> Result<u64, ParseError> {
            parts[idx].parse().map_err(|_| {
                ParseError::new(format!("line {}: invalid column {}", lineno + 1, idx + 1))
            })
        };
        let device_number = |idx: usize| -> Result<u32, ParseError> {
            parts[idx].parse().map_err(|_| {
                ParseError::new(format!("line {}: invalid device number", lineno + 1))
            })
        };
        let major = device_number(0)?;
        let minor = device_number(1)?;
        let device = parts[2].to_string();

        if parts.len() == 7 {
            disks.push(DiskStatsLine {
                major,
                minor,
                device,
                legacy_partition: true,
                reads: get_val(3)?,
                read_sectors: get_val(4)?,
                writes: get_val(5)?,
                write_sectors: get_val(6)?,
                ..Default::default()
            });
            continue;
        }

        disks.push(DiskStatsLine {
            major,
            minor,
            device,
            legacy_partition: false,
            reads: get_val(3)?,
            r_merged: get_val(4)?,
            read_sectors: get_val(5)?,
            read_time: get_val(6)?,
            writes: get_val(7)?,
            w_merged: get_val(8)?,
            write_sectors: get_val(9)?,
            write_time: get_val(10)?,
            io_in_progress: get_val(11)?,
            io_time: get_val(12)?,
            io_weighted_time: get_val(13)?,
        });
    }

    Ok(disks)
}
