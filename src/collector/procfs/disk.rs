//! Disk and partition collector for `/proc/diskstats`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tracing::debug;

use crate::collector::CollectError;
use crate::collector::procfs::parser::{DiskStatsLine, parse_diskstats};
use crate::collector::traits::FileSystem;
use crate::model::{DiskSnapshot, DiskStat, ParentDisk, PartitionStat};

/// Collects per-disk and per-partition I/O counters.
///
/// Whole disks are told apart from partitions by `/sys/block`, which lists
/// only whole disks. When sysfs is unreadable, or lists none of the devices
/// in `/proc/diskstats`, a name-prefix heuristic is used instead.
pub struct DiskStatsCollector<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
    sys_path: PathBuf,
}

impl<F: FileSystem> DiskStatsCollector<F> {
    /// Creates a new disk collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `sys_path` - Base path to sysfs (usually "/sys")
    pub fn new(fs: F, proc_path: impl Into<PathBuf>, sys_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            sys_path: sys_path.into(),
        }
    }

    pub fn collect(&self) -> Result<DiskSnapshot, CollectError> {
        let path = self.proc_path.join("diskstats");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CollectError::unavailable(&path, e))?;
        let lines =
            parse_diskstats(&content).map_err(|e| CollectError::malformed(&path, e.message))?;

        // A /sys/block from another namespace or host may share no name with
        // this diskstats; classify by name then.
        let block_devices = self.list_block_devices().filter(|devices| {
            let matches = lines.iter().any(|l| devices.contains(l.device.as_str()));
            if !matches {
                debug!("/sys/block lists none of the diskstats devices, classifying disks by name");
            }
            matches
        });
        let all_names: Vec<&str> = lines.iter().map(|l| l.device.as_str()).collect();

        let (disk_lines, partition_lines): (Vec<&DiskStatsLine>, Vec<&DiskStatsLine>) =
            lines.iter().partition(|line| {
                if line.legacy_partition {
                    return false;
                }
                match &block_devices {
                    Some(devices) => devices.contains(line.device.as_str()),
                    None => !looks_like_partition(&line.device, &all_names),
                }
            });

        let disk_names: Vec<&str> = disk_lines.iter().map(|l| l.device.as_str()).collect();
        let mut counts: HashMap<&str, u32> = HashMap::new();

        let partitions: Vec<PartitionStat> = partition_lines
            .iter()
            .map(|line| {
                let parent = match parent_disk(&line.device, &disk_names) {
                    Some(disk) => {
                        let count = counts.entry(disk).or_default();
                        *count = count.saturating_add(1);
                        ParentDisk::Disk(disk.to_string())
                    }
                    None => {
                        debug!(partition = %line.device, "no parent disk found");
                        ParentDisk::Unassociated
                    }
                };
                PartitionStat {
                    name: line.device.clone(),
                    major: line.major,
                    minor: line.minor,
                    parent,
                    reads: line.reads,
                    read_sectors: line.read_sectors,
                    writes: line.writes,
                    write_sectors: line.write_sectors,
                }
            })
            .collect();

        let disks = disk_lines
            .iter()
            .map(|line| DiskStat {
                name: line.device.clone(),
                major: line.major,
                minor: line.minor,
                reads: line.reads,
                reads_merged: line.r_merged,
                read_sectors: line.read_sectors,
                read_time_ms: line.read_time,
                writes: line.writes,
                writes_merged: line.w_merged,
                write_sectors: line.write_sectors,
                write_time_ms: line.write_time,
                io_in_progress: line.io_in_progress,
                io_time_ms: line.io_time,
                weighted_io_time_ms: line.io_weighted_time,
                partitions: counts.get(line.device.as_str()).copied().unwrap_or(0),
            })
            .collect();

        Ok(DiskSnapshot { disks, partitions })
    }

    /// Names under `<sys>/block`, or `None` when sysfs is not listable.
    fn list_block_devices(&self) -> Option<HashSet<String>> {
        let block = self.sys_path.join("block");
        match self.fs.read_dir(&block) {
            Ok(entries) => Some(
                entries
                    .iter()
                    .filter_map(|entry| Some(entry.file_name()?.to_str()?.to_string()))
                    .collect(),
            ),
            Err(e) => {
                debug!(path = %block.display(), error = %e, "sysfs unavailable, classifying disks by name");
                None
            }
        }
    }
}

/// True when another device name is a proper prefix of `name` and the rest
/// is a partition suffix (`1`, `p1`).
///
/// This is a heuristic: it misreads whole disks whose names extend another
/// disk's name with a digit.
fn looks_like_partition(name: &str, all_names: &[&str]) -> bool {
    all_names.iter().any(|other| {
        let Some(rest) = name.strip_prefix(other) else {
            return false;
        };
        let rest = rest.strip_prefix('p').unwrap_or(rest);
        rest.starts_with(|c: char| c.is_ascii_digit())
    })
}

/// Longest disk name that is a proper prefix of the partition name.
fn parent_disk<'a>(partition: &str, disk_names: &[&'a str]) -> Option<&'a str> {
    disk_names
        .iter()
        .filter(|disk| disk.len() < partition.len() && partition.starts_with(**disk))
        .max_by_key(|disk| disk.len())
        .copied()
}
