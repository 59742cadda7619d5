//! Disk and partition I/O counters from `/proc/diskstats`.

use serde::{Deserialize, Serialize};

/// Whole-disk I/O counters.
///
/// Source: one full-format line of `/proc/diskstats`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct DiskStat {
    /// Device name (sda, nvme0n1, ...).
    pub name: String,
    pub major: u32,
    pub minor: u32,
    /// Reads completed. Source: column 4
    pub reads: u64,
    /// Source: column 5
    pub reads_merged: u64,
    /// Source: column 6
    pub read_sectors: u64,
    /// Source: column 7
    pub read_time_ms: u64,
    /// Writes completed. Source: column 8
    pub writes: u64,
    /// Source: column 9
    pub writes_merged: u64,
    /// Source: column 10
    pub write_sectors: u64,
    /// Source: column 11
    pub write_time_ms: u64,
    /// Source: column 12
    pub io_in_progress: u64,
    /// Source: column 13
    pub io_time_ms: u64,
    /// Source: column 14
    pub weighted_io_time_ms: u64,
    /// Number of partitions in the same snapshot whose parent is this disk.
    pub partitions: u32,
}

/// Parent of a partition, by name.
///
/// This is a lookup key into the same snapshot's disk list, not ownership.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParentDisk {
    Disk(String),
    /// No disk name in the snapshot is a prefix of the partition name.
    Unassociated,
}

impl ParentDisk {
    pub fn name(&self) -> Option<&str> {
        match self {
            ParentDisk::Disk(name) => Some(name),
            ParentDisk::Unassociated => None,
        }
    }
}

/// Partition I/O counters.
///
/// Legacy 2.6 kernels report only these four counters for partitions.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct PartitionStat {
    pub name: String,
    pub major: u32,
    pub minor: u32,
    pub parent: ParentDisk,
    pub reads: u64,
    pub read_sectors: u64,
    pub writes: u64,
    /// Sectors requested for write.
    pub write_sectors: u64,
}

/// Disks and partitions read from one pass over the source.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct DiskSnapshot {
    pub disks: Vec<DiskStat>,
    pub partitions: Vec<PartitionStat>,
}

impl DiskSnapshot {
    pub fn disk(&self, name: &str) -> Option<&DiskStat> {
        self.disks.iter().find(|d| d.name == name)
    }

    /// Partitions associated with the named disk, in source order.
    pub fn partitions_of<'a>(&'a self, disk: &'a str) -> impl Iterator<Item = &'a PartitionStat> {
        self.partitions
            .iter()
            .filter(move |p| p.parent.name() == Some(disk))
    }

    pub fn unassociated(&self) -> impl Iterator<Item = &PartitionStat> {
        self.partitions
            .iter()
            .filter(|p| p.parent == ParentDisk::Unassociated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(name: &str, parent: ParentDisk) -> PartitionStat {
        PartitionStat {
            name: name.to_string(),
            major: 8,
            minor: 1,
            parent,
            reads: 0,
            read_sectors: 0,
            writes: 0,
            write_sectors: 0,
        }
    }

    #[test]
    fn test_snapshot_lookups() {
        let snapshot = DiskSnapshot {
            disks: vec![DiskStat {
                name: "sda".to_string(),
                partitions: 2,
                ..Default::default()
            }],
            partitions: vec![
                partition("sda1", ParentDisk::Disk("sda".to_string())),
                partition("sda2", ParentDisk::Disk("sda".to_string())),
                partition("loop0p1", ParentDisk::Unassociated),
            ],
        };

        assert_eq!(snapshot.disk("sda").map(|d| d.partitions), Some(2));
        assert!(snapshot.disk("sdb").is_none());
        assert_eq!(snapshot.partitions_of("sda").count(), 2);
        let orphans: Vec<_> = snapshot.unassociated().map(|p| p.name.as_str()).collect();
        assert_eq!(orphans, vec!["loop0p1"]);
    }
}
