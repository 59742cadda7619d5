//! Snapshot value types returned by the collectors.
//!
//! Every type here is constructed fresh per collector call and never
//! mutated afterwards. They carry no references into the collector, so a
//! binding layer may move them across threads or serialize them freely.

mod cpuvm;
mod disk;
mod memory;
mod process;

pub use cpuvm::{CpuTimes, CpuVmStats};
pub use disk::{DiskSnapshot, DiskStat, ParentDisk, PartitionStat};
pub use memory::MemoryStats;
pub use process::{
    Detail, DetailPolicy, ProcessFilter, ProcessMemory, ProcessRecord, ProcessState,
    StatusDetails,
};
