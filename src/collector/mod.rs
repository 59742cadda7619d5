//! Snapshot collectors for the Linux `/proc` and `/sys` filesystems.
//!
//! Each collector reads one family of kernel sources, parses it with the
//! pure functions in [`procfs::parser`] and returns a plain value type from
//! [`crate::model`]. Collectors hold no mutable state and can be shared
//! across threads.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Caller                                │
//! │  ┌───────────────────┐ ┌──────────────┐ ┌──────────┐ ┌─────────┐ │
//! │  │ ProcessTable      │ │ MemoryStats  │ │ CpuVm    │ │ Disk    │ │
//! │  │ - /proc/[pid]/*   │ │ - meminfo    │ │ - stat   │ │ - disk- │ │
//! │  │                   │ │              │ │ - vmstat │ │   stats │ │
//! │  │                   │ │              │ │          │ │ - /sys/ │ │
//! │  │                   │ │              │ │          │ │   block │ │
//! │  └─────────┬─────────┘ └──────┬───────┘ └────┬─────┘ └────┬────┘ │
//! │            └──────────────────┴──────┬───────┴────────────┘      │
//! │                               ┌──────▼──────┐                    │
//! │                               │  FileSystem │ (trait)            │
//! │                               └──────┬──────┘                    │
//! └──────────────────────────────────────┼───────────────────────────┘
//!                                        │
//!                        ┌───────────────┼───────────────┐
//!                 ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!                 │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!                 │ (Linux)     │ │ (Testing)   │ │ (Fixtures)  │
//!                 └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use procsnap::collector::{MemoryStatsCollector, RealFs};
//!
//! let collector = MemoryStatsCollector::new(RealFs::new(), "/proc");
//! let mem = collector.collect(10).unwrap();
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use procsnap::collector::{MockFs, ProcessTableCollector};
//! use procsnap::model::DetailPolicy;
//!
//! let fs = MockFs::typical_system();
//! let collector = ProcessTableCollector::new(fs, "/proc");
//! let processes = collector.scan(&DetailPolicy::basic()).unwrap();
//! assert!(!processes.is_empty());
//! ```

mod error;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use error::CollectError;
pub(crate) use error::is_process_gone;
pub use mock::MockFs;
pub use procfs::{
    CpuVmStatsCollector, DiskStatsCollector, MemoryStatsCollector, ProcessTableCollector,
};
pub use traits::{FileSystem, RealFs};
