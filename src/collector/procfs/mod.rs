//! Collectors for the Linux `/proc` filesystem.
//!
//! This module provides parsers and collectors for reading system and process
//! information from the `/proc` virtual filesystem.

pub mod cpuvm;
pub mod disk;
pub mod memory;
pub mod parser;
pub mod process;

pub use cpuvm::CpuVmStatsCollector;
pub use disk::DiskStatsCollector;
pub use memory::MemoryStatsCollector;
pub use process::ProcessTableCollector;
