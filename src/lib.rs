//! procsnap - point-in-time Linux telemetry snapshots.
//!
//! Provides:
//! - `collector`: process table, memory, CPU/VM and disk collectors over `/proc`
//! - `model`: the immutable snapshot value types the collectors return
//! - `util`: process-wide platform constants and boundary conversions

pub mod collector;
pub mod model;
pub mod util;
