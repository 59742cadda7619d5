//! Utility modules for procsnap.

pub mod clock;
pub mod narrow;

pub use clock::{page_size, ticks_per_second};
pub use narrow::narrow_u32;
