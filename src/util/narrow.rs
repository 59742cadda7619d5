//! Explicit lossy-boundary conversions.
//!
//! Collectors keep every counter as `u64`. Transports that can only carry
//! 32-bit values go through here, where overflow is an error instead of a
//! silent wrap.

use crate::collector::CollectError;

/// Narrows a counter to `u32`, failing with `CapacityExceeded` when it does
/// not fit.
pub fn narrow_u32(value: u64) -> Result<u32, CollectError> {
    u32::try_from(value).map_err(|_| CollectError::CapacityExceeded {
        limit: u32::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_u32_in_range() {
        assert_eq!(narrow_u32(0).unwrap(), 0);
        assert_eq!(narrow_u32(u64::from(u32::MAX)).unwrap(), u32::MAX);
    }

    #[test]
    fn test_narrow_u32_overflow() {
        let err = narrow_u32(u64::from(u32::MAX) + 1).unwrap_err();
        assert!(matches!(err, CollectError::CapacityExceeded { limit } if limit == u32::MAX as usize));
    }
}
