//! Process-wide platform constants.
//!
//! Ticks per second (`USER_HZ`) and the page size never change while the
//! process runs, so each is queried from the platform at most once and
//! cached for the process lifetime.

use std::sync::OnceLock;

use tracing::warn;

/// Fallback when `sysconf(_SC_CLK_TCK)` fails. Standard value for Linux.
const DEFAULT_CLK_TCK: u64 = 100;

/// Fallback when `sysconf(_SC_PAGESIZE)` fails.
const DEFAULT_PAGE_SIZE: u64 = 4096;

/// A constant resolved by `query` on first use and cached afterwards.
///
/// Concurrent first callers block on a single initializer; `query` runs at
/// most once per instance.
pub struct OnceConstant {
    value: OnceLock<u64>,
    query: fn() -> u64,
}

impl OnceConstant {
    pub const fn new(query: fn() -> u64) -> Self {
        Self {
            value: OnceLock::new(),
            query,
        }
    }

    pub fn get(&self) -> u64 {
        *self.value.get_or_init(self.query)
    }

    /// Returns the cached value without triggering the query.
    pub fn cached(&self) -> Option<u64> {
        self.value.get().copied()
    }
}

static CLOCK_TICKS: OnceConstant = OnceConstant::new(query_clock_ticks);
static PAGE_SIZE: OnceConstant = OnceConstant::new(query_page_size);

/// Kernel clock ticks per second, used to interpret jiffy counters.
pub fn ticks_per_second() -> u64 {
    CLOCK_TICKS.get()
}

/// Memory page size in bytes.
pub fn page_size() -> u64 {
    PAGE_SIZE.get()
}

fn query_clock_ticks() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads configuration.
    let result = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if result <= 0 {
        warn!(fallback = DEFAULT_CLK_TCK, "sysconf(_SC_CLK_TCK) failed");
        DEFAULT_CLK_TCK
    } else {
        result as u64
    }
}

fn query_page_size() -> u64 {
    // SAFETY: see query_clock_ticks.
    let result = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if result <= 0 {
        warn!(fallback = DEFAULT_PAGE_SIZE, "sysconf(_SC_PAGESIZE) failed");
        DEFAULT_PAGE_SIZE
    } else {
        result as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static QUERY_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting_query() -> u64 {
        QUERY_CALLS.fetch_add(1, Ordering::SeqCst);
        250
    }

    #[test]
    fn test_concurrent_first_use_queries_once() {
        let constant = OnceConstant::new(counting_query);
        let threads = 16;
        let barrier = Barrier::new(threads);

        let values: Vec<u64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        constant.get()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(values.iter().all(|&v| v == 250));
        assert_eq!(QUERY_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(constant.get(), 250);
        assert_eq!(QUERY_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_before_and_after_first_use() {
        fn fixed() -> u64 {
            64
        }
        let constant = OnceConstant::new(fixed);
        assert_eq!(constant.cached(), None);
        assert_eq!(constant.get(), 64);
        assert_eq!(constant.cached(), Some(64));
    }

    #[test]
    fn test_process_wide_values_are_stable() {
        let first = ticks_per_second();
        assert!(first > 0);
        assert_eq!(ticks_per_second(), first);
        assert!(page_size() >= 1024);
    }
}
