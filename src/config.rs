//! Runtime-tunable knobs. `page_size` is settable at runtime: tests
//! shrink it to exercise page-growth edge cases, then reset it so later
//! tests see the default again.

use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_PAGE_SIZE: usize = 4096;
pub const DEFAULT_POOL_PAGES: usize = 50;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Current page size in bytes.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::SeqCst)
}

/// Test-only mutator. Never call this outside of tests: pages already
/// cached or written under a different size become unreadable.
pub fn set_page_size(bytes: usize) {
    PAGE_SIZE.store(bytes, Ordering::SeqCst);
}

/// Test-only mutator. Restores the default page size.
pub fn reset_page_size() {
    PAGE_SIZE.store(DEFAULT_PAGE_SIZE, Ordering::SeqCst);
}
