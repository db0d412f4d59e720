//! Page-Protection Cache (§4.1): a bounded LRU of text pages currently left
//! writable+executable, so a batch touching many nearby patch points pays
//! one `mprotect` per page instead of one per patch point.

use crate::config::PPC_CAPACITY;
use crate::engine::error::CommitError;
use crate::platform;

/// Counters exposed so a caller (or a test) can observe cache behavior
/// without re-deriving it from `mprotect` call counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageCacheStats {
    pub(crate) unprotects: u32,
    pub(crate) reprotects: u32,
    pub(crate) evictions: u32,
}

/// A single batch's page-protection context. Holds at most [`PPC_CAPACITY`]
/// page addresses currently writable+executable, most-recently-used first.
pub(crate) struct PageCache {
    slots: [Option<usize>; PPC_CAPACITY],
    page_size: usize,
    stats: PageCacheStats,
    closed: bool,
}

impl PageCache {
    /// Opens a fresh context. The only fallible step is the (cached) host
    /// page-size query; the slot storage itself is a fixed-size array and
    /// needs no heap allocation (§5).
    pub(crate) fn open() -> Result<Self, CommitError> {
        let page_size = platform::page_size().ok_or(CommitError::ContextAlloc)?;
        Ok(Self {
            slots: [None; PPC_CAPACITY],
            page_size,
            stats: PageCacheStats::default(),
            closed: false,
        })
    }

    fn page_of(&self, addr: usize) -> usize {
        addr & !(self.page_size - 1)
    }

    /// Ensures `addr`'s containing page is writable+executable, promoting or
    /// inserting it at the most-recently-used slot.
    ///
    /// # Safety
    ///
    /// `addr` must point into a mapped, executable region of this process.
    pub(crate) unsafe fn unprotect(&mut self, addr: usize) {
        let page = self.page_of(addr);

        if let Some(pos) = self.slots.iter().position(|slot| *slot == Some(page)) {
            // Already unprotected. Promote to the front; a hit at position 0
            // is a no-op, handled naturally by rotating a one-element slice.
            self.slots[..=pos].rotate_right(1);
            return;
        }

        // Not yet unprotected. Evict the LRU victim (the last slot) first if
        // the cache is full.
        if let Some(victim) = self.slots[PPC_CAPACITY - 1] {
            platform::mprotect_rx(victim, self.page_size);
            self.stats.reprotects += 1;
            self.stats.evictions += 1;
        }

        platform::mprotect_rwx(page, self.page_size);
        self.stats.unprotects += 1;

        // Classic LRU insertion: shift every occupied slot down by one, then
        // write the new entry at the front. This fixes the off-by-one the
        // source has (§4.1, §9): its insertion loop leaves the last occupied
        // entry in place instead of shifting it out.
        self.slots.rotate_right(1);
        self.slots[0] = Some(page);
    }

    fn drain(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(page) = slot.take() {
                unsafe { platform::mprotect_rx(page, self.page_size) };
                self.stats.reprotects += 1;
            }
        }
    }

    /// Re-protects every held page with read+execute and consumes the
    /// context. Guaranteed to run on every driver return path (§4.4); see
    /// also the [`Drop`] impl for the panic-unwind case.
    pub(crate) fn close(mut self) -> PageCacheStats {
        self.drain();
        self.closed = true;
        self.stats
    }

    #[cfg(test)]
    pub(crate) fn stats(&self) -> PageCacheStats {
        self.stats
    }
}

impl Drop for PageCache {
    fn drop(&mut self) {
        // If `close()` already ran, every slot is `None` and this is a
        // no-op. If we are unwinding from a panic mid-batch, this is what
        // keeps the "re-protected by the time the call returns" guarantee
        // (§5) even on that path.
        if !self.closed {
            self.drain();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps `count` distinct anonymous pages, initially read+execute, and
    /// returns their base addresses. Kept mapped for the test's duration.
    fn map_pages(count: usize) -> Vec<usize> {
        let page_size = platform::page_size().unwrap();
        let mut pages = Vec::with_capacity(count);
        for _ in 0..count {
            let ptr = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    page_size,
                    libc::PROT_READ | libc::PROT_EXEC,
                    libc::MAP_ANONYMOUS | libc::MAP_PRIVATE,
                    -1,
                    0,
                )
            };
            assert_ne!(ptr, libc::MAP_FAILED, "mmap failed in test setup");
            pages.push(ptr as usize);
        }
        pages
    }

    #[test]
    fn promotes_existing_hit_without_shifting_others_out() {
        let pages = map_pages(3);
        let mut cache = PageCache::open().unwrap();
        unsafe {
            cache.unprotect(pages[0]);
            cache.unprotect(pages[1]);
            cache.unprotect(pages[2]);
            // Re-touch the oldest entry; it should move to the front without
            // evicting anything (only 3 of 10 slots are in use).
            cache.unprotect(pages[0]);
        }
        assert_eq!(cache.slots[0], Some(pages[0]));
        assert_eq!(cache.slots[1], Some(pages[2]));
        assert_eq!(cache.slots[2], Some(pages[1]));
        assert_eq!(cache.stats().evictions, 0);
        cache.close();
    }

    #[test]
    fn fifteen_pages_cause_five_evictions_and_fifteen_reprotects() {
        let pages = map_pages(15);
        let mut cache = PageCache::open().unwrap();
        for &page in &pages {
            unsafe { cache.unprotect(page) };
        }
        let mid_batch = cache.stats();
        assert_eq!(mid_batch.unprotects, 15);
        assert_eq!(mid_batch.evictions, 5);
        assert_eq!(mid_batch.reprotects, 5);

        let final_stats = cache.close();
        assert_eq!(final_stats.unprotects, 15);
        assert_eq!(final_stats.reprotects, 5 + PPC_CAPACITY as u32);
    }

    #[test]
    fn close_reprotects_every_remaining_slot() {
        let pages = map_pages(4);
        let mut cache = PageCache::open().unwrap();
        for &page in &pages {
            unsafe { cache.unprotect(page) };
        }
        let stats = cache.close();
        assert_eq!(stats.reprotects, 4);
    }
}
