//! Fixed-capacity shared page cache: a bounded `PageId -> Page` map
//! enforcing NO-STEAL eviction and force-before-write durability.
//! Dirty pages are never evicted, and a page reaches disk only after
//! its (before, after) image pair has been logged and the log forced.

use crate::catalog::Catalog;
use crate::config;
use crate::error::{DbError, DbResult};
use crate::heap_file::HeapFile;
use crate::log::LogSink;
use crate::lock_manager::LockManager;
use crate::page::HeapPage;
use crate::page_id::{PageId, TableId};
use crate::permissions::Permissions;
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

struct CacheEntry {
    page: Arc<Mutex<HeapPage>>,
    dirty_by: Option<TransactionId>,
    /// The page's on-disk image as of the last time it was clean.
    /// `flush_page` logs (clean_snapshot, current) as the WAL's
    /// (before, after) pair.
    clean_snapshot: Option<HeapPage>,
    /// Set only by `install_dirty_page`: this page's slot was written
    /// to disk immediately to reserve it, ahead of any commit.
    /// `discard_page` must undo that write (truncate) rather than
    /// simply dropping the cache entry, or an abort would leave the
    /// file permanently extended.
    newly_allocated: bool,
}

#[derive(Default)]
struct PoolInner {
    entries: HashMap<PageId, CacheEntry>,
    recency: VecDeque<PageId>,
}

impl PoolInner {
    fn touch(&mut self, pid: PageId) {
        self.recency.retain(|p| *p != pid);
        self.recency.push_back(pid);
    }

    /// Evicts the least-recently-used *clean* page. Never evicts a
    /// dirty page (NO-STEAL) — if every cached page is dirty, the pool
    /// is simply full and the caller must wait for a commit/abort.
    fn evict_one(&mut self) -> DbResult<()> {
        let victim = self
            .recency
            .iter()
            .find(|pid| self.entries.get(pid).map_or(false, |e| e.dirty_by.is_none()))
            .copied();

        match victim {
            Some(pid) => {
                self.entries.remove(&pid);
                self.recency.retain(|p| *p != pid);
                debug!("evicted clean page {}", pid);
                Ok(())
            }
            None => Err(DbError::logic("buffer pool is full of dirty pages")),
        }
    }
}

pub struct BufferPool {
    capacity: usize,
    catalog: Arc<Catalog>,
    log: Arc<dyn LogSink>,
    lock_manager: LockManager,
    inner: Mutex<PoolInner>,
}

impl BufferPool {
    pub fn new(capacity: usize, catalog: Arc<Catalog>, log: Arc<dyn LogSink>) -> Self {
        BufferPool {
            capacity,
            catalog,
            log,
            lock_manager: LockManager::new(),
            inner: Mutex::new(PoolInner::default()),
        }
    }

    pub fn with_default_capacity(catalog: Arc<Catalog>, log: Arc<dyn LogSink>) -> Self {
        Self::new(config::DEFAULT_POOL_PAGES, catalog, log)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn heap_file(&self, table_id: TableId) -> DbResult<Arc<HeapFile>> {
        self.catalog.get_heap_file(table_id)
    }

    /// Acquires the requested lock, then returns the cached page,
    /// reading it from its heap file (and evicting a clean victim if
    /// the pool is full) on a miss.
    pub fn get_page(&self, tid: TransactionId, pid: PageId, perm: Permissions) -> DbResult<Arc<Mutex<HeapPage>>> {
        self.lock_manager.acquire(tid, pid, perm)?;

        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.entries.get(&pid) {
            let page = Arc::clone(&entry.page);
            inner.touch(pid);
            return Ok(page);
        }

        let heap_file = self.heap_file(pid.table_id)?;
        let page = heap_file.read_page(pid)?;

        if inner.entries.len() >= self.capacity {
            inner.evict_one()?;
        }

        let page_arc = Arc::new(Mutex::new(page.clone()));
        inner.entries.insert(
            pid,
            CacheEntry {
                page: Arc::clone(&page_arc),
                dirty_by: None,
                clean_snapshot: Some(page),
                newly_allocated: false,
            },
        );
        inner.recency.push_back(pid);
        Ok(page_arc)
    }

    /// Marks an already-cached page dirty under `tid`. Called after
    /// mutating a page obtained through `get_page`.
    pub fn mark_dirty(&self, tid: TransactionId, pid: PageId) -> DbResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .entries
            .get_mut(&pid)
            .ok_or_else(|| DbError::logic(format!("page {} is not cached", pid)))?;
        entry.dirty_by = Some(tid);
        Ok(())
    }

    /// Installs a freshly allocated page (already appended to its heap
    /// file to reserve the slot) directly into the cache as dirty,
    /// skipping the usual disk read. The write lock is acquired here
    /// since the caller never went through `get_page` for this page.
    pub fn install_dirty_page(&self, tid: TransactionId, page: HeapPage) -> DbResult<()> {
        let pid = page.page_id();
        self.lock_manager.acquire_write(tid, pid)?;

        let clean = HeapPage::new_empty(pid, Arc::clone(page.desc()), page.page_size());

        let mut inner = self.inner.lock().unwrap();
        if !inner.entries.contains_key(&pid) && inner.entries.len() >= self.capacity {
            inner.evict_one()?;
        }

        let page_arc = Arc::new(Mutex::new(page));
        inner.entries.insert(
            pid,
            CacheEntry {
                page: page_arc,
                dirty_by: Some(tid),
                clean_snapshot: Some(clean),
                newly_allocated: true,
            },
        );
        inner.recency.push_back(pid);
        Ok(())
    }

    /// Releases a lock without waiting for the owning transaction to
    /// complete. Used only by `HeapFile::insert_tuple`'s probing scan,
    /// to downgrade a READ lock taken just to check `empty_slots()` on
    /// a page that turned out to be full.
    pub fn unsafe_release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_manager.release(tid, pid);
    }

    pub fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: Tuple) -> DbResult<Vec<PageId>> {
        let heap_file = self.heap_file(table_id)?;
        heap_file.insert_tuple(tid, self, tuple)
    }

    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<Vec<PageId>> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::logic("tuple has no record id to delete"))?;
        let heap_file = self.heap_file(rid.page_id.table_id)?;
        heap_file.delete_tuple(tid, self, tuple)
    }

    /// Logs the page's (before, after) image pair, forces the log, and
    /// only then overwrites the heap file. A no-op if the page isn't
    /// cached or isn't dirty.
    pub fn flush_page(&self, pid: PageId) -> DbResult<()> {
        let (tid, before, after) = {
            let inner = self.inner.lock().unwrap();
            let entry = match inner.entries.get(&pid) {
                Some(e) => e,
                None => return Ok(()),
            };
            let tid = match entry.dirty_by {
                Some(t) => t,
                None => return Ok(()),
            };
            let after = entry.page.lock().unwrap().clone();
            let before = entry.clean_snapshot.clone().unwrap_or_else(|| after.clone());
            (tid, before, after)
        };

        self.log.log_write(tid, &before, &after)?;
        self.log.force()?;

        let heap_file = self.heap_file(pid.table_id)?;
        heap_file.write_page(&after)?;

        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.entries.get_mut(&pid) {
            entry.dirty_by = None;
            entry.clean_snapshot = Some(after);
            // once flushed, the page's content is durable; a later
            // discard of this same cache entry must not truncate it.
            entry.newly_allocated = false;
        }
        Ok(())
    }

    fn flush_matching<F: Fn(Option<TransactionId>) -> bool>(&self, predicate: F) -> DbResult<()> {
        let pids: Vec<PageId> = {
            let inner = self.inner.lock().unwrap();
            inner
                .entries
                .iter()
                .filter(|(_, e)| predicate(e.dirty_by))
                .map(|(pid, _)| *pid)
                .collect()
        };
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    pub fn flush_pages_for(&self, tid: TransactionId) -> DbResult<()> {
        self.flush_matching(|owner| owner == Some(tid))
    }

    pub fn flush_all_pages(&self) -> DbResult<()> {
        self.flush_matching(|owner| owner.is_some())
    }

    /// Drops a cached page without writing it back, regardless of its
    /// dirty state. The only path an aborted transaction's dirty pages
    /// take back out of the cache. If the page was a brand-new
    /// allocation that reserved its slot with an immediate write,
    /// truncates that slot away too, so the file's length matches
    /// exactly what it was before the aborted transaction touched it.
    pub fn discard_page(&self, pid: PageId) -> DbResult<()> {
        let newly_allocated = {
            let mut inner = self.inner.lock().unwrap();
            let newly_allocated = inner.entries.get(&pid).map_or(false, |e| e.newly_allocated);
            inner.entries.remove(&pid);
            inner.recency.retain(|p| *p != pid);
            newly_allocated
        };

        if newly_allocated {
            self.heap_file(pid.table_id)?.truncate_if_trailing(pid)?;
        }
        Ok(())
    }

    /// Ends `tid`: on commit, flushes every page it holds and forces a
    /// commit record; on abort, discards every dirty page it holds
    /// without writing it back. Either way, releases all of `tid`'s
    /// locks last,'s strict-2PL release-at-end rule.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> DbResult<()> {
        let pages = self.lock_manager.pages_held_by(tid);

        if commit {
            for pid in &pages {
                self.flush_page(*pid)?;
            }
            self.log.log_commit(tid)?;
            self.log.force()?;
        } else {
            for pid in &pages {
                self.discard_page(*pid)?;
            }
            self.log.log_abort(tid)?;
            warn!("{:?} aborted, discarded {} pages", tid, pages.len());
        }

        self.lock_manager.release_all(tid);
        Ok(())
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }
}
