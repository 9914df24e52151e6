//! `HeapFile`: one table as a contiguous, page-sized-block file. A
//! single type that both lays out pages and drives inserts, deletes,
//! and scans through the buffer pool.

use crate::buffer_pool::BufferPool;
use crate::config;
use crate::error::{DbError, DbResult};
use crate::page::HeapPage;
use crate::page_id::{PageId, TableId};
use crate::permissions::Permissions;
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub struct HeapFile {
    table_id: TableId,
    path: PathBuf,
    desc: Arc<TupleDesc>,
    file: Mutex<File>,
}

impl HeapFile {
    pub fn new<P: AsRef<Path>>(path: P, table_id: TableId, desc: Arc<TupleDesc>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        Ok(HeapFile {
            table_id,
            path,
            desc,
            file: Mutex::new(file),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `floor(file_length / page_size)`. Partial tail bytes are
    /// forbidden as an invariant, so floor and ceiling division agree
    /// whenever the file is well-formed, but floor is the one that
    /// doesn't silently manufacture a phantom page out of a corrupt
    /// tail.
    pub fn num_pages(&self) -> DbResult<usize> {
        let file = self.file.lock().unwrap();
        let len = file.metadata()?.len() as usize;
        let page_size = config::page_size();
        if len % page_size != 0 {
            return Err(DbError::logic(format!(
                "heap file {:?} has length {} which is not a multiple of page size {}",
                self.path, len, page_size
            )));
        }
        Ok(len / page_size)
    }

    pub fn read_page(&self, pid: PageId) -> DbResult<HeapPage> {
        let page_size = config::page_size();
        let offset = pid.byte_offset(page_size);
        let mut file = self.file.lock().unwrap();
        let len = file.metadata()?.len();
        if offset + page_size as u64 > len {
            return Err(DbError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("page {} is beyond end of file", pid),
            )));
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; page_size];
        file.read_exact(&mut buf)?;
        debug!("read page {} from {:?}", pid, self.path);
        HeapPage::from_bytes(pid, Arc::clone(&self.desc), page_size, &buf)
    }

    /// Shrinks the file by one page if `pid` is still the trailing
    /// page, undoing the immediate-write a just-allocated page
    /// performed to reserve its slot. Used only when discarding a
    /// dirty page that was never actually committed (the
    /// abort path: "restoring the on-disk state"). A no-op if another
    /// page has since been appended past `pid` -- the common single
    /// first-insert case this exists for never hits that.
    pub fn truncate_if_trailing(&self, pid: PageId) -> DbResult<()> {
        let page_size = config::page_size();
        let mut file = self.file.lock().unwrap();
        let len = file.metadata()?.len();
        let expected_end = pid.byte_offset(page_size) + page_size as u64;
        if len == expected_end {
            file.set_len(pid.byte_offset(page_size))?;
        }
        Ok(())
    }

    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let page_size = config::page_size();
        let offset = page.page_id().byte_offset(page_size);
        let bytes = page.to_bytes()?;
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&bytes)?;
        file.flush()?;
        debug!("wrote page {} to {:?}", page.page_id(), self.path);
        Ok(())
    }

    /// Scans existing pages for room, probing each with a READ lock
    /// and releasing it immediately (`unsafe_release_page`) when the
    /// page turns out to be full; upgrades to WRITE only on the page
    /// that actually receives the tuple. Allocates and appends a new
    /// page when none has room. Returns the pages the caller must mark
    /// dirty.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        buffer_pool: &BufferPool,
        mut tuple: Tuple,
    ) -> DbResult<Vec<PageId>> {
        let num_pages = self.num_pages()?;

        for index in 0..num_pages {
            let pid = PageId::new(self.table_id, index);
            let page_arc = buffer_pool.get_page(tid, pid, Permissions::ReadOnly)?;
            let has_space = page_arc.lock().unwrap().empty_slots() > 0;

            if !has_space {
                buffer_pool.unsafe_release_page(tid, pid);
                continue;
            }

            let page_arc = buffer_pool.get_page(tid, pid, Permissions::ReadWrite)?;
            let rid = {
                let mut page = page_arc.lock().unwrap();
                page.insert_tuple(&tuple)?
            };
            tuple.set_record_id(Some(rid));
            buffer_pool.mark_dirty(tid, pid)?;
            return Ok(vec![pid]);
        }

        // No existing page has room: allocate a new one.
        let new_pid = PageId::new(self.table_id, num_pages);
        let mut new_page = HeapPage::new_empty(new_pid, Arc::clone(&self.desc), config::page_size());
        let rid = new_page.insert_tuple(&tuple)?;
        tuple.set_record_id(Some(rid));

        // Reserve the file slot immediately so a concurrent insert
        // scan sees `num_pages()` already incremented;
        // the buffer-pool copy remains the source of truth and is
        // replayed on commit.
        self.write_page(&new_page)?;
        buffer_pool.install_dirty_page(tid, new_page)?;

        Ok(vec![new_pid])
    }

    pub fn delete_tuple(&self, tid: TransactionId, buffer_pool: &BufferPool, tuple: &Tuple) -> DbResult<Vec<PageId>> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::logic("tuple has no record id to delete"))?;

        if rid.page_id.table_id != self.table_id {
            return Err(DbError::logic("tuple not in this table"));
        }

        let page_arc = buffer_pool.get_page(tid, rid.page_id, Permissions::ReadWrite)?;
        {
            let mut page = page_arc.lock().unwrap();
            page.delete_tuple(rid)?;
        }
        buffer_pool.mark_dirty(tid, rid.page_id)?;

        Ok(vec![rid.page_id])
    }

    /// A restartable, page-at-a-time iterator over every tuple
    /// currently in the file, fetching one page ahead of the next
    /// through the buffer pool (never prefetching more than one).
    /// Takes `&Arc<HeapFile>` rather than `&self` so the returned
    /// iterator can own a clone of the handle instead of borrowing it,
    /// letting operators hold the iterator independently of wherever
    /// the `Arc<HeapFile>` came from.
    pub fn iterator<'a>(
        this: &Arc<HeapFile>,
        tid: TransactionId,
        buffer_pool: &'a BufferPool,
    ) -> DbResult<HeapFileIterator<'a>> {
        let num_pages = this.num_pages()?;
        Ok(HeapFileIterator {
            heap_file: Arc::clone(this),
            tid,
            buffer_pool,
            num_pages,
            page_index: 0,
            current: Vec::new().into_iter(),
        })
    }
}

pub struct HeapFileIterator<'a> {
    heap_file: Arc<HeapFile>,
    tid: TransactionId,
    buffer_pool: &'a BufferPool,
    num_pages: usize,
    page_index: usize,
    current: std::vec::IntoIter<Tuple>,
}

impl<'a> HeapFileIterator<'a> {
    /// Reopens at page 0, re-reading the page count at the time of
    /// rewind -- a full restart-from-scratch, not a resume.
    pub fn rewind(&mut self) -> DbResult<()> {
        self.num_pages = self.heap_file.num_pages()?;
        self.page_index = 0;
        self.current = Vec::new().into_iter();
        Ok(())
    }

    fn load_next_page(&mut self) -> DbResult<bool> {
        while self.page_index < self.num_pages {
            let pid = PageId::new(self.heap_file.table_id(), self.page_index);
            self.page_index += 1;
            let page_arc = self.buffer_pool.get_page(self.tid, pid, Permissions::ReadOnly)?;
            let tuples: Vec<Tuple> = page_arc.lock().unwrap().iter_tuples().collect();
            if !tuples.is_empty() {
                self.current = tuples.into_iter();
                return Ok(true);
            }
            // empty page: keep scanning
        }
        Ok(false)
    }
}

impl<'a> Iterator for HeapFileIterator<'a> {
    type Item = DbResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(t) = self.current.next() {
                return Some(Ok(t));
            }
            match self.load_next_page() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
