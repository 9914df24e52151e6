//! Table scan operator: an `Iterator` pulling pages through the buffer
//! pool one at a time via `HeapFile::iterator`.

use crate::buffer_pool::BufferPool;
use crate::error::DbResult;
use crate::heap_file::HeapFileIterator;
use crate::page_id::TableId;
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use std::sync::Arc;

pub struct SeqScan<'a> {
    desc: Arc<TupleDesc>,
    inner: HeapFileIterator<'a>,
}

impl<'a> SeqScan<'a> {
    pub fn new(tid: TransactionId, buffer_pool: &'a BufferPool, table_id: TableId) -> DbResult<Self> {
        let heap_file = buffer_pool.catalog().get_heap_file(table_id)?;
        let desc = Arc::clone(heap_file.desc());
        let inner = crate::heap_file::HeapFile::iterator(&heap_file, tid, buffer_pool)?;
        Ok(SeqScan { desc, inner })
    }

    pub fn output_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn rewind(&mut self) -> DbResult<()> {
        self.inner.rewind()
    }
}

impl<'a> Iterator for SeqScan<'a> {
    type Item = DbResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
