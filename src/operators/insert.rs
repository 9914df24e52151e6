//! One-shot insert operator: drains its child, inserting every tuple
//! it produces through the buffer pool, then yields a single `(INT)`
//! tuple holding the count and is exhausted. Built in the same
//! `Iterator` idiom as `SeqScan`, driving `BufferPool::insert_tuple`.

use crate::buffer_pool::BufferPool;
use crate::error::DbResult;
use crate::field::Field;
use crate::page_id::TableId;
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use std::sync::Arc;

pub struct Insert<'a> {
    tid: TransactionId,
    buffer_pool: &'a BufferPool,
    table_id: TableId,
    child: Box<dyn Iterator<Item = DbResult<Tuple>> + 'a>,
    done: bool,
}

impl<'a> Insert<'a> {
    pub fn new(
        tid: TransactionId,
        buffer_pool: &'a BufferPool,
        table_id: TableId,
        child: Box<dyn Iterator<Item = DbResult<Tuple>> + 'a>,
    ) -> Self {
        Insert {
            tid,
            buffer_pool,
            table_id,
            child,
            done: false,
        }
    }

    pub fn output_desc() -> TupleDesc {
        TupleDesc::ints(1, "count")
    }
}

impl<'a> Iterator for Insert<'a> {
    type Item = DbResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.done = true;

        let mut count = 0i32;
        for t in self.child.by_ref() {
            let t = match t {
                Ok(t) => t,
                Err(e) => return Some(Err(e)),
            };
            match self.buffer_pool.insert_tuple(self.tid, self.table_id, t) {
                Ok(_) => count += 1,
                Err(e) => return Some(Err(e)),
            }
        }

        let desc = Arc::new(Self::output_desc());
        Some(Tuple::new(desc, vec![Field::Int(count)]))
    }
}
