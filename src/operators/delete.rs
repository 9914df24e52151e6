//! One-shot delete operator, the mirror of `Insert`: drains its child
//! and deletes every tuple it produces (each must already carry a
//! `RecordId`, e.g. from a `SeqScan`), yielding a single `(INT)` count
//! tuple.

use crate::buffer_pool::BufferPool;
use crate::error::DbResult;
use crate::field::Field;
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use std::sync::Arc;

pub struct Delete<'a> {
    tid: TransactionId,
    buffer_pool: &'a BufferPool,
    child: Box<dyn Iterator<Item = DbResult<Tuple>> + 'a>,
    done: bool,
}

impl<'a> Delete<'a> {
    pub fn new(tid: TransactionId, buffer_pool: &'a BufferPool, child: Box<dyn Iterator<Item = DbResult<Tuple>> + 'a>) -> Self {
        Delete {
            tid,
            buffer_pool,
            child,
            done: false,
        }
    }

    pub fn output_desc() -> TupleDesc {
        TupleDesc::ints(1, "count")
    }
}

impl<'a> Iterator for Delete<'a> {
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
            match self.buffer_pool.delete_tuple(self.tid, &t) {
                Ok(_) => count += 1,
                Err(e) => return Some(Err(e)),
            }
        }

        let desc = Arc::new(Self::output_desc());
        Some(Tuple::new(desc, vec![Field::Int(count)]))
    }
}
