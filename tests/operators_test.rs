//! Insert/Delete operator behavior: one-shot draining, the `(INT)`
//! count schema, and end-of-stream on a second call.

mod common;

use common::*;
use small_storage::operators::{Delete, Insert, SeqScan};
use small_storage::transaction::Transaction;

#[test]
fn insert_drains_child_and_reports_count_once() {
    let test_db = new_test_db();
    let db = &test_db.db;
    let table_id = add_int_table(db, test_db.dir.path(), "ins", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();

    let tid = Transaction::start();
    let rows: Vec<_> = vec![[1, 1], [2, 2], [3, 3]]
        .into_iter()
        .map(|v| Ok(int_tuple(&desc, &v)))
        .collect();
    let child: Box<dyn Iterator<Item = small_storage::DbResult<small_storage::Tuple>>> = Box::new(rows.into_iter());

    let mut insert = Insert::new(tid.id(), buffer_pool(db), table_id, child);
    let first = insert.next().unwrap().unwrap();
    assert_eq!(first.get_field(0).as_int().unwrap(), 3);
    assert!(insert.next().is_none(), "insert must be exhausted after one result");
    tid.commit(buffer_pool(db)).unwrap();

    let tid2 = Transaction::start();
    let count = SeqScan::new(tid2.id(), buffer_pool(db), table_id).unwrap().count();
    tid2.commit(buffer_pool(db)).unwrap();
    assert_eq!(count, 3);
}

#[test]
fn delete_drains_child_and_removes_every_tuple() {
    let test_db = new_test_db();
    let db = &test_db.db;
    let table_id = add_int_table(db, test_db.dir.path(), "del_op", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();

    let setup_tid = Transaction::start();
    for v in [[1, 1], [2, 2]] {
        buffer_pool(db).insert_tuple(setup_tid.id(), table_id, int_tuple(&desc, &v)).unwrap();
    }
    setup_tid.commit(buffer_pool(db)).unwrap();

    let tid = Transaction::start();
    let scan: Box<dyn Iterator<Item = small_storage::DbResult<small_storage::Tuple>> + '_> =
        Box::new(SeqScan::new(tid.id(), buffer_pool(db), table_id).unwrap());
    let mut delete = Delete::new(tid.id(), buffer_pool(db), scan);
    let result = delete.next().unwrap().unwrap();
    assert_eq!(result.get_field(0).as_int().unwrap(), 2);
    assert!(delete.next().is_none());
    tid.commit(buffer_pool(db)).unwrap();

    let tid2 = Transaction::start();
    let remaining = SeqScan::new(tid2.id(), buffer_pool(db), table_id).unwrap().count();
    tid2.commit(buffer_pool(db)).unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn seq_scan_rewind_restarts_from_page_zero() {
    let test_db = new_test_db();
    let db = &test_db.db;
    let table_id = add_int_table(db, test_db.dir.path(), "rewind", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();

    let setup_tid = Transaction::start();
    for v in [[1, 1], [2, 2]] {
        buffer_pool(db).insert_tuple(setup_tid.id(), table_id, int_tuple(&desc, &v)).unwrap();
    }
    setup_tid.commit(buffer_pool(db)).unwrap();

    let tid = Transaction::start();
    let mut scan = SeqScan::new(tid.id(), buffer_pool(db), table_id).unwrap();
    let first_pass = scan.by_ref().count();
    scan.rewind().unwrap();
    let second_pass = scan.count();
    tid.commit(buffer_pool(db)).unwrap();

    assert_eq!(first_pass, 2);
    assert_eq!(second_pass, 2);
}
