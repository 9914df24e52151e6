//! Heap file / buffer pool round-trip, growth, and NO-STEAL abort
//! scenarios: build a table, drive it through a couple of
//! transactions, assert on the file and on what a fresh scan sees.

mod common;

use common::*;
use small_storage::config;
use small_storage::heap_file::HeapFile;
use small_storage::operators::SeqScan;
use small_storage::page::HeapPage;
use small_storage::page_id::PageId;
use small_storage::transaction::Transaction;

fn scan_values(db: &small_storage::Database, table_id: u64) -> Vec<(i32, i32)> {
    let tid = Transaction::start();
    let scan = SeqScan::new(tid.id(), buffer_pool(db), table_id).unwrap();
    let mut out: Vec<(i32, i32)> = scan
        .map(|t| {
            let t = t.unwrap();
            (t.get_field(0).as_int().unwrap(), t.get_field(1).as_int().unwrap())
        })
        .collect();
    tid.commit(buffer_pool(db)).unwrap();
    out.sort();
    out
}

#[test]
fn heap_round_trip_survives_commit() {
    let test_db = new_test_db();
    let db = &test_db.db;
    let table_id = add_int_table(db, test_db.dir.path(), "t1", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();

    let t1 = Transaction::start();
    for values in [[1, 10], [2, 20], [3, 30]] {
        let tuple = int_tuple(&desc, &values);
        buffer_pool(db).insert_tuple(t1.id(), table_id, tuple).unwrap();
    }
    t1.commit(buffer_pool(db)).unwrap();

    let heap_file = db.catalog().get_heap_file(table_id).unwrap();
    assert_eq!(heap_file.num_pages().unwrap(), 1);

    let values = scan_values(db, table_id);
    assert_eq!(values, vec![(1, 10), (2, 20), (3, 30)]);
}

#[test]
fn insert_beyond_one_page_grows_the_file() {
    let _page_size_guard = lock_page_size();
    let test_db = new_test_db();
    let db = &test_db.db;
    // row_size for a 2-column INT schema is 8 bytes; a 28-byte page
    // holds exactly 3 of them ((28*8)/(8*8+1) = 3).
    config::set_page_size(28);
    assert_eq!(HeapPage::num_slots_for(28, 8), 3);
    let table_id = add_int_table(db, test_db.dir.path(), "t2", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();

    let t1 = Transaction::start();
    for values in [[1, 10], [2, 20], [3, 30], [4, 40]] {
        let tuple = int_tuple(&desc, &values);
        buffer_pool(db).insert_tuple(t1.id(), table_id, tuple).unwrap();
    }
    t1.commit(buffer_pool(db)).unwrap();

    let heap_file = db.catalog().get_heap_file(table_id).unwrap();
    assert_eq!(heap_file.num_pages().unwrap(), 2);

    let values = scan_values(db, table_id);
    assert_eq!(values.len(), 4);

    config::reset_page_size();
}

#[test]
fn no_steal_abort_discards_uncommitted_inserts() {
    let test_db = new_test_db();
    let db = &test_db.db;
    let table_id = add_int_table(db, test_db.dir.path(), "t3", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();
    let heap_file = db.catalog().get_heap_file(table_id).unwrap();
    let len_before = heap_file.path().metadata().unwrap().len();

    let t1 = Transaction::start();
    let tuple = int_tuple(&desc, &[1, 10]);
    buffer_pool(db).insert_tuple(t1.id(), table_id, tuple).unwrap();
    t1.abort(buffer_pool(db)).unwrap();

    let values = scan_values(db, table_id);
    assert!(values.is_empty());

    let len_after = heap_file.path().metadata().unwrap().len();
    assert_eq!(len_before, len_after, "aborted insert must not grow the file");
}

#[test]
fn property_read_write_page_round_trips_bytes() {
    let test_db = new_test_db();
    let db = &test_db.db;
    let table_id = add_int_table(db, test_db.dir.path(), "rt", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();
    let heap_file = db.catalog().get_heap_file(table_id).unwrap();

    let mut page = HeapPage::new_empty(PageId::new(table_id, 0), std::sync::Arc::clone(&desc), config::page_size());
    page.insert_tuple(&int_tuple(&desc, &[7, 8])).unwrap();
    heap_file.write_page(&page).unwrap();

    let reread = heap_file.read_page(PageId::new(table_id, 0)).unwrap();
    assert_eq!(page.to_bytes().unwrap(), reread.to_bytes().unwrap());
}

#[test]
fn delete_removes_tuple_and_frees_slot() {
    let test_db = new_test_db();
    let db = &test_db.db;
    let table_id = add_int_table(db, test_db.dir.path(), "del", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();

    let t1 = Transaction::start();
    buffer_pool(db)
        .insert_tuple(t1.id(), table_id, int_tuple(&desc, &[1, 10]))
        .unwrap();
    t1.commit(buffer_pool(db)).unwrap();

    let t2 = Transaction::start();
    let heap_file = db.catalog().get_heap_file(table_id).unwrap();
    let mut it = HeapFile::iterator(&heap_file, t2.id(), buffer_pool(db)).unwrap();
    let victim = it.next().unwrap().unwrap();
    buffer_pool(db).delete_tuple(t2.id(), &victim).unwrap();
    t2.commit(buffer_pool(db)).unwrap();

    assert!(scan_values(db, table_id).is_empty());
}

#[test]
fn delete_rejects_tuple_from_another_table() {
    let test_db = new_test_db();
    let db = &test_db.db;
    let table_a = add_int_table(db, test_db.dir.path(), "a", 2);
    let table_b = add_int_table(db, test_db.dir.path(), "b", 2);
    let desc_a = db.catalog().get_tuple_desc(table_a).unwrap();
    let desc_b = db.catalog().get_tuple_desc(table_b).unwrap();

    let t1 = Transaction::start();
    buffer_pool(db)
        .insert_tuple(t1.id(), table_a, int_tuple(&desc_a, &[1, 1]))
        .unwrap();
    buffer_pool(db)
        .insert_tuple(t1.id(), table_b, int_tuple(&desc_b, &[2, 2]))
        .unwrap();
    t1.commit(buffer_pool(db)).unwrap();

    let t2 = Transaction::start();
    let heap_file_a = db.catalog().get_heap_file(table_a).unwrap();
    let mut it = HeapFile::iterator(&heap_file_a, t2.id(), buffer_pool(db)).unwrap();
    let tuple_from_a = it.next().unwrap().unwrap();

    let heap_file_b = db.catalog().get_heap_file(table_b).unwrap();
    let err = heap_file_b.delete_tuple(t2.id(), buffer_pool(db), &tuple_from_a).unwrap_err();
    assert!(matches!(err, small_storage::DbError::Logic(_)));
    t2.abort(buffer_pool(db)).unwrap();
}

#[test]
fn buffer_pool_rejects_eviction_when_every_cached_page_is_dirty() {
    let _page_size_guard = lock_page_size();
    let test_db = new_test_db();
    let db = &test_db.db;
    config::set_page_size(28); // capacity 3 rows/page
    let catalog = db.catalog();
    let log = std::sync::Arc::clone(db.log());
    let pool = small_storage::BufferPool::new(1, std::sync::Arc::clone(catalog), log);

    let table_id = add_int_table(db, test_db.dir.path(), "tiny", 2);
    let desc = db.catalog().get_tuple_desc(table_id).unwrap();

    let t1 = Transaction::start();
    for values in [[1, 1], [2, 2], [3, 3]] {
        pool.insert_tuple(t1.id(), table_id, int_tuple(&desc, &values)).unwrap();
    }
    // Page 0 now holds all 3 rows and is dirty; the pool's capacity of
    // 1 means a 4th row needs a second page, which requires evicting
    // the only cached (dirty) page -- NO-STEAL forbids that, so this
    // must fail rather than silently publish uncommitted state.
    let err = pool.insert_tuple(t1.id(), table_id, int_tuple(&desc, &[4, 4]));
    assert!(err.is_err());
    t1.abort(&pool).unwrap();
    config::reset_page_size();
}

