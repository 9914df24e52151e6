//! Shared integration-test scaffolding: one `setup()` that installs
//! logging once per process, plus helpers that build a throwaway
//! table backed by a temp directory (so tests never race each other
//! over one file).

use small_storage::field::{Field, Type};
use small_storage::tuple::Tuple;
use small_storage::tuple_desc::TupleDesc;
use small_storage::{BufferPool, Catalog, Database};
use std::sync::{Arc, Mutex, MutexGuard};

pub fn setup() {
    small_storage::logging::init_log();
}

/// `config::page_size` is a process-wide static; cargo runs `#[test]`
/// functions in one binary on a shared thread pool, so a test that
/// calls `config::set_page_size` would otherwise race every other test
/// in the same binary reading the default. Tests that need a
/// non-default page size must hold this guard for as long as the
/// override is in effect.
static PAGE_SIZE_LOCK: Mutex<()> = Mutex::new(());

#[must_use]
pub fn lock_page_size() -> MutexGuard<'static, ()> {
    PAGE_SIZE_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// A fresh `Database` plus the temp directory backing it -- the
/// directory must be kept alive for as long as the database is used or
/// its heap files disappear out from under it.
pub struct TestDb {
    pub dir: tempfile::TempDir,
    pub db: Database,
}

pub fn new_test_db() -> TestDb {
    setup();
    let dir = tempfile::tempdir().expect("create temp dir");
    let log_path = dir.path().join("wal.log");
    let db = Database::open(&log_path).expect("open database");
    TestDb { dir, db }
}

/// Registers a table with `column_count` INT columns at
/// `<dir>/<name>.dat`, returning its table id.
pub fn add_int_table(db: &Database, dir: &std::path::Path, name: &str, column_count: usize) -> u64 {
    let path = dir.join(format!("{}.dat", name));
    let desc = TupleDesc::ints(column_count, "c");
    db.catalog().add_table(name, path, desc).expect("add_table")
}

pub fn int_tuple(desc: &Arc<TupleDesc>, values: &[i32]) -> Tuple {
    let fields = values.iter().map(|v| Field::Int(*v)).collect();
    Tuple::new(Arc::clone(desc), fields).expect("build int tuple")
}

pub fn mixed_desc() -> TupleDesc {
    TupleDesc::new(vec![
        (Type::Str(16), Some("name".to_string())),
        (Type::Int, Some("value".to_string())),
    ])
}

/// Generates `count` INT tuples with random payload columns (column 0
/// is always `id`, monotonic).
pub fn random_int_tuples(desc: &Arc<TupleDesc>, count: usize) -> Vec<Tuple> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let column_count = desc.num_fields();
    (0..count as i32)
        .map(|id| {
            let mut values = vec![id];
            for _ in 1..column_count {
                values.push(rng.gen_range(0, 1_000_000));
            }
            int_tuple(desc, &values)
        })
        .collect()
}

pub fn buffer_pool(db: &Database) -> &Arc<BufferPool> {
    db.buffer_pool()
}

pub fn catalog(db: &Database) -> &Arc<Catalog> {
    db.catalog()
}
