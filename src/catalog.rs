//! Table directory: an independently constructible collaborator
//! mapping `TableId` to its backing `HeapFile`, so tests can run
//! against private catalogs instead of one shared process-wide table
//! space.

use crate::error::{DbError, DbResult};
use crate::heap_file::HeapFile;
use crate::page_id::TableId;
use crate::tuple_desc::TupleDesc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct Catalog {
    tables: RwLock<HashMap<TableId, Arc<HeapFile>>>,
    names: RwLock<HashMap<String, TableId>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            tables: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
        }
    }

    /// Opens (or creates) the heap file backing `path`, deriving its
    /// table id from the path's stable hash, and registers it under
    /// `name`.
    pub fn add_table<P: AsRef<Path>>(&self, name: &str, path: P, desc: TupleDesc) -> DbResult<TableId> {
        let table_id = crate::util::table_id_for_path(&path)?;
        let heap_file = HeapFile::new(path, table_id, Arc::new(desc))?;
        self.tables.write().unwrap().insert(table_id, Arc::new(heap_file));
        self.names.write().unwrap().insert(name.to_string(), table_id);
        Ok(table_id)
    }

    pub fn table_id_for_name(&self, name: &str) -> DbResult<TableId> {
        self.names
            .read()
            .unwrap()
            .get(name)
            .copied()
            .ok_or_else(|| DbError::logic(format!("no such table: {}", name)))
    }

    pub fn get_heap_file(&self, table_id: TableId) -> DbResult<Arc<HeapFile>> {
        self.tables
            .read()
            .unwrap()
            .get(&table_id)
            .cloned()
            .ok_or_else(|| DbError::logic(format!("no table registered with id {:#x}", table_id)))
    }

    pub fn get_tuple_desc(&self, table_id: TableId) -> DbResult<Arc<TupleDesc>> {
        Ok(Arc::clone(self.get_heap_file(table_id)?.desc()))
    }
}
