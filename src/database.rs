//! Process-wide handle bundling the catalog, buffer pool and log
//! sink. `Database::global()` offers a singleton convenience behind a
//! `once_cell::sync::OnceCell`; `Database::new` is independently
//! constructible so tests don't share state through a single
//! process-wide instance.

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::config;
use crate::error::DbResult;
use crate::log::{LogSink, NaiveLog};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;

pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    log: Arc<dyn LogSink>,
}

static GLOBAL: OnceCell<Database> = OnceCell::new();

impl Database {
    pub fn new(catalog: Arc<Catalog>, buffer_pool: Arc<BufferPool>, log: Arc<dyn LogSink>) -> Self {
        Database {
            catalog,
            buffer_pool,
            log,
        }
    }

    /// Convenience constructor: an empty catalog, a default-capacity
    /// buffer pool, and a `NaiveLog` writing to `log_path`.
    pub fn open<P: AsRef<Path>>(log_path: P) -> DbResult<Self> {
        let catalog = Arc::new(Catalog::new());
        let log: Arc<dyn LogSink> = Arc::new(NaiveLog::new(log_path)?);
        let buffer_pool = Arc::new(BufferPool::new(
            config::DEFAULT_POOL_PAGES,
            Arc::clone(&catalog),
            Arc::clone(&log),
        ));
        Ok(Database::new(catalog, buffer_pool, log))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn log(&self) -> &Arc<dyn LogSink> {
        &self.log
    }

    /// Installs `db` as the process-wide instance. Panics if called
    /// more than once.
    pub fn install_global(db: Database) {
        GLOBAL
            .set(db)
            .unwrap_or_else(|_| panic!("Database::install_global called more than once"));
    }

    pub fn global() -> &'static Database {
        GLOBAL.get().expect("Database::install_global was never called")
    }
}
