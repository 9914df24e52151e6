//! A teaching-grade heap-file storage engine: slotted pages, a
//! NO-STEAL buffer pool coordinated with a write-ahead log, page-level
//! strict two-phase locking with deadlock detection, and a small set
//! of pull-based query operators (scan, aggregate, insert, delete).
//! Generalized from `small-db`'s B-tree-oriented storage layer onto a
//! heap-file-oriented one; see DESIGN.md for what was kept, replaced,
//! or dropped.

pub mod buffer_pool;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod field;
pub mod heap_file;
pub mod lock_manager;
pub mod log;
pub mod logging;
pub mod operators;
pub mod page;
pub mod page_id;
pub mod permissions;
pub mod transaction;
pub mod transaction_id;
pub mod tuple;
pub mod tuple_desc;
pub mod util;
pub mod wait_for_graph;

pub use buffer_pool::BufferPool;
pub use catalog::Catalog;
pub use database::Database;
pub use error::{DbError, DbResult};
pub use field::{Field, Type};
pub use heap_file::HeapFile;
pub use lock_manager::LockManager;
pub use page_id::{PageId, TableId};
pub use permissions::Permissions;
pub use transaction::Transaction;
pub use transaction_id::TransactionId;
pub use tuple::{RecordId, Tuple};
pub use tuple_desc::TupleDesc;
