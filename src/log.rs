//! Write-ahead log interface. Only the force-before-write discipline
//! is modeled here (full ARIES-style crash recovery is out of scope);
//! the log exists so `BufferPool::flush_page` has something real to
//! call before it touches the heap file.

use crate::error::DbResult;
use crate::page::HeapPage;
use crate::transaction_id::TransactionId;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

#[repr(u8)]
enum RecordType {
    Start = 0,
    Update = 1,
    Commit = 2,
    Abort = 3,
}

/// Collaborator a `BufferPool` forces through on the way to
/// `HeapFile::write_page`. The flush protocol is: log the
/// (before, after) image pair, force the log, only then overwrite the
/// page on disk.
pub trait LogSink: Send + Sync {
    fn log_start(&self, tid: TransactionId) -> DbResult<()>;
    fn log_write(&self, tid: TransactionId, before: &HeapPage, after: &HeapPage) -> DbResult<()>;
    fn log_commit(&self, tid: TransactionId) -> DbResult<()>;
    fn log_abort(&self, tid: TransactionId) -> DbResult<()>;
    fn force(&self) -> DbResult<()>;
}

/// Append-only file sink. Records are self-delimiting
/// (tag, tid, payload length, payload) but never replayed — this
/// implementation exists to make the force-before-write ordering a
/// real, observable file operation rather than a no-op.
pub struct NaiveLog {
    file: Mutex<File>,
}

impl NaiveLog {
    pub fn new<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(NaiveLog { file: Mutex::new(file) })
    }

    fn write_record(&self, tag: RecordType, tid: TransactionId, payload: &[u8]) -> DbResult<()> {
        let mut file = self.file.lock().unwrap();
        file.write_all(&[tag as u8])?;
        file.write_all(&tid_bytes(tid))?;
        file.write_all(&(payload.len() as u32).to_be_bytes())?;
        file.write_all(payload)?;
        Ok(())
    }
}

fn tid_bytes(tid: TransactionId) -> [u8; 8] {
    let h = crate::util::stable_hash(format!("{}", tid).as_bytes());
    h.to_be_bytes()
}

impl LogSink for NaiveLog {
    fn log_start(&self, tid: TransactionId) -> DbResult<()> {
        self.write_record(RecordType::Start, tid, &[])
    }

    fn log_write(&self, tid: TransactionId, before: &HeapPage, after: &HeapPage) -> DbResult<()> {
        let mut payload = before.to_bytes()?;
        payload.extend(after.to_bytes()?);
        self.write_record(RecordType::Update, tid, &payload)
    }

    fn log_commit(&self, tid: TransactionId) -> DbResult<()> {
        self.write_record(RecordType::Commit, tid, &[])
    }

    fn log_abort(&self, tid: TransactionId) -> DbResult<()> {
        self.write_record(RecordType::Abort, tid, &[])
    }

    fn force(&self) -> DbResult<()> {
        self.file.lock().unwrap().sync_all()?;
        Ok(())
    }
}

/// A sink that discards everything, for tests exercising locking or
/// eviction where the WAL's own content is not under test.
pub struct NullLog;

impl LogSink for NullLog {
    fn log_start(&self, _tid: TransactionId) -> DbResult<()> {
        Ok(())
    }
    fn log_write(&self, _tid: TransactionId, _before: &HeapPage, _after: &HeapPage) -> DbResult<()> {
        Ok(())
    }
    fn log_commit(&self, _tid: TransactionId) -> DbResult<()> {
        Ok(())
    }
    fn log_abort(&self, _tid: TransactionId) -> DbResult<()> {
        Ok(())
    }
    fn force(&self) -> DbResult<()> {
        Ok(())
    }
}
