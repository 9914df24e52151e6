use thiserror::Error;

/// Crate-wide error type. Mirrors the four kinds the design names: an
/// `IO` failure is never caller-recoverable except by retry, `Logic`
/// covers contract violations, `TxnAborted` signals the deadlock
/// detector (or an external caller) invalidated the transaction, and
/// `IllegalArgument` is reserved for construction-time validation.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Logic(String),

    #[error("transaction aborted: {0}")]
    TxnAborted(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),
}

impl DbError {
    pub fn logic<S: Into<String>>(msg: S) -> Self {
        DbError::Logic(msg.into())
    }

    pub fn txn_aborted<S: Into<String>>(msg: S) -> Self {
        DbError::TxnAborted(msg.into())
    }

    pub fn illegal_argument<S: Into<String>>(msg: S) -> Self {
        DbError::IllegalArgument(msg.into())
    }

    /// Prints a backtrace captured at the call site to stderr. Not part
    /// of `Display`/`Error` output -- callers opt in at sites where a
    /// failure is unexpected enough to warrant the extra noise (e.g.
    /// deadlock abort).
    pub fn show_backtrace(&self) {
        eprintln!("{}\n{:?}", self, backtrace::Backtrace::new());
    }
}

pub type DbResult<T> = Result<T, DbError>;
