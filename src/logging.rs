//! `env_logger` wiring, guarded by `std::sync::Once` so every test's
//! own setup can call it without re-initializing a second subscriber.
//! Not used by library code itself -- only by tests and the optional
//! embedding binary -- so it lives outside `log.rs`, which is reserved
//! for the WAL collaborator.

use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Installs an `env_logger` subscriber formatted with file:line, once
/// per process. Safe to call from every test's own setup; only the
/// first call takes effect.
pub fn init_log() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format_timestamp_micros()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} - {}] [{}:{}] {}",
                    record.level(),
                    record.target(),
                    record.file().unwrap_or("?"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .is_test(true)
            .try_init()
            .ok();
    });
}
