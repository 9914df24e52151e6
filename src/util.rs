//! Small stateless helpers shared across the storage layer.

use crate::page_id::TableId;
use std::path::Path;

/// FNV-1a 64-bit hash over the canonicalized path's UTF-8 bytes.
///
/// Used as `TableId`: deterministic across process runs on the same
/// host (same bytes in, same hash out), unlike `DefaultHasher`, whose
/// exact algorithm is not part of its stability guarantee. The same
/// physical file must map to the same id whenever it's reopened.
pub fn stable_hash(bytes: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Stable table id for a heap file at `path`. `Path::canonicalize`
/// requires every component to exist, which the file itself usually
/// doesn't yet -- `HeapFile::new` is what creates it. So this
/// canonicalizes the *parent directory* instead (which callers always
/// create ahead of the table, e.g. a test's temp dir) and rejoins the
/// file name, giving the same canonical path `canonicalize()` would
/// have produced had the file already existed. That keeps the result
/// stable whether this is the table's first creation or a later reopen
/// of the same physical file.
pub fn table_id_for_path<P: AsRef<Path>>(path: P) -> std::io::Result<TableId> {
    let path = path.as_ref();
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let canonical = parent.canonicalize()?.join(file_name);
    let as_str = canonical.to_string_lossy();
    Ok(stable_hash(as_str.as_bytes()))
}

/// Ceiling division, specialized to `usize` (the only width the page
/// layer needs).
pub fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}
