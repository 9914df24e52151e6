//! Page and table identity. `TableId` is a stable hash of a table's
//! canonical on-disk path (see `util::stable_hash`), not a process
//! counter, so the same physical file maps to the same id across
//! process runs on the same host.

pub type TableId = u64;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct PageId {
    pub table_id: TableId,
    pub page_index: usize,
}

impl PageId {
    pub fn new(table_id: TableId, page_index: usize) -> Self {
        PageId {
            table_id,
            page_index,
        }
    }

    pub fn byte_offset(&self, page_size: usize) -> u64 {
        (self.page_index * page_size) as u64
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "page(table={:#x}, index={})", self.table_id, self.page_index)
    }
}
