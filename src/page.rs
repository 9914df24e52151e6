//! `HeapPage`: a fixed-size slotted page — a header bitmap of occupied
//! slots followed by packed fixed-width tuples. Uses the `bit_vec`
//! crate for the header bitmap rather than hand-rolling bit packing.

use crate::error::{DbError, DbResult};
use crate::field::Field;
use crate::page_id::PageId;
use crate::tuple::{RecordId, Tuple};
use crate::tuple_desc::TupleDesc;
use bit_vec::BitVec;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct HeapPage {
    page_id: PageId,
    desc: Arc<TupleDesc>,
    page_size: usize,
    header: BitVec,
    slots: Vec<Option<Vec<Field>>>,
}

impl HeapPage {
    /// Number of tuple slots a page of `page_size` bytes holds for a
    /// row of `row_size` bytes: each slot costs `row_size` bytes of
    /// payload plus one bit of header, so
    /// `num_slots * (row_size * 8 + 1) <= page_size * 8`.
    pub fn num_slots_for(page_size: usize, row_size: usize) -> usize {
        if row_size == 0 {
            return 0;
        }
        (page_size * 8) / (row_size * 8 + 1)
    }

    pub fn header_bytes_for(num_slots: usize) -> usize {
        crate::util::ceil_div(num_slots, 8)
    }

    fn layout(desc: &TupleDesc, page_size: usize) -> (usize, usize) {
        let row_size = desc.row_size();
        let num_slots = Self::num_slots_for(page_size, row_size);
        let header_bytes = Self::header_bytes_for(num_slots);
        (num_slots, header_bytes)
    }

    /// A freshly allocated, entirely empty page.
    pub fn new_empty(page_id: PageId, desc: Arc<TupleDesc>, page_size: usize) -> Self {
        let (num_slots, _) = Self::layout(&desc, page_size);
        HeapPage {
            page_id,
            desc,
            page_size,
            header: BitVec::from_elem(num_slots, false),
            slots: vec![None; num_slots],
        }
    }

    /// Parses a page image. `bytes.len()` must equal `page_size`
    /// exactly ("size is exactly the configured page
    /// size").
    pub fn from_bytes(
        page_id: PageId,
        desc: Arc<TupleDesc>,
        page_size: usize,
        bytes: &[u8],
    ) -> DbResult<Self> {
        if bytes.len() != page_size {
            return Err(DbError::logic(format!(
                "page image is {} bytes, expected exactly {}",
                bytes.len(),
                page_size
            )));
        }

        let (num_slots, header_bytes) = Self::layout(&desc, page_size);
        let row_size = desc.row_size();
        let header = BitVec::from_bytes(&bytes[..header_bytes]);

        let mut slots = Vec::with_capacity(num_slots);
        let mut offset = header_bytes;
        for slot in 0..num_slots {
            let used = header.get(slot).unwrap_or(false);
            if used {
                let row_bytes = &bytes[offset..offset + row_size];
                slots.push(Some(Self::decode_row(&desc, row_bytes)?));
            } else {
                slots.push(None);
            }
            offset += row_size;
        }

        Ok(HeapPage {
            page_id,
            desc,
            page_size,
            header,
            slots,
        })
    }

    fn decode_row(desc: &TupleDesc, bytes: &[u8]) -> DbResult<Vec<Field>> {
        let mut fields = Vec::with_capacity(desc.num_fields());
        let mut offset = 0;
        for i in 0..desc.num_fields() {
            let field_type = desc.field_type(i)?;
            let len = field_type.byte_len();
            fields.push(Field::from_bytes(field_type, &bytes[offset..offset + len])?);
            offset += len;
        }
        Ok(fields)
    }

    fn encode_row(desc: &TupleDesc, fields: &[Field]) -> DbResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(desc.row_size());
        for (i, field) in fields.iter().enumerate() {
            buf.extend(field.to_bytes(desc.field_type(i)?)?);
        }
        Ok(buf)
    }

    /// Serializes back to exactly `page_size` bytes (deterministic
    /// round-trip).
    pub fn to_bytes(&self) -> DbResult<Vec<u8>> {
        let (num_slots, header_bytes) = Self::layout(&self.desc, self.page_size);
        let row_size = self.desc.row_size();

        let mut buf = self.header.to_bytes();
        buf.resize(header_bytes, 0);

        for slot in 0..num_slots {
            match &self.slots[slot] {
                Some(fields) => buf.extend(Self::encode_row(&self.desc, fields)?),
                None => buf.extend(std::iter::repeat(0u8).take(row_size)),
            }
        }

        buf.resize(self.page_size, 0);
        Ok(buf)
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn num_used_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn empty_slots(&self) -> usize {
        self.num_slots() - self.num_used_slots()
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        self.slots.get(slot).map_or(false, |s| s.is_some())
    }

    /// Finds the first empty slot and occupies it with `tuple`'s
    /// fields, returning the `RecordId` the caller should stamp onto
    /// the tuple.
    pub fn insert_tuple(&mut self, tuple: &Tuple) -> DbResult<RecordId> {
        if *tuple.desc().as_ref() != *self.desc.as_ref() {
            return Err(DbError::logic("tuple schema does not match page schema"));
        }
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or_else(|| DbError::logic("page has no empty slots"))?;

        self.slots[slot] = Some(tuple.fields().to_vec());
        self.header.set(slot, true);
        Ok(RecordId::new(self.page_id, slot))
    }

    /// Clears the slot named by `rid`. Fails if the slot was already
    /// empty or `rid` names a different page.
    pub fn delete_tuple(&mut self, rid: RecordId) -> DbResult<()> {
        if rid.page_id != self.page_id {
            return Err(DbError::logic("record id belongs to a different page"));
        }
        if !self.is_slot_used(rid.slot) {
            return Err(DbError::logic("slot is not occupied"));
        }
        self.slots[rid.slot] = None;
        self.header.set(rid.slot, false);
        Ok(())
    }

    /// Tuples for every occupied slot, in slot order, each carrying its
    /// `RecordId`.
    pub fn iter_tuples(&self) -> impl Iterator<Item = Tuple> + '_ {
        self.slots.iter().enumerate().filter_map(move |(slot, f)| {
            f.as_ref().map(|fields| {
                let mut t = Tuple::new(Arc::clone(&self.desc), fields.clone())
                    .expect("fields stored in a page already satisfy its schema");
                t.set_record_id(Some(RecordId::new(self.page_id, slot)));
                t
            })
        })
    }
}
