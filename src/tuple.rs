//! `Tuple`: a fixed-arity row conforming to a `TupleDesc`. A single
//! value type, no trait object per cell — the closed `Field` enum
//! already covers the type set, so dynamic dispatch buys nothing here.

use crate::error::{DbError, DbResult};
use crate::field::Field;
use crate::page_id::PageId;
use crate::tuple_desc::TupleDesc;
use std::fmt;
use std::sync::Arc;

/// Identifies a tuple's storage location: the page plus its slot
/// number within that page's header bitmap.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: usize) -> Self {
        RecordId { page_id, slot }
    }
}

#[derive(Clone, Debug)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(desc: Arc<TupleDesc>, fields: Vec<Field>) -> DbResult<Self> {
        if fields.len() != desc.num_fields() {
            return Err(DbError::logic(format!(
                "tuple has {} fields, schema declares {}",
                fields.len(),
                desc.num_fields()
            )));
        }
        for (i, field) in fields.iter().enumerate() {
            let declared = desc.field_type(i)?;
            let actual = field.field_type();
            let compatible = match (declared, actual) {
                (crate::field::Type::Int, crate::field::Type::Int) => true,
                (crate::field::Type::Str(_), crate::field::Type::Str(_)) => true,
                _ => false,
            };
            if !compatible {
                return Err(DbError::logic(format!(
                    "field {} has type {}, schema declares {}",
                    i, actual, declared
                )));
            }
        }
        Ok(Tuple {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn get_field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    pub fn set_field(&mut self, i: usize, field: Field) {
        self.fields[i] = field;
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(|c| c.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}
