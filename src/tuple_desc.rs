//! Ordered schema of a table or operator output: a list of (type,
//! optional name) pairs whose equality is structural over types only —
//! names are advisory.

use crate::error::{DbError, DbResult};
use crate::field::Type;

#[derive(Clone, Debug)]
pub struct FieldDesc {
    pub field_type: Type,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TupleDesc {
    fields: Vec<FieldDesc>,
}

impl TupleDesc {
    pub fn new(fields: Vec<(Type, Option<String>)>) -> Self {
        TupleDesc {
            fields: fields
                .into_iter()
                .map(|(field_type, name)| FieldDesc { field_type, name })
                .collect(),
        }
    }

    /// All-INT schema, field names `"{prefix}{i}"`.
    pub fn ints(count: usize, prefix: &str) -> Self {
        let fields = (0..count)
            .map(|i| (Type::Int, Some(format!("{}{}", prefix, i))))
            .collect();
        TupleDesc::new(fields)
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, i: usize) -> DbResult<Type> {
        self.fields
            .get(i)
            .map(|f| f.field_type)
            .ok_or_else(|| DbError::logic(format!("no field at index {}", i)))
    }

    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.fields.get(i).and_then(|f| f.name.as_deref())
    }

    /// Index of the field named `name`, if any.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
    }

    /// Fixed on-disk width of one tuple under this schema.
    pub fn row_size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.byte_len()).sum()
    }

    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut fields = a.fields.clone();
        fields.extend(b.fields.clone());
        TupleDesc { fields }
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural_over_types_only() {
        let a = TupleDesc::new(vec![(Type::Int, Some("a".to_string()))]);
        let b = TupleDesc::new(vec![(Type::Int, Some("totally_different_name".to_string()))]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_types_are_unequal() {
        let a = TupleDesc::new(vec![(Type::Int, None)]);
        let b = TupleDesc::new(vec![(Type::Str(4), None)]);
        assert_ne!(a, b);
    }

    #[test]
    fn row_size_sums_field_widths() {
        let desc = TupleDesc::new(vec![(Type::Int, None), (Type::Str(10), None)]);
        assert_eq!(desc.row_size(), 4 + 10);
    }

    #[test]
    fn merge_concatenates_fields_in_order() {
        let a = TupleDesc::ints(1, "a");
        let b = TupleDesc::ints(2, "b");
        let merged = TupleDesc::merge(&a, &b);
        assert_eq!(merged.num_fields(), 3);
        assert_eq!(merged.field_name(0), Some("a0"));
        assert_eq!(merged.field_name(1), Some("b0"));
        assert_eq!(merged.field_name(2), Some("b1"));
    }

    #[test]
    fn field_index_finds_by_name() {
        let desc = TupleDesc::ints(3, "c");
        assert_eq!(desc.field_index("c1"), Some(1));
        assert_eq!(desc.field_index("missing"), None);
    }
}
