//! Hash-grouped aggregation, built in the same pull-based `Iterator`
//! shape as `SeqScan`; it drains its child eagerly on the first
//! `next()` call, since an aggregate can't emit anything until every
//! input row has been seen.
//!
//! AVG keeps `sum` and `count` separately for the whole scan and
//! divides only once, at `next()`/emit time, rather than summing
//! per-row quotients (which would silently corrupt the result).

use crate::error::{DbError, DbResult};
use crate::field::{Field, Type};
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl AggregateOp {
    fn name(self) -> &'static str {
        match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        }
    }
}

#[derive(Default)]
struct Accumulator {
    count: i64,
    sum: i64,
    min: Option<Field>,
    max: Option<Field>,
}

impl Accumulator {
    fn update(&mut self, op: AggregateOp, field: &Field) -> DbResult<()> {
        self.count += 1;
        match op {
            AggregateOp::Count => {}
            AggregateOp::Sum | AggregateOp::Avg => {
                let v = field
                    .as_int()
                    .map_err(|_| DbError::illegal_argument("SUM/AVG require an INT field"))?;
                self.sum += v as i64;
            }
            AggregateOp::Min => {
                if self.min.as_ref().map_or(true, |m| field < m) {
                    self.min = Some(field.clone());
                }
            }
            AggregateOp::Max => {
                if self.max.as_ref().map_or(true, |m| field > m) {
                    self.max = Some(field.clone());
                }
            }
        }
        Ok(())
    }

    /// The accumulated value for `op`. AVG divides `sum` by `count`
    /// here, not during `update` -- dividing per row and summing the
    /// quotients would silently corrupt the result as rows arrive.
    fn emit(&self, op: AggregateOp) -> Field {
        match op {
            AggregateOp::Count => Field::Int(self.count as i32),
            AggregateOp::Sum => Field::Int(self.sum as i32),
            AggregateOp::Avg => Field::Int((self.sum / self.count.max(1)) as i32),
            AggregateOp::Min => self.min.clone().expect("group has at least one row"),
            AggregateOp::Max => self.max.clone().expect("group has at least one row"),
        }
    }
}

pub struct Aggregator<'a> {
    child: Box<dyn Iterator<Item = DbResult<Tuple>> + 'a>,
    group_field: Option<usize>,
    agg_field: usize,
    op: AggregateOp,
    output_desc: Arc<TupleDesc>,
    computed: Option<std::vec::IntoIter<DbResult<Tuple>>>,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        child: Box<dyn Iterator<Item = DbResult<Tuple>> + 'a>,
        child_desc: &TupleDesc,
        group_field: Option<usize>,
        agg_field: usize,
        op: AggregateOp,
    ) -> DbResult<Self> {
        let agg_type = child_desc.field_type(agg_field)?;
        if matches!(agg_type, Type::Str(_)) && op != AggregateOp::Count {
            return Err(DbError::illegal_argument(format!(
                "{:?} is not valid on a STRING field, only COUNT is",
                op
            )));
        }

        let output_desc = Self::build_output_desc(child_desc, group_field, agg_field, op)?;
        Ok(Aggregator {
            child,
            group_field,
            agg_field,
            op,
            output_desc,
            computed: None,
        })
    }

    fn build_output_desc(
        child_desc: &TupleDesc,
        group_field: Option<usize>,
        agg_field: usize,
        op: AggregateOp,
    ) -> DbResult<Arc<TupleDesc>> {
        let agg_source_name = child_desc.field_name(agg_field).unwrap_or("?").to_string();
        let agg_name = format!("{}({})", op.name(), agg_source_name);

        let fields = match group_field {
            Some(gi) => {
                let group_type = child_desc.field_type(gi)?;
                let group_name = child_desc.field_name(gi).map(|s| s.to_string());
                vec![(group_type, group_name), (Type::Int, Some(agg_name))]
            }
            None => vec![(Type::Int, Some(agg_name))],
        };

        Ok(Arc::new(TupleDesc::new(fields)))
    }

    pub fn output_desc(&self) -> &Arc<TupleDesc> {
        &self.output_desc
    }

    fn compute(&mut self) -> DbResult<()> {
        let mut groups: HashMap<Option<Field>, Accumulator> = HashMap::new();

        for t in self.child.by_ref() {
            let t = t?;
            let key = match self.group_field {
                Some(gi) => Some(t.get_field(gi).clone()),
                None => None,
            };
            let field = t.get_field(self.agg_field).clone();
            groups.entry(key).or_insert_with(Accumulator::default).update(self.op, &field)?;
        }

        let mut out = Vec::with_capacity(groups.len());
        for (key, acc) in groups {
            let value = acc.emit(self.op);
            let fields = match key {
                Some(k) => vec![k, value],
                None => vec![value],
            };
            out.push(Tuple::new(Arc::clone(&self.output_desc), fields));
        }

        self.computed = Some(out.into_iter());
        Ok(())
    }
}

impl<'a> Iterator for Aggregator<'a> {
    type Item = DbResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.computed.is_none() {
            if let Err(e) = self.compute() {
                return Some(Err(e));
            }
        }
        self.computed.as_mut().unwrap().next()
    }
}
