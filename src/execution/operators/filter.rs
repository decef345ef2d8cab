use std::cmp::Ordering;
use std::fmt;

use crate::{
    db_trace, db_warn,
    debugger::Component,
    execution::{
        errors::{ExecResult, ExecutionError},
        operator::{PhysicalOperator, Pull},
        tuple::Tuple,
        value_cmp::compare_values,
    },
    storage::table::Table,
    txn::TrxHandle,
    types::value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompOp {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" | "==" => Some(CompOp::Eq),
            "!=" | "<>" => Some(CompOp::NotEq),
            "<" => Some(CompOp::Lt),
            "<=" => Some(CompOp::LtEq),
            ">" => Some(CompOp::Gt),
            ">=" => Some(CompOp::GtEq),
            _ => None,
        }
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::NotEq => ord != Ordering::Equal,
            CompOp::Lt => ord == Ordering::Less,
            CompOp::LtEq => ord != Ordering::Greater,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::GtEq => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompOp::Eq => "=",
            CompOp::NotEq => "!=",
            CompOp::Lt => "<",
            CompOp::LtEq => "<=",
            CompOp::Gt => ">",
            CompOp::GtEq => ">=",
        };
        f.write_str(s)
    }
}

/// `<field> <op> <literal>`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub field: String,
    pub op: CompOp,
    pub value: Value,
}

impl FieldPredicate {
    pub fn new(field: impl Into<String>, op: CompOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

impl fmt::Display for FieldPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// Passes through the child's rows that satisfy a single field predicate.
/// Comparisons against NULL, or between incomparable values, never match.
pub struct PredicateOperator {
    child: Box<dyn PhysicalOperator>,
    predicate: FieldPredicate,
    field_index: usize,
}

impl PredicateOperator {
    pub fn new(
        child: Box<dyn PhysicalOperator>,
        table: &dyn Table,
        predicate: FieldPredicate,
    ) -> ExecResult<Self> {
        let field_index = table.schema().column_index(&predicate.field).ok_or_else(|| {
            ExecutionError::FieldNotFound {
                table: table.name().to_string(),
                field: predicate.field.clone(),
            }
        })?;

        Ok(Self {
            child,
            predicate,
            field_index,
        })
    }

    fn matches(&self, tuple: &dyn Tuple) -> ExecResult<bool> {
        let cell = tuple.cell_at(self.field_index)?;
        Ok(compare_values(cell, &self.predicate.value)
            .map(|ord| self.predicate.op.holds(ord))
            .unwrap_or(false))
    }
}

impl PhysicalOperator for PredicateOperator {
    fn name(&self) -> &'static str {
        "Predicate"
    }

    fn open(&mut self, trx: TrxHandle) -> ExecResult<()> {
        self.child.open(trx).inspect_err(|e| {
            db_warn!(Component::Filter, "failed to open child operator: {}", e);
        })
    }

    fn next(&mut self) -> ExecResult<Pull> {
        while self.child.next()? == Pull::Row {
            let tuple = self
                .child
                .current_tuple()
                .ok_or(ExecutionError::MissingTuple {
                    operator: self.child.name(),
                })?;

            if self.matches(tuple)? {
                db_trace!(Component::Filter, "row matches {}", self.predicate);
                return Ok(Pull::Row);
            }
        }
        Ok(Pull::Eof)
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.child.current_tuple()
    }

    fn close(&mut self) -> ExecResult<()> {
        self.child.close()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::{
        execution::operators::scan::TableScanOperator,
        storage::table::HeapTable,
        txn::Trx,
        types::{datatype::DataType, schema::{Column, Schema}},
    };

    fn users() -> Arc<HeapTable> {
        let schema = Schema::new(vec![
            Column::new("name", DataType::Varchar { max_len: None }),
            Column::new("age", DataType::Int64),
        ]);
        let t = Arc::new(HeapTable::new("users", schema));
        for (name, age) in [("Alice", Value::Int64(30)), ("Bob", Value::Int64(15)), ("Eve", Value::Null)] {
            t.insert_values(&[Value::String(name.into()), age]).unwrap();
        }
        t
    }

    fn names(op: &mut PredicateOperator) -> Vec<Value> {
        let trx: TrxHandle = Rc::new(RefCell::new(Trx::begin()));
        op.open(trx).unwrap();
        let mut out = Vec::new();
        while op.next().unwrap() == Pull::Row {
            out.push(op.current_tuple().unwrap().cell_at(0).unwrap().clone());
        }
        op.close().unwrap();
        out
    }

    #[test]
    fn filter_removes_rows() {
        let t = users();
        let scan = TableScanOperator::new(t.clone());
        let mut filter = PredicateOperator::new(
            Box::new(scan),
            &*t,
            FieldPredicate::new("age", CompOp::Gt, 18i64),
        )
        .unwrap();

        assert_eq!(names(&mut filter), vec![Value::String("Alice".into())]);
    }

    #[test]
    fn null_never_matches() {
        let t = users();
        let scan = TableScanOperator::new(t.clone());
        let mut filter = PredicateOperator::new(
            Box::new(scan),
            &*t,
            FieldPredicate::new("age", CompOp::NotEq, 0i64),
        )
        .unwrap();

        assert_eq!(names(&mut filter).len(), 2);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let t = users();
        let scan = TableScanOperator::new(t.clone());
        let err = PredicateOperator::new(
            Box::new(scan),
            &*t,
            FieldPredicate::new("height", CompOp::Eq, 1i64),
        )
        .err()
        .unwrap();

        assert_eq!(
            err,
            ExecutionError::FieldNotFound {
                table: "users".into(),
                field: "height".into()
            }
        );
    }

    #[test]
    fn parses_operators() {
        assert_eq!(CompOp::parse("<>"), Some(CompOp::NotEq));
        assert_eq!(CompOp::parse(">="), Some(CompOp::GtEq));
        assert_eq!(CompOp::parse("=>"), None);
    }
}
