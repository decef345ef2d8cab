use std::collections::VecDeque;
use std::sync::Arc;

use crate::{
    db_debug, db_trace,
    debugger::Component,
    execution::{
        errors::{ExecResult, ExecutionError},
        operator::{PhysicalOperator, Pull},
        tuple::{RowTuple, Tuple},
    },
    storage::{errors::StorageError, row_id::RowId, table::Table},
    txn::TrxHandle,
};

/// Full scan over a table. The set of row ids is fixed when the operator
/// is opened; records that disappear before they are reached are skipped.
pub struct TableScanOperator {
    table: Arc<dyn Table>,
    pending: Option<VecDeque<RowId>>,
    current: Option<RowTuple>,
}

impl TableScanOperator {
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self {
            table,
            pending: None,
            current: None,
        }
    }
}

impl PhysicalOperator for TableScanOperator {
    fn name(&self) -> &'static str {
        "TableScan"
    }

    fn open(&mut self, _trx: TrxHandle) -> ExecResult<()> {
        let rids: VecDeque<RowId> = self.table.scan().into();
        db_debug!(
            Component::Scan,
            "open scan on '{}' ({} rows)",
            self.table.name(),
            rids.len()
        );
        self.pending = Some(rids);
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Pull> {
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| ExecutionError::invalid_state("TableScan", "Unopened", "pull from"))?;

        while let Some(rid) = pending.pop_front() {
            match self.table.get(rid) {
                Ok(record) => {
                    db_trace!(Component::Scan, "row {}", rid);
                    self.current = Some(RowTuple::new(record)?);
                    return Ok(Pull::Row);
                }
                Err(StorageError::RecordNotFound { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        self.current = None;
        Ok(Pull::Eof)
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.pending = None;
        self.current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::{
        storage::table::HeapTable,
        txn::Trx,
        types::{datatype::DataType, schema::{Column, Schema}, value::Value},
    };

    fn table(n: i64) -> Arc<HeapTable> {
        let schema = Schema::new(vec![Column::new("id", DataType::Int64)]);
        let t = Arc::new(HeapTable::with_page_capacity("t", schema, 2));
        for i in 0..n {
            t.insert_values(&[Value::Int64(i)]).unwrap();
        }
        t
    }

    fn trx() -> TrxHandle {
        Rc::new(RefCell::new(Trx::begin()))
    }

    #[test]
    fn scan_yields_every_row_then_eof() {
        let t = table(3);
        let mut scan = TableScanOperator::new(t);
        scan.open(trx()).unwrap();

        let mut ids = Vec::new();
        while scan.next().unwrap() == Pull::Row {
            ids.push(scan.current_tuple().unwrap().cell_at(0).unwrap().clone());
        }

        assert_eq!(ids, vec![Value::Int64(0), Value::Int64(1), Value::Int64(2)]);
        assert!(scan.current_tuple().is_none());
        assert_eq!(scan.next().unwrap(), Pull::Eof);
    }

    #[test]
    fn rows_inserted_after_open_are_not_visited() {
        let t = table(2);
        let mut scan = TableScanOperator::new(t.clone());
        scan.open(trx()).unwrap();

        assert_eq!(scan.next().unwrap(), Pull::Row);
        t.insert_values(&[Value::Int64(99)]).unwrap();

        assert_eq!(scan.next().unwrap(), Pull::Row);
        assert_eq!(scan.next().unwrap(), Pull::Eof);
    }

    #[test]
    fn rows_deleted_after_open_are_skipped() {
        let t = table(3);
        let mut scan = TableScanOperator::new(t.clone());
        scan.open(trx()).unwrap();

        let second = t.get(t.scan()[1]).unwrap();
        t.delete_record(&second).unwrap();

        let mut count = 0;
        while scan.next().unwrap() == Pull::Row {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn next_before_open_is_rejected() {
        let mut scan = TableScanOperator::new(table(1));
        assert!(matches!(
            scan.next(),
            Err(ExecutionError::InvalidState { .. })
        ));
    }
}
