use crate::{
    execution::errors::{ExecResult, ExecutionError},
    storage::{errors::StorageResult, record::Record},
    types::value::Value,
};

/// An in-memory view over a row flowing through the pipeline.
pub trait Tuple {
    fn cell_num(&self) -> usize;

    fn cell_at(&self, index: usize) -> ExecResult<&Value>;

    /// The stored record backing this tuple, if it came straight from a
    /// table.
    fn record(&self) -> Option<&Record>;
}

/// A tuple decoded from one stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTuple {
    record: Record,
    cells: Vec<Value>,
}

impl RowTuple {
    pub fn new(record: Record) -> StorageResult<Self> {
        let cells = record.values()?;
        Ok(Self { record, cells })
    }
}

impl Tuple for RowTuple {
    fn cell_num(&self) -> usize {
        self.cells.len()
    }

    fn cell_at(&self, index: usize) -> ExecResult<&Value> {
        self.cells
            .get(index)
            .ok_or(ExecutionError::CellOutOfBounds {
                index,
                cell_num: self.cells.len(),
            })
    }

    fn record(&self) -> Option<&Record> {
        Some(&self.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{row_id::RowId, value_codec::ValueCodec};

    #[test]
    fn row_tuple_exposes_cells_and_record() {
        let values = vec![Value::Int32(1), Value::String("x".into())];
        let record = Record::with_rid(RowId::new(0, 3), ValueCodec::encode_row(&values));
        let tuple = RowTuple::new(record.clone()).unwrap();

        assert_eq!(tuple.cell_num(), 2);
        assert_eq!(tuple.cell_at(1).unwrap(), &Value::String("x".into()));
        assert_eq!(tuple.record(), Some(&record));
        assert_eq!(
            tuple.cell_at(2),
            Err(ExecutionError::CellOutOfBounds {
                index: 2,
                cell_num: 2
            })
        );
    }
}
