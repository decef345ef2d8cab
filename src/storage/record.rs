use crate::{
    storage::{errors::StorageResult, row_id::RowId, value_codec::ValueCodec},
    types::value::Value,
};

/// A table's native representation of a row.
///
/// `rid` is `None` until the record has been inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub rid: Option<RowId>,
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(data: Vec<u8>) -> Self {
        Self { rid: None, data }
    }

    pub fn with_rid(rid: RowId, data: Vec<u8>) -> Self {
        Self {
            rid: Some(rid),
            data,
        }
    }

    pub fn values(&self) -> StorageResult<Vec<Value>> {
        ValueCodec::decode_row(&self.data)
    }
}
