use std::fmt;

use crate::{
    storage::{errors::StorageError, row_id::RowId},
    txn::errors::TxnError,
};

pub type ExecResult<T> = Result<T, ExecutionError>;

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ExecutionError {
    // ----------------------------
    // Operator protocol
    // ----------------------------
    InvalidState {
        operator: &'static str,
        state: String,
        action: &'static str,
    },

    /// The child reported a row but exposes no current tuple.
    MissingTuple {
        operator: &'static str,
    },

    /// The tuple is not backed by a stored record, so it cannot be deleted.
    UnboundTuple,

    CellOutOfBounds {
        index: usize,
        cell_num: usize,
    },

    // ----------------------------
    // Resolution
    // ----------------------------
    FieldNotFound {
        table: String,
        field: String,
    },

    // ----------------------------
    // Storage / transaction passthrough
    // ----------------------------
    RecordConstruction(StorageError),

    DeleteFailed {
        rid: Option<RowId>,
        source: TxnError,
    },

    InsertFailed {
        source: TxnError,
    },

    Storage(StorageError),
}

impl From<StorageError> for ExecutionError {
    fn from(err: StorageError) -> Self {
        ExecutionError::Storage(err)
    }
}

impl ExecutionError {
    pub fn invalid_state(
        operator: &'static str,
        state: impl fmt::Debug,
        action: &'static str,
    ) -> Self {
        ExecutionError::InvalidState {
            operator,
            state: format!("{:?}", state),
            action,
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::InvalidState {
                operator,
                state,
                action,
            } => write!(f, "cannot {} {} operator in state {}", action, operator, state),
            ExecutionError::MissingTuple { operator } => {
                write!(f, "{} operator produced a row without a tuple", operator)
            }
            ExecutionError::UnboundTuple => {
                write!(f, "tuple is not bound to a stored record")
            }
            ExecutionError::CellOutOfBounds { index, cell_num } => {
                write!(f, "cell index {} out of bounds ({} cells)", index, cell_num)
            }
            ExecutionError::FieldNotFound { table, field } => {
                write!(f, "field '{}' does not exist in table '{}'", field, table)
            }
            ExecutionError::RecordConstruction(err) => {
                write!(f, "failed to make record: {}", err)
            }
            ExecutionError::DeleteFailed { rid: Some(rid), source } => {
                write!(f, "failed to delete record {}: {}", rid, source)
            }
            ExecutionError::DeleteFailed { rid: None, source } => {
                write!(f, "failed to delete record: {}", source)
            }
            ExecutionError::InsertFailed { source } => {
                write!(f, "failed to insert record: {}", source)
            }
            ExecutionError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutionError::RecordConstruction(err) | ExecutionError::Storage(err) => Some(err),
            ExecutionError::DeleteFailed { source, .. } | ExecutionError::InsertFailed { source } => {
                Some(source)
            }
            _ => None,
        }
    }
}
