use std::fmt;

use crate::storage::errors::StorageError;

pub type TxnResult<T> = Result<T, TxnError>;

#[derive(Debug, Clone, PartialEq)]
pub enum TxnError {
    /// The transaction already committed or rolled back.
    NotActive { trx_id: u64 },

    Storage(StorageError),
}

impl fmt::Display for TxnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnError::NotActive { trx_id } => {
                write!(f, "transaction {} is no longer active", trx_id)
            }
            TxnError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for TxnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TxnError::Storage(err) => Some(err),
            TxnError::NotActive { .. } => None,
        }
    }
}

impl From<StorageError> for TxnError {
    fn from(err: StorageError) -> Self {
        TxnError::Storage(err)
    }
}
