use std::fmt;

use crate::storage::row_id::RowId;
use crate::types::datatype::DataType;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    RecordNotFound { table: String, rid: RowId },

    /// A record was handed to the table without ever having been inserted.
    MissingRowId { table: String },

    SlotOccupied { table: String, rid: RowId },

    ArityMismatch { expected: usize, found: usize },

    TypeMismatch { column: String, expected: DataType, found: DataType },

    NullViolation { column: String },

    ValueTooLong { column: String, max_len: u32, len: usize },

    Corrupted { reason: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::RecordNotFound { table, rid } => {
                write!(f, "storage error: record {} not found in '{}'", rid, table)
            }

            StorageError::MissingRowId { table } => {
                write!(f, "storage error: record for '{}' has no row id", table)
            }

            StorageError::SlotOccupied { table, rid } => {
                write!(f, "storage error: slot {} in '{}' is occupied", rid, table)
            }

            StorageError::ArityMismatch { expected, found } => {
                write!(
                    f,
                    "storage error: expected {} values, found {}",
                    expected, found
                )
            }

            StorageError::TypeMismatch {
                column,
                expected,
                found,
            } => {
                write!(
                    f,
                    "storage error: column '{}' expects {}, found {}",
                    column, expected, found
                )
            }

            StorageError::NullViolation { column } => {
                write!(f, "storage error: column '{}' is NOT NULL", column)
            }

            StorageError::ValueTooLong {
                column,
                max_len,
                len,
            } => {
                write!(
                    f,
                    "storage error: value of length {} exceeds VARCHAR({}) in '{}'",
                    len, max_len, column
                )
            }

            StorageError::Corrupted { reason } => {
                write!(f, "storage error: corrupted record ({})", reason)
            }
        }
    }
}

impl std::error::Error for StorageError {}
