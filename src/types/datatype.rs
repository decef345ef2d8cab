//! Logical data types understood by the system.
//!
//! These represent *semantic* types, not physical layout.

use crate::types::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    // Integer types
    Int32,
    Int64,

    // Floating point
    Float64,

    Boolean,

    Varchar { max_len: Option<u32> },

    // Only ever the type of a NULL literal, never of a column
    Null,
}

impl DataType {
    /// Whether a non-null `value` may be stored in a column of this type.
    ///
    /// NULL handling is a column property and is checked separately.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (DataType::Int32, Value::Int32(_))
                | (DataType::Int64, Value::Int64(_))
                | (DataType::Float64, Value::Float64(_))
                | (DataType::Boolean, Value::Boolean(_))
                | (DataType::Varchar { .. }, Value::String(_))
        )
    }

    /// Parses the short type names used by the CLI (`int`, `bigint`,
    /// `double`, `bool`, `string`, `varchar(16)`).
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if let Some(len) = lower
            .strip_prefix("varchar(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return len.parse().ok().map(|n| DataType::Varchar { max_len: Some(n) });
        }

        match lower.as_str() {
            "int" | "int32" => Some(DataType::Int32),
            "bigint" | "int64" => Some(DataType::Int64),
            "double" | "float" | "float64" => Some(DataType::Float64),
            "bool" | "boolean" => Some(DataType::Boolean),
            "string" | "text" | "varchar" => Some(DataType::Varchar { max_len: None }),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Int32 => write!(f, "INT"),
            DataType::Int64 => write!(f, "BIGINT"),
            DataType::Float64 => write!(f, "DOUBLE"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Varchar { max_len: Some(n) } => write!(f, "VARCHAR({n})"),
            DataType::Varchar { max_len: None } => write!(f, "VARCHAR"),
            DataType::Null => write!(f, "NULL"),
        }
    }
}
