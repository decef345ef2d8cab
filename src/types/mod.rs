//! Core type contracts: values, logical types and table schemas.
//!
//! No IO and no dependencies on other modules.

pub mod datatype;
pub mod schema;
pub mod value;
