pub mod errors;
pub mod operator;
pub mod operators;
pub mod tuple;
pub mod value_cmp;

pub use errors::{ExecResult, ExecutionError};
pub use operator::{PhysicalOperator, Pull};
pub use tuple::{RowTuple, Tuple};
