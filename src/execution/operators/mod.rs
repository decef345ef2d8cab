pub mod filter;
pub mod scan;
pub mod update;

pub use filter::{CompOp, FieldPredicate, PredicateOperator};
pub use scan::TableScanOperator;
pub use update::{OperatorState, UpdateOperator, UpdateStats};
