use crate::{
    execution::{errors::ExecResult, tuple::Tuple},
    txn::TrxHandle,
};

/// Outcome of a successful pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// A row was produced; read it through `current_tuple`.
    Row,
    /// End of stream.
    Eof,
}

/// A node of the pull-based execution pipeline.
///
/// Operators are single-threaded and not reentrant: the caller drives
/// `open`, then `next` until `Pull::Eof` or an error, then `close`.
pub trait PhysicalOperator {
    fn name(&self) -> &'static str;

    /// Prepare the operator (open children, bind the transaction).
    /// No rows are produced here.
    fn open(&mut self, trx: TrxHandle) -> ExecResult<()>;

    /// Advance to the next row.
    ///
    /// - Ok(Pull::Row) → `current_tuple` holds the row
    /// - Ok(Pull::Eof) → end of stream
    /// - Err(e)        → execution/storage error
    fn next(&mut self) -> ExecResult<Pull>;

    /// The row produced by the last successful `next`.
    fn current_tuple(&self) -> Option<&dyn Tuple>;

    fn close(&mut self) -> ExecResult<()>;
}
