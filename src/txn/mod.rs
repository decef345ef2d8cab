pub mod errors;
pub mod trx;

pub use trx::{Transaction, TrxHandle, Trx, TrxState};
