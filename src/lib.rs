pub mod config;

pub mod api;
pub mod catalog;
pub mod debugger;
pub mod execution;
pub mod frontend;
pub mod storage;
pub mod txn;
pub mod types;
