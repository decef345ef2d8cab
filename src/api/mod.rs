pub mod db;

pub use db::{Database, QueryResult, UpdateOutcome};
