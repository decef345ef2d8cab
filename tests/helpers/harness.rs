#![allow(dead_code)]

use argon::api::db::{Database, QueryResult, UpdateOutcome};
use argon::catalog::Catalog;
use argon::types::value::Value;

pub struct TestDB {
    pub db: Database,
}

impl TestDB {
    pub fn new() -> Self {
        Self {
            db: Database::new(),
        }
    }

    /// Small pages so a handful of rows already spans several of them.
    pub fn with_page_capacity(page_capacity: usize) -> Self {
        Self {
            db: Database::with_catalog(Catalog::with_page_capacity(page_capacity)),
        }
    }

    pub fn exec(&mut self, script: &str) -> Result<QueryResult, anyhow::Error> {
        let mut last = QueryResult::Empty;
        for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
            last = self.db.query(line)?;
        }
        Ok(last)
    }

    pub fn update(&mut self, line: &str) -> Result<UpdateOutcome, anyhow::Error> {
        match self.db.query(line)? {
            QueryResult::Updated(outcome) => Ok(outcome),
            other => anyhow::bail!("Expected update outcome, got {:?}", other),
        }
    }

    /// Rows of `table`, sorted so results do not depend on slot placement.
    pub fn rows(&mut self, table: &str) -> Result<Vec<Vec<Value>>, anyhow::Error> {
        match self.db.query(&format!("select {table}"))? {
            QueryResult::Rows { mut rows, .. } => {
                rows.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                Ok(rows)
            }
            other => anyhow::bail!("Expected rows, got {:?}", other),
        }
    }
}
