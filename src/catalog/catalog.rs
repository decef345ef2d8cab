use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Result, anyhow, bail};

use crate::{
    db_info,
    debugger::Component,
    storage::table::{DEFAULT_PAGE_CAPACITY, HeapTable},
    types::schema::Schema,
};

/// Named tables known to a database.
pub struct Catalog {
    tables: BTreeMap<String, Arc<HeapTable>>,
    page_capacity: usize,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_page_capacity(DEFAULT_PAGE_CAPACITY)
    }

    pub fn with_page_capacity(page_capacity: usize) -> Self {
        Self {
            tables: BTreeMap::new(),
            page_capacity,
        }
    }

    pub fn create_table(&mut self, name: &str, schema: Schema) -> Result<Arc<HeapTable>> {
        if self.tables.contains_key(name) {
            bail!("table '{}' already exists", name);
        }
        if schema.is_empty() {
            bail!("table '{}' must have at least one column", name);
        }
        for (i, column) in schema.columns.iter().enumerate() {
            if schema.column_index(&column.name) != Some(i) {
                bail!("duplicate column '{}' in table '{}'", column.name, name);
            }
        }

        let heap = Arc::new(HeapTable::with_page_capacity(
            name,
            schema,
            self.page_capacity,
        ));
        self.tables.insert(name.to_string(), heap.clone());
        db_info!(Component::Api, "created table '{}'", name);
        Ok(heap)
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.tables
            .remove(name)
            .ok_or_else(|| anyhow!("table '{}' not found", name))?;
        db_info!(Component::Api, "dropped table '{}'", name);
        Ok(())
    }

    pub fn get_table(&self, name: &str) -> Result<Arc<HeapTable>> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("table '{}' not found", name))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(|k| k.as_str()).collect()
    }
}
