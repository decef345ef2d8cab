use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::{
    catalog::Catalog,
    db_debug, db_error, db_warn,
    debugger::Component,
    execution::{
        errors::ExecResult,
        operator::{PhysicalOperator, Pull},
        operators::{FieldPredicate, PredicateOperator, TableScanOperator, UpdateOperator},
    },
    frontend::command::{Command, parse_command},
    storage::{row_id::RowId, table::Table},
    txn::{Transaction, Trx, TrxHandle},
    types::{
        datatype::DataType,
        schema::{Column, Schema},
        value::Value,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub trx_id: u64,
    pub rows_affected: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Inserted(RowId),
    Updated(UpdateOutcome),
    Tables(Vec<String>),
    Empty,
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows { columns, rows } => {
                writeln!(f, "{}", columns.join(" | "))?;
                for row in rows {
                    let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                    writeln!(f, "{}", cells.join(" | "))?;
                }
                write!(f, "({} rows)", rows.len())
            }
            QueryResult::Inserted(rid) => write!(f, "inserted {}", rid),
            QueryResult::Updated(outcome) => {
                write!(f, "updated {} rows", outcome.rows_affected)
            }
            QueryResult::Tables(names) => write!(f, "{}", names.join("\n")),
            QueryResult::Empty => write!(f, "ok"),
        }
    }
}

/// Adapts a literal to the declared type of `column`, the way a binder
/// would before handing it to execution. Integers narrow or widen to the
/// column's numeric type; everything else must already match.
pub fn bind_literal(column: &Column, value: Value) -> Result<Value> {
    let bound = match (&column.ty, value) {
        (_, Value::Null) => Value::Null,
        (DataType::Int32, Value::Int64(v)) => Value::Int32(
            i32::try_from(v).with_context(|| format!("{} out of range for '{}'", v, column.name))?,
        ),
        (DataType::Int64, Value::Int32(v)) => Value::Int64(i64::from(v)),
        (DataType::Float64, Value::Int64(v)) => Value::Float64(v as f64),
        (DataType::Float64, Value::Int32(v)) => Value::Float64(f64::from(v)),
        (ty, v) if ty.accepts(&v) => v,
        (ty, v) => bail!("cannot assign {} to column '{}' of type {}", v, column.name, ty),
    };
    Ok(bound)
}

/// Drive a sink operator through its whole lifecycle. `close` runs even
/// when `open` or `next` fail; the first error wins.
pub fn run_to_completion(op: &mut dyn PhysicalOperator, trx: TrxHandle) -> ExecResult<()> {
    let run = drain(op, trx);
    let closed = op.close();
    run.and(closed)
}

fn drain(op: &mut dyn PhysicalOperator, trx: TrxHandle) -> ExecResult<()> {
    op.open(trx)?;
    while op.next()? == Pull::Row {}
    Ok(())
}

pub struct Database {
    catalog: Catalog,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
        }
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn create_table(&mut self, name: &str, schema: Schema) -> Result<()> {
        self.catalog.create_table(name, schema)?;
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.catalog.drop_table(name)
    }

    pub fn insert(&self, table: &str, values: Vec<Value>) -> Result<RowId> {
        let heap = self.catalog.get_table(table)?;
        let schema = heap.schema();
        if values.len() != schema.len() {
            bail!(
                "table '{}' has {} columns but {} values were supplied",
                table,
                schema.len(),
                values.len()
            );
        }

        let values = schema
            .columns
            .iter()
            .zip(values)
            .map(|(col, v)| bind_literal(col, v))
            .collect::<Result<Vec<_>>>()?;

        let table: Arc<dyn Table> = heap;
        let mut record = table.make_record(&values)?;
        let mut trx = Trx::begin();
        trx.insert_record(&table, &mut record)?;
        trx.commit()?;

        record
            .rid
            .with_context(|| format!("insert into '{}' assigned no row id", table.name()))
    }

    pub fn select(&self, table: &str) -> Result<Vec<Vec<Value>>> {
        let heap = self.catalog.get_table(table)?;
        let mut rows = Vec::new();
        for rid in heap.scan() {
            rows.push(heap.get(rid)?.values()?);
        }
        Ok(rows)
    }

    /// `UPDATE <table> SET <field> = <value> [WHERE <predicate>]`.
    ///
    /// Runs in its own transaction, committed on success and rolled back on
    /// any failure, so a failed statement leaves the table untouched.
    pub fn update(
        &self,
        table: &str,
        field: &str,
        value: Value,
        predicate: Option<FieldPredicate>,
    ) -> Result<UpdateOutcome> {
        let heap = self.catalog.get_table(table)?;
        let schema = heap.schema();
        let column_of = |name: &str| schema.column_index(name).and_then(|i| schema.field(i));

        // Unknown names are left for the operators to reject.
        let value = match column_of(field) {
            Some(column) => bind_literal(column, value)?,
            None => value,
        };
        let predicate = match predicate {
            Some(mut p) => {
                if let Some(column) = column_of(&p.field) {
                    p.value = bind_literal(column, p.value).with_context(|| {
                        format!("invalid comparison in WHERE on '{}'", p.field)
                    })?;
                }
                Some(p)
            }
            None => None,
        };

        let target: Arc<dyn Table> = heap;
        let mut source: Box<dyn PhysicalOperator> = Box::new(TableScanOperator::new(target.clone()));
        if let Some(p) = predicate {
            source = Box::new(PredicateOperator::new(source, &*target, p)?);
        }
        let mut update = UpdateOperator::new(target, field, value).with_child(source);

        let trx = Rc::new(RefCell::new(Trx::begin()));
        let trx_id = trx.borrow().id();
        let handle: TrxHandle = trx.clone();

        match run_to_completion(&mut update, handle) {
            Ok(()) => {
                trx.borrow_mut().commit()?;
                let rows_affected = update.stats().rows_matched;
                db_debug!(
                    Component::Api,
                    "trx {} updated {} rows of '{}'",
                    trx_id,
                    rows_affected,
                    table
                );
                Ok(UpdateOutcome {
                    trx_id,
                    rows_affected,
                })
            }
            Err(err) => {
                db_warn!(Component::Api, "rolling back trx {}: {}", trx_id, err);
                if let Err(rollback_err) = trx.borrow_mut().rollback() {
                    db_error!(
                        Component::Api,
                        "rollback of trx {} failed: {}",
                        trx_id,
                        rollback_err
                    );
                    return Err(rollback_err)
                        .with_context(|| format!("rollback after failed update: {}", err));
                }
                Err(err).with_context(|| format!("update of '{}' failed", table))
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<QueryResult> {
        match command {
            Command::Create { table, schema } => {
                self.create_table(&table, schema)?;
                Ok(QueryResult::Empty)
            }
            Command::Drop { table } => {
                self.drop_table(&table)?;
                Ok(QueryResult::Empty)
            }
            Command::Insert { table, values } => Ok(QueryResult::Inserted(self.insert(&table, values)?)),
            Command::Select { table } => {
                let columns = self
                    .catalog
                    .get_table(&table)?
                    .schema()
                    .column_names()
                    .into_iter()
                    .map(String::from)
                    .collect();
                let rows = self.select(&table)?;
                Ok(QueryResult::Rows { columns, rows })
            }
            Command::Update {
                table,
                field,
                value,
                predicate,
            } => Ok(QueryResult::Updated(self.update(&table, &field, value, predicate)?)),
            Command::Tables => Ok(QueryResult::Tables(
                self.catalog.table_names().into_iter().map(String::from).collect(),
            )),
            Command::Help | Command::Exit => Ok(QueryResult::Empty),
        }
    }

    pub fn query(&mut self, line: &str) -> Result<QueryResult> {
        let command = parse_command(line)?;
        self.execute(command)
    }
}
