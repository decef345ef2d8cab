use std::sync::Arc;

use crate::{
    db_debug, db_scope, db_trace, db_warn,
    debugger::{Component, DebugLevel},
    execution::{
        errors::{ExecResult, ExecutionError},
        operator::{PhysicalOperator, Pull},
        tuple::Tuple,
    },
    storage::{record::Record, table::Table},
    txn::TrxHandle,
    types::{schema::Schema, value::Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorState {
    Unopened,
    Opened,
    /// The change set has been applied; further pulls report end of stream.
    Exhausted,
    /// A pull or apply step failed; the operator must be closed.
    Failed,
    Closed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStats {
    pub rows_matched: u64,
    pub records_deleted: u64,
    pub records_inserted: u64,
}

/// Old records to delete and their replacements, index-aligned.
#[derive(Debug, Default)]
struct ChangeSet {
    deletes: Vec<Record>,
    inserts: Vec<Record>,
}

impl ChangeSet {
    fn push(&mut self, old: Record, new: Record) {
        self.deletes.push(old);
        self.inserts.push(new);
    }

    fn len(&self) -> usize {
        debug_assert_eq!(self.deletes.len(), self.inserts.len());
        self.deletes.len()
    }
}

/// Position of `field` in `schema`: exact, case-sensitive, first match.
pub fn resolve_field_index(schema: &Schema, table: &str, field: &str) -> ExecResult<usize> {
    schema
        .column_index(field)
        .ok_or_else(|| ExecutionError::FieldNotFound {
            table: table.to_string(),
            field: field.to_string(),
        })
}

/// Copy every cell of `tuple` in schema order, substituting `value` at
/// `target`.
pub fn rebuild_cells(
    tuple: &dyn Tuple,
    arity: usize,
    target: usize,
    value: &Value,
) -> ExecResult<Vec<Value>> {
    (0..arity)
        .map(|pos| {
            if pos == target {
                Ok(value.clone())
            } else {
                tuple.cell_at(pos).cloned()
            }
        })
        .collect()
}

/// Sets one field of every row produced by its child.
///
/// `next` drains the child completely, building the full change set
/// before touching the table, then applies it as delete/insert pairs
/// through the bound transaction. It never produces rows: success is
/// reported as end of stream.
pub struct UpdateOperator {
    table: Arc<dyn Table>,
    field: String,
    value: Value,
    child: Option<Box<dyn PhysicalOperator>>,
    trx: Option<TrxHandle>,
    state: OperatorState,
    stats: UpdateStats,
}

impl UpdateOperator {
    pub fn new(table: Arc<dyn Table>, field: impl Into<String>, value: Value) -> Self {
        Self {
            table,
            field: field.into(),
            value,
            child: None,
            trx: None,
            state: OperatorState::Unopened,
            stats: UpdateStats::default(),
        }
    }

    pub fn with_child(mut self, child: Box<dyn PhysicalOperator>) -> Self {
        self.child = Some(child);
        self
    }

    /// Attach the source of matched rows. Only one child is supported and
    /// it must be attached before `open`.
    pub fn set_child(&mut self, child: Box<dyn PhysicalOperator>) -> ExecResult<()> {
        if self.state != OperatorState::Unopened || self.child.is_some() {
            return Err(ExecutionError::invalid_state(
                self.name(),
                self.state,
                "attach child to",
            ));
        }
        self.child = Some(child);
        Ok(())
    }

    pub fn state(&self) -> OperatorState {
        self.state
    }

    pub fn stats(&self) -> UpdateStats {
        self.stats
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Pull the child dry, recording each matched record and its rebuilt
    /// replacement. Nothing is written to the table here.
    fn collect_changes(
        child: &mut dyn PhysicalOperator,
        table: &dyn Table,
        target: usize,
        value: &Value,
    ) -> ExecResult<ChangeSet> {
        let arity = table.schema().len();
        let mut changes = ChangeSet::default();

        while child.next()? == Pull::Row {
            let tuple = child.current_tuple().ok_or(ExecutionError::MissingTuple {
                operator: child.name(),
            })?;

            let old = tuple.record().ok_or(ExecutionError::UnboundTuple)?.clone();
            let cells = rebuild_cells(tuple, arity, target, value)?;
            let new = table
                .make_record(&cells)
                .map_err(ExecutionError::RecordConstruction)?;

            db_trace!(Component::Update, "prepared {:?}: {:?}", old.rid, cells);
            changes.push(old, new);
        }

        Ok(changes)
    }

    /// Delete then insert each pair, in matched-row order. The first failure
    /// stops the loop; pairs already applied are left for the transaction to
    /// roll back.
    fn apply_changes(
        trx: &TrxHandle,
        table: &Arc<dyn Table>,
        changes: ChangeSet,
        stats: &mut UpdateStats,
    ) -> ExecResult<()> {
        let mut trx = trx.borrow_mut();

        for (old, mut new) in changes.deletes.into_iter().zip(changes.inserts) {
            trx.delete_record(table, &old)
                .map_err(|source| ExecutionError::DeleteFailed {
                    rid: old.rid,
                    source,
                })?;
            stats.records_deleted += 1;

            trx.insert_record(table, &mut new)
                .map_err(|source| ExecutionError::InsertFailed { source })?;
            stats.records_inserted += 1;

            db_trace!(Component::Update, "moved {:?} -> {:?}", old.rid, new.rid);
        }

        Ok(())
    }

    fn run(&mut self) -> ExecResult<()> {
        let (Some(child), Some(trx)) = (self.child.as_mut(), self.trx.as_ref()) else {
            return Err(ExecutionError::invalid_state("Update", self.state, "pull from"));
        };

        let target = resolve_field_index(self.table.schema(), self.table.name(), &self.field)?;

        let changes = db_scope!(DebugLevel::Debug, Component::Update, "collect", {
            Self::collect_changes(&mut **child, &*self.table, target, &self.value)
        })?;

        self.stats.rows_matched = changes.len() as u64;
        db_debug!(
            Component::Update,
            "set {} = {} on {} rows of '{}'",
            self.field,
            self.value,
            changes.len(),
            self.table.name()
        );

        db_scope!(DebugLevel::Debug, Component::Update, "apply", {
            Self::apply_changes(trx, &self.table, changes, &mut self.stats)
        })
    }
}

impl PhysicalOperator for UpdateOperator {
    fn name(&self) -> &'static str {
        "Update"
    }

    fn open(&mut self, trx: TrxHandle) -> ExecResult<()> {
        if self.state != OperatorState::Unopened {
            return Err(ExecutionError::invalid_state(self.name(), self.state, "open"));
        }

        if let Some(child) = self.child.as_mut() {
            child.open(trx.clone()).inspect_err(|e| {
                db_warn!(Component::Update, "failed to open child operator: {}", e);
            })?;
            self.trx = Some(trx);
        }

        self.stats = UpdateStats::default();
        self.state = OperatorState::Opened;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Pull> {
        if self.child.is_none() {
            return Ok(Pull::Eof);
        }

        match self.state {
            OperatorState::Opened => {}
            OperatorState::Exhausted => return Ok(Pull::Eof),
            state => return Err(ExecutionError::invalid_state(self.name(), state, "pull from")),
        }

        match self.run() {
            Ok(()) => {
                self.state = OperatorState::Exhausted;
                Ok(Pull::Eof)
            }
            Err(err) => {
                db_warn!(Component::Update, "update of '{}' failed: {}", self.table.name(), err);
                self.state = OperatorState::Failed;
                Err(err)
            }
        }
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        None
    }

    fn close(&mut self) -> ExecResult<()> {
        if self.state == OperatorState::Closed {
            return Ok(());
        }

        self.state = OperatorState::Closed;
        self.trx = None;

        match self.child.as_mut() {
            Some(child) => child.close(),
            None => Ok(()),
        }
    }
}
