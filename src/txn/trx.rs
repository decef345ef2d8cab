use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    db_debug, db_trace, db_warn,
    debugger::Component,
    storage::{record::Record, table::Table},
    txn::errors::{TxnError, TxnResult},
};

/// Mutation entry points of the ambient unit of work.
pub trait Transaction {
    fn id(&self) -> u64;

    fn delete_record(&mut self, table: &Arc<dyn Table>, record: &Record) -> TxnResult<()>;

    /// Insert `record`; on success its row id is filled in.
    fn insert_record(&mut self, table: &Arc<dyn Table>, record: &mut Record) -> TxnResult<()>;
}

/// Shared handle to the transaction a statement's pipeline runs under.
/// Owned by the caller; operators keep a clone between `open` and `close`.
pub type TrxHandle = Rc<RefCell<dyn Transaction>>;

static NEXT_TRX_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrxState {
    Active,
    Committed,
    RolledBack,
}

enum UndoEntry {
    Deleted { table: Arc<dyn Table>, record: Record },
    Inserted { table: Arc<dyn Table>, record: Record },
}

/// Default transaction: applies mutations directly to the tables and keeps
/// an undo log so that `rollback` can reverse them.
pub struct Trx {
    id: u64,
    state: TrxState,
    undo: Vec<UndoEntry>,
}

impl Trx {
    pub fn begin() -> Self {
        let id = NEXT_TRX_ID.fetch_add(1, Ordering::Relaxed);
        db_debug!(Component::Txn, "begin trx {}", id);
        Self {
            id,
            state: TrxState::Active,
            undo: Vec::new(),
        }
    }

    pub fn state(&self) -> TrxState {
        self.state
    }

    /// Number of mutations applied so far.
    pub fn pending(&self) -> usize {
        self.undo.len()
    }

    pub fn commit(&mut self) -> TxnResult<()> {
        self.ensure_active()?;
        db_debug!(
            Component::Txn,
            "commit trx {} ({} mutations)",
            self.id,
            self.undo.len()
        );
        self.undo.clear();
        self.state = TrxState::Committed;
        Ok(())
    }

    /// Reverse every applied mutation, newest first. An entry that cannot be
    /// undone does not stop the remaining ones; the first failure is returned.
    pub fn rollback(&mut self) -> TxnResult<()> {
        self.ensure_active()?;
        db_debug!(
            Component::Txn,
            "rollback trx {} ({} mutations)",
            self.id,
            self.undo.len()
        );

        let mut first_err = None;
        while let Some(entry) = self.undo.pop() {
            let result = match &entry {
                UndoEntry::Deleted { table, record } => table.restore_record(record),
                UndoEntry::Inserted { table, record } => table.delete_record(record),
            };
            if let Err(err) = result {
                db_warn!(Component::Txn, "undo in trx {} failed: {}", self.id, err);
                first_err.get_or_insert(err);
            }
        }
        self.state = TrxState::RolledBack;

        match first_err {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn ensure_active(&self) -> TxnResult<()> {
        if self.state != TrxState::Active {
            return Err(TxnError::NotActive { trx_id: self.id });
        }
        Ok(())
    }
}

impl Transaction for Trx {
    fn id(&self) -> u64 {
        self.id
    }

    fn delete_record(&mut self, table: &Arc<dyn Table>, record: &Record) -> TxnResult<()> {
        self.ensure_active()?;
        table.delete_record(record)?;
        db_trace!(Component::Txn, "trx {} deleted {:?}", self.id, record.rid);
        self.undo.push(UndoEntry::Deleted {
            table: table.clone(),
            record: record.clone(),
        });
        Ok(())
    }

    fn insert_record(&mut self, table: &Arc<dyn Table>, record: &mut Record) -> TxnResult<()> {
        self.ensure_active()?;
        table.insert_record(record)?;
        db_trace!(Component::Txn, "trx {} inserted {:?}", self.id, record.rid);
        self.undo.push(UndoEntry::Inserted {
            table: table.clone(),
            record: record.clone(),
        });
        Ok(())
    }
}
