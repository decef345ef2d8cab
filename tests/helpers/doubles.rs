#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use argon::{
    execution::{ExecResult, ExecutionError, PhysicalOperator, Pull, RowTuple, Tuple},
    storage::{
        errors::{StorageError, StorageResult},
        record::Record,
        row_id::RowId,
        table::{HeapTable, Table},
    },
    txn::{
        Transaction, Trx, TrxHandle,
        errors::{TxnError, TxnResult},
    },
    types::{schema::Schema, value::Value},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ChildOpened,
    Pulled(usize),
    ChildEof,
    ChildClosed,
    Delete(Vec<Value>),
    Insert(Vec<Value>),
}

impl Event {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Event::Delete(_) | Event::Insert(_))
    }
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn mutations(log: &EventLog) -> Vec<Event> {
    log.borrow().iter().filter(|e| e.is_mutation()).cloned().collect()
}

pub fn pulls(log: &EventLog) -> usize {
    log.borrow()
        .iter()
        .filter(|e| matches!(e, Event::Pulled(_)))
        .count()
}

/// Insert `rows` into `table` and return tuples bound to the stored records.
pub fn seed(table: &dyn Table, rows: &[Vec<Value>]) -> Vec<RowTuple> {
    rows.iter()
        .map(|values| {
            let mut record = table.make_record(values).unwrap();
            table.insert_record(&mut record).unwrap();
            RowTuple::new(record).unwrap()
        })
        .collect()
}

pub fn table_rows(table: &dyn Table) -> Vec<Vec<Value>> {
    table
        .scan()
        .into_iter()
        .map(|rid| table.get(rid).unwrap().values().unwrap())
        .collect()
}

/// Child operator replaying a fixed list of tuples.
///
/// It refuses to hand out another row once any mutation has reached the
/// shared log, so an update that writes mid-scan fails loudly.
pub struct VecChild {
    rows: Vec<RowTuple>,
    pos: usize,
    current: Option<RowTuple>,
    log: EventLog,
    pub fail_open: Option<ExecutionError>,
    /// Fail the n-th call to `next` (1-based).
    pub fail_next_at: Option<(usize, ExecutionError)>,
    pub fail_close: Option<ExecutionError>,
    /// Report a row at this position without exposing a tuple.
    pub missing_tuple_at: Option<usize>,
    calls: usize,
}

impl VecChild {
    pub fn new(rows: Vec<RowTuple>, log: EventLog) -> Self {
        Self {
            rows,
            pos: 0,
            current: None,
            log,
            fail_open: None,
            fail_next_at: None,
            fail_close: None,
            missing_tuple_at: None,
            calls: 0,
        }
    }
}

impl PhysicalOperator for VecChild {
    fn name(&self) -> &'static str {
        "VecChild"
    }

    fn open(&mut self, _trx: TrxHandle) -> ExecResult<()> {
        if let Some(err) = self.fail_open.clone() {
            return Err(err);
        }
        self.log.borrow_mut().push(Event::ChildOpened);
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Pull> {
        assert!(
            !self.log.borrow().iter().any(Event::is_mutation),
            "table mutated while the child was still being pulled"
        );

        self.calls += 1;
        if let Some((at, err)) = &self.fail_next_at {
            if *at == self.calls {
                self.current = None;
                return Err(err.clone());
            }
        }

        if self.pos >= self.rows.len() {
            self.current = None;
            self.log.borrow_mut().push(Event::ChildEof);
            return Ok(Pull::Eof);
        }

        let pos = self.pos;
        self.pos += 1;
        self.log.borrow_mut().push(Event::Pulled(pos));
        self.current = if self.missing_tuple_at == Some(pos) {
            None
        } else {
            Some(self.rows[pos].clone())
        };
        Ok(Pull::Row)
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.log.borrow_mut().push(Event::ChildClosed);
        match self.fail_close.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Tuple with cells but no backing record, like a projection's output.
pub struct DetachedTuple(pub Vec<Value>);

impl Tuple for DetachedTuple {
    fn cell_num(&self) -> usize {
        self.0.len()
    }

    fn cell_at(&self, index: usize) -> ExecResult<&Value> {
        self.0.get(index).ok_or(ExecutionError::CellOutOfBounds {
            index,
            cell_num: self.0.len(),
        })
    }

    fn record(&self) -> Option<&Record> {
        None
    }
}

pub struct DetachedChild {
    row: DetachedTuple,
    done: bool,
}

impl DetachedChild {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            row: DetachedTuple(values),
            done: false,
        }
    }
}

impl PhysicalOperator for DetachedChild {
    fn name(&self) -> &'static str {
        "DetachedChild"
    }

    fn open(&mut self, _trx: TrxHandle) -> ExecResult<()> {
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Pull> {
        if self.done {
            return Ok(Pull::Eof);
        }
        self.done = true;
        Ok(Pull::Row)
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        Some(&self.row)
    }

    fn close(&mut self) -> ExecResult<()> {
        Ok(())
    }
}

/// Heap table whose `make_record` fails on the n-th call (1-based) after
/// `arm` is called.
pub struct FlakyTable {
    inner: HeapTable,
    fail_make_at: usize,
    calls: AtomicUsize,
    armed: AtomicBool,
}

impl FlakyTable {
    pub fn new(inner: HeapTable, fail_make_at: usize) -> Self {
        Self {
            inner,
            fail_make_at,
            calls: AtomicUsize::new(0),
            armed: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn make_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Table for FlakyTable {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    fn make_record(&self, values: &[Value]) -> StorageResult<Record> {
        if self.armed.load(Ordering::SeqCst) {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_make_at {
                return Err(StorageError::ArityMismatch {
                    expected: self.inner.schema().len(),
                    found: 0,
                });
            }
        }
        self.inner.make_record(values)
    }

    fn insert_record(&self, record: &mut Record) -> StorageResult<RowId> {
        self.inner.insert_record(record)
    }

    fn restore_record(&self, record: &Record) -> StorageResult<()> {
        self.inner.restore_record(record)
    }

    fn delete_record(&self, record: &Record) -> StorageResult<()> {
        self.inner.delete_record(record)
    }

    fn get(&self, rid: RowId) -> StorageResult<Record> {
        self.inner.get(rid)
    }

    fn scan(&self) -> Vec<RowId> {
        self.inner.scan()
    }
}

/// Transaction that logs every mutation before delegating to a real `Trx`,
/// optionally rejecting the n-th delete or insert (1-based).
pub struct RecordingTrx {
    pub inner: Trx,
    log: EventLog,
    pub fail_delete_at: Option<usize>,
    pub fail_insert_at: Option<usize>,
    deletes: usize,
    inserts: usize,
}

impl RecordingTrx {
    pub fn new(log: EventLog) -> Self {
        Self {
            inner: Trx::begin(),
            log,
            fail_delete_at: None,
            fail_insert_at: None,
            deletes: 0,
            inserts: 0,
        }
    }

    pub fn into_handle(self) -> (Rc<RefCell<RecordingTrx>>, TrxHandle) {
        let trx = Rc::new(RefCell::new(self));
        let handle: TrxHandle = trx.clone();
        (trx, handle)
    }

    fn rejected(&self) -> TxnError {
        TxnError::NotActive {
            trx_id: self.inner.id(),
        }
    }
}

impl Transaction for RecordingTrx {
    fn id(&self) -> u64 {
        self.inner.id()
    }

    fn delete_record(&mut self, table: &Arc<dyn Table>, record: &Record) -> TxnResult<()> {
        self.deletes += 1;
        self.log
            .borrow_mut()
            .push(Event::Delete(record.values().unwrap()));
        if self.fail_delete_at == Some(self.deletes) {
            return Err(self.rejected());
        }
        self.inner.delete_record(table, record)
    }

    fn insert_record(&mut self, table: &Arc<dyn Table>, record: &mut Record) -> TxnResult<()> {
        self.inserts += 1;
        self.log
            .borrow_mut()
            .push(Event::Insert(record.values().unwrap()));
        if self.fail_insert_at == Some(self.inserts) {
            return Err(self.rejected());
        }
        self.inner.insert_record(table, record)
    }
}
