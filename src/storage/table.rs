use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    db_trace,
    debugger::Component,
    storage::{
        errors::{StorageError, StorageResult},
        record::Record,
        row_id::RowId,
        value_codec::ValueCodec,
    },
    types::{datatype::DataType, schema::Schema, value::Value},
};

pub const DEFAULT_PAGE_CAPACITY: usize = 64;

pub trait Table: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> &Schema;

    /// Assemble a fresh, unidentified record from one value per column.
    fn make_record(&self, values: &[Value]) -> StorageResult<Record>;

    /// Store `record`, assign its row id and return it.
    fn insert_record(&self, record: &mut Record) -> StorageResult<RowId>;

    /// Put a previously deleted record back at its original row id.
    fn restore_record(&self, record: &Record) -> StorageResult<()>;

    fn delete_record(&self, record: &Record) -> StorageResult<()>;

    fn get(&self, rid: RowId) -> StorageResult<Record>;

    /// Row ids of all live records, in physical order.
    fn scan(&self) -> Vec<RowId>;
}

#[derive(Debug)]
struct HeapPage {
    slots: Vec<Option<Vec<u8>>>,
}

/// In-memory slotted heap. Slots freed by a delete are reused by later
/// inserts; a page is appended once every existing slot is taken.
#[derive(Debug)]
pub struct HeapTable {
    name: String,
    schema: Schema,
    page_capacity: usize,
    pages: RwLock<Vec<HeapPage>>,
}

impl HeapTable {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self::with_page_capacity(name, schema, DEFAULT_PAGE_CAPACITY)
    }

    pub fn with_page_capacity(name: impl Into<String>, schema: Schema, page_capacity: usize) -> Self {
        Self {
            name: name.into(),
            schema,
            page_capacity: page_capacity.clamp(1, u16::MAX as usize),
            pages: RwLock::new(Vec::new()),
        }
    }

    pub fn insert_values(&self, values: &[Value]) -> StorageResult<RowId> {
        let mut record = self.make_record(values)?;
        self.insert_record(&mut record)
    }

    pub fn len(&self) -> usize {
        self.read_pages()
            .iter()
            .map(|p| p.slots.iter().filter(|s| s.is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn page_count(&self) -> usize {
        self.read_pages().len()
    }

    fn read_pages(&self) -> RwLockReadGuard<'_, Vec<HeapPage>> {
        self.pages.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_pages(&self) -> RwLockWriteGuard<'_, Vec<HeapPage>> {
        self.pages.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_value(&self, pos: usize, value: &Value) -> StorageResult<()> {
        let column = &self.schema.columns[pos];

        if value.is_null() {
            if column.nullable {
                return Ok(());
            }
            return Err(StorageError::NullViolation {
                column: column.name.clone(),
            });
        }

        if !column.ty.accepts(value) {
            return Err(StorageError::TypeMismatch {
                column: column.name.clone(),
                expected: column.ty.clone(),
                found: value.data_type(),
            });
        }

        if let (DataType::Varchar { max_len: Some(max) }, Value::String(s)) = (&column.ty, value) {
            let len = s.chars().count();
            if len > *max as usize {
                return Err(StorageError::ValueTooLong {
                    column: column.name.clone(),
                    max_len: *max,
                    len,
                });
            }
        }

        Ok(())
    }

    fn not_found(&self, rid: RowId) -> StorageError {
        StorageError::RecordNotFound {
            table: self.name.clone(),
            rid,
        }
    }

    fn rid_of(&self, record: &Record) -> StorageResult<RowId> {
        record.rid.ok_or_else(|| StorageError::MissingRowId {
            table: self.name.clone(),
        })
    }
}

impl Table for HeapTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn make_record(&self, values: &[Value]) -> StorageResult<Record> {
        if values.len() != self.schema.len() {
            return Err(StorageError::ArityMismatch {
                expected: self.schema.len(),
                found: values.len(),
            });
        }

        for (pos, value) in values.iter().enumerate() {
            self.check_value(pos, value)?;
        }

        Ok(Record::new(ValueCodec::encode_row(values)))
    }

    fn insert_record(&self, record: &mut Record) -> StorageResult<RowId> {
        let mut pages = self.write_pages();

        let mut target = None;
        for (page_id, page) in pages.iter_mut().enumerate() {
            if let Some(slot) = page.slots.iter().position(|s| s.is_none()) {
                page.slots[slot] = Some(record.data.clone());
                target = Some(RowId::new(page_id as u32, slot as u16));
                break;
            }
            if page.slots.len() < self.page_capacity {
                page.slots.push(Some(record.data.clone()));
                target = Some(RowId::new(page_id as u32, (page.slots.len() - 1) as u16));
                break;
            }
        }

        let rid = match target {
            Some(rid) => rid,
            None => {
                let page_id = pages.len() as u32;
                pages.push(HeapPage {
                    slots: vec![Some(record.data.clone())],
                });
                RowId::new(page_id, 0)
            }
        };

        record.rid = Some(rid);
        db_trace!(Component::Storage, "insert {} into '{}'", rid, self.name);
        Ok(rid)
    }

    fn restore_record(&self, record: &Record) -> StorageResult<()> {
        let rid = self.rid_of(record)?;
        let mut pages = self.write_pages();

        while pages.len() <= rid.page_id as usize {
            pages.push(HeapPage { slots: Vec::new() });
        }

        let page = &mut pages[rid.page_id as usize];
        let slot = rid.slot as usize;
        if page.slots.len() <= slot {
            page.slots.resize(slot + 1, None);
        }

        if page.slots[slot].is_some() {
            return Err(StorageError::SlotOccupied {
                table: self.name.clone(),
                rid,
            });
        }

        page.slots[slot] = Some(record.data.clone());
        db_trace!(Component::Storage, "restore {} into '{}'", rid, self.name);
        Ok(())
    }

    fn delete_record(&self, record: &Record) -> StorageResult<()> {
        let rid = self.rid_of(record)?;
        let mut pages = self.write_pages();

        let slot = pages
            .get_mut(rid.page_id as usize)
            .and_then(|p| p.slots.get_mut(rid.slot as usize))
            .filter(|s| s.is_some())
            .ok_or_else(|| self.not_found(rid))?;

        *slot = None;
        db_trace!(Component::Storage, "delete {} from '{}'", rid, self.name);
        Ok(())
    }

    fn get(&self, rid: RowId) -> StorageResult<Record> {
        let pages = self.read_pages();

        pages
            .get(rid.page_id as usize)
            .and_then(|p| p.slots.get(rid.slot as usize))
            .and_then(|s| s.as_ref())
            .map(|data| Record::with_rid(rid, data.clone()))
            .ok_or_else(|| self.not_found(rid))
    }

    fn scan(&self) -> Vec<RowId> {
        let pages = self.read_pages();

        let mut rids = Vec::new();
        for (page_id, page) in pages.iter().enumerate() {
            for (slot, data) in page.slots.iter().enumerate() {
                if data.is_some() {
                    rids.push(RowId::new(page_id as u32, slot as u16));
                }
            }
        }
        rids
    }
}
