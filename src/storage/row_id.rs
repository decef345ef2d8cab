use std::fmt;

/// Physical address of a stored record: heap page and slot within it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId {
    pub page_id: u32,
    pub slot: u16,
}

impl RowId {
    pub fn new(page_id: u32, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.page_id, self.slot)
    }
}
