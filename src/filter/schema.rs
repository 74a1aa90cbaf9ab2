use super::error::FilterError;
use super::types::{ColumnType, FilterValue};

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self { name, column_type }
    }
}

/// Table name plus the allow-list of scalar columns that may be filtered or
/// sorted on. Anything not listed here never reaches generated SQL.
#[derive(Debug)]
pub struct EntitySchema {
    pub table: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [ColumnDef],
}

impl EntitySchema {
    pub fn column(&self, name: &str) -> Result<&ColumnDef, FilterError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FilterError::UnknownColumn(name.to_string()))
    }
}

/// A row that can be evaluated against a `Filter` without a database.
pub trait FilterRecord {
    fn column_value(&self, column: &str) -> FilterValue;
}
