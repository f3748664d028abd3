//! Identity keys and positional row decoding shared by every source record
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// One query-result row, positional in the select order of the producing query.
pub type RowTuple = Vec<Value>;

/// Identity of a schema within a collection run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaKey {
    pub database: String,
    pub schema: String,
}

/// Identity of a table or view within a collection run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableKey {
    pub database: String,
    pub schema: String,
    pub table: String,
}

/// Identity of a column: its table plus the 1-based ordinal position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub database: String,
    pub schema: String,
    pub table: String,
    pub ordinal_position: i64,
}

impl SchemaKey {
    pub fn new(database: &str, schema: &str) -> Self {
        Self {
            database: database.to_string(),
            schema: schema.to_string(),
        }
    }
}

impl TableKey {
    pub fn new(database: &str, schema: &str, table: &str) -> Self {
        Self {
            database: database.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }
}

impl ColumnKey {
    pub fn new(database: &str, schema: &str, table: &str, ordinal_position: i64) -> Self {
        Self {
            database: database.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
            ordinal_position,
        }
    }

    /// Key of the table this column belongs to
    pub fn table_key(&self) -> TableKey {
        TableKey::new(&self.database, &self.schema, &self.table)
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.schema)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}#{}",
            self.database, self.schema, self.table, self.ordinal_position
        )
    }
}

/// A typed row produced by one metadata source.
///
/// Every source names its identity columns differently (`schema_name`,
/// `schemaname`, `schema`, ...), so each record reports its own key rather
/// than the aligner reading fields by a shared name.
pub trait SourceRecord: Serialize + DeserializeOwned {
    type Key: PartialEq + fmt::Debug;

    /// System view the rows come from, used in error context
    const SOURCE: &'static str;

    fn key(&self) -> Self::Key;
}

/// Decode a positional row into the record shape declared for its source.
///
/// Values are matched to struct fields by position, so the arity and the
/// select order of the producing query are part of the record's contract.
pub fn decode_row<T: SourceRecord>(row: &[Value]) -> Result<T> {
    serde_json::from_value(Value::Array(row.to_vec())).with_context(|| {
        format!(
            "Row from {} does not match its declared shape ({} values)",
            T::SOURCE,
            row.len()
        )
    })
}
