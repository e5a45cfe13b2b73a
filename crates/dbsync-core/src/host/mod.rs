//! Host automation abstraction
//!
//! Rewriting link metadata and building fresh databases requires the Access
//! database engine. The engine is reached through [`HostEngine`], which opens
//! a [`HostSession`] per database file. Production code uses
//! [`PowerShellHost`]; tests substitute an in-memory or file-backed fake.

mod powershell;
mod protocol;
pub mod sql;

pub use powershell::PowerShellHost;

use dbsync_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::connect::ConnectString;

/// DAO `dbAutoIncrField` field attribute
const DAO_AUTO_INCREMENT: i64 = 0x10;

/// A linked table definition as stored in a database catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedTableDef {
    /// Table name inside this database
    pub name: String,
    /// Table name inside the linked source
    pub source_table: String,
    /// Raw connect string
    pub connect: String,
}

impl LinkedTableDef {
    pub fn connect_string(&self) -> ConnectString {
        ConnectString::new(self.connect.clone())
    }
}

/// Column data types, named after the Access engine's field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Counter,
    Boolean,
    Byte,
    Integer,
    Long,
    Currency,
    Single,
    Double,
    DateTime,
    Binary,
    Text,
    LongBinary,
    Memo,
    Guid,
    Decimal,
    /// Anything else; recreated as text
    Other,
}

impl ColumnType {
    /// Map a DAO `Field.Type` code and `Field.Attributes` value.
    pub fn from_dao(type_code: i32, attributes: i64) -> Self {
        match type_code {
            1 => Self::Boolean,
            2 => Self::Byte,
            3 => Self::Integer,
            4 if attributes & DAO_AUTO_INCREMENT != 0 => Self::Counter,
            4 => Self::Long,
            5 => Self::Currency,
            6 => Self::Single,
            7 => Self::Double,
            8 => Self::DateTime,
            9 | 17 => Self::Binary,
            10 | 18 => Self::Text,
            11 => Self::LongBinary,
            12 => Self::Memo,
            15 => Self::Guid,
            20 => Self::Decimal,
            _ => Self::Other,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Counter
                | Self::Byte
                | Self::Integer
                | Self::Long
                | Self::Currency
                | Self::Single
                | Self::Double
                | Self::Decimal
        )
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    /// Declared size for text and binary columns
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            size: None,
            nullable: true,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Structure of a table: its name and columns in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A row of values, ordered like the table's columns.
pub type Row = Vec<serde_json::Value>;

/// System and temporary tables never count as user tables.
pub fn is_system_table(name: &str) -> bool {
    name.starts_with("MSys") || name.starts_with('~')
}

/// Factory for sessions against database files.
pub trait HostEngine {
    /// Short name for log output
    fn name(&self) -> &str;

    /// Open an existing database.
    fn open(&self, path: &NormalizedPath, password: Option<&str>) -> Result<Box<dyn HostSession>>;

    /// Create a new, empty database; the file must not exist yet.
    fn create(&self, path: &NormalizedPath, password: Option<&str>)
    -> Result<Box<dyn HostSession>>;
}

/// An open database.
///
/// Implementations release the underlying engine handle when dropped, even
/// if [`HostSession::close`] was never called.
pub trait HostSession {
    /// Every table whose connect string is non-empty.
    fn linked_tables(&mut self) -> Result<Vec<LinkedTableDef>>;

    /// Point `table` at a new source and refresh the link.
    fn relink(&mut self, table: &str, connect: &ConnectString) -> Result<()>;

    /// Names of local (non-linked, non-system) tables, in catalog order.
    fn local_tables(&mut self) -> Result<Vec<String>>;

    fn table_schema(&mut self, table: &str) -> Result<TableSchema>;

    /// The last `limit` rows in physical (insertion) order.
    fn tail_rows(&mut self, table: &str, limit: usize) -> Result<Vec<Row>>;

    fn create_table(&mut self, schema: &TableSchema) -> Result<()>;

    /// Insert rows into `schema.name`; returns how many were written.
    fn insert_rows(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<usize>;

    /// Append a linked table definition.
    fn create_link(&mut self, link: &LinkedTableDef) -> Result<()>;

    /// Close the database and release the engine.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Run `work` against `session`, then close it whatever happened.
///
/// An error from `work` takes precedence over an error from closing.
pub fn with_session<T>(
    mut session: Box<dyn HostSession>,
    work: impl FnOnce(&mut dyn HostSession) -> Result<T>,
) -> Result<T> {
    let outcome = work(session.as_mut());
    let closed = session.close();
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::warn!("Closing host session after failure also failed: {}", close_err);
            Err(e)
        }
    }
}
