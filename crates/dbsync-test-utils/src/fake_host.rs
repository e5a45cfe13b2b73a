//! [`FakeEngine`]: a host engine whose databases are JSON files.
//!
//! Each "database" is a JSON document holding local tables with rows and a
//! catalog of linked tables. Tests can make the engine unavailable, lock
//! files and make individual relinks fail.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use dbsync_core::host::{HostEngine, HostSession, LinkedTableDef, Row, TableSchema};
use dbsync_core::{ConnectString, Error, Result};
use dbsync_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

/// A local table with its rows in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeTable {
    pub schema: TableSchema,
    pub rows: Vec<Row>,
}

/// Contents of a fake database file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FakeDatabase {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tables: Vec<FakeTable>,
    #[serde(default)]
    pub links: Vec<LinkedTableDef>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn with_table(mut self, schema: TableSchema, rows: Vec<Row>) -> Self {
        self.tables.push(FakeTable { schema, rows });
        self
    }

    /// Add a linked table with a raw connect string.
    pub fn with_link(mut self, name: &str, source_table: &str, connect: &str) -> Self {
        self.links.push(LinkedTableDef {
            name: name.to_string(),
            source_table: source_table.to_string(),
            connect: connect.to_string(),
        });
        self
    }

    /// Add a file link to `target`, stored the way Access stores it.
    pub fn with_file_link(self, name: &str, target: &NormalizedPath) -> Self {
        let connect = ConnectString::for_database(&target.to_windows_string());
        self.with_link(name, name, connect.as_str())
    }

    /// Write this database to `path`.
    pub fn write_to(&self, path: &NormalizedPath) {
        let json = serde_json::to_vec_pretty(self).expect("serialize fake database");
        dbsync_fs::io::write_atomic(path, &json).expect("write fake database");
    }

    /// Load the database stored at `path`.
    ///
    /// # Panics
    /// Panics if the file is missing or not a fake database.
    pub fn read_from(path: &NormalizedPath) -> Self {
        let text = std::fs::read_to_string(path.to_native())
            .unwrap_or_else(|e| panic!("Could not read fake database {}: {}", path, e));
        serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("Not a fake database {}: {}", path, e))
    }

    pub fn table(&self, name: &str) -> Option<&FakeTable> {
        self.tables.iter().find(|t| t.schema.name == name)
    }

    pub fn link(&self, name: &str) -> Option<&LinkedTableDef> {
        self.links.iter().find(|l| l.name == name)
    }

    /// The `DATABASE=` target of linked table `name`.
    pub fn link_target(&self, name: &str) -> Option<String> {
        self.link(name)
            .and_then(|l| l.connect_string().database().map(str::to_string))
    }
}

#[derive(Debug, Default)]
struct FakeState {
    unavailable: bool,
    locked: Vec<NormalizedPath>,
    failing_relinks: HashSet<String>,
    opened: usize,
    closed: usize,
    dropped_open: usize,
    relinks: usize,
}

/// Host engine storing databases as JSON files.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the engine under test owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake engine state poisoned")
    }

    /// Every open or create fails as if the engine were not installed.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Opening `path` fails as if another user held it open.
    pub fn lock(&self, path: &NormalizedPath) {
        self.state().locked.push(path.clone());
    }

    /// Relinking `table` fails in every database.
    pub fn fail_relink(&self, table: &str) {
        self.state().failing_relinks.insert(table.to_string());
    }

    /// Sessions opened or created so far
    pub fn opened(&self) -> usize {
        self.state().opened
    }

    /// Sessions closed explicitly
    pub fn closed(&self) -> usize {
        self.state().closed
    }

    /// Sessions dropped without `close`
    pub fn dropped_open(&self) -> usize {
        self.state().dropped_open
    }

    /// Successful relink calls
    pub fn relinks(&self) -> usize {
        self.state().relinks
    }

    fn check_access(&self, op: &str, path: &NormalizedPath) -> Result<()> {
        let state = self.state();
        if state.unavailable {
            return Err(Error::HostUnavailable {
                message: "DAO.DBEngine.120 is not registered".to_string(),
            });
        }
        if state.locked.iter().any(|p| p.eq_ignore_case(path)) {
            return Err(failed(op, format!("{} is locked by another user", path)));
        }
        Ok(())
    }

    fn session(&self, path: &NormalizedPath, db: FakeDatabase) -> Box<dyn HostSession> {
        self.state().opened += 1;
        Box::new(FakeSession {
            engine: self.clone(),
            path: path.clone(),
            db,
            closed: false,
        })
    }
}

impl HostEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn open(&self, path: &NormalizedPath, password: Option<&str>) -> Result<Box<dyn HostSession>> {
        self.check_access("open", path)?;
        let text = std::fs::read_to_string(path.to_native())
            .map_err(|e| failed("open", format!("cannot open {}: {}", path, e)))?;
        let db: FakeDatabase = serde_json::from_str(&text)
            .map_err(|_| failed("open", format!("unrecognized database format '{}'", path)))?;
        if db.password.is_some() && db.password.as_deref() != password {
            return Err(failed("open", "not a valid password"));
        }
        Ok(self.session(path, db))
    }

    fn create(
        &self,
        path: &NormalizedPath,
        password: Option<&str>,
    ) -> Result<Box<dyn HostSession>> {
        self.check_access("create", path)?;
        if path.exists() {
            return Err(failed("create", format!("database {} already exists", path)));
        }
        let db = FakeDatabase {
            password: password.map(str::to_string),
            ..FakeDatabase::default()
        };
        save(path, &db)?;
        Ok(self.session(path, db))
    }
}

struct FakeSession {
    engine: FakeEngine,
    path: NormalizedPath,
    db: FakeDatabase,
    closed: bool,
}

impl FakeSession {
    fn table_mut(&mut self, op: &str, name: &str) -> Result<&mut FakeTable> {
        self.db
            .tables
            .iter_mut()
            .find(|t| t.schema.name == name)
            .ok_or_else(|| failed(op, format!("table '{}' not found", name)))
    }

    fn table(&self, op: &str, name: &str) -> Result<&FakeTable> {
        self.db
            .table(name)
            .ok_or_else(|| failed(op, format!("table '{}' not found", name)))
    }

    fn persist(&self) -> Result<()> {
        save(&self.path, &self.db)
    }
}

impl HostSession for FakeSession {
    fn linked_tables(&mut self) -> Result<Vec<LinkedTableDef>> {
        Ok(self
            .db
            .links
            .iter()
            .filter(|l| !l.connect.is_empty())
            .cloned()
            .collect())
    }

    fn relink(&mut self, table: &str, connect: &ConnectString) -> Result<()> {
        if self.engine.state().failing_relinks.contains(table) {
            return Err(failed("relink", format!("could not refresh link '{}'", table)));
        }
        let link = self
            .db
            .links
            .iter_mut()
            .find(|l| l.name == table)
            .ok_or_else(|| failed("relink", format!("table '{}' not found", table)))?;
        link.connect = connect.as_str().to_string();
        self.persist()?;
        self.engine.state().relinks += 1;
        Ok(())
    }

    fn local_tables(&mut self) -> Result<Vec<String>> {
        Ok(self.db.tables.iter().map(|t| t.schema.name.clone()).collect())
    }

    fn table_schema(&mut self, table: &str) -> Result<TableSchema> {
        Ok(self.table("schema", table)?.schema.clone())
    }

    fn tail_rows(&mut self, table: &str, limit: usize) -> Result<Vec<Row>> {
        let rows = &self.table("tail", table)?.rows;
        let skip = rows.len().saturating_sub(limit);
        Ok(rows[skip..].to_vec())
    }

    fn create_table(&mut self, schema: &TableSchema) -> Result<()> {
        if self.db.table(&schema.name).is_some() {
            return Err(failed("execute", format!("table '{}' already exists", schema.name)));
        }
        self.db.tables.push(FakeTable {
            schema: schema.clone(),
            rows: Vec::new(),
        });
        self.persist()
    }

    fn insert_rows(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<usize> {
        self.table_mut("execute", &schema.name)?
            .rows
            .extend(rows.iter().cloned());
        self.persist()?;
        Ok(rows.len())
    }

    fn create_link(&mut self, link: &LinkedTableDef) -> Result<()> {
        if self.db.link(&link.name).is_some() {
            return Err(failed("create_link", format!("table '{}' already exists", link.name)));
        }
        self.db.links.push(link.clone());
        self.persist()
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.closed = true;
        self.engine.state().closed += 1;
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if !self.closed {
            self.engine.state().dropped_open += 1;
        }
    }
}

fn failed(op: &str, message: impl Into<String>) -> Error {
    Error::HostFailed {
        op: op.to_string(),
        message: message.into(),
    }
}

fn save(path: &NormalizedPath, db: &FakeDatabase) -> Result<()> {
    let json = serde_json::to_vec_pretty(db)?;
    dbsync_fs::io::write_atomic(path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbsync_core::host::{Column, ColumnType};
    use serde_json::json;

    fn schema() -> TableSchema {
        TableSchema::new("Correos", vec![Column::new("Id", ColumnType::Long)])
    }

    #[test]
    fn tail_returns_last_rows_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(temp.path().join("correos.mdb"));
        let rows = (1..=8).map(|i| vec![json!(i)]).collect();
        FakeDatabase::new().with_table(schema(), rows).write_to(&path);

        let engine = FakeEngine::new();
        let mut session = engine.open(&path, None).unwrap();
        let tail = session.tail_rows("Correos", 3).unwrap();
        assert_eq!(tail, vec![vec![json!(6)], vec![json!(7)], vec![json!(8)]]);
        session.close().unwrap();
        assert_eq!(engine.closed(), 1);
    }

    #[test]
    fn password_is_enforced() {
        let temp = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(temp.path().join("brass.mdb"));
        FakeDatabase::new().with_password("secret").write_to(&path);

        let engine = FakeEngine::new();
        assert!(engine.open(&path, None).is_err());
        assert!(engine.open(&path, Some("secret")).is_ok());
    }

    #[test]
    fn dropped_session_is_counted() {
        let temp = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(temp.path().join("brass.mdb"));
        FakeDatabase::new().write_to(&path);

        let engine = FakeEngine::new();
        drop(engine.open(&path, None).unwrap());
        assert_eq!(engine.dropped_open(), 1);
        assert_eq!(engine.closed(), 0);
    }
}
