//! Lightweight record extraction for mail-like databases
//!
//! Instead of copying a whole mail archive, a fresh local database is built
//! holding the primary table's structure and its most recent rows.

use dbsync_fs::NormalizedPath;
use serde::Serialize;

use crate::Result;
use crate::host::{
    HostEngine, HostSession, LinkedTableDef, Row, TableSchema, is_system_table, with_session,
};

/// Result of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    /// Table reproduced locally; `None` when the source had no user table
    pub primary_table: Option<String>,
    pub rows_copied: usize,
    pub links_recreated: usize,
}

/// What was read from the source database.
struct Snapshot {
    primary: Option<(TableSchema, Vec<Row>)>,
    links: Vec<LinkedTableDef>,
}

pub struct RecordExtractor<'a> {
    engine: &'a dyn HostEngine,
    password: Option<&'a str>,
    tail_size: usize,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(engine: &'a dyn HostEngine, password: Option<&'a str>, tail_size: usize) -> Self {
        Self {
            engine,
            password,
            tail_size,
        }
    }

    /// Rebuild `target` from the tail of `source`'s primary table.
    ///
    /// Any existing file at `target` is replaced. If building the new
    /// database fails part way, the partial file is removed.
    pub fn extract(&self, source: &NormalizedPath, target: &NormalizedPath) -> Result<ExtractReport> {
        tracing::info!(
            "Extracting last {} records from {} into {}",
            self.tail_size,
            source,
            target
        );

        let session = self.engine.open(source, self.password)?;
        let snapshot = with_session(session, |session| self.read_source(session))?;

        dbsync_fs::io::remove_if_exists(target)?;
        let session = self.engine.create(target, self.password)?;
        let built = with_session(session, |session| self.build_target(session, &snapshot));

        match built {
            Ok(report) => {
                tracing::info!(
                    rows = report.rows_copied,
                    links = report.links_recreated,
                    "Extracted {} into {}",
                    report.primary_table.as_deref().unwrap_or("<no table>"),
                    target
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(cleanup) = dbsync_fs::io::remove_if_exists(target) {
                    tracing::warn!("Could not remove partial database {}: {}", target, cleanup);
                }
                Err(e)
            }
        }
    }

    fn read_source(&self, session: &mut dyn HostSession) -> Result<Snapshot> {
        let primary_name = session
            .local_tables()?
            .into_iter()
            .find(|name| !is_system_table(name));

        let primary = match primary_name {
            Some(name) => {
                let schema = session.table_schema(&name)?;
                let rows = session.tail_rows(&name, self.tail_size)?;
                tracing::debug!(
                    table = %name,
                    columns = ?schema.column_names(),
                    rows = rows.len(),
                    "Read primary table tail"
                );
                Some((schema, rows))
            }
            None => {
                tracing::warn!("No user table found in source database; creating an empty copy");
                None
            }
        };

        let links = session.linked_tables()?;
        Ok(Snapshot { primary, links })
    }

    fn build_target(&self, session: &mut dyn HostSession, snapshot: &Snapshot) -> Result<ExtractReport> {
        let mut report = ExtractReport::default();

        if let Some((schema, rows)) = &snapshot.primary {
            session.create_table(schema)?;
            report.rows_copied = session.insert_rows(schema, rows)?;
            report.primary_table = Some(schema.name.clone());
        }

        for link in &snapshot.links {
            session.create_link(link)?;
            report.links_recreated += 1;
        }

        Ok(report)
    }
}
