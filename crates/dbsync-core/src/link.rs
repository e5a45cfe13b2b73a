//! Linked table relinking
//!
//! The [`LinkUpdater`] opens a local database, walks its linked tables and
//! points every file link that lies under a remote root at the local copy.

use dbsync_fs::NormalizedPath;
use serde::Serialize;

use crate::Result;
use crate::connect::ConnectString;
use crate::host::{HostEngine, HostSession, LinkedTableDef, with_session};
use crate::mapping::{PathMapper, Resolution};

/// What happened to one linked table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkStatus {
    /// Link rewritten to `target`
    Relinked { target: String, target_exists: bool },
    /// Already pointing inside a local root, which covers a link whose
    /// mapped target is its current path
    AlreadyLocal,
    /// No mapping rule matched; left untouched
    Unresolved,
    /// Not a file link (ODBC or other external source)
    NotFileLink,
    /// The host refused the relink
    Failed { message: String },
}

/// Outcome for one linked table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    pub table: String,
    /// Path stored before this run, if the link had one
    pub current_path: Option<String>,
    #[serde(flatten)]
    pub status: LinkStatus,
}

/// Relinking result for one database.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkReport {
    pub database: String,
    pub tables: Vec<TableOutcome>,
}

impl LinkReport {
    fn count(&self, pred: impl Fn(&LinkStatus) -> bool) -> usize {
        self.tables.iter().filter(|t| pred(&t.status)).count()
    }

    pub fn relinked(&self) -> usize {
        self.count(|s| matches!(s, LinkStatus::Relinked { .. }))
    }

    pub fn unresolved(&self) -> usize {
        self.count(|s| matches!(s, LinkStatus::Unresolved))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, LinkStatus::Failed { .. }))
    }

    /// Tables left as they were: already local or not file links.
    pub fn untouched(&self) -> usize {
        self.count(|s| {
            matches!(
                s,
                LinkStatus::AlreadyLocal | LinkStatus::NotFileLink
            )
        })
    }

    /// True when no table failed to relink.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, table: &str) -> Option<&TableOutcome> {
        self.tables.iter().find(|t| t.table == table)
    }
}

/// Rewrites linked-table sources inside local databases.
pub struct LinkUpdater<'a> {
    engine: &'a dyn HostEngine,
    mapper: &'a PathMapper,
    password: Option<&'a str>,
}

impl<'a> LinkUpdater<'a> {
    pub fn new(engine: &'a dyn HostEngine, mapper: &'a PathMapper, password: Option<&'a str>) -> Self {
        Self {
            engine,
            mapper,
            password,
        }
    }

    /// Relink every resolvable file link in `database`.
    ///
    /// Per-table relink failures are recorded in the report and do not stop
    /// the walk. Failing to open the database or read its catalog is an
    /// error. The session is closed in every case.
    pub fn update(&self, database: &NormalizedPath) -> Result<LinkReport> {
        tracing::info!("Updating links in {}", database);
        let session = self.engine.open(database, self.password)?;

        let tables = with_session(session, |session| {
            let links = session.linked_tables()?;
            if links.is_empty() {
                tracing::info!("No linked tables in {}", database);
            }
            let mut outcomes = Vec::with_capacity(links.len());
            for link in &links {
                outcomes.push(self.update_table(session, link));
            }
            Ok(outcomes)
        })?;

        let report = LinkReport {
            database: database.to_string(),
            tables,
        };
        tracing::info!(
            relinked = report.relinked(),
            untouched = report.untouched(),
            unresolved = report.unresolved(),
            failed = report.failed(),
            "Finished links in {}",
            database
        );
        Ok(report)
    }

    fn update_table(&self, session: &mut dyn HostSession, link: &LinkedTableDef) -> TableOutcome {
        let connect = link.connect_string();
        let Some(current) = connect.database() else {
            tracing::debug!(table = %link.name, connect = %connect, "Skipping non-file link");
            return outcome(link, None, LinkStatus::NotFileLink);
        };
        let current_path = NormalizedPath::new(current);

        let status = match self.mapper.resolve(&current_path) {
            Resolution::Unresolved => {
                tracing::warn!(
                    "Table {}: no mapping for {}, leaving link untouched",
                    link.name,
                    current
                );
                LinkStatus::Unresolved
            }
            Resolution::AlreadyLocal => {
                tracing::debug!(table = %link.name, "Link already points to a local file");
                LinkStatus::AlreadyLocal
            }
            Resolution::Mapped(target) => self.relink(session, link, &connect, &target),
        };
        outcome(link, Some(current), status)
    }

    fn relink(
        &self,
        session: &mut dyn HostSession,
        link: &LinkedTableDef,
        connect: &ConnectString,
        target: &NormalizedPath,
    ) -> LinkStatus {
        let target_exists = target.is_file();
        if !target_exists {
            tracing::warn!(
                "Table {}: local target {} does not exist, relinking anyway",
                link.name,
                target
            );
        }

        let target_str = target.to_windows_string();
        let rewritten = connect.with_database(&target_str);
        match session.relink(&link.name, &rewritten) {
            Ok(()) => {
                tracing::info!("Table {} -> {}", link.name, target_str);
                LinkStatus::Relinked {
                    target: target_str,
                    target_exists,
                }
            }
            Err(e) => {
                tracing::error!("Table {}: relink failed: {}", link.name, e);
                LinkStatus::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

fn outcome(link: &LinkedTableDef, current: Option<&str>, status: LinkStatus) -> TableOutcome {
    TableOutcome {
        table: link.name.clone(),
        current_path: current.map(str::to_string),
        status,
    }
}
