//! DAO automation through a PowerShell child process
//!
//! Each session spawns the shell with an embedded script that drives
//! `DAO.DBEngine.120`, then exchanges one JSON line per operation over the
//! child's stdin/stdout.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use dbsync_fs::NormalizedPath;

use super::protocol::{RawSchema, Request, Response};
use super::{HostEngine, HostSession, LinkedTableDef, Row, TableSchema, sql};
use crate::connect::ConnectString;
use crate::{Error, Result};

const SCRIPT: &str = include_str!("dao_host.ps1");
const SCRIPT_FILE: &str = "dbsync-dao-host.ps1";

/// Host engine backed by Windows PowerShell and the Access database engine.
#[derive(Debug, Clone)]
pub struct PowerShellHost {
    shell: String,
}

impl PowerShellHost {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn script_path(&self) -> Result<NormalizedPath> {
        let path = NormalizedPath::new(std::env::temp_dir()).join(SCRIPT_FILE);
        dbsync_fs::io::write_atomic(&path, SCRIPT.as_bytes())?;
        Ok(path)
    }

    fn spawn(&self) -> Result<PowerShellSession> {
        let script = self.script_path()?;

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-NoLogo")
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-ExecutionPolicy")
            .arg("Bypass")
            .arg("-File")
            .arg(script.to_native())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::HostUnavailable {
                message: format!("'{}' not found", self.shell),
            },
            _ => Error::HostUnavailable {
                message: format!("cannot start '{}': {}", self.shell, e),
            },
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(Error::HostProtocol {
                message: "host process started without pipes".to_string(),
            });
        };

        tracing::debug!(shell = %self.shell, pid = child.id(), "Started host process");
        Ok(PowerShellSession {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            closed: false,
        })
    }

    fn start(
        &self,
        path: &NormalizedPath,
        password: Option<&str>,
        create: bool,
    ) -> Result<Box<dyn HostSession>> {
        let mut session = self.spawn()?;
        let windows_path = path.to_windows_string();
        let request = if create {
            Request::Create {
                path: &windows_path,
                password,
            }
        } else {
            Request::Open {
                path: &windows_path,
                password,
            }
        };
        let op = request.op();
        if let Err(e) = session.call(&request).and_then(|r| r.into_data(op)) {
            session.terminate();
            return Err(e);
        }
        Ok(Box::new(session))
    }
}

impl HostEngine for PowerShellHost {
    fn name(&self) -> &str {
        "powershell-dao"
    }

    fn open(&self, path: &NormalizedPath, password: Option<&str>) -> Result<Box<dyn HostSession>> {
        self.start(path, password, false)
    }

    fn create(
        &self,
        path: &NormalizedPath,
        password: Option<&str>,
    ) -> Result<Box<dyn HostSession>> {
        self.start(path, password, true)
    }
}

/// One running host process with one open database.
pub struct PowerShellSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    closed: bool,
}

impl PowerShellSession {
    fn call(&mut self, request: &Request<'_>) -> Result<Response> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        let mut reply = String::new();
        let read = self.stdout.read_line(&mut reply)?;
        if read == 0 {
            return Err(Error::HostProtocol {
                message: format!("host exited during '{}'", request.op()),
            });
        }
        Response::parse(&reply)
    }

    fn request<T: serde::de::DeserializeOwned>(&mut self, request: Request<'_>) -> Result<T> {
        let op = request.op();
        self.call(&request)?.decode(op)
    }

    fn command(&mut self, request: Request<'_>) -> Result<()> {
        let op = request.op();
        self.call(&request)?.into_data(op).map(|_| ())
    }

    fn terminate(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl HostSession for PowerShellSession {
    fn linked_tables(&mut self) -> Result<Vec<LinkedTableDef>> {
        self.request(Request::LinkedTables)
    }

    fn relink(&mut self, table: &str, connect: &ConnectString) -> Result<()> {
        self.command(Request::Relink {
            table,
            connect: connect.as_str(),
        })
    }

    fn local_tables(&mut self) -> Result<Vec<String>> {
        self.request(Request::LocalTables)
    }

    fn table_schema(&mut self, table: &str) -> Result<TableSchema> {
        let raw: RawSchema = self.request(Request::Schema { table })?;
        Ok(raw.into())
    }

    fn tail_rows(&mut self, table: &str, limit: usize) -> Result<Vec<Row>> {
        self.request(Request::Tail { table, limit })
    }

    fn create_table(&mut self, schema: &TableSchema) -> Result<()> {
        let statement = sql::create_table_sql(schema);
        tracing::debug!(sql = %statement, "Creating table");
        self.command(Request::Execute { sql: &statement })
    }

    fn insert_rows(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<usize> {
        for row in rows {
            let statement = sql::insert_sql(schema, row);
            self.command(Request::Execute { sql: &statement })?;
        }
        Ok(rows.len())
    }

    fn create_link(&mut self, link: &LinkedTableDef) -> Result<()> {
        self.command(Request::CreateLink { link })
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        let outcome = self.command(Request::Close);
        if outcome.is_ok() {
            let _ = self.child.wait();
            self.closed = true;
        }
        self.terminate();
        outcome
    }
}

impl Drop for PowerShellSession {
    fn drop(&mut self) {
        self.terminate();
    }
}
