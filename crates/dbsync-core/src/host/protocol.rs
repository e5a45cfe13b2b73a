//! Line-delimited JSON protocol spoken with the host script
//!
//! Every request is one JSON object on one line; the script answers each
//! with exactly one JSON line.

use serde::{Deserialize, Serialize};

use super::{Column, ColumnType, LinkedTableDef, TableSchema};
use crate::{Error, Result};

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum Request<'a> {
    Open {
        path: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<&'a str>,
    },
    Create {
        path: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<&'a str>,
    },
    LinkedTables,
    Relink {
        table: &'a str,
        connect: &'a str,
    },
    LocalTables,
    Schema {
        table: &'a str,
    },
    Tail {
        table: &'a str,
        limit: usize,
    },
    Execute {
        sql: &'a str,
    },
    CreateLink {
        link: &'a LinkedTableDef,
    },
    Close,
}

impl Request<'_> {
    pub(crate) fn op(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Create { .. } => "create",
            Self::LinkedTables => "linked_tables",
            Self::Relink { .. } => "relink",
            Self::LocalTables => "local_tables",
            Self::Schema { .. } => "schema",
            Self::Tail { .. } => "tail",
            Self::Execute { .. } => "execute",
            Self::CreateLink { .. } => "create_link",
            Self::Close => "close",
        }
    }
}

/// Reply kind the script uses when the DAO engine cannot be created
const KIND_UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Deserialize)]
pub(crate) struct Response {
    pub ok: bool,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl Response {
    /// Parse one reply line.
    pub(crate) fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).map_err(|e| Error::HostProtocol {
            message: format!("unparseable reply {:?}: {}", truncate(line), e),
        })
    }

    /// Turn a failed reply into the matching error, or hand back the data.
    pub(crate) fn into_data(self, op: &str) -> Result<serde_json::Value> {
        if self.ok {
            return Ok(self.data);
        }
        let message = self
            .error
            .unwrap_or_else(|| "host reported failure without a message".to_string());
        match self.kind.as_deref() {
            Some(KIND_UNAVAILABLE) => Err(Error::HostUnavailable { message }),
            _ => Err(Error::host_failed(op, message)),
        }
    }

    /// Decode the reply data into `T`.
    pub(crate) fn decode<T: serde::de::DeserializeOwned>(self, op: &str) -> Result<T> {
        let data = self.into_data(op)?;
        serde_json::from_value(data).map_err(|e| Error::HostProtocol {
            message: format!("unexpected '{}' reply: {}", op, e),
        })
    }
}

/// Schema as the script reports it, with DAO type codes.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSchema {
    name: String,
    columns: Vec<RawColumn>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
    column_type: i32,
    #[serde(default)]
    attributes: i64,
    #[serde(default)]
    size: u32,
    #[serde(default = "default_true")]
    nullable: bool,
}

fn default_true() -> bool {
    true
}

impl From<RawSchema> for TableSchema {
    fn from(raw: RawSchema) -> Self {
        let columns = raw
            .columns
            .into_iter()
            .map(|c| {
                let column_type = ColumnType::from_dao(c.column_type, c.attributes);
                let mut column = Column::new(c.name, column_type);
                if matches!(column_type, ColumnType::Text | ColumnType::Binary) && c.size > 0 {
                    column = column.with_size(c.size);
                }
                if !c.nullable {
                    column = column.required();
                }
                column
            })
            .collect();
        TableSchema::new(raw.name, columns)
    }
}

fn truncate(line: &str) -> String {
    line.chars().take(200).collect()
}
