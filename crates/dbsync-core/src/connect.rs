//! Access connect strings
//!
//! A linked table stores its source as a `;`-separated string such as
//! `;DATABASE=\\srv\data\brass.mdb;PWD=secret`. Only the `DATABASE` part
//! is ever rewritten; every other part is kept verbatim.

const DATABASE_KEY: &str = "DATABASE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectString {
    raw: String,
}

impl ConnectString {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The stored database path, if this is a file link.
    pub fn database(&self) -> Option<&str> {
        self.raw
            .split(';')
            .filter_map(|part| part.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(DATABASE_KEY))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Links to other Access/Jet files carry a `DATABASE=` part; ODBC and
    /// other external sources do not.
    pub fn is_file_link(&self) -> bool {
        self.database().is_some()
    }

    /// Copy of this connect string pointing at `path`.
    pub fn with_database(&self, path: &str) -> Self {
        let parts: Vec<String> = self
            .raw
            .split(';')
            .map(|part| match part.split_once('=') {
                Some((key, _)) if key.trim().eq_ignore_ascii_case(DATABASE_KEY) => {
                    format!("{}={}", key, path)
                }
                _ => part.to_string(),
            })
            .collect();
        Self {
            raw: parts.join(";"),
        }
    }

    /// Connect string for a plain Access file link.
    pub fn for_database(path: &str) -> Self {
        Self {
            raw: format!(";{}={}", DATABASE_KEY, path),
        }
    }
}

impl std::fmt::Display for ConnectString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
