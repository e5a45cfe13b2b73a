//! Database descriptors built from configuration

use dbsync_fs::NormalizedPath;

/// One configured database: where it lives remotely and where its local
/// copy goes.
///
/// Built once from settings and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseDescriptor {
    name: String,
    remote_path: NormalizedPath,
    local_path: NormalizedPath,
    mail_like: bool,
}

impl DatabaseDescriptor {
    pub fn new(
        name: impl Into<String>,
        remote_path: NormalizedPath,
        local_path: NormalizedPath,
        mail_like: bool,
    ) -> Self {
        Self {
            name: name.into(),
            remote_path,
            local_path,
            mail_like,
        }
    }

    /// Logical name, e.g. `BRASS` for `DB_BRASS`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn remote_path(&self) -> &NormalizedPath {
        &self.remote_path
    }

    pub fn local_path(&self) -> &NormalizedPath {
        &self.local_path
    }

    /// Whether only a bounded tail of the primary table is reproduced locally
    pub fn is_mail_like(&self) -> bool {
        self.mail_like
    }

    /// File name shared by the remote and local copies.
    pub fn file_name(&self) -> &str {
        self.remote_path.file_name().unwrap_or(&self.name)
    }
}
