//! [`TestWorkspace`] builder for sync scenarios.
//!
//! Lays out a temporary directory the way a real installation looks: a
//! "remote" directory standing in for the office share, the local
//! `dbs-locales` directory and a `.env` file.

use std::collections::BTreeMap;

use dbsync_core::{Settings, SettingsOverrides};
use dbsync_fs::NormalizedPath;
use tempfile::TempDir;

use crate::fake_host::FakeDatabase;

/// Name of the directory standing in for the network share
pub const REMOTE_DIR: &str = "remote";
/// Default local directory, relative to the workspace root
pub const LOCAL_DIR: &str = "dbs-locales";

/// A temporary installation with remote and local database directories.
///
/// # Example
///
/// ```rust,no_run
/// use dbsync_test_utils::{FakeDatabase, TestWorkspace};
///
/// let mut ws = TestWorkspace::new();
/// let brass = ws.remote_db("brass.mdb", &FakeDatabase::new());
/// ws.add_database("BRASS", &brass);
/// let settings = ws.settings();
/// assert_eq!(settings.descriptors().len(), 1);
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
    pairs: BTreeMap<String, String>,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty workspace with the remote directory in place.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join(REMOTE_DIR)).unwrap();
        Self {
            temp_dir,
            pairs: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> NormalizedPath {
        NormalizedPath::new(self.temp_dir.path())
    }

    pub fn remote_dir(&self) -> NormalizedPath {
        self.root().join(REMOTE_DIR)
    }

    pub fn local_dir(&self) -> NormalizedPath {
        self.root().join(LOCAL_DIR)
    }

    pub fn remote_path(&self, file: &str) -> NormalizedPath {
        self.remote_dir().join(file)
    }

    pub fn local_path(&self, file: &str) -> NormalizedPath {
        self.local_dir().join(file)
    }

    /// A path in a directory that does not exist, standing in for a share
    /// that is offline.
    pub fn offline_path(&self, file: &str) -> NormalizedPath {
        self.root().join("offline-share").join(file)
    }

    /// Write a database into the remote directory.
    pub fn remote_db(&self, file: &str, db: &FakeDatabase) -> NormalizedPath {
        let path = self.remote_path(file);
        db.write_to(&path);
        path
    }

    /// Write a database into the local directory, creating it if needed.
    pub fn local_db(&self, file: &str, db: &FakeDatabase) -> NormalizedPath {
        std::fs::create_dir_all(self.local_dir().to_native()).unwrap();
        let path = self.local_path(file);
        db.write_to(&path);
        path
    }

    /// Set a configuration key.
    pub fn configure(&mut self, key: &str, value: &str) -> &mut Self {
        self.pairs.insert(key.to_string(), value.to_string());
        self
    }

    /// Register `DB_<name>` pointing at `remote`.
    pub fn add_database(&mut self, name: &str, remote: &NormalizedPath) -> &mut Self {
        let value = remote.to_native_string();
        self.configure(&format!("DB_{}", name), &value)
    }

    /// Write the configured pairs to `.env` in the workspace root.
    pub fn write_env(&self) -> NormalizedPath {
        let path = self.root().join(".env");
        let mut text = String::from("# generated by TestWorkspace\n");
        for (key, value) in &self.pairs {
            text.push_str(&format!("{}={}\n", key, value));
        }
        std::fs::write(path.to_native(), text).unwrap();
        path
    }

    /// Settings built from the configured pairs, relative to the root.
    ///
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn settings(&self) -> Settings {
        self.try_settings().expect("invalid test configuration")
    }

    pub fn try_settings(&self) -> dbsync_core::Result<Settings> {
        Settings::from_pairs(&self.pairs, &self.root(), &SettingsOverrides::default())
    }

    /// Read back a local database.
    pub fn read_local(&self, file: &str) -> FakeDatabase {
        FakeDatabase::read_from(&self.local_path(file))
    }

    /// Read back a remote database.
    pub fn read_remote(&self, file: &str) -> FakeDatabase {
        FakeDatabase::read_from(&self.remote_path(file))
    }
}
