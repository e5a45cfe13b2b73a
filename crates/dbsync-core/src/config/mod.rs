//! Configuration loading
//!
//! Settings come from key/value pairs (a `.env`-style file overlaid by the
//! process environment) and an optional TOML/JSON overrides file. Later
//! sources override earlier ones:
//!
//! 1. **Defaults** - `dbs-locales`, pattern `correos`, tail of 5 rows
//! 2. **Key/value file** - `.env` next to the working directory
//! 3. **Process environment** - same keys as the file
//! 4. **Overrides file** - `--settings dbsync.toml`
//!
//! # Example
//!
//! ```ignore
//! use dbsync_core::config::{Settings, SettingsOverrides, read_env_file};
//! use dbsync_fs::NormalizedPath;
//!
//! let pairs = read_env_file(&NormalizedPath::new(".env"))?;
//! let settings = Settings::from_pairs(&pairs, &NormalizedPath::new("."), &SettingsOverrides::default())?;
//! for db in settings.descriptors() {
//!     println!("{} -> {}", db.remote_path(), db.local_path());
//! }
//! ```

mod descriptor;
mod env_file;
mod settings;

pub use descriptor::DatabaseDescriptor;
pub use env_file::{overlay_environment, parse_env, read_env_file};
pub use settings::{
    DB_PREFIX, DEFAULT_HOST_SHELL, DEFAULT_LOCAL_DIR, DEFAULT_MAIL_PATTERN, DEFAULT_TAIL_SIZE,
    HOST_SHELL_KEY, LOCAL_DIR_KEY, MAIL_PATTERN_KEY, PASSWORD_KEY, Settings, SettingsOverrides,
    TAIL_SIZE_KEY,
};
