//! Configuration loading for a run
//!
//! Reads the optional settings file and the key/value file, overlays the
//! process environment and builds the immutable `Settings`.

use std::collections::BTreeMap;
use std::path::Path;

use dbsync_core::config::{overlay_environment, read_env_file};
use dbsync_core::{Settings, SettingsOverrides};
use dbsync_fs::{ConfigStore, NormalizedPath};

use crate::error::{CliError, Result};

/// Default key/value file name in the working directory
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Load the `--settings` overrides file, or defaults when none was given.
pub fn load_overrides(path: Option<&Path>) -> Result<SettingsOverrides> {
    let Some(path) = path else {
        return Ok(SettingsOverrides::default());
    };
    ConfigStore::new()
        .load(&NormalizedPath::new(path))
        .map_err(|source| CliError::Settings {
            path: path.to_path_buf(),
            source,
        })
}

/// Build settings for a run started in `cwd`.
///
/// An explicitly named env file must exist; the default `.env` is optional.
/// A relative `LOCAL_DB_DIR` resolves against the env file's directory.
pub fn load_settings(
    cwd: &Path,
    env_file: Option<&Path>,
    overrides: &SettingsOverrides,
) -> Result<Settings> {
    let cwd = NormalizedPath::new(cwd);

    let (mut pairs, base_dir) = match env_file {
        Some(path) => {
            let path = NormalizedPath::new(path).absolutize(&cwd);
            let pairs = read_env_file(&path)?;
            let base = path.parent().unwrap_or_else(|| cwd.clone());
            tracing::debug!(env_file = %path, "Loaded configuration file");
            (pairs, base)
        }
        None => {
            let path = cwd.join(DEFAULT_ENV_FILE);
            if path.is_file() {
                tracing::debug!(env_file = %path, "Loaded configuration file");
                (read_env_file(&path)?, cwd.clone())
            } else {
                tracing::debug!("No {} in {}, using environment only", DEFAULT_ENV_FILE, cwd);
                (BTreeMap::new(), cwd.clone())
            }
        }
    };

    overlay_environment(&mut pairs, std::env::vars());
    Ok(Settings::from_pairs(&pairs, &base_dir, overrides)?)
}
