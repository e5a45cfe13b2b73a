//! Immutable run settings
//!
//! `Settings` is built once from key/value pairs and handed to the sync
//! engine; nothing in the core reads the environment on its own.

use std::collections::BTreeMap;

use dbsync_fs::NormalizedPath;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::mapping::MappingRule;
use crate::{Error, Result};

use super::descriptor::DatabaseDescriptor;

/// Prefix marking a database entry, e.g. `DB_BRASS`
pub const DB_PREFIX: &str = "DB_";
/// Password applied when opening and creating databases
pub const PASSWORD_KEY: &str = "DB_PASSWORD";
/// Local base directory
pub const LOCAL_DIR_KEY: &str = "LOCAL_DB_DIR";
/// Regex selecting mail-like databases
pub const MAIL_PATTERN_KEY: &str = "MAIL_PATTERN";
/// Rows kept from a mail-like primary table
pub const TAIL_SIZE_KEY: &str = "TAIL_SIZE";
/// PowerShell executable driving DAO
pub const HOST_SHELL_KEY: &str = "HOST_SHELL";

pub const DEFAULT_LOCAL_DIR: &str = "dbs-locales";
pub const DEFAULT_MAIL_PATTERN: &str = "correos";
pub const DEFAULT_TAIL_SIZE: usize = 5;
pub const DEFAULT_HOST_SHELL: &str = "powershell.exe";

/// Optional overrides loaded from a TOML or JSON settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsOverrides {
    #[serde(default)]
    pub mail_pattern: Option<String>,
    #[serde(default)]
    pub tail_size: Option<usize>,
    #[serde(default)]
    pub host_shell: Option<String>,
    /// Consumed by the CLI when setting up the log file
    #[serde(default)]
    pub log_file: Option<String>,
}

/// Effective configuration for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    password: Option<String>,
    local_dir: NormalizedPath,
    mail_pattern: Regex,
    tail_size: usize,
    host_shell: String,
    descriptors: Vec<DatabaseDescriptor>,
}

impl Settings {
    /// Build settings from key/value pairs.
    ///
    /// A relative `LOCAL_DB_DIR` is resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no database is configured, a
    /// value is empty or malformed, or two databases share a local file.
    pub fn from_pairs(
        pairs: &BTreeMap<String, String>,
        base_dir: &NormalizedPath,
        overrides: &SettingsOverrides,
    ) -> Result<Self> {
        let password = pairs
            .get(PASSWORD_KEY)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let local_dir_raw = pairs
            .get(LOCAL_DIR_KEY)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_LOCAL_DIR);
        let local_dir = NormalizedPath::new(local_dir_raw).absolutize(base_dir);

        let pattern_raw = overrides
            .mail_pattern
            .as_deref()
            .or(pairs.get(MAIL_PATTERN_KEY).map(String::as_str))
            .unwrap_or(DEFAULT_MAIL_PATTERN);
        let mail_pattern = RegexBuilder::new(pattern_raw)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::invalid(MAIL_PATTERN_KEY, e.to_string()))?;

        let tail_size = match overrides.tail_size {
            Some(n) => n,
            None => match pairs.get(TAIL_SIZE_KEY) {
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| Error::invalid(TAIL_SIZE_KEY, format!("'{}': {}", raw, e)))?,
                None => DEFAULT_TAIL_SIZE,
            },
        };
        if tail_size == 0 {
            return Err(Error::invalid(TAIL_SIZE_KEY, "must be at least 1"));
        }

        let host_shell = overrides
            .host_shell
            .clone()
            .or_else(|| pairs.get(HOST_SHELL_KEY).cloned())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST_SHELL.to_string());

        let descriptors = discover_descriptors(pairs, &local_dir, &mail_pattern)?;

        Ok(Self {
            password,
            local_dir,
            mail_pattern,
            tail_size,
            host_shell,
            descriptors,
        })
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn local_dir(&self) -> &NormalizedPath {
        &self.local_dir
    }

    pub fn mail_pattern(&self) -> &Regex {
        &self.mail_pattern
    }

    pub fn tail_size(&self) -> usize {
        self.tail_size
    }

    pub fn host_shell(&self) -> &str {
        &self.host_shell
    }

    /// Databases in logical-name order.
    pub fn descriptors(&self) -> &[DatabaseDescriptor] {
        &self.descriptors
    }

    /// One rule per descriptor: remote directory -> local directory.
    ///
    /// Descriptors whose remote path has no directory contribute nothing.
    pub fn mapping_rules(&self) -> Vec<MappingRule> {
        self.descriptors
            .iter()
            .filter_map(|d| {
                let remote_root = d.remote_path().parent()?;
                let local_root = d.local_path().parent()?;
                Some(MappingRule::new(remote_root, local_root))
            })
            .collect()
    }
}

fn discover_descriptors(
    pairs: &BTreeMap<String, String>,
    local_dir: &NormalizedPath,
    mail_pattern: &Regex,
) -> Result<Vec<DatabaseDescriptor>> {
    let mut descriptors: Vec<DatabaseDescriptor> = Vec::new();

    for (key, value) in pairs {
        if key == PASSWORD_KEY {
            continue;
        }
        let Some(name) = key.strip_prefix(DB_PREFIX) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let remote_path = NormalizedPath::new(value.trim());
        let Some(file_name) = remote_path.file_name().map(str::to_string) else {
            return Err(Error::invalid(key, "expected a path to a database file"));
        };
        let local_path = local_dir.join(&file_name);

        if let Some(existing) = descriptors
            .iter()
            .find(|d| d.local_path().eq_ignore_case(&local_path))
        {
            return Err(Error::DuplicateLocalTarget {
                path: local_path.to_string(),
                first: existing.name().to_string(),
                second: name.to_string(),
            });
        }

        let mail_like = mail_pattern.is_match(name) || mail_pattern.is_match(&file_name);
        tracing::debug!(
            name,
            remote = %remote_path,
            local = %local_path,
            mail_like,
            "Discovered database"
        );
        descriptors.push(DatabaseDescriptor::new(
            name,
            remote_path,
            local_path,
            mail_like,
        ));
    }

    if descriptors.is_empty() {
        return Err(Error::ConfigMissing {
            key: format!("{}<NAME> database entries", DB_PREFIX),
        });
    }

    tracing::info!("Discovered {} databases from configuration", descriptors.len());
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> NormalizedPath {
        NormalizedPath::new("C:\\tools\\importer")
    }

    #[test]
    fn discovers_databases_and_defaults() {
        let settings = Settings::from_pairs(
            &pairs(&[
                ("DB_PASSWORD", "secret"),
                ("DB_BRASS", "\\\\srv\\data\\brass.mdb"),
                ("DB_CORREOS", "\\\\srv\\data\\correos.mdb"),
            ]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap();

        assert_eq!(settings.password(), Some("secret"));
        assert_eq!(settings.local_dir().as_str(), "C:/tools/importer/dbs-locales");
        assert_eq!(settings.tail_size(), DEFAULT_TAIL_SIZE);
        assert_eq!(settings.host_shell(), DEFAULT_HOST_SHELL);

        let names: Vec<_> = settings.descriptors().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["BRASS", "CORREOS"]);

        let brass = &settings.descriptors()[0];
        assert_eq!(brass.local_path().as_str(), "C:/tools/importer/dbs-locales/brass.mdb");
        assert!(!brass.is_mail_like());
        assert!(settings.descriptors()[1].is_mail_like());
    }

    #[test]
    fn empty_password_means_none() {
        let settings = Settings::from_pairs(
            &pairs(&[("DB_PASSWORD", "  "), ("DB_BRASS", "\\\\srv\\data\\brass.mdb")]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap();
        assert_eq!(settings.password(), None);
    }

    #[test]
    fn absolute_local_dir_is_kept() {
        let settings = Settings::from_pairs(
            &pairs(&[("LOCAL_DB_DIR", "D:\\dbs"), ("DB_BRASS", "\\\\srv\\data\\brass.mdb")]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap();
        assert_eq!(settings.local_dir().as_str(), "D:/dbs");
    }

    #[test]
    fn no_databases_is_config_error() {
        let err = Settings::from_pairs(
            &pairs(&[("DB_PASSWORD", "secret")]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigMissing { .. }));
        assert!(err.is_config());
    }

    #[test]
    fn empty_remote_path_is_config_error() {
        let err = Settings::from_pairs(
            &pairs(&[("DB_BRASS", "")]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { ref key, .. } if key == "DB_BRASS"));
    }

    #[test]
    fn invalid_tail_size_is_config_error() {
        for raw in ["five", "0", "-1"] {
            let err = Settings::from_pairs(
                &pairs(&[("TAIL_SIZE", raw), ("DB_BRASS", "\\\\srv\\data\\brass.mdb")]),
                &base(),
                &SettingsOverrides::default(),
            )
            .unwrap_err();
            assert!(err.is_config(), "{} should be rejected", raw);
        }
    }

    #[test]
    fn invalid_mail_pattern_is_config_error() {
        let err = Settings::from_pairs(
            &pairs(&[("MAIL_PATTERN", "(correos"), ("DB_BRASS", "\\\\srv\\data\\brass.mdb")]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { ref key, .. } if key == MAIL_PATTERN_KEY));
    }

    #[test]
    fn duplicate_local_file_is_config_error() {
        let err = Settings::from_pairs(
            &pairs(&[
                ("DB_A", "\\\\srv\\one\\brass.mdb"),
                ("DB_B", "\\\\srv\\two\\BRASS.mdb"),
            ]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateLocalTarget { .. }));
    }

    #[test]
    fn mail_pattern_matches_file_name_case_insensitively() {
        let settings = Settings::from_pairs(
            &pairs(&[("DB_MAIL", "\\\\srv\\data\\CORREOS_2024.mdb")]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap();
        assert!(settings.descriptors()[0].is_mail_like());
    }

    #[test]
    fn overrides_win_over_pairs() {
        let overrides = SettingsOverrides {
            mail_pattern: Some("^brass$".into()),
            tail_size: Some(9),
            host_shell: Some("C:\\Windows\\SysWOW64\\WindowsPowerShell\\v1.0\\powershell.exe".into()),
            log_file: None,
        };
        let settings = Settings::from_pairs(
            &pairs(&[("TAIL_SIZE", "3"), ("DB_BRASS", "\\\\srv\\data\\brass.mdb")]),
            &base(),
            &overrides,
        )
        .unwrap();
        assert_eq!(settings.tail_size(), 9);
        assert!(settings.descriptors()[0].is_mail_like());
        assert!(settings.host_shell().contains("SysWOW64"));
    }

    #[test]
    fn mapping_rules_follow_descriptor_directories() {
        let settings = Settings::from_pairs(
            &pairs(&[
                ("LOCAL_DB_DIR", "C:\\dbs"),
                ("DB_BRASS", "\\\\srv\\data\\brass.mdb"),
                ("DB_STOCK", "\\\\srv\\data\\stock\\stock.mdb"),
            ]),
            &base(),
            &SettingsOverrides::default(),
        )
        .unwrap();

        let rules: Vec<_> = settings
            .mapping_rules()
            .into_iter()
            .map(|r| (r.remote_root.to_string(), r.local_root.to_string()))
            .collect();
        assert_eq!(
            rules,
            vec![
                ("//srv/data".to_string(), "C:/dbs".to_string()),
                ("//srv/data/stock".to_string(), "C:/dbs".to_string()),
            ]
        );
    }
}
