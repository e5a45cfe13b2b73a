//! `.env`-style key/value files

use std::collections::BTreeMap;

use dbsync_fs::NormalizedPath;

use crate::{Error, Result};

use super::settings::{DB_PREFIX, HOST_SHELL_KEY, LOCAL_DIR_KEY, MAIL_PATTERN_KEY, TAIL_SIZE_KEY};

/// Parse `KEY=value` lines.
///
/// Blank lines and `#` comments are skipped, an `export` prefix is accepted,
/// and one pair of matching surrounding quotes is removed from the value.
pub fn parse_env(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let kv_line = trimmed
            .strip_prefix("export")
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .map(str::trim_start)
            .unwrap_or(trimmed);
        let Some((k, v)) = kv_line.split_once('=') else {
            continue;
        };
        let key = k.trim().to_string();
        if key.is_empty() {
            continue;
        }
        let mut val = v.trim().to_string();
        if ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
            && val.len() >= 2
        {
            val = val[1..val.len() - 1].to_string();
        }
        out.insert(key, val);
    }
    out
}

/// Read and parse a key/value file.
pub fn read_env_file(path: &NormalizedPath) -> Result<BTreeMap<String, String>> {
    let native = path.to_native();
    let text = std::fs::read_to_string(&native).map_err(|source| Error::ConfigUnreadable {
        path: native,
        source,
    })?;
    Ok(parse_env(&text))
}

/// Overlay environment variables on top of file pairs.
///
/// Only keys this tool understands are taken, so unrelated variables never
/// turn into database entries.
pub fn overlay_environment(
    pairs: &mut BTreeMap<String, String>,
    vars: impl IntoIterator<Item = (String, String)>,
) {
    for (key, value) in vars {
        let known = key.starts_with(DB_PREFIX)
            || [LOCAL_DIR_KEY, MAIL_PATTERN_KEY, TAIL_SIZE_KEY, HOST_SHELL_KEY]
                .contains(&key.as_str());
        if known {
            pairs.insert(key, value);
        }
    }
}
